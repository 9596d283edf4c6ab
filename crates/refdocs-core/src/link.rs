//! External documentation links.
//!
//! Each configured rule pairs a regular expression over the qualified type
//! identifier with a URL template written in Go text/template syntax.
//! Templates see three values: `TypeIdentifier` (bare type name),
//! `PackagePath` and `PackageSegments` (the path split on `/`), plus the
//! `lower`, `arrIndex` and `printf` helpers. Rules are translated to
//! minijinja once, when the resolver is built.

use minijinja::value::{Rest, Value};
use minijinja::{Environment, context};
use regex::Regex;

use refdocs_error::{Error, Result};

use crate::config::ExternalPackage;
use crate::decl::TypeDecl;
use crate::naming::quote;

/// One compiled `externalPackages` entry.
#[derive(Debug, Clone)]
struct LinkRule {
    pattern: Regex,
    template: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    /// Already spelled as a minijinja string literal.
    Str(String),
    Pipe,
    Open,
    Close,
}

fn syntax_error(source: &str, message: impl Into<String>) -> Error {
    Error::template_error(message)
        .with_operation("link::translate_go_template")
        .with_context("template", source.to_string())
}

/// Offset of the `}}` closing an action, skipping quoted text.
fn action_end(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (idx, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if b == b'\\' && q == b'"' {
                    escaped = true;
                } else if b == q {
                    quote = None;
                }
            }
            None if b == b'"' || b == b'`' => quote = Some(b),
            None if b == b'}' && bytes.get(idx + 1) == Some(&b'}') => return Some(idx),
            None => {}
        }
    }
    None
}

/// Spell `value` as a double-quoted minijinja literal.
fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Decode the body of a Go interpreted string literal.
fn unquote_go(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let decoded = match chars.next()? {
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0b}',
            '\\' => '\\',
            '"' => '"',
            'x' => hex_char(&mut chars, 2)?,
            'u' => hex_char(&mut chars, 4)?,
            'U' => hex_char(&mut chars, 8)?,
            d @ '0'..='7' => {
                let digits: String = std::iter::once(d).chain(chars.by_ref().take(2)).collect();
                char::from_u32(u32::from_str_radix(&digits, 8).ok()?)?
            }
            _ => return None,
        };
        out.push(decoded);
    }
    Some(out)
}

fn hex_char(chars: &mut std::str::Chars<'_>, len: usize) -> Option<char> {
    let digits: String = chars.by_ref().take(len).collect();
    if digits.len() != len {
        return None;
    }
    char::from_u32(u32::from_str_radix(&digits, 16).ok()?)
}

fn tokenize(source: &str, action: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = action.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        match ch {
            c if c.is_whitespace() => {}
            '|' => tokens.push(Token::Pipe),
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            '"' => {
                let mut escaped = false;
                let mut end = None;
                for (idx, c) in chars.by_ref() {
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == '"' {
                        end = Some(idx);
                        break;
                    }
                }
                let end = end.ok_or_else(|| syntax_error(source, "unterminated quoted string"))?;
                let value = unquote_go(&action[start + 1..end])
                    .ok_or_else(|| syntax_error(source, "invalid escape in quoted string"))?;
                tokens.push(Token::Str(string_literal(&value)));
            }
            '`' => {
                let end = chars
                    .by_ref()
                    .find(|&(_, c)| c == '`')
                    .map(|(idx, _)| idx)
                    .ok_or_else(|| syntax_error(source, "unterminated raw string"))?;
                tokens.push(Token::Str(string_literal(&action[start + 1..end])));
            }
            _ => {
                let mut end = action.len();
                while let Some(&(idx, c)) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '|' | '(' | ')' | '"' | '`') {
                        end = idx;
                        break;
                    }
                    chars.next();
                }
                tokens.push(Token::Word(action[start..end].to_string()));
            }
        }
    }
    Ok(tokens)
}

/// Go operand spelling to minijinja: `.Field` loses its dot, `nil` is `none`.
fn operand(word: String) -> String {
    if word == "nil" {
        return "none".to_string();
    }
    if let Some(field) = word.strip_prefix('.').filter(|field| !field.is_empty()) {
        return field.to_string();
    }
    word
}

struct ActionParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl ActionParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// `command ('|' command)*`; a later stage takes the earlier result as
    /// its last argument.
    fn pipeline(&mut self) -> Result<String> {
        let mut expr: Option<String> = None;
        loop {
            let mut operands = Vec::new();
            while let Some(token) = self.peek().cloned() {
                match token {
                    Token::Pipe | Token::Close => break,
                    Token::Open => {
                        self.pos += 1;
                        let inner = self.pipeline()?;
                        if self.peek() != Some(&Token::Close) {
                            return Err(syntax_error(self.source, "unclosed left paren"));
                        }
                        self.pos += 1;
                        operands.push(format!("({inner})"));
                    }
                    Token::Word(word) => {
                        self.pos += 1;
                        operands.push(operand(word));
                    }
                    Token::Str(literal) => {
                        self.pos += 1;
                        operands.push(literal);
                    }
                }
            }
            if operands.is_empty() {
                return Err(syntax_error(self.source, "missing command in action"));
            }
            if let Some(prev) = expr.take() {
                operands.push(prev);
            }
            let head = operands.remove(0);
            expr = Some(if operands.is_empty() {
                head
            } else {
                format!("{}({})", head, operands.join(", "))
            });
            if self.peek() == Some(&Token::Pipe) {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(expr.unwrap_or_default())
    }
}

fn translate_action(source: &str, action: &str) -> Result<String> {
    let tokens = tokenize(source, action)?;
    let mut parser = ActionParser {
        source,
        tokens,
        pos: 0,
    };
    let expr = parser.pipeline()?;
    if parser.pos != parser.tokens.len() {
        return Err(syntax_error(source, "unexpected right paren"));
    }
    Ok(expr)
}

/// Rewrite Go-template actions into minijinja expressions.
///
/// `.Field` becomes `Field`, `fn a b` becomes `fn(a, b)`, a pipeline stage
/// `x | fn a` becomes `fn(a, x)` and quoted literals are kept intact. Trim
/// markers (`{{- ` and ` -}}`) carry over; comments are dropped.
pub fn translate_go_template(source: &str) -> Result<String> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let body = &rest[start + 2..];
        let end = action_end(body)
            .ok_or_else(|| syntax_error(source, "unclosed action"))?;

        let mut action = &body[..end];
        let trim_left = action.starts_with('-') && action[1..].starts_with(char::is_whitespace);
        if trim_left {
            action = &action[1..];
        }
        let trim_right = action.ends_with('-')
            && action[..action.len() - 1].ends_with(char::is_whitespace);
        if trim_right {
            action = &action[..action.len() - 1];
        }

        let open = if trim_left { "{{-" } else { "{{" };
        let close = if trim_right { "-}}" } else { "}}" };
        let trimmed = action.trim();
        if trimmed.starts_with("/*") && trimmed.ends_with("*/") {
            out.push_str(&format!("{open} '' {close}"));
        } else {
            out.push_str(&format!("{open} {} {close}", translate_action(source, action)?));
        }
        rest = &body[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Go's `printf` for the verbs URL templates use: `%s`, `%v`, `%d`, `%q`.
fn printf(format: String, args: Rest<Value>) -> std::result::Result<String, minijinja::Error> {
    let bad = |message: String| minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, message);
    let mut out = String::with_capacity(format.len());
    let mut values = args.iter();
    let mut chars = format.chars();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some(verb @ ('s' | 'v' | 'd' | 'q')) => {
                let value = values
                    .next()
                    .ok_or_else(|| bad(format!("printf: missing argument for %{verb}")))?;
                if verb == 'q' {
                    out.push_str(&quote(&value.to_string()));
                } else {
                    out.push_str(&value.to_string());
                }
            }
            Some(verb) => return Err(bad(format!("printf: unsupported verb %{verb}"))),
            None => return Err(bad("printf: trailing %".to_string())),
        }
    }
    if values.next().is_some() {
        return Err(bad("printf: too many arguments".to_string()));
    }
    Ok(out)
}

fn arr_index(items: Vec<String>, index: i64) -> std::result::Result<String, minijinja::Error> {
    if items.is_empty() {
        return Err(minijinja::Error::new(
            minijinja::ErrorKind::InvalidOperation,
            "arrIndex on an empty array",
        ));
    }
    let len = items.len() as i64;
    let idx = index.rem_euclid(len) as usize;
    Ok(items[idx].clone())
}

fn template_env() -> Environment<'static> {
    let mut env = Environment::new();
    env.add_function("lower", |s: String| s.to_lowercase());
    env.add_filter("lower", |s: String| s.to_lowercase());
    env.add_function("arrIndex", arr_index);
    env.add_function("printf", printf);
    env
}

/// Compiled external link rules, tried in configuration order.
pub struct LinkResolver {
    rules: Vec<LinkRule>,
    env: Environment<'static>,
}

impl std::fmt::Debug for LinkResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkResolver")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl LinkResolver {
    /// Compile every rule up front; the first malformed one fails.
    pub fn new(packages: &[ExternalPackage]) -> Result<Self> {
        let env = template_env();
        let mut rules = Vec::with_capacity(packages.len());
        for pkg in packages {
            let pattern = Regex::new(&pkg.type_match_prefix).map_err(|e| {
                Error::invalid_external_pattern(&pkg.type_match_prefix)
                    .with_operation("link::new")
                    .set_source(e)
            })?;

            let template = translate_go_template(&pkg.docs_url_template)
                .map_err(|e| e.with_operation("link::new"))?;
            env.template_from_str(&template).map_err(|e| {
                Error::template_error("docs URL template failed to parse")
                    .with_operation("link::new")
                    .with_context("template", pkg.docs_url_template.clone())
                    .set_source(e)
            })?;
            rules.push(LinkRule { pattern, template });
        }
        Ok(Self { rules, env })
    }

    /// URL from the first rule matching `decl`, or `None` when nothing matches.
    pub fn external_url(&self, decl: &TypeDecl) -> Result<Option<String>> {
        let identifier = decl.name.to_string();
        let Some(rule) = self.rules.iter().find(|r| r.pattern.is_match(&identifier)) else {
            return Ok(None);
        };

        let segments: Vec<&str> = decl.name.package.split('/').collect();
        let url = self
            .env
            .render_str(
                &rule.template,
                context! {
                    TypeIdentifier => &decl.name.name,
                    PackagePath => &decl.name.package,
                    PackageSegments => segments,
                },
            )
            .map_err(|e| {
                Error::template_error("docs url template execution error")
                    .with_operation("link::external_url")
                    .with_context("type", identifier.clone())
                    .set_source(e)
            })?;
        Ok(Some(url))
    }
}
