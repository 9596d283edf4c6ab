//! Identifiers, display names and anchors.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::warn;

use refdocs_error::{Error, Result};

use crate::decl::{TypeId, TypeKind, Universe};
use crate::group::ApiPackage;
use crate::index::TypePackageIndex;

/// Group reported for a type no API package owns.
pub const UNKNOWN_API_GROUP: &str = "<UNKNOWN_API_GROUP>";

static SAFE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[[:punct:][:space:]]+").expect("anchor pattern is valid"));

/// Collapse punctuation and whitespace runs to `-` and lower-case the result.
///
/// ```
/// use refdocs_core::naming::safe_identifier;
/// assert_eq!(safe_identifier("apps/v1.Deployment Spec!"), "apps-v1-deployment-spec");
/// ```
pub fn safe_identifier(id: &str) -> String {
    SAFE_ID_REGEX
        .replace_all(id, "-")
        .trim_matches('-')
        .to_lowercase()
}

/// Anchor of an API package: its identifier without spaces.
pub fn package_anchor_id(pkg: &ApiPackage) -> String {
    pkg.identifier().replace(' ', "")
}

/// Runes Go's `strconv.Quote` escapes: controls, separators other than the
/// ASCII space, format characters and private use.
fn is_unprintable(c: char) -> bool {
    if c == ' ' {
        return false;
    }
    c.is_control()
        || c.is_whitespace()
        || matches!(
            c,
            '\u{ad}'
                | '\u{600}'..='\u{605}'
                | '\u{61c}'
                | '\u{6dd}'
                | '\u{70f}'
                | '\u{180e}'
                | '\u{200b}'..='\u{200f}'
                | '\u{202a}'..='\u{202e}'
                | '\u{2060}'..='\u{2064}'
                | '\u{2066}'..='\u{206f}'
                | '\u{feff}'
                | '\u{fff9}'..='\u{fffb}'
                | '\u{e000}'..='\u{f8ff}'
                | '\u{f0000}'..
        )
}

/// Go-style quoting used for string constants.
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0b}' => out.push_str("\\v"),
            c if c < ' ' || c == '\u{7f}' => out.push_str(&format!("\\x{:02x}", c as u32)),
            c if is_unprintable(c) && (c as u32) < 0x10000 => {
                out.push_str(&format!("\\u{:04x}", c as u32))
            }
            c if is_unprintable(c) => out.push_str(&format!("\\U{:08x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Read-only view answering identity and naming questions.
#[derive(Debug, Clone, Copy)]
pub struct Naming<'a> {
    pub universe: &'a Universe,
    pub packages: &'a [ApiPackage],
    pub index: &'a TypePackageIndex,
}

impl<'a> Naming<'a> {
    pub fn new(
        universe: &'a Universe,
        packages: &'a [ApiPackage],
        index: &'a TypePackageIndex,
    ) -> Self {
        Self {
            universe,
            packages,
            index,
        }
    }

    /// `{packagePath}.{name}` of the dereferenced type.
    pub fn type_identifier(&self, id: TypeId) -> String {
        let base = self.universe.dereference(id);
        self.universe.get(base).name.to_string()
    }

    /// Documented in this run, once wrappers are stripped.
    pub fn is_local_type(&self, id: TypeId) -> bool {
        self.index.contains(self.universe.dereference(id))
    }

    pub fn owning_package(&self, id: TypeId) -> Option<&'a ApiPackage> {
        let base = self.universe.dereference(id);
        self.index.owner(base).and_then(|idx| self.packages.get(idx))
    }

    /// `group/version` of the package documenting `id`.
    pub fn api_group_for_type(&self, id: TypeId) -> String {
        match self.owning_package(id) {
            Some(pkg) => pkg.identifier(),
            None => {
                warn!(
                    "cannot read apiVersion for {} from type=>pkg map",
                    self.type_identifier(id)
                );
                UNKNOWN_API_GROUP.to_string()
            }
        }
    }

    pub fn anchor_id(&self, id: TypeId) -> String {
        let base = self.universe.dereference(id);
        safe_identifier(&format!(
            "{}.{}",
            self.api_group_for_type(base),
            self.universe.get(base).name.name
        ))
    }

    /// Human-facing name of `id`.
    ///
    /// Map types keep their raw spelling and skip `overrides`; every other
    /// kind has each matching prefix rewritten in order.
    pub fn display_name(&self, id: TypeId, overrides: &IndexMap<String, String>) -> Result<String> {
        let decl = self.universe.get(id);
        let base = self.universe.dereference(id);

        let mut name = if self.index.contains(base) {
            self.universe.get(base).name.name.clone()
        } else {
            self.universe.get(base).name.to_string()
        };

        match decl.kind {
            TypeKind::Pointer => name = name.trim_start_matches('*').to_string(),
            TypeKind::Struct
            | TypeKind::Interface
            | TypeKind::Alias
            | TypeKind::Slice
            | TypeKind::Builtin => {}
            TypeKind::Unsupported => return Ok(String::new()),
            TypeKind::Map => return Ok(decl.name.name.clone()),
            TypeKind::DeclarationOf => {
                let value = decl.const_value.as_deref().ok_or_else(|| {
                    Error::unresolved_kind(
                        decl.name.to_string(),
                        format!("type {} is a non-const declaration, which is unhandled", decl.name),
                    )
                    .with_operation("naming::display_name")
                })?;
                let underlying = self.universe.get(self.universe.final_underlying(id));
                if underlying.kind == TypeKind::Builtin && underlying.name.name == "string" {
                    return Ok(quote(value));
                }
                return Ok(value.to_string());
            }
        }

        for (prefix, replacement) in overrides {
            if name.starts_with(prefix.as_str()) {
                name = name.replacen(prefix.as_str(), replacement, 1);
            }
        }

        if decl.kind == TypeKind::Slice {
            let brackets = decl.name.name.find(']').map_or("[]", |end| &decl.name.name[..=end]);
            name.insert_str(0, brackets);
        }
        Ok(name)
    }
}
