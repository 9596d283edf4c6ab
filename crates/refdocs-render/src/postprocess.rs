use std::sync::LazyLock;

use regex::Regex;

static LEADING_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s+").expect("leading whitespace pattern is valid"));
static TRAILING_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)[ \t\r]+$").expect("trailing whitespace pattern is valid"));

/// Drop line indentation, the blank lines it swallows, and trailing blanks.
///
/// Markdown renderers treat indented HTML as code blocks, hence the stripping.
pub fn strip_whitespace(doc: &str) -> String {
    let doc = LEADING_WS.replace_all(doc, "");
    TRAILING_WS.replace_all(&doc, "").into_owned()
}
