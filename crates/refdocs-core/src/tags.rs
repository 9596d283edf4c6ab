//! Marker comments (`+key=value`) and struct tags (`json:"name,omitempty"`).

use indexmap::IndexMap;

/// Collect `marker`-prefixed comment lines into `key -> values`.
///
/// `+groupName=widgets.example.io` yields `groupName -> ["widgets.example.io"]`;
/// a bare `+optional` yields `optional -> [""]`.
pub fn extract_comment_tags(marker: &str, lines: &[String]) -> IndexMap<String, Vec<String>> {
    let mut out: IndexMap<String, Vec<String>> = IndexMap::new();
    for line in lines {
        let line = line.trim_matches(' ');
        let Some(rest) = line.strip_prefix(marker) else {
            continue;
        };
        let (key, value) = rest.split_once('=').unwrap_or((rest, ""));
        out.entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }
    out
}

/// Drop marker lines, keeping the prose.
pub fn filter_comment_tags(lines: &[String]) -> Vec<&str> {
    lines
        .iter()
        .filter(|line| !line.trim().starts_with('+'))
        .map(String::as_str)
        .collect()
}

/// Look up `key` in a struct tag such as `json:"spec,omitempty" protobuf:"bytes,2"`.
///
/// Returns `None` when the key is absent or the tag is malformed past that point.
pub fn struct_tag_lookup(tag: &str, key: &str) -> Option<String> {
    let mut rest = tag;
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return None;
        }

        let name_end = rest
            .find(|c: char| c <= ' ' || c == ':' || c == '"' || c == '\x7f')
            .unwrap_or(rest.len());
        if name_end == 0 || !rest[name_end..].starts_with(":\"") {
            return None;
        }
        let name = &rest[..name_end];
        rest = &rest[name_end + 2..];

        let mut value = String::new();
        let mut chars = rest.char_indices();
        let mut closed = None;
        while let Some((idx, ch)) = chars.next() {
            match ch {
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, escaped)) => value.push(escaped),
                    None => return None,
                },
                '"' => {
                    closed = Some(idx);
                    break;
                }
                other => value.push(other),
            }
        }
        let end = closed?;
        if name == key {
            return Some(value);
        }
        rest = &rest[end + 1..];
    }
}
