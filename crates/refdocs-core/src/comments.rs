use pulldown_cmark::{Options, Parser, html};

use crate::tags::filter_comment_tags;

/// Doc comment lines as document text: marker lines dropped, the rest joined
/// with newlines and, when `markdown` is set, rendered to HTML.
pub fn render_comments(lines: &[String], markdown: bool) -> String {
    let doc = filter_comment_tags(lines).join("\n");
    if !markdown {
        return doc;
    }

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut out = String::with_capacity(doc.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(&doc, options));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plain_comments_drop_markers() {
        let input = lines(&[
            "Widget is a thing.",
            "+genclient",
            "  +k8s:deepcopy-gen=true",
            "It has `parts`.",
        ]);
        assert_eq!(
            render_comments(&input, false),
            "Widget is a thing.\nIt has `parts`."
        );
    }

    #[test]
    fn test_markdown_comments() {
        let input = lines(&["Widget is a *thing*.", "", "+optional", "- one", "- two"]);
        let html = render_comments(&input, true);
        assert!(html.contains("<p>Widget is a <em>thing</em>.</p>"), "{html}");
        assert!(html.contains("<li>one</li>"), "{html}");
        assert!(!html.contains("optional"), "{html}");
    }

    #[test]
    fn test_empty_comments() {
        assert_eq!(render_comments(&[], true), "");
        assert_eq!(render_comments(&[], false), "");
    }
}
