//! Rich-text helpers
//!
//! Case properties are stored as small HTML fragments. The mind-map shows and
//! edits them as plain text, so it needs a lossy stripper for display and a
//! minimal escaping wrapper for writes.

use once_cell::sync::Lazy;
use regex::Regex;

/// Label shown for a node whose text is empty
pub const PLACEHOLDER: &str = "(empty)";

/// Markup the backend stores for an empty rich-text field
pub const EMPTY_BLOCK: &str = "<p></p>";

static STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid style regex"));
static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid line break regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
static NBSP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)&nbsp;").expect("valid nbsp regex"));

/// Reduce stored markup to the plain text shown on a node
///
/// Style blocks are dropped, `<br>` becomes a newline, all other tags are
/// removed, the escapes written by [`plain_to_markup`] are undone and the
/// result is trimmed.
#[must_use]
pub fn strip_markup(markup: &str) -> String {
    if markup.is_empty() {
        return String::new();
    }
    let text = STYLE_BLOCK.replace_all(markup, "");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, "");
    let text = NBSP.replace_all(&text, " ");
    unescape(&text).trim().to_string()
}

/// Escape the characters that are significant in markup
#[must_use]
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    // `&amp;` last so `&amp;lt;` decodes to `&lt;` and not `<`
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Wrap plain text into the single-block markup rich-text fields expect
///
/// Empty input (or the placeholder) produces [`EMPTY_BLOCK`]. Line breaks
/// are kept as `<br/>`.
#[must_use]
pub fn plain_to_markup(text: &str) -> String {
    let normalized = text.trim();
    if normalized.is_empty() || normalized == PLACEHOLDER {
        return EMPTY_BLOCK.to_string();
    }
    let escaped = escape_markup(normalized).replace("\r\n", "\n").replace('\n', "<br/>");
    format!("<p>{escaped}</p>")
}

/// Whether a label is empty once whitespace is ignored
#[inline]
#[must_use]
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_styles() {
        let markup = "<style>.x{color:red}</style><p>Hello <b>world</b></p>";
        assert_eq!(strip_markup(markup), "Hello world");
    }

    #[test]
    fn strips_nbsp_and_trims() {
        assert_eq!(strip_markup("<p>&nbsp;a&nbsp;b </p>"), "a b");
        assert_eq!(strip_markup(EMPTY_BLOCK), "");
        assert_eq!(strip_markup(""), "");
    }

    #[test]
    fn line_breaks_survive_stripping() {
        assert_eq!(strip_markup("<p>one<br/>two<BR>three</p>"), "one\ntwo\nthree");
    }

    #[test]
    fn escapes_all_significant_characters() {
        assert_eq!(
            escape_markup(r#"<script>&"'"#),
            "&lt;script&gt;&amp;&quot;&#039;"
        );
    }

    #[test]
    fn wraps_in_single_block() {
        let markup = plain_to_markup(r#"<script>&"'"#);
        assert_eq!(markup, "<p>&lt;script&gt;&amp;&quot;&#039;</p>");
        let inner = &markup["<p>".len()..markup.len() - "</p>".len()];
        assert!(!inner.contains('<'));
        assert!(!inner.contains('>'));
        assert!(inner.split('&').skip(1).all(|rest| {
            ["lt;", "gt;", "amp;", "quot;", "#039;"]
                .iter()
                .any(|entity| rest.starts_with(entity))
        }));
    }

    #[test]
    fn keeps_line_breaks() {
        assert_eq!(plain_to_markup("a\nb"), "<p>a<br/>b</p>");
    }

    #[test]
    fn empty_and_placeholder_become_empty_block() {
        assert_eq!(plain_to_markup("   "), EMPTY_BLOCK);
        assert_eq!(plain_to_markup(PLACEHOLDER), EMPTY_BLOCK);
    }

    #[test]
    fn strip_undoes_wrap() {
        for text in ["plain", "a & b", "x < y > z", "quote \" and ' apostrophe", "two\nlines"] {
            assert_eq!(strip_markup(&plain_to_markup(text)), text);
        }
    }
}
