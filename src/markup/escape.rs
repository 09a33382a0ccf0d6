//! Character escaping for element text, attributes and CDATA.

use std::borrow::Cow;

/// Escape element text. `\r` is kept as a character reference because
/// parsers normalize a literal one to `\n`.
pub(crate) fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
}

/// Escape a double-quoted attribute value. Whitespace other than a plain
/// space is written as a character reference so attribute normalization
/// keeps it.
pub(crate) fn escape_attr(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            '\t' => out.push_str("&#x9;"),
            c => out.push(c),
        }
    }
}

/// Escape CDATA content by splitting any `]]>`.
pub(crate) fn escape_cdata(text: &str) -> Cow<'_, str> {
    if text.contains("]]>") {
        Cow::Owned(text.replace("]]>", "]]]]><![CDATA[>"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Prefix a literal attribute value starting with `{` so it is not read as
/// a markup extension.
pub(crate) fn escape_braces(text: &str) -> Cow<'_, str> {
    if text.starts_with('{') {
        Cow::Owned(format!("{{}}{text}"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Whether element text survives trimming unchanged.
pub(crate) fn is_whitespace_safe(text: &str) -> bool {
    !text.starts_with(char::is_whitespace) && !text.ends_with(char::is_whitespace)
}
