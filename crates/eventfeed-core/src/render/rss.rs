//! RSS 2.0 serialization.

use std::fmt::Write;

use super::FeedDocument;

pub const CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

/// Escape text for XML element content and attribute values.
///
/// Control characters outside XML 1.0's `Char` production are dropped.
pub fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => {}
            other => out.push(other),
        }
    }
    out
}

fn element(out: &mut String, indent: &str, name: &str, value: &str) {
    let _ = writeln!(out, "{indent}<{name}>{}</{name}>", escape_xml(value));
}

/// Render the document as an RSS channel, newest item first.
pub fn render(doc: &FeedDocument) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n");
    out.push_str("  <channel>\n");
    element(&mut out, "    ", "title", &doc.title);
    element(&mut out, "    ", "description", &doc.description);
    element(&mut out, "    ", "link", &doc.link);
    if let Some(icon) = &doc.icon {
        out.push_str("    <image>\n");
        element(&mut out, "      ", "url", icon);
        element(&mut out, "      ", "title", &doc.title);
        element(&mut out, "      ", "link", &doc.link);
        out.push_str("    </image>\n");
    }
    if let Some(published) = doc.published_at() {
        let stamp = published.to_rfc2822();
        element(&mut out, "    ", "lastBuildDate", &stamp);
        element(&mut out, "    ", "pubDate", &stamp);
    }
    element(&mut out, "    ", "ttl", &doc.ttl.to_string());

    for item in doc.items.iter().rev() {
        out.push_str("    <item>\n");
        element(&mut out, "      ", "title", &item.summary);
        element(&mut out, "      ", "description", &item.description);
        if let Some(url) = &item.url {
            element(&mut out, "      ", "link", url);
        }
        let _ = writeln!(
            out,
            "      <guid isPermaLink=\"false\">{}</guid>",
            item.event_id
        );
        element(&mut out, "      ", "pubDate", &item.created_at.to_rfc2822());
        out.push_str("    </item>\n");
    }

    out.push_str("  </channel>\n");
    out.push_str("</rss>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &apos;Jerry&apos;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_xml_drops_forbidden_control_chars() {
        assert_eq!(
            escape_xml("bell\u{7}\u{0}vt\u{b}ff\u{c}esc\u{1b}\u{fffe}"),
            "bellvtffesc"
        );
        assert_eq!(escape_xml("tab\tline\nret\r"), "tab\tline\nret\r");
    }
}
