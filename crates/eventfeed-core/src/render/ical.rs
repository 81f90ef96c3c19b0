//! iCalendar (RFC 5545) serialization.

use chrono::{DateTime, Utc};

use super::item::{FeedItem, ItemTime};
use super::FeedDocument;

pub const CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

const PRODID: &str = concat!("-//eventfeed//eventfeed ", env!("CARGO_PKG_VERSION"), "//EN");
const MAX_LINE_OCTETS: usize = 75;

/// Escape a TEXT property value.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Fold a content line at 75 octets without splitting UTF-8 sequences.
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut width = 0;
    // Continuation lines start with a space, which counts toward the limit.
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(c);
        width += len;
    }
    out
}

fn utc_stamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

fn time_property(name: &str, time: &ItemTime) -> String {
    match time {
        ItemTime::Date(d) => format!("{name};VALUE=DATE:{}", d.format("%Y%m%d")),
        ItemTime::DateTime(dt) => format!("{name}:{}", utc_stamp(dt)),
    }
}

struct Lines(Vec<String>);

impl Lines {
    fn push(&mut self, line: String) {
        self.0.push(fold_line(&line));
    }

    fn text(&mut self, name: &str, value: &str) {
        self.push(format!("{name}:{}", escape_text(value)));
    }

    fn finish(self) -> String {
        let mut body = self.0.join("\r\n");
        body.push_str("\r\n");
        body
    }
}

fn push_event(lines: &mut Lines, doc: &FeedDocument, item: &FeedItem) {
    lines.push("BEGIN:VEVENT".to_string());
    lines.push(format!("UID:event-{}@{}", item.event_id, doc.agent_id));
    lines.push(format!("DTSTAMP:{}", utc_stamp(&item.created_at)));
    lines.push(time_property("DTSTART", &item.starts_at));
    if let Some(end) = &item.ends_at {
        lines.push(time_property("DTEND", end));
    }
    lines.text("SUMMARY", &item.summary);
    if !item.description.is_empty() {
        lines.text("DESCRIPTION", &item.description);
    }
    if let Some(location) = &item.location {
        lines.text("LOCATION", location);
    }
    if let Some(url) = &item.url {
        lines.push(format!("URL:{url}"));
    }
    lines.push("END:VEVENT".to_string());
}

/// Render the document as a VCALENDAR, events in window order.
pub fn render(doc: &FeedDocument) -> String {
    let mut lines = Lines(Vec::new());
    lines.push("BEGIN:VCALENDAR".to_string());
    lines.push("VERSION:2.0".to_string());
    lines.push(format!("PRODID:{PRODID}"));
    lines.push("CALSCALE:GREGORIAN".to_string());
    lines.push("METHOD:PUBLISH".to_string());
    lines.text("X-WR-CALNAME", &doc.title);
    if !doc.description.is_empty() {
        lines.text("X-WR-CALDESC", &doc.description);
    }
    lines.push(format!("X-PUBLISHED-TTL:PT{}M", doc.ttl));
    for item in &doc.items {
        push_event(&mut lines, doc, item);
    }
    lines.push("END:VCALENDAR".to_string());
    lines.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a,b;c\\d"), "a\\,b\\;c\\\\d");
        assert_eq!(escape_text("one\r\ntwo\nthree"), "one\\ntwo\\nthree");
    }

    #[test]
    fn test_short_line_untouched() {
        assert_eq!(fold_line("SUMMARY:short"), "SUMMARY:short");
    }

    #[test]
    fn test_fold_ascii() {
        let line = format!("DESCRIPTION:{}", "x".repeat(100));
        let folded = fold_line(&line);
        let parts: Vec<&str> = folded.split("\r\n").collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 75);
        assert!(parts[1].starts_with(' '));
        assert_eq!(parts.concat().replacen(' ', "", 1), line);
    }

    #[test]
    fn test_fold_keeps_utf8_intact() {
        let line = format!("SUMMARY:{}", "é".repeat(60));
        let folded = fold_line(&line);
        for part in folded.split("\r\n") {
            assert!(part.len() <= 75);
        }
        let unfolded = folded.replace("\r\n ", "");
        assert_eq!(unfolded, line);
    }
}
