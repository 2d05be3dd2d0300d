//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Each entry is shown by its position, date and author with a short excerpt
//! of its message, followed by an indented detail line counting what was
//! archived with it. Filesystem paths only appear in the closing summary.
//!
//! # Output Format
//!
//! ```text
//! Entries
//! 001 2018-03-01 12:34 Ada Lovelace: Meeting moved to Thursday, see...
//!     1 picture, 2 comments, 3 likes
//! 002 2018-03-02 08:00 (unknown author)
//!     no content
//!
//! Pictures: 1 cached, 2 downloaded (3 total)
//! Assets: 4 files
//! Archive → output/index.html
//! Manifest → output/entries.json
//! ```
//!
//! # Architecture
//!
//! `format_*` functions return `Vec<String>` for testability and `print_*`
//! wrappers write to stdout. Format functions are pure: no I/O, no side
//! effects.

use crate::archive::ArchiveReport;
use crate::model::{Content, Entry};

/// Maximum characters of a message shown in the entry header.
const EXCERPT_LEN: usize = 48;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Strip HTML tags from a string (simple angle-bracket stripping).
///
/// Sanitized content is escaped HTML; the common entities are decoded back so
/// the excerpt reads as plain text.
fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Message text as it reads on the page: sanitized bodies lose their markup,
/// raw bodies are already plain.
fn plain_text(content: &Content) -> String {
    match content {
        Content::Raw(text) => text.clone(),
        Content::Sanitized(html) => strip_html_tags(html),
    }
}

/// Collapse whitespace and truncate to `max` characters, appending `...` if
/// truncated.
fn excerpt(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{}...", cut.trim_end())
    }
}

fn count(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("1 {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Header line for one entry.
///
/// ```text
/// 001 2018-03-01 12:34 Ada Lovelace: Meeting moved to Thursday
/// 002 2018-03-02 08:00 (unknown author)
/// ```
fn entry_header(index: usize, entry: &Entry) -> String {
    let author = entry
        .author
        .as_ref()
        .map(|a| a.name.as_str())
        .unwrap_or("(unknown author)");
    let date = entry.date.format("%Y-%m-%d %H:%M");
    let text = entry
        .content
        .as_ref()
        .map(|content| excerpt(&plain_text(content), EXCERPT_LEN))
        .filter(|text| !text.is_empty());
    match text {
        Some(text) => format!("{} {} {}: {}", format_index(index), date, author, text),
        None => format!("{} {} {}", format_index(index), date, author),
    }
}

/// Detail line counting what was archived with an entry.
fn entry_details(entry: &Entry) -> String {
    let pictures = entry.pictures.len() + usize::from(entry.picture.is_some());
    let mut parts = Vec::new();
    if pictures > 0 {
        parts.push(count(pictures, "picture", "pictures"));
    }
    if !entry.comments.is_empty() {
        parts.push(count(entry.comments.len(), "comment", "comments"));
    }
    if !entry.likes.is_empty() {
        parts.push(count(entry.likes.len(), "like", "likes"));
    }
    if parts.is_empty() && entry.content.is_none() {
        return "no content".to_string();
    }
    if parts.is_empty() {
        return "text only".to_string();
    }
    parts.join(", ")
}

// ============================================================================
// Archive
// ============================================================================

pub fn format_archive_output(report: &ArchiveReport) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.entries.is_empty() {
        lines.push("Entries".to_string());
        for (idx, entry) in report.entries.iter().enumerate() {
            lines.push(entry_header(idx + 1, entry));
            lines.push(format!("{}{}", indent(1), entry_details(entry)));
        }
        lines.push(String::new());
    }

    lines.push(format!("Pictures: {}", report.downloads));
    lines.push(format!(
        "Assets: {}",
        count(report.assets.files as usize, "file", "files")
    ));
    lines.push(format!(
        "Archive \u{2192} {}",
        report.index_path.display()
    ));
    if let Some(manifest) = &report.manifest_path {
        lines.push(format!("Manifest \u{2192} {}", manifest.display()));
    }
    lines
}

/// Print archive output to stdout.
pub fn print_archive_output(report: &ArchiveReport) {
    for line in format_archive_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::CopyStats;
    use crate::media::DownloadStats;
    use crate::test_helpers::{author, entry, with_comment_picture};
    use std::path::PathBuf;

    fn report(entries: Vec<Entry>) -> ArchiveReport {
        ArchiveReport {
            entries,
            downloads: DownloadStats::default(),
            assets: CopyStats {
                files: 3,
                directories: 2,
            },
            index_path: PathBuf::from("output/index.html"),
            manifest_path: None,
        }
    }

    #[test]
    fn strip_html_tags_removes_tags_and_decodes() {
        assert_eq!(
            strip_html_tags(r#"see <a href="x">x</a> &amp; &lt;b&gt;"#),
            "see x & <b>"
        );
    }

    #[test]
    fn strip_html_tags_no_tags() {
        assert_eq!(strip_html_tags("plain text"), "plain text");
    }

    #[test]
    fn excerpt_short_text_unchanged() {
        assert_eq!(excerpt("hello", 10), "hello");
    }

    #[test]
    fn excerpt_collapses_whitespace() {
        assert_eq!(excerpt("a\n\n  b\tc", 10), "a b c");
    }

    #[test]
    fn excerpt_truncates_on_char_boundary() {
        assert_eq!(excerpt("héllo wörld", 7), "héllo w...");
        assert_eq!(excerpt("日本語のテキスト", 3), "日本語...");
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn entry_header_with_author_and_content() {
        let mut e = entry("1", None);
        e.author = Some(author("9", "Ada Lovelace"));
        e.content = Some(Content::Sanitized(
            r#"Moved, see <a href="http://x.example" rel="nofollow">http://x.example</a>"#.into(),
        ));
        assert_eq!(
            entry_header(1, &e),
            "001 2018-03-01 12:00 Ada Lovelace: Moved, see http://x.example"
        );
    }

    #[test]
    fn entry_header_keeps_raw_text_verbatim() {
        let mut e = entry("1", None);
        e.content = Some(Content::Raw("Welcome <3 see you &amp; bye".into()));
        assert_eq!(
            entry_header(1, &e),
            "001 2018-03-01 12:00 (unknown author): Welcome <3 see you &amp; bye"
        );
    }

    #[test]
    fn entry_header_without_author_or_content() {
        assert_eq!(
            entry_header(2, &entry("1", None)),
            "002 2018-03-01 12:00 (unknown author)"
        );
    }

    #[test]
    fn entry_details_counts() {
        let mut e = with_comment_picture(entry("1", Some("pictures/a")), "pictures/b");
        e.pictures = vec!["c".into()];
        e.likes = vec![author("2", "B")];
        assert_eq!(entry_details(&e), "2 pictures, 1 comment, 1 like");
    }

    #[test]
    fn entry_details_empty() {
        assert_eq!(entry_details(&entry("1", None)), "no content");
        let mut e = entry("1", None);
        e.content = Some(Content::Raw("hi".into()));
        assert_eq!(entry_details(&e), "text only");
    }

    #[test]
    fn format_archive_output_lists_entries_and_summary() {
        let lines = format_archive_output(&report(vec![entry("1", None), entry("2", None)]));
        assert_eq!(lines[0], "Entries");
        assert!(lines[1].starts_with("001 "));
        assert_eq!(lines[2], "    no content");
        assert!(lines[3].starts_with("002 "));
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "Pictures: no pictures");
        assert_eq!(lines[7], "Assets: 3 files");
        assert_eq!(lines[8], "Archive \u{2192} output/index.html");
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn format_archive_output_mentions_manifest() {
        let mut r = report(Vec::new());
        r.manifest_path = Some(PathBuf::from("output/entries.json"));
        let lines = format_archive_output(&r);
        assert_eq!(lines[0], "Pictures: no pictures");
        assert_eq!(
            lines.last().unwrap(),
            "Manifest \u{2192} output/entries.json"
        );
    }
}
