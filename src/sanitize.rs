//! Message body sanitizing.
//!
//! [`linkify`] produces an HTML fragment from free text: every character that
//! means something in HTML is escaped, and bare `http://`, `https://` and
//! `www.` URLs become `<a rel="nofollow">` links. The result is safe to embed
//! in the page verbatim.

use maud::html;
use regex::Regex;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"']+"#).expect("URL pattern must compile")
});

/// A run of message text, either plain or a detected link.
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Link { href: String, text: &'a str },
}

/// Escape `text` and wrap detected URLs in anchors.
pub fn linkify(text: &str) -> String {
    let segments = split_links(text);
    html! {
        @for segment in &segments {
            @match segment {
                Segment::Text(plain) => { (plain) }
                Segment::Link { href, text } => {
                    a href=(href) rel="nofollow" { (text) }
                }
            }
        }
    }
    .into_string()
}

fn split_links(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for found in URL_PATTERN.find_iter(text) {
        let start = found.start();
        let url = trim_trailing_punctuation(found.as_str());
        if is_bare_prefix(url) {
            continue;
        }
        let end = start + url.len();

        if start > last {
            segments.push(Segment::Text(&text[last..start]));
        }
        segments.push(Segment::Link {
            href: href_for(url),
            text: &text[start..end],
        });
        last = end;
    }

    if last < text.len() {
        segments.push(Segment::Text(&text[last..]));
    }
    segments
}

/// Drop sentence punctuation that the pattern swallowed at the end of a URL.
///
/// A closing parenthesis is kept when the URL itself opened one, so
/// `https://en.wikipedia.org/wiki/Rust_(language)` survives intact.
fn trim_trailing_punctuation(url: &str) -> &str {
    let mut trimmed = url;
    while let Some(last) = trimmed.chars().last() {
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' => true,
            ')' => trimmed.matches('(').count() < trimmed.matches(')').count(),
            _ => false,
        };
        if !strip {
            break;
        }
        trimmed = &trimmed[..trimmed.len() - last.len_utf8()];
    }
    trimmed
}

fn is_bare_prefix(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    matches!(lower.as_str(), "http://" | "https://" | "www.")
}

fn href_for(url: &str) -> String {
    let is_www = url
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("www."));
    if is_www {
        format!("http://{url}")
    } else {
        url.to_string()
    }
}
