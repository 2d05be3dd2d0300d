//! Shared test utilities for the group-archive test suite.
//!
//! Provides raw feed JSON builders for model tests, ready-made [`Entry`]
//! values for the stages after it, and a minimal on-disk theme.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let feed = json!([post("a", "2018-03-01T12:00:00+0000")]);
//! let entries = build_entries(&feed, ContentPolicy::Raw).unwrap();
//! assert_eq!(ids(&entries), ["a"]);
//!
//! let mut e = with_comment_picture(entry("1", Some(URL)), URL);
//! e.author = Some(author("7", "Ada"));
//! ```

use chrono::{FixedOffset, TimeZone};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;

use crate::model::{Author, Comment, Entry};

// =========================================================================
// Raw feed JSON
// =========================================================================

/// The smallest valid post object: an id and a timestamp.
pub fn post(id: &str, created_time: &str) -> Value {
    json!({"id": id, "created_time": created_time})
}

/// Entry ids in order.
pub fn ids(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.id.as_str()).collect()
}

// =========================================================================
// Model values
// =========================================================================

pub fn author(id: &str, name: &str) -> Author {
    Author {
        id: id.to_string(),
        name: name.to_string(),
    }
}

/// An entry dated 2018-03-01 12:00 UTC with nothing but an id and an
/// optional picture reference.
pub fn entry(id: &str, picture: Option<&str>) -> Entry {
    Entry {
        id: id.to_string(),
        picture: picture.map(str::to_string),
        content: None,
        author: None,
        date: FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2018, 3, 1, 12, 0, 0)
            .unwrap(),
        likes: Vec::new(),
        comments: Vec::new(),
        pictures: Vec::new(),
    }
}

/// Append a comment carrying `picture` to `entry`.
pub fn with_comment_picture(mut entry: Entry, picture: &str) -> Entry {
    entry.comments.push(Comment {
        id: None,
        content: None,
        picture: Some(picture.to_string()),
        author: author("99", "Commenter"),
        date: entry.date,
        likes: Vec::new(),
    });
    entry
}

// =========================================================================
// Theme
// =========================================================================

/// Write a minimal theme (`fonts/fonts.css`, `assets/style.css`) into `dir`.
pub fn write_theme(dir: &Path) {
    fs::create_dir_all(dir.join("fonts")).unwrap();
    fs::create_dir_all(dir.join("assets")).unwrap();
    fs::write(dir.join("fonts/fonts.css"), "@font-face { font-family: Test; }").unwrap();
    fs::write(dir.join("assets/style.css"), "body { margin: 0; }").unwrap();
}
