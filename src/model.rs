//! Typed archive model built from raw feed JSON.
//!
//! The export format is loose: almost every key of a post may be missing, and
//! nested collections (`likes`, `comments`) are wrapped in `{"data": [...]}`
//! envelopes. This module maps each post object onto an [`Entry`] with explicit
//! `Option`s for everything optional, so later stages never probe for keys.
//!
//! ## Field rules
//!
//! | JSON key | Model field | When absent |
//! |---|---|---|
//! | `id` | `id` | error |
//! | `picture` | `picture` | `None` (a JSON `null` is also `None`) |
//! | `message` | `content` | `None` |
//! | `from` | `author` | `None` on entries, error on comments |
//! | `created_time` | `date` | error |
//! | `likes.data` | `likes` | empty |
//! | `comments.data` | `comments` | empty (entries only) |
//!
//! Errors name the record index and the dotted path of the offending field,
//! e.g. `record 4: missing required field 'comments.data[1].from'`.

use crate::config::ContentPolicy;
use crate::sanitize;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON array of posts at the top level, found {0}")]
    NotAnArray(&'static str),
    #[error("record {index}: expected a JSON object, found {found}")]
    NotAnObject { index: usize, found: &'static str },
    #[error("record {index}: missing required field '{field}'")]
    MissingField { index: usize, field: String },
    #[error("record {index}: field '{field}' should be {expected}, found {found}")]
    InvalidField {
        index: usize,
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("record {index}: cannot parse '{value}' in '{field}' as a timestamp")]
    DateParse {
        index: usize,
        field: String,
        value: String,
    },
}

/// A person referenced by a post, comment or like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: String,
    pub name: String,
}

/// A message body, stored according to the configured [`ContentPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "policy", content = "text", rename_all = "lowercase")]
pub enum Content {
    /// Verbatim text; escaped when rendered.
    Raw(String),
    /// Escaped and linkified HTML; rendered as is.
    Sanitized(String),
}

impl Content {
    pub fn from_message(message: &str, policy: ContentPolicy) -> Self {
        match policy {
            ContentPolicy::Raw => Content::Raw(message.to_string()),
            ContentPolicy::Sanitized => Content::Sanitized(sanitize::linkify(message)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Content::Raw(text) | Content::Sanitized(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub content: Option<Content>,
    pub picture: Option<String>,
    pub author: Author,
    pub date: DateTime<FixedOffset>,
    pub likes: Vec<Author>,
}

/// One archived post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub id: String,
    /// Remote URL after building; local `pictures/<hash>` path (or `None`)
    /// after media resolution.
    pub picture: Option<String>,
    pub content: Option<Content>,
    pub author: Option<Author>,
    pub date: DateTime<FixedOffset>,
    pub likes: Vec<Author>,
    pub comments: Vec<Comment>,
    /// Local filenames inside `pictures/`, filled by the attachments strategy.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pictures: Vec<String>,
}

impl Entry {
    /// Build an entry from the post object at position `index` of the feed.
    pub fn from_value(value: &Value, index: usize, policy: ContentPolicy) -> Result<Self, ModelError> {
        let fields = value.as_object().ok_or(ModelError::NotAnObject {
            index,
            found: json_kind(value),
        })?;
        let record = Record::root(fields, index);

        let comments = record
            .envelope("comments")?
            .iter()
            .map(|comment| Comment::from_record(comment, policy))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Entry {
            id: record.required_str("id")?,
            picture: record.optional_str("picture")?,
            content: record.content(policy)?,
            author: record
                .optional_object("from")?
                .map(|from| Author::from_record(&from))
                .transpose()?,
            date: record.date("created_time")?,
            likes: record.likes()?,
            comments,
            pictures: Vec::new(),
        })
    }
}

impl Comment {
    fn from_record(record: &Record<'_>, policy: ContentPolicy) -> Result<Self, ModelError> {
        Ok(Comment {
            id: record.optional_str("id")?,
            content: record.content(policy)?,
            picture: record.optional_str("picture")?,
            author: Author::from_record(&record.required_object("from")?)?,
            date: record.date("created_time")?,
            likes: record.likes()?,
        })
    }
}

impl Author {
    fn from_record(record: &Record<'_>) -> Result<Self, ModelError> {
        Ok(Author {
            id: record.required_str("id")?,
            name: record.required_str("name")?,
        })
    }
}

/// Build every entry of a feed, in input order.
pub fn build_entries(feed: &Value, policy: ContentPolicy) -> Result<Vec<Entry>, ModelError> {
    let items = feed
        .as_array()
        .ok_or_else(|| ModelError::NotAnArray(json_kind(feed)))?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| Entry::from_value(item, index, policy))
        .collect()
}

/// Order entries by date, oldest first. Entries with equal timestamps keep
/// their input order.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by_key(|entry| entry.date);
}

/// Parse a feed document, build its entries and sort them.
pub fn parse_entries(json: &str, policy: ContentPolicy) -> Result<Vec<Entry>, ModelError> {
    let feed: Value = serde_json::from_str(json)?;
    let mut entries = build_entries(&feed, policy)?;
    sort_entries(&mut entries);
    Ok(entries)
}

/// Parse the timestamp shapes found in feed exports.
///
/// Accepts `2018-03-01T12:34:56+0000`, RFC 3339 (`...Z`, `...+01:00`, with or
/// without fractional seconds), naive date-times (taken as UTC) and bare dates
/// (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(date) = DateTime::parse_from_str(s, format) {
            return Some(date);
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Field access with path-aware errors
// ============================================================================

/// A JSON object plus where it sits in the feed, for error messages.
struct Record<'a> {
    fields: &'a Map<String, Value>,
    index: usize,
    path: String,
}

impl<'a> Record<'a> {
    fn root(fields: &'a Map<String, Value>, index: usize) -> Self {
        Self {
            fields,
            index,
            path: String::new(),
        }
    }

    fn child(&self, fields: &'a Map<String, Value>, path: String) -> Self {
        Self {
            fields,
            index: self.index,
            path,
        }
    }

    fn field_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    /// Present and not `null`.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.get(key).filter(|value| !value.is_null())
    }

    fn missing(&self, key: &str) -> ModelError {
        ModelError::MissingField {
            index: self.index,
            field: self.field_path(key),
        }
    }

    fn invalid(&self, field: String, expected: &'static str, value: &Value) -> ModelError {
        ModelError::InvalidField {
            index: self.index,
            field,
            expected,
            found: json_kind(value),
        }
    }

    /// Ids show up as numbers in some exports; they are kept as strings.
    fn required_str(&self, key: &str) -> Result<String, ModelError> {
        self.optional_str(key)?.ok_or_else(|| self.missing(key))
    }

    fn optional_str(&self, key: &str) -> Result<Option<String>, ModelError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(self.invalid(self.field_path(key), "a string", other)),
        }
    }

    fn optional_object(&self, key: &str) -> Result<Option<Record<'a>>, ModelError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Object(fields)) => Ok(Some(self.child(fields, self.field_path(key)))),
            Some(other) => Err(self.invalid(self.field_path(key), "an object", other)),
        }
    }

    fn required_object(&self, key: &str) -> Result<Record<'a>, ModelError> {
        self.optional_object(key)?.ok_or_else(|| self.missing(key))
    }

    /// Objects inside a `{"data": [...]}` envelope. Absent envelope or absent
    /// `data` yields an empty list.
    fn envelope(&self, key: &str) -> Result<Vec<Record<'a>>, ModelError> {
        let Some(wrapper) = self.optional_object(key)? else {
            return Ok(Vec::new());
        };
        let data_path = wrapper.field_path("data");
        let items = match wrapper.get("data") {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(other) => return Err(self.invalid(data_path, "an array", other)),
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let path = format!("{data_path}[{i}]");
                match item {
                    Value::Object(fields) => Ok(self.child(fields, path)),
                    other => Err(self.invalid(path, "an object", other)),
                }
            })
            .collect()
    }

    fn likes(&self) -> Result<Vec<Author>, ModelError> {
        self.envelope("likes")?
            .iter()
            .map(Author::from_record)
            .collect()
    }

    fn content(&self, policy: ContentPolicy) -> Result<Option<Content>, ModelError> {
        Ok(self
            .optional_str("message")?
            .map(|message| Content::from_message(&message, policy)))
    }

    fn date(&self, key: &str) -> Result<DateTime<FixedOffset>, ModelError> {
        let raw = match self.get(key) {
            None => return Err(self.missing(key)),
            Some(Value::String(s)) => s,
            Some(other) => return Err(self.invalid(self.field_path(key), "a string", other)),
        };
        parse_timestamp(raw).ok_or_else(|| ModelError::DateParse {
            index: self.index,
            field: self.field_path(key),
            value: raw.clone(),
        })
    }
}
