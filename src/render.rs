//! HTML page rendering.
//!
//! The archive is a single page, `index.html`, listing every entry oldest
//! first with its pictures, likes and comments.
//!
//! ## Output Structure
//!
//! ```text
//! output/
//! ├── index.html         # This module
//! ├── entries.json       # Optional manifest (archive module)
//! ├── pictures/          # Downloaded pictures (media module)
//! ├── fonts/             # Theme fonts (assets module)
//! └── assets/            # Theme stylesheets and images (assets module)
//! ```
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Every interpolated string is escaped except [`Content::Sanitized`] bodies,
//! which already are.

use crate::config::{self, ArchiveConfig};
use crate::model::{Author, Comment, Content, Entry};
use chrono::{DateTime, FixedOffset};
use maud::{DOCTYPE, Markup, PreEscaped, Render, html};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Name of the rendered page inside the output directory.
pub const INDEX_TEMPLATE: &str = "index.html";

impl Render for Content {
    fn render_to(&self, buffer: &mut String) {
        match self {
            Content::Raw(text) => text.as_str().render_to(buffer),
            Content::Sanitized(html) => PreEscaped(html.as_str()).render_to(buffer),
        }
    }
}

/// Render the archive page for `entries` and write it to
/// `output_dir/index.html`, replacing any previous page.
pub fn render_page(
    entries: &[Entry],
    output_dir: &Path,
    config: &ArchiveConfig,
) -> Result<PathBuf, RenderError> {
    fs::create_dir_all(output_dir)?;
    let css = config::generate_color_css(&config.colors);
    let page = render_index(entries, &config.page.title, &config.page.date_format, &css);

    let path = output_dir.join(INDEX_TEMPLATE);
    fs::write(&path, page.into_string())?;
    info!(entries = entries.len(), path = %path.display(), "page rendered");
    Ok(path)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href="fonts/fonts.css";
                link rel="stylesheet" href="assets/style.css";
                style { (PreEscaped(css)) }
            }
            body {
                (content)
            }
        }
    }
}

fn render_index(entries: &[Entry], title: &str, date_format: &str, css: &str) -> Markup {
    let content = html! {
        header.archive-header {
            h1 { (title) }
            p.archive-count { (plural(entries.len(), "post", "posts")) }
        }
        main.archive {
            @for entry in entries {
                (render_entry(entry, date_format))
            }
        }
    };
    base_document(title, css, content)
}

fn render_entry(entry: &Entry, date_format: &str) -> Markup {
    html! {
        article.entry id={ "entry-" (entry.id) } {
            header.entry-meta {
                @if let Some(author) = &entry.author {
                    span.author { (author.name) }
                }
                time datetime=(entry.date.to_rfc3339()) { (format_date(&entry.date, date_format)) }
            }
            @if let Some(content) = &entry.content {
                div.content { (content) }
            }
            @if let Some(picture) = &entry.picture {
                figure.picture {
                    img src=(picture) alt="" loading="lazy";
                }
            }
            @if !entry.pictures.is_empty() {
                div.gallery {
                    @for filename in &entry.pictures {
                        a href={ "pictures/" (filename) } {
                            img src={ "pictures/" (filename) } alt="" loading="lazy";
                        }
                    }
                }
            }
            (render_likes(&entry.likes))
            @if !entry.comments.is_empty() {
                section.comments {
                    h2 { (plural(entry.comments.len(), "comment", "comments")) }
                    @for comment in &entry.comments {
                        (render_comment(comment, date_format))
                    }
                }
            }
        }
    }
}

fn render_comment(comment: &Comment, date_format: &str) -> Markup {
    html! {
        div.comment id=[comment.id.as_ref().map(|id| format!("comment-{id}"))] {
            div.comment-meta {
                span.author { (comment.author.name) }
                time datetime=(comment.date.to_rfc3339()) { (format_date(&comment.date, date_format)) }
            }
            @if let Some(content) = &comment.content {
                div.content { (content) }
            }
            @if let Some(picture) = &comment.picture {
                img.comment-picture src=(picture) alt="" loading="lazy";
            }
            (render_likes(&comment.likes))
        }
    }
}

/// Like count with the names in a tooltip; nothing when there are no likes.
fn render_likes(likes: &[Author]) -> Markup {
    if likes.is_empty() {
        return html! {};
    }
    let names = likes
        .iter()
        .map(|author| author.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    html! {
        p.likes title=(names) { (plural(likes.len(), "like", "likes")) }
    }
}

/// Formats with the configured `strftime` pattern, falling back to RFC 3339
/// if the pattern cannot be rendered.
fn format_date(date: &DateTime<FixedOffset>, format: &str) -> String {
    let mut out = String::new();
    match write!(out, "{}", date.format(format)) {
        Ok(()) => out,
        Err(_) => date.to_rfc3339(),
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("1 {one}")
    } else {
        format!("{count} {many}")
    }
}
