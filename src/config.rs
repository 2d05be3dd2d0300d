//! Archive configuration module.
//!
//! Handles loading, validating, and merging an optional `config.toml`. Stock
//! defaults are the base layer; a user file overrides only the keys it names,
//! and command-line flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! content_policy = "sanitized"  # "raw" or "sanitized"
//! media_strategy = "direct"     # "direct" or "attachments"
//! on_fetch_error = "abort"      # "abort" or "skip"
//! write_manifest = false        # also write entries.json
//! # theme_dir = "theme"         # defaults to the bundled theme
//!
//! [page]
//! title = "Group archive"
//! date_format = "%Y-%m-%d %H:%M"
//!
//! [http]
//! timeout_secs = 30
//! user_agent = "group-archive/<version>"
//!
//! [graph]
//! base_url = "https://graph.facebook.com"
//! version = "v2.12"
//! follow_paging = false
//!
//! [colors.light]
//! background = "#f4f4f2"
//! surface = "#ffffff"
//! text = "#1c1c1c"
//! text_muted = "#6b6b6b"
//! border = "#e2e2e0"
//! link = "#2a5db0"
//! link_hover = "#173a75"
//!
//! [colors.dark]
//! background = "#121212"
//! surface = "#1d1d1d"
//! text = "#ececec"
//! text_muted = "#9a9a9a"
//! border = "#303030"
//! link = "#8fb3f0"
//! link_hover = "#c3d6f7"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// How message bodies are stored in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ContentPolicy {
    /// Keep the text verbatim; it is escaped when rendered.
    Raw,
    /// Escape markup and turn bare URLs into links up front.
    Sanitized,
}

/// Where entry pictures come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MediaStrategy {
    /// Download the single `picture` URL carried by each record.
    Direct,
    /// Query the attachments endpoint for every entry and download all photos.
    Attachments,
}

/// What a network or IO failure during media resolution does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FetchErrorPolicy {
    Abort,
    Skip,
}

/// Archive configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    pub content_policy: ContentPolicy,
    pub media_strategy: MediaStrategy,
    pub on_fetch_error: FetchErrorPolicy,
    /// Write the normalized entries to `entries.json` next to `index.html`.
    pub write_manifest: bool,
    /// Theme directory holding `fonts/` and `assets/`. Bundled theme when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_dir: Option<PathBuf>,
    pub page: PageConfig,
    pub http: HttpConfig,
    pub graph: GraphConfig,
    pub colors: ColorConfig,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            content_policy: ContentPolicy::Sanitized,
            media_strategy: MediaStrategy::Direct,
            on_fetch_error: FetchErrorPolicy::Abort,
            write_manifest: false,
            theme_dir: None,
            page: PageConfig::default(),
            http: HttpConfig::default(),
            graph: GraphConfig::default(),
            colors: ColorConfig::default(),
        }
    }
}

impl ArchiveConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page.title.trim().is_empty() {
            return Err(ConfigError::Validation(
                "page.title must not be empty".into(),
            ));
        }
        if StrftimeItems::new(&self.page.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::Validation(format!(
                "page.date_format '{}' is not a valid strftime pattern",
                self.page.date_format
            )));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "http.timeout_secs must be greater than zero".into(),
            ));
        }
        if !(self.graph.base_url.starts_with("http://")
            || self.graph.base_url.starts_with("https://"))
        {
            return Err(ConfigError::Validation(format!(
                "graph.base_url must be an http(s) URL, got '{}'",
                self.graph.base_url
            )));
        }
        if self.graph.version.trim().is_empty() {
            return Err(ConfigError::Validation(
                "graph.version must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The theme directory to read templates' static files from.
    pub fn theme_path(&self) -> PathBuf {
        self.theme_dir.clone().unwrap_or_else(bundled_theme_dir)
    }
}

/// The theme shipped alongside the crate sources.
pub fn bundled_theme_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("theme")
}

/// Page-level presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    /// Heading and `<title>` of the archive page.
    pub title: String,
    /// `chrono` format string used for entry and comment timestamps.
    pub date_format: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Group archive".to_string(),
            date_format: "%Y-%m-%d %H:%M".to_string(),
        }
    }
}

/// HTTP client settings for media downloads and graph queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("group-archive/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Attachment graph endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    pub base_url: String,
    pub version: String,
    /// Follow `paging.next` links instead of reading only the first page.
    pub follow_paging: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: "https://graph.facebook.com".to_string(),
            version: "v2.12".to_string(),
            follow_paging: false,
        }
    }
}

impl GraphConfig {
    /// Attachments URL for one entry.
    pub fn attachments_url(&self, entry_id: &str) -> String {
        format!(
            "{}/{}/{}/attachments",
            self.base_url.trim_end_matches('/'),
            self.version,
            entry_id
        )
    }
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    pub light: ColorScheme,
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    /// Page background.
    pub background: String,
    /// Entry card background.
    pub surface: String,
    pub text: String,
    /// Timestamps, like lists and other secondary text.
    pub text_muted: String,
    pub border: String,
    pub link: String,
    pub link_hover: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#f4f4f2".to_string(),
            surface: "#ffffff".to_string(),
            text: "#1c1c1c".to_string(),
            text_muted: "#6b6b6b".to_string(),
            border: "#e2e2e0".to_string(),
            link: "#2a5db0".to_string(),
            link_hover: "#173a75".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#121212".to_string(),
            surface: "#1d1d1d".to_string(),
            text: "#ececec".to_string(),
            text_muted: "#9a9a9a".to_string(),
            border: "#303030".to_string(),
            link: "#8fb3f0".to_string(),
            link_hover: "#c3d6f7".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ArchiveConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ArchiveConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ArchiveConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from an optional `config.toml` path.
///
/// With `None`, a `config.toml` in the working directory is used when present;
/// otherwise the stock defaults apply. An explicit path that does not exist is
/// an error.
pub fn load_config(path: Option<&Path>) -> Result<ArchiveConfig, ConfigError> {
    let overlay = match path {
        Some(p) => Some(read_toml(p)?),
        None => {
            let implicit = Path::new("config.toml");
            if implicit.is_file() {
                Some(read_toml(implicit)?)
            } else {
                None
            }
        }
    };
    resolve_config(overlay)
}

fn read_toml(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Printed by `--gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# group-archive configuration
# ===========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# How message bodies are stored:
#   "sanitized" - escape markup and turn bare URLs into links
#   "raw"       - keep the text verbatim (escaped when rendered)
content_policy = "sanitized"

# Where pictures come from:
#   "direct"      - download the `picture` URL of each post
#   "attachments" - query the attachments endpoint (requires --token)
media_strategy = "direct"

# What a network failure while downloading media does:
#   "abort" - stop the run
#   "skip"  - log a warning and leave the picture out
on_fetch_error = "abort"

# Also write the normalized entries to entries.json.
write_manifest = false

# Directory with fonts/ and assets/ to copy into the output.
# Defaults to the bundled theme.
# theme_dir = "theme"

# ---------------------------------------------------------------------------
# Page
# ---------------------------------------------------------------------------
[page]
title = "Group archive"
# chrono strftime-style format for timestamps.
date_format = "%Y-%m-%d %H:%M"

# ---------------------------------------------------------------------------
# HTTP client
# ---------------------------------------------------------------------------
[http]
timeout_secs = 30
# user_agent = "group-archive/<version>"

# ---------------------------------------------------------------------------
# Attachment graph endpoint (media_strategy = "attachments")
# ---------------------------------------------------------------------------
[graph]
base_url = "https://graph.facebook.com"
version = "v2.12"
# Read every page of attachments instead of only the first one.
follow_paging = false

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#f4f4f2"
surface = "#ffffff"
text = "#1c1c1c"
text_muted = "#6b6b6b"
border = "#e2e2e0"
link = "#2a5db0"
link_hover = "#173a75"

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#121212"
surface = "#1d1d1d"
text = "#ececec"
text_muted = "#9a9a9a"
border = "#303030"
link = "#8fb3f0"
link_hover = "#c3d6f7"
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
    --color-bg: {light_bg};
    --color-surface: {light_surface};
    --color-text: {light_text};
    --color-text-muted: {light_text_muted};
    --color-border: {light_border};
    --color-link: {light_link};
    --color-link-hover: {light_link_hover};
}}

@media (prefers-color-scheme: dark) {{
    :root {{
        --color-bg: {dark_bg};
        --color-surface: {dark_surface};
        --color-text: {dark_text};
        --color-text-muted: {dark_text_muted};
        --color-border: {dark_border};
        --color-link: {dark_link};
        --color-link-hover: {dark_link_hover};
    }}
}}"#,
        light_bg = colors.light.background,
        light_surface = colors.light.surface,
        light_text = colors.light.text,
        light_text_muted = colors.light.text_muted,
        light_border = colors.light.border,
        light_link = colors.light.link,
        light_link_hover = colors.light.link_hover,
        dark_bg = colors.dark.background,
        dark_surface = colors.dark.surface,
        dark_text = colors.dark.text,
        dark_text_muted = colors.dark.text_muted,
        dark_border = colors.dark.border,
        dark_link = colors.dark.link,
        dark_link_hover = colors.dark.link_hover,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_policies() {
        let config = ArchiveConfig::default();
        assert_eq!(config.content_policy, ContentPolicy::Sanitized);
        assert_eq!(config.media_strategy, MediaStrategy::Direct);
        assert_eq!(config.on_fetch_error, FetchErrorPolicy::Abort);
        assert!(!config.write_manifest);
        assert!(!config.graph.follow_paging);
    }

    #[test]
    fn default_theme_is_bundled() {
        let config = ArchiveConfig::default();
        assert_eq!(config.theme_path(), bundled_theme_dir());
        assert!(config.theme_path().ends_with("theme"));
    }

    #[test]
    fn stock_defaults_round_trip_through_toml() {
        let config = resolve_config(None).unwrap();
        assert_eq!(config.page.title, "Group archive");
        assert_eq!(config.graph.version, "v2.12");
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("title = \"Group archive\"\nwrite_manifest = false").unwrap();
        let overlay: toml::Value = toml::from_str("write_manifest = true").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["write_manifest"].as_bool(), Some(true));
        assert_eq!(merged["title"].as_str(), Some("Group archive"));
    }

    #[test]
    fn merge_toml_deep_nesting() {
        let base: toml::Value = toml::from_str(
            r##"
[colors.light]
background = "#ffffff"
text = "#111111"

[colors.dark]
background = "#000000"
"##,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r##"
[colors.light]
text = "#222222"
"##,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["colors"]["light"]["text"].as_str(), Some("#222222"));
        assert_eq!(merged["colors"]["light"]["background"].as_str(), Some("#ffffff"));
        assert_eq!(merged["colors"]["dark"]["background"].as_str(), Some("#000000"));
    }

    #[test]
    fn merge_toml_overlay_adds_new_keys_and_replaces_tables_with_scalars() {
        let base: toml::Value = toml::from_str("[graph]\nversion = \"v2.12\"").unwrap();
        let overlay: toml::Value =
            toml::from_str("graph = \"flat\"\ntheme_dir = \"mine\"").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["graph"].as_str(), Some("flat"));
        assert_eq!(merged["theme_dir"].as_str(), Some("mine"));
    }

    #[test]
    fn parse_partial_config() {
        let overlay: toml::Value = toml::from_str(
            r##"
content_policy = "raw"

[colors.light]
background = "#fafafa"
"##,
        )
        .unwrap();
        let config = resolve_config(Some(overlay)).unwrap();
        assert_eq!(config.content_policy, ContentPolicy::Raw);
        assert_eq!(config.colors.light.background, "#fafafa");
        // Siblings of overridden keys keep their defaults
        assert_eq!(config.colors.light.text, "#1c1c1c");
        assert_eq!(config.colors.dark.background, "#121212");
        assert_eq!(config.media_strategy, MediaStrategy::Direct);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let overlay: toml::Value = toml::from_str("media_stratgy = \"direct\"").unwrap();
        assert!(matches!(
            resolve_config(Some(overlay)),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn unknown_enum_value_is_rejected() {
        let overlay: toml::Value = toml::from_str("media_strategy = \"carrier-pigeon\"").unwrap();
        assert!(resolve_config(Some(overlay)).is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = ArchiveConfig::default();
        config.http.timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("timeout_secs")
        ));
    }

    #[test]
    fn validate_rejects_non_http_graph_url() {
        let mut config = ArchiveConfig::default();
        config.graph.base_url = "ftp://graph.example".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_date_format() {
        let mut config = ArchiveConfig::default();
        config.page.date_format = "%Y-%Q".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("date_format"));
    }

    #[test]
    fn validate_rejects_blank_title() {
        let mut config = ArchiveConfig::default();
        config.page.title = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn attachments_url_joins_segments() {
        let mut graph = GraphConfig::default();
        assert_eq!(
            graph.attachments_url("123_456"),
            "https://graph.facebook.com/v2.12/123_456/attachments"
        );
        graph.base_url = "http://localhost:8080/".to_string();
        assert_eq!(
            graph.attachments_url("1"),
            "http://localhost:8080/v2.12/1/attachments"
        );
    }

    #[test]
    fn load_config_reads_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("archive.toml");
        fs::write(
            &path,
            r#"
media_strategy = "attachments"
on_fetch_error = "skip"

[page]
title = "Hiking club"

[graph]
follow_paging = true
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.media_strategy, MediaStrategy::Attachments);
        assert_eq!(config.on_fetch_error, FetchErrorPolicy::Skip);
        assert_eq!(config.page.title, "Hiking club");
        assert!(config.graph.follow_paging);
        // Untouched sections keep defaults
        assert_eq!(config.page.date_format, "%Y-%m-%d %H:%M");
    }

    #[test]
    fn load_config_missing_explicit_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let overlay: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(Some(overlay)).unwrap();
        assert_eq!(config.content_policy, ContentPolicy::Sanitized);
        assert_eq!(config.colors.dark.link, "#8fb3f0");
        assert_eq!(config.graph.base_url, "https://graph.facebook.com");
    }

    #[test]
    fn generate_css_uses_config_colors() {
        let mut colors = ColorConfig::default();
        colors.light.background = "#f0f0f0".to_string();
        colors.dark.surface = "#1a1a1a".to_string();

        let css = generate_color_css(&colors);
        assert!(css.contains("--color-bg: #f0f0f0"));
        assert!(css.contains("--color-surface: #1a1a1a"));
        assert!(css.contains("prefers-color-scheme: dark"));
    }
}
