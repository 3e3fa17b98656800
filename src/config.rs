//! Engine configuration.
//!
//! Handles loading, validating, and merging `docus.toml`. Stock defaults are
//! the base layer; a user file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! ignore = []                # Document key prefixes dropped at ingestion
//!
//! [search]
//! enabled = true             # false = text queries fail with IndexUnavailable
//! fields = ["title", "description", "navigation.title"]
//! inheritance_fields = ["navigation.title"]
//!
//! [locales]
//! codes = ["en"]             # Languages accepted by `nav --language`
//! default_locale = "en"      # Navigation language when none is requested
//!
//! [navigation]
//! include_drafts = false     # true = drafts are listed, not flagged hidden
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
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

/// Engine configuration loaded from `docus.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Document key prefixes skipped during ingestion.
    pub ignore: Vec<String>,
    /// Full-text search settings.
    pub search: SearchConfig,
    /// Content languages.
    pub locales: LocaleConfig,
    /// Navigation tree settings.
    pub navigation: NavigationSettings,
}

impl EngineConfig {
    /// Validate values that parse fine but make no sense together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.enabled && self.search.fields.is_empty() {
            return Err(ConfigError::Validation(
                "search.fields must not be empty when search is enabled".into(),
            ));
        }
        if self
            .search
            .fields
            .iter()
            .chain(&self.search.inheritance_fields)
            .any(|f| f.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "search field names must not be blank".into(),
            ));
        }
        if !self.locales.codes.contains(&self.locales.default_locale) {
            return Err(ConfigError::Validation(format!(
                "locales.default_locale '{}' is not listed in locales.codes",
                self.locales.default_locale
            )));
        }
        if self.ignore.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::Validation(
                "ignore prefixes must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The search settings, or `None` when the index is switched off.
    pub fn search_index(&self) -> Option<SearchConfig> {
        self.search.enabled.then(|| self.search.clone())
    }
}

/// Which document fields the search index covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub enabled: bool,
    /// Fields scored for every document. Dotted paths reach nested values.
    pub fields: Vec<String>,
    /// Fields a document takes from its nearest exclusive ancestor when it
    /// has no value of its own.
    pub inheritance_fields: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fields: vec![
                "title".to_string(),
                "description".to_string(),
                "navigation.title".to_string(),
            ],
            inheritance_fields: vec!["navigation.title".to_string()],
        }
    }
}

impl SearchConfig {
    /// Every indexed field, own fields first, without duplicates.
    pub fn indexed_fields(&self) -> Vec<&str> {
        let mut all: Vec<&str> = Vec::new();
        for field in self.fields.iter().chain(&self.inheritance_fields) {
            if !all.contains(&field.as_str()) {
                all.push(field);
            }
        }
        all
    }

    pub fn inherits(&self, field: &str) -> bool {
        self.inheritance_fields.iter().any(|f| f == field)
    }
}

/// Content languages the site publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocaleConfig {
    pub codes: Vec<String>,
    /// Language of the navigation tree when none is requested.
    pub default_locale: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            codes: vec!["en".to_string()],
            default_locale: "en".to_string(),
        }
    }
}

impl LocaleConfig {
    /// The language to build navigation in: `requested` when it is one of
    /// `codes`, the default locale when nothing was requested.
    pub fn resolve<'a>(&'a self, requested: Option<&'a str>) -> Result<&'a str, ConfigError> {
        match requested {
            None => Ok(&self.default_locale),
            Some(code) if self.codes.iter().any(|c| c == code) => Ok(code),
            Some(code) => Err(ConfigError::Validation(format!(
                "language '{code}' is not listed in locales.codes ({})",
                self.codes.join(", ")
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavigationSettings {
    /// List drafts as regular nodes instead of flagging them hidden.
    pub include_drafts: bool,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(EngineConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
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

/// Read a config file as a raw TOML value; `Ok(None)` when it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EngineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EngineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path` over the stock defaults.
///
/// A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// A fully commented stock `docus.toml`, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# docus-content configuration
# ===========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys cause an error.

# Document key prefixes skipped during ingestion, e.g. ["content:_partials"].
ignore = []

# ---------------------------------------------------------------------------
# Full-text search
# ---------------------------------------------------------------------------
[search]
# Set to false to run without an index; text queries then fail.
enabled = true

# Fields scored for every document. Dotted paths reach nested values.
fields = ["title", "description", "navigation.title"]

# Fields a document borrows from its nearest exclusive ancestor when its own
# value is missing, so a section title boosts the pages inside it.
inheritance_fields = ["navigation.title"]

# ---------------------------------------------------------------------------
# Languages
# ---------------------------------------------------------------------------
[locales]
# Languages content is published in. `nav --language` accepts only these.
codes = ["en"]
# Navigation lists this language (plus language-neutral documents) unless
# another one is requested.
default_locale = "en"

# ---------------------------------------------------------------------------
# Navigation
# ---------------------------------------------------------------------------
[navigation]
# List drafts as regular menu entries instead of flagging them hidden.
include_drafts = false
"##
}
