//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/catree/catree.toml`
//! 3. Local config: `<dir>/.catree.toml`
//! 4. Environment variables: `CATREE_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{FilterField, SortDirection, SortKey, TextQuery};

/// Default ordering of forest levels and orphans.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SortSettings {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// Text filter behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilterSettings {
    /// Record fields searched by the filter text (e.g. ["name", "subject"])
    pub fields: Vec<String>,
    pub case_sensitive: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            fields: vec!["name".into()],
            case_sensitive: false,
        }
    }
}

/// Raw filter config for intermediate parsing (arrays are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawFilterSettings {
    pub fields: Option<Vec<String>>,
    pub case_sensitive: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSortSettings {
    pub key: Option<SortKey>,
    pub direction: Option<SortDirection>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub page_size: Option<usize>,
    pub expand_roots: Option<bool>,
    pub sort: RawSortSettings,
    pub filter: RawFilterSettings,
}

impl FilterSettings {
    /// Merge arrays with union semantics and negation support.
    ///
    /// - Items from overlay are added to base
    /// - Items prefixed with `!` remove the corresponding item from the result
    /// - Duplicates are de-duplicated
    ///
    /// # Examples
    /// ```ignore
    /// merge_array(&["name"], &["subject"])          // → ["name", "subject"]
    /// merge_array(&["name", "id"], &["!name"])      // → ["id"]
    /// ```
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().cloned().collect();

        for item in overlay {
            if let Some(negated) = item.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(item.clone());
            }
        }

        // Convert to sorted Vec for deterministic output
        let mut vec: Vec<String> = result.into_iter().collect();
        vec.sort();
        vec
    }

    /// Union-merge a local overlay onto self.
    pub fn merge(&self, overlay: &RawFilterSettings) -> Self {
        Self {
            fields: overlay
                .fields
                .as_ref()
                .map(|o| Self::merge_array(&self.fields, o))
                .unwrap_or_else(|| self.fields.clone()),
            case_sensitive: overlay.case_sensitive.unwrap_or(self.case_sensitive),
        }
    }

    /// Apply global config onto defaults: arrays REPLACE.
    pub fn apply_global(&self, global: &RawFilterSettings) -> Self {
        Self {
            fields: global
                .fields
                .clone()
                .unwrap_or_else(|| self.fields.clone()),
            case_sensitive: global.case_sensitive.unwrap_or(self.case_sensitive),
        }
    }

    /// Parse the configured field names.
    pub fn parsed_fields(&self) -> ApplicationResult<Vec<FilterField>> {
        self.fields
            .iter()
            .map(|f| f.parse::<FilterField>().map_err(ApplicationError::from))
            .collect()
    }
}

impl SortSettings {
    fn overlay(&self, raw: &RawSortSettings) -> Self {
        Self {
            key: raw.key.unwrap_or(self.key),
            direction: raw.direction.unwrap_or(self.direction),
        }
    }
}

/// Unified configuration for catree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Orphans per page
    pub page_size: usize,
    /// Start with every root expanded
    pub expand_roots: bool,
    pub sort: SortSettings,
    pub filter: FilterSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: 10,
            expand_roots: false,
            sort: SortSettings::default(),
            filter: FilterSettings::default(),
        }
    }
}

/// Get the XDG config directory for catree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "catree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("catree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".catree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> ApplicationResult<RawSettings> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Merge overlay config onto self (base) with union semantics for arrays.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            page_size: overlay.page_size.unwrap_or(self.page_size),
            expand_roots: overlay.expand_roots.unwrap_or(self.expand_roots),
            sort: self.sort.overlay(&overlay.sort),
            filter: self.filter.merge(&overlay.filter),
        }
    }

    /// Apply global config onto defaults with REPLACE semantics for arrays.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            page_size: global.page_size.unwrap_or(self.page_size),
            expand_roots: global.expand_roots.unwrap_or(self.expand_roots),
            sort: self.sort.overlay(&global.sort),
            filter: self.filter.apply_global(&global.filter),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.catree.toml`
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE (global defines the real baseline)
    /// - Global → Local: UNION with negation support
    /// - Any → Env vars: REPLACE (explicit user override)
    pub fn load(local_dir: Option<&Path>) -> ApplicationResult<Self> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("loading local config {}", local_path.display());
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Apply CATREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> ApplicationResult<Self> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("CATREE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("filter.fields")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_int("page_size") {
            settings.page_size = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("CATREE_PAGE_SIZE out of range: {val}"),
            })?;
        }
        if let Ok(val) = config.get_bool("expand_roots") {
            settings.expand_roots = val;
        }
        if let Ok(val) = config.get_string("sort.key") {
            settings.sort.key = val.parse()?;
        }
        if let Ok(val) = config.get_string("sort.direction") {
            settings.sort.direction = val.parse()?;
        }
        if let Ok(val) = config.get::<Vec<String>>("filter.fields") {
            settings.filter.fields = val;
        }
        if let Ok(val) = config.get_bool("filter.case_sensitive") {
            settings.filter.case_sensitive = val;
        }

        Ok(settings)
    }

    /// Reject settings the view pipeline cannot use.
    pub fn validate(&self) -> ApplicationResult<()> {
        if self.page_size == 0 {
            return Err(ApplicationError::Config {
                message: "page_size must be at least 1".into(),
            });
        }
        self.filter.parsed_fields()?;
        Ok(())
    }

    /// Build the text query configured for `text`.
    pub fn text_query(&self, text: &str) -> ApplicationResult<TextQuery> {
        Ok(TextQuery::with_fields(
            text,
            self.filter.parsed_fields()?,
            self.filter.case_sensitive,
        ))
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> ApplicationResult<String> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# catree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/catree/catree.toml  (defines your baseline)
#   Local:  <dir>/.catree.toml            (directory-specific additions)
#   Env:    CATREE_* environment variables (explicit overrides, e.g. CATREE_SORT__KEY)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global.
#   Use "!item" in local config to REMOVE an inherited item:
#     fields = ["subject", "!name"]  # adds subject, removes name

# Orphans per page
# page_size = 10

# Start with every root expanded
# expand_roots = false

[sort]
# name | subject | issuer | status | type | cert_count | expiry
# key = "name"
# asc | desc
# direction = "asc"

[filter]
# Fields searched by the filter text: id, name, subject, issuer, status, type
# fields = ["name"]
# case_sensitive = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_validating_then_ok() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.page_size, 10);
        assert_eq!(settings.sort.key, SortKey::Name);
        assert_eq!(settings.filter.fields, vec!["name".to_string()]);
    }

    #[test]
    fn given_zero_page_size_when_validating_then_config_error() {
        let settings = Settings {
            page_size: 0,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ApplicationError::Config { .. })
        ));
    }

    #[test]
    fn given_unknown_filter_field_when_validating_then_domain_error() {
        let mut settings = Settings::default();
        settings.filter.fields.push("colour".into());
        assert!(matches!(
            settings.validate(),
            Err(ApplicationError::Domain(_))
        ));
    }

    #[test]
    fn given_overlay_with_negation_when_merging_then_removes_and_adds() {
        let merged = FilterSettings::merge_array(
            &["name".to_string(), "id".to_string()],
            &["!name".to_string(), "subject".to_string()],
        );
        assert_eq!(merged, vec!["id".to_string(), "subject".to_string()]);
    }

    #[test]
    fn given_global_fields_when_applying_then_replaces_defaults() {
        let global = RawFilterSettings {
            fields: Some(vec!["issuer".into()]),
            case_sensitive: None,
        };
        let applied = FilterSettings::default().apply_global(&global);
        assert_eq!(applied.fields, vec!["issuer".to_string()]);
        assert!(!applied.case_sensitive);
    }

    #[test]
    fn given_settings_when_serializing_then_round_trips_through_toml() {
        let settings = Settings::default();
        let text = settings.to_toml().unwrap();
        assert!(text.contains("page_size = 10"));
        assert!(text.contains("key = \"name\""));
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn given_template_when_parsing_then_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.page_size.is_none());
    }
}
