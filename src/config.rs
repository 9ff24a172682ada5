//! Renderer configuration.
//!
//! [`RenderJsonOptions`] is the partial configuration a host supplies, in
//! code or from a JSON/TOML document. [`RenderJsonOptions::resolve`] merges
//! it with the defaults into an immutable [`RenderJsonConfig`].
//!
//! The two table sections, `secure_headers` and `json_escape_filter`, are
//! merged key-by-key:
//!
//! | section value         | result                                     |
//! |-----------------------|--------------------------------------------|
//! | absent or `true`      | default table                              |
//! | `null` or `false`     | section disabled                           |
//! | table                 | default table with the given entries on top |
//!
//! Inside a table, a string sets an entry and `null`/`false` disables it.
//!
//! ```
//! use armature_render_json::RenderJsonOptions;
//!
//! let config = RenderJsonOptions::from_toml_str(r#"
//!     canonical = true
//!     status_code_field = "status"
//!     json_escape_filter = false
//!
//!     [secure_headers]
//!     x-frame-options = "SAMEORIGIN"
//!     referrer-policy = false
//! "#).unwrap().resolve();
//!
//! assert!(config.flags.canonical);
//! assert!(config.escape_filter.is_none());
//! let headers = config.secure_headers.as_ref().unwrap();
//! assert_eq!(headers.get("x-frame-options"), Some("SAMEORIGIN"));
//! assert!(headers.is_disabled("referrer-policy"));
//! ```

use crate::encoder::{EncodeFlags, SchemaEncoder};
use crate::error::{RenderError, Result};
use crate::escape::EscapeFilter;
use crate::normalizer::ObjectNormalizer;
use crate::validator::RequestValidator;
use armature_security::SecureHeaders;
use indexmap::IndexMap;
use serde::de::{DeserializeOwned, Deserializer, Error as _, IgnoredAny};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Name the renderer is installed under when none is configured
pub const DEFAULT_METHOD_NAME: &str = "render_json";

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            _ => None,
        }
    }

    /// Detect the format from a file extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                RenderError::ConfigLoad(format!("No file extension found: {}", path.display()))
            })?;

        Self::from_extension(ext)
            .ok_or_else(|| RenderError::ConfigLoad(format!("Unsupported format: {}", ext)))
    }
}

/// A mergeable configuration section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section<T> {
    /// Use the default table
    Default,
    /// Turn the whole section off
    Disabled,
    /// Overlay these entries onto the default table
    Override(T),
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Section::Default
    }
}

impl<T> Section<T> {
    pub fn is_disabled(&self) -> bool {
        matches!(self, Section::Disabled)
    }
}

impl<T: Default> Section<T> {
    /// Overlay table, created empty if the section was not overriding
    fn overrides_mut(&mut self) -> &mut T {
        if !matches!(self, Section::Override(_)) {
            *self = Section::Override(T::default());
        }
        match self {
            Section::Override(table) => table,
            _ => unreachable!("section was just set to Override"),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Section<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null | serde_json::Value::Bool(false) => Ok(Section::Disabled),
            serde_json::Value::Bool(true) => Ok(Section::Default),
            table @ serde_json::Value::Object(_) => {
                T::deserialize(table).map(Section::Override).map_err(D::Error::custom)
            }
            other => {
                warn!(value = %other, "configuration section is not a table; disabling it");
                Ok(Section::Disabled)
            }
        }
    }
}

/// One entry of a mergeable table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Enable the entry with this value
    Set(String),
    /// Disable the entry
    Disabled,
    /// Leave the default entry as it is
    Keep,
}

impl Entry {
    fn into_overlay(self) -> Option<Option<String>> {
        match self {
            Entry::Set(value) => Some(Some(value)),
            Entry::Disabled => Some(None),
            Entry::Keep => None,
        }
    }
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(value) => Entry::Set(value),
            serde_json::Value::Null | serde_json::Value::Bool(false) => Entry::Disabled,
            serde_json::Value::Bool(true) => Entry::Keep,
            serde_json::Value::Number(n) => Entry::Set(n.to_string()),
            other => {
                warn!(value = %other, "configuration entry is not a string; keeping the default");
                Entry::Keep
            }
        })
    }
}

/// Table of entries as written in a configuration document
pub type EntryTable = IndexMap<String, Entry>;

/// Partial renderer configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenderJsonOptions {
    pub name: Option<String>,
    pub secure_headers: Section<EntryTable>,
    pub json_escape_filter: Section<EntryTable>,
    pub ascii: Option<bool>,
    pub utf8: Option<bool>,
    pub canonical: Option<bool>,
    pub convert_blessed: Option<bool>,
    pub require_types: Option<bool>,
    pub type_all_string: Option<bool>,
    /// Use [`ObjectNormalizer::unbless`] when no normalizer is set in code
    pub unbless_object: Option<bool>,
    pub status_code_field: Option<String>,
    pub defence_json_hijacking_for_legacy_browser: Option<bool>,
    #[serde(skip)]
    pub normalizer: Option<ObjectNormalizer>,
    #[serde(flatten)]
    unknown: BTreeMap<String, IgnoredAny>,
}

impl RenderJsonOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| RenderError::ConfigParse(format!("JSON parse error: {}", e)))?;
        Self::from_json_value(value)
    }

    /// Parse options from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let toml_value: toml::Value = toml::from_str(content)
            .map_err(|e| RenderError::ConfigParse(format!("TOML parse error: {}", e)))?;

        let value = serde_json::to_value(toml_value)
            .map_err(|e| RenderError::ConfigParse(format!("TOML conversion error: {}", e)))?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| RenderError::ConfigParse(format!("Invalid options: {}", e)))
    }

    /// Load options from a file, detecting the format from its extension
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let format = FileFormat::from_path(&path)?;
        Self::load_file_as(path, format)
    }

    pub fn load_file_as(path: impl AsRef<Path>, format: FileFormat) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), ?format, "loading render_json options");

        match format {
            FileFormat::Json => Self::from_json_str(&content),
            FileFormat::Toml => Self::from_toml_str(&content),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn ascii(mut self, enabled: bool) -> Self {
        self.ascii = Some(enabled);
        self
    }

    pub fn utf8(mut self, enabled: bool) -> Self {
        self.utf8 = Some(enabled);
        self
    }

    pub fn canonical(mut self, enabled: bool) -> Self {
        self.canonical = Some(enabled);
        self
    }

    pub fn convert_blessed(mut self, enabled: bool) -> Self {
        self.convert_blessed = Some(enabled);
        self
    }

    pub fn require_types(mut self, enabled: bool) -> Self {
        self.require_types = Some(enabled);
        self
    }

    pub fn type_all_string(mut self, enabled: bool) -> Self {
        self.type_all_string = Some(enabled);
        self
    }

    pub fn normalizer(mut self, normalizer: ObjectNormalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn unbless_object(mut self, enabled: bool) -> Self {
        self.unbless_object = Some(enabled);
        self
    }

    pub fn status_code_field(mut self, field: impl Into<String>) -> Self {
        self.status_code_field = Some(field.into());
        self
    }

    pub fn defence_json_hijacking_for_legacy_browser(mut self, enabled: bool) -> Self {
        self.defence_json_hijacking_for_legacy_browser = Some(enabled);
        self
    }

    /// Set a security header on top of the defaults
    pub fn secure_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secure_headers
            .overrides_mut()
            .insert(name.into(), Entry::Set(value.into()));
        self
    }

    /// Stop a single default security header from being sent
    pub fn disable_secure_header(mut self, name: impl Into<String>) -> Self {
        self.secure_headers
            .overrides_mut()
            .insert(name.into(), Entry::Disabled);
        self
    }

    pub fn disable_secure_headers(mut self) -> Self {
        self.secure_headers = Section::Disabled;
        self
    }

    /// Replace `trigger` with `replacement` on top of the default escapes
    pub fn escape(mut self, trigger: char, replacement: impl Into<String>) -> Self {
        self.json_escape_filter
            .overrides_mut()
            .insert(trigger.to_string(), Entry::Set(replacement.into()));
        self
    }

    pub fn disable_escape(mut self, trigger: char) -> Self {
        self.json_escape_filter
            .overrides_mut()
            .insert(trigger.to_string(), Entry::Disabled);
        self
    }

    pub fn disable_escape_filter(mut self) -> Self {
        self.json_escape_filter = Section::Disabled;
        self
    }

    /// Merge with the defaults.
    pub fn resolve(self) -> RenderJsonConfig {
        for key in self.unknown.keys() {
            debug!(key = %key, "ignoring unknown render_json option");
        }

        let defaults = EncodeFlags::default();
        let flags = EncodeFlags {
            ascii: self.ascii.unwrap_or(defaults.ascii),
            utf8: self.utf8.unwrap_or(defaults.utf8),
            canonical: self.canonical.unwrap_or(defaults.canonical),
            convert_blessed: self.convert_blessed.unwrap_or(defaults.convert_blessed),
            require_types: self.require_types.unwrap_or(defaults.require_types),
            type_all_string: self.type_all_string.unwrap_or(defaults.type_all_string),
        };

        let normalizer = match (self.normalizer, self.unbless_object) {
            (Some(normalizer), _) => Some(normalizer),
            (None, Some(true)) => Some(ObjectNormalizer::unbless()),
            (None, _) => None,
        };

        let config = RenderJsonConfig {
            name: self.name.unwrap_or_else(|| DEFAULT_METHOD_NAME.to_string()),
            flags,
            escape_filter: resolve_escape_filter(self.json_escape_filter),
            secure_headers: resolve_secure_headers(self.secure_headers),
            normalizer,
            status_code_field: self.status_code_field,
            defence_json_hijacking_for_legacy_browser: self
                .defence_json_hijacking_for_legacy_browser
                .unwrap_or(false),
        };

        debug!(
            name = %config.name,
            escape_filter = config.escape_filter.is_some(),
            secure_headers = config.secure_headers.is_some(),
            "resolved render_json configuration"
        );
        config
    }
}

fn resolve_secure_headers(section: Section<EntryTable>) -> Option<SecureHeaders> {
    match section {
        Section::Default => Some(SecureHeaders::default()),
        Section::Disabled => None,
        Section::Override(table) => Some(
            SecureHeaders::default().overlay(
                table
                    .into_iter()
                    .filter_map(|(name, entry)| entry.into_overlay().map(|value| (name, value))),
            ),
        ),
    }
}

fn resolve_escape_filter(section: Section<EntryTable>) -> Option<EscapeFilter> {
    match section {
        Section::Default => Some(EscapeFilter::default()),
        Section::Disabled => None,
        Section::Override(table) => {
            let mut overlay = Vec::with_capacity(table.len());
            for (key, entry) in table {
                let mut chars = key.chars();
                let trigger = match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => {
                        warn!(key = %key, "escape filter keys must be a single character; entry ignored");
                        continue;
                    }
                };
                if let Some(replacement) = entry.into_overlay() {
                    overlay.push((trigger, replacement));
                }
            }
            Some(EscapeFilter::default().overlay(overlay))
        }
    }
}

/// Fully resolved, immutable renderer configuration.
#[derive(Debug, Clone)]
pub struct RenderJsonConfig {
    pub name: String,
    pub flags: EncodeFlags,
    /// `None` when the section is disabled
    pub escape_filter: Option<EscapeFilter>,
    /// `None` when the section is disabled
    pub secure_headers: Option<SecureHeaders>,
    pub normalizer: Option<ObjectNormalizer>,
    pub status_code_field: Option<String>,
    pub defence_json_hijacking_for_legacy_browser: bool,
}

impl RenderJsonConfig {
    pub fn encoder(&self) -> SchemaEncoder {
        let encoder = SchemaEncoder::new(self.flags);
        match &self.normalizer {
            Some(normalizer) => encoder.with_normalizer(normalizer.clone()),
            None => encoder,
        }
    }

    pub fn validator(&self) -> RequestValidator {
        RequestValidator::new(self.defence_json_hijacking_for_legacy_browser)
    }
}

impl Default for RenderJsonConfig {
    fn default() -> Self {
        RenderJsonOptions::default().resolve()
    }
}
