use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::log::{MessageId, Severities, Severity};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read the configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Settings of the forward translation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslationConfig {
    /// Replaces whitespace runs in generated names
    pub whitespace_replacement: String,
    /// Used for diagrams that declare no target namespace
    pub default_namespace: Option<String>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            whitespace_replacement: "-".into(),
            default_namespace: None,
        }
    }
}

/// Options of the reverse translation
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReverseOptions {
    /// Collapse roots that are structurally represented exactly once into their representative
    pub resolve_srs: bool,
    /// Collapse the stand-ins left behind when relocating extending classes
    pub delete_unnecessary_srs_made_by_extensions: bool,
    /// Journal every model operation so that the import can be undone
    pub use_commands: bool,
    /// Ask the sink to lay out the new diagram
    pub layout: bool,
}

impl Default for ReverseOptions {
    fn default() -> Self {
        Self {
            resolve_srs: true,
            delete_unnecessary_srs_made_by_extensions: true,
            use_commands: true,
            layout: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub translation: TranslationConfig,
    pub severities: HashMap<MessageId, Severity>,
    pub reverse: ReverseOptions,
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn severities(&self) -> Severities {
        Severities::new(self.severities.clone())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_file_means_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn reads_all_sections() {
        let config = Config::from_toml_str(
            r#"
            [translation]
            whitespace_replacement = "_"
            default_namespace = "urn:example"

            [severities]
            XS_NO_ROOT = "error"
            XS_ELEMENT_NAME_NORMALIZED = "ignore"

            [reverse]
            resolve_srs = false
            layout = true
            "#,
        )
        .unwrap();

        assert_eq!(config.translation.whitespace_replacement, "_");
        assert_eq!(
            config.translation.default_namespace.as_deref(),
            Some("urn:example")
        );
        let severities = config.severities();
        assert_eq!(severities.get(MessageId::XsNoRoot), Severity::Error);
        assert_eq!(
            severities.get(MessageId::XsElementNameNormalized),
            Severity::Ignore
        );
        assert_eq!(severities.get(MessageId::RevInternal), Severity::Error);
        assert_eq!(
            config.reverse,
            ReverseOptions {
                resolve_srs: false,
                layout: true,
                ..ReverseOptions::default()
            }
        );
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            Config::from_toml_str("[reverse]\nresolve = true"),
            Err(ConfigError::Toml(_))
        ));
        assert!(Config::from_toml_str("[severities]\nXS_BOGUS = \"error\"").is_err());
    }
}
