//! Translation between PSM diagrams and XML Schema, in both directions.
//!
//! * [`forward::XmlSchemaTranslator`] renders one diagram of a [`xcase_psm::PsmProject`] as an
//!   XML Schema document.
//! * [`reverse::XsdImporter`] reads an XML Schema document into a new diagram.
//!
//! Both directions report problems of their input in a [`log::TranslationLog`] instead of
//! failing.

pub mod config;
pub mod forward;
pub mod log;
pub mod project_file;
pub mod reverse;

pub use config::{Config, ConfigError, ReverseOptions, TranslationConfig};
pub use forward::{TranslationResult, XmlSchemaTranslator};
pub use log::{LogEntry, MessageId, Severities, Severity, TranslationLog};
pub use reverse::{ImportResult, ReverseError, XsdImporter};

/// Documentation that marks the element of a content container
pub const CONTENT_CONTAINER_MARKER: &str = "PSM: ContentContainer";
