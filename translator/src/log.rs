use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Identifier of a translation diagnostic
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageId {
    XsNoRoot,
    XsAbstractNotSpecialized,
    XsAttributeMultiplicityLost,
    XsDuplicateRootElements,
    XsSpecializedAttributeGroup,
    XsTypeTranslatedAsString,
    XsEmptyName,
    XsElementNameNormalized,
    XsGroupAttributesRepeated,
    XsUnionAttributes,
    XsRepresentativeCycle,
    XsUnreferencedRoot,
    XsNoNamespace,
    RevInternal,
    RevUnresolvedReference,
    RevLossyConstruct,
}

impl MessageId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::XsNoRoot => "XS_NO_ROOT",
            Self::XsAbstractNotSpecialized => "XS_ABSTRACT_NOT_SPECIALIZED",
            Self::XsAttributeMultiplicityLost => "XS_ATTRIBUTE_MULTIPLICITY_LOST",
            Self::XsDuplicateRootElements => "XS_DUPLICATE_ROOT_ELEMENTS",
            Self::XsSpecializedAttributeGroup => "XS_SPECIALIZED_ATTRIBUTE_GROUP",
            Self::XsTypeTranslatedAsString => "XS_TYPE_TRANSLATED_AS_STRING",
            Self::XsEmptyName => "XS_EMPTY_NAME",
            Self::XsElementNameNormalized => "XS_ELEMENT_NAME_NORMALIZED",
            Self::XsGroupAttributesRepeated => "XS_GROUP_ATTRIBUTES_REPEATED",
            Self::XsUnionAttributes => "XS_UNION_ATTRIBUTES",
            Self::XsRepresentativeCycle => "XS_REPRESENTATIVE_CYCLE",
            Self::XsUnreferencedRoot => "XS_UNREFERENCED_ROOT",
            Self::XsNoNamespace => "XS_NO_NAMESPACE",
            Self::RevInternal => "REV_INTERNAL",
            Self::RevUnresolvedReference => "REV_UNRESOLVED_REFERENCE",
            Self::RevLossyConstruct => "REV_LOSSY_CONSTRUCT",
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ignore,
    Warning,
    Error,
}

lazy_static! {
    static ref DEFAULT_SEVERITIES: HashMap<MessageId, Severity> = [
        (MessageId::XsRepresentativeCycle, Severity::Error),
        (MessageId::RevInternal, Severity::Error),
        (MessageId::RevUnresolvedReference, Severity::Error),
    ]
    .into_iter()
    .collect();
}

/// Severity table: configured overrides on top of the built-in defaults.
/// Messages without an entry anywhere are warnings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Severities {
    overrides: HashMap<MessageId, Severity>,
}

impl Severities {
    pub fn new(overrides: HashMap<MessageId, Severity>) -> Self {
        Self { overrides }
    }

    pub fn get(&self, id: MessageId) -> Severity {
        self.overrides
            .get(&id)
            .or_else(|| DEFAULT_SEVERITIES.get(&id))
            .copied()
            .unwrap_or(Severity::Warning)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub id: MessageId,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            _ => "warning",
        };
        write!(f, "{severity}[{}]: {}", self.id, self.message)
    }
}

/// Diagnostics produced by one translation run.
///
/// Entries with severity [`Severity::Ignore`] are dropped; identical entries are recorded once.
#[derive(Clone, Debug, Default)]
pub struct TranslationLog {
    severities: Severities,
    entries: Vec<LogEntry>,
}

impl TranslationLog {
    pub fn new(severities: Severities) -> Self {
        Self {
            severities,
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, id: MessageId, message: impl Into<String>) {
        let severity = self.severities.get(id);
        if severity == Severity::Ignore {
            return;
        }
        let entry = LogEntry {
            id,
            severity,
            message: message.into(),
        };
        if self.entries.contains(&entry) {
            return;
        }
        match severity {
            Severity::Error => tracing::error!(id = %id, "{}", entry.message),
            _ => tracing::warn!(id = %id, "{}", entry.message),
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.severity == Severity::Error)
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.count(id) > 0
    }

    pub fn count(&self, id: MessageId) -> usize {
        self.entries.iter().filter(|entry| entry.id == id).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_match_their_serialized_form() {
        let json = serde_json::to_string(&MessageId::XsAttributeMultiplicityLost).unwrap();
        assert_eq!(json, "\"XS_ATTRIBUTE_MULTIPLICITY_LOST\"");
        assert_eq!(MessageId::RevInternal.to_string(), "REV_INTERNAL");
    }

    #[test]
    fn applies_severities_and_deduplicates() {
        let severities = Severities::new(
            [
                (MessageId::XsNoRoot, Severity::Ignore),
                (MessageId::XsEmptyName, Severity::Error),
            ]
            .into_iter()
            .collect(),
        );
        let mut log = TranslationLog::new(severities);
        log.add(MessageId::XsNoRoot, "no roots");
        log.add(MessageId::XsEmptyName, "class #3 has no name");
        log.add(MessageId::XsEmptyName, "class #3 has no name");
        log.add(MessageId::XsUnionAttributes, "union");

        assert!(!log.contains(MessageId::XsNoRoot));
        assert_eq!(log.count(MessageId::XsEmptyName), 1);
        assert!(log.has_errors());
        assert_eq!(log.entries()[1].severity, Severity::Warning);
        assert_eq!(
            log.entries()[0].to_string(),
            "error[XS_EMPTY_NAME]: class #3 has no name"
        );
    }
}
