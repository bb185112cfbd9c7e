use std::path::PathBuf;

use roxmltree::Node;
use thiserror::Error;

use super::{
    error::XsdError,
    shared::target_namespace,
    values::{optional_attribute, required_attribute},
    Schema,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImportKind {
    Import,
    Include,
}

/// This structure represents the `import` and `include` elements; it is not a schema component.
///
/// Note that an import is allowed to have neither a `schemaLocation` nor a `namespace` attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    pub kind: ImportKind,
    pub namespace: Option<String>,
    pub schema_location: Option<String>,
}

impl Import {
    pub const IMPORT_TAG_NAME: &'static str = "import";
    pub const INCLUDE_TAG_NAME: &'static str = "include";

    pub(crate) fn map_from_xml(import: Node, schema: Node) -> Result<Self, XsdError> {
        if import.tag_name().name() == Self::INCLUDE_TAG_NAME {
            return Ok(Self {
                kind: ImportKind::Include,
                namespace: target_namespace(schema),
                schema_location: Some(required_attribute(import, "schemaLocation")?),
            });
        }

        let namespace: Option<String> = optional_attribute(import, "namespace")?;
        let schema_location = optional_attribute(import, "schemaLocation")?;

        // § 4.2.6 Schema Representation Constraint: Import Constraints and Semantics
        // 1 The appropriate case among the following must be true:
        match (namespace.as_deref(), target_namespace(schema)) {
            // 1.1 If the namespace [attribute] is present, then its ·actual value· does not match
            //   the ·actual value· of the enclosing <schema>'s targetNamespace [attribute].
            (Some(namespace), Some(target)) if namespace == target => {
                return Err(XsdError::InvalidValue {
                    what: "import namespace (equals the target namespace)",
                    value: namespace.into(),
                })
            }
            // 1.2 If the namespace [attribute] is not present, then the enclosing <schema> has a
            //   targetNamespace [attribute]
            (None, None) => {
                return Err(XsdError::MissingAttribute {
                    element: Self::IMPORT_TAG_NAME.into(),
                    attribute: "namespace",
                })
            }
            _ => {}
        }

        Ok(Self {
            kind: ImportKind::Import,
            namespace,
            schema_location,
        })
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("the resolver does not support the import")]
    UnsupportedImport,
    #[error("failed to read the schema: {0}")]
    Io(#[from] std::io::Error),
    #[error("the schema failed to parse: {0}")]
    Xsd(Box<XsdError>),
}

impl From<XsdError> for ImportError {
    fn from(error: XsdError) -> Self {
        Self::Xsd(Box::new(error))
    }
}

pub trait ImportResolver {
    fn resolve_import(&self, import: &Import) -> Result<Schema, ImportError>;
}

/// Resolves relative `schemaLocation`s against a base directory.
#[derive(Clone, Debug)]
pub struct FileImportResolver {
    base_dir: PathBuf,
}

impl FileImportResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl ImportResolver for FileImportResolver {
    fn resolve_import(&self, import: &Import) -> Result<Schema, ImportError> {
        let Some(location) = import.schema_location.as_deref() else {
            return Err(ImportError::UnsupportedImport);
        };
        if location.contains("://") {
            return Err(ImportError::UnsupportedImport);
        }
        let text = std::fs::read_to_string(self.base_dir.join(location))?;
        Ok(Schema::parse(&text)?)
    }
}
