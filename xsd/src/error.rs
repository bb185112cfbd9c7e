use thiserror::Error;

use super::import::ImportError;

#[derive(Debug, Error)]
pub enum XsdError {
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("the root element is <{0}>, not <xs:schema>")]
    NotASchema(String),
    #[error("failed to resolve prefix {0:?} to a namespace URI")]
    NamePrefixNotResolved(String),
    #[error("<{element}> is missing the required attribute {attribute:?}")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
    #[error("invalid value {value:?} for {what}")]
    InvalidValue { what: &'static str, value: String },
    #[error("duplicate {kind} {name}")]
    DuplicateComponent { kind: &'static str, name: String },
    #[error("failed to import {location:?}: {source}")]
    Import {
        location: String,
        #[source]
        source: ImportError,
    },
}
