#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{Multiplicity, Ref};

/// A PSM attribute, owned either by a class or by an attribute container.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PsmAttribute {
    pub name: String,
    /// Overrides `name` in the XML representation when set
    #[cfg_attr(feature = "serde", serde(default))]
    pub alias: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub multiplicity: Multiplicity,
    #[cfg_attr(feature = "serde", serde(default))]
    pub default: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, rename = "type"))]
    pub type_: Option<DataType>,
}

impl PsmAttribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, type_: DataType) -> Self {
        self.type_ = Some(type_);
        self
    }

    pub fn with_multiplicity(mut self, multiplicity: Multiplicity) -> Self {
        self.multiplicity = multiplicity;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// The name used in XML: the alias if present and non-empty, the name otherwise.
    pub fn xml_name(&self) -> &str {
        match self.alias.as_deref() {
            Some(alias) if !alias.trim().is_empty() => alias,
            _ => &self.name,
        }
    }
}

/// The type of an attribute
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataType {
    /// An XML Schema built-in type, identified by its local name (`string`, `int`, ...)
    Builtin(String),
    Simple(Ref<SimpleDataType>),
}

impl DataType {
    pub fn builtin(local_name: impl Into<String>) -> Self {
        Self::Builtin(local_name.into())
    }
}

/// A constraining facet of a [`SimpleDataType`], e.g. `maxLength = 10`
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Facet {
    pub kind: String,
    pub value: String,
}

/// A project-defined simple type, restricting a built-in type.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimpleDataType {
    pub name: String,
    /// Local name of the restricted built-in type
    pub base: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub facets: Vec<Facet>,
}
