#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{
    PsmAssociation, PsmAttribute, PsmAttributeContainer, PsmContentChoice, PsmContentContainer,
    PsmDiagram, Ref,
};

/// A PSM class
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PsmClass {
    pub name: String,
    pub diagram: Ref<PsmDiagram>,
    /// Set if the class is realized as an XML element
    #[cfg_attr(feature = "serde", serde(default))]
    pub element_label: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_abstract: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attributes: Vec<Ref<PsmAttribute>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub components: Vec<Subordinate>,
    /// Set if this class is a structural representative of another class
    #[cfg_attr(feature = "serde", serde(default))]
    pub represented_class: Option<Ref<PsmClass>>,
    /// Generalizations in which this class is the specific one
    #[cfg_attr(feature = "serde", serde(default))]
    pub generalizations: Vec<Ref<Generalization>>,
    /// Generalizations in which this class is the general one
    #[cfg_attr(feature = "serde", serde(default))]
    pub specifications: Vec<Ref<Generalization>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub comments: Vec<String>,
}

impl PsmClass {
    pub fn new(name: impl Into<String>, diagram: Ref<PsmDiagram>) -> Self {
        Self {
            name: name.into(),
            diagram,
            element_label: None,
            is_abstract: false,
            attributes: Vec::new(),
            components: Vec::new(),
            represented_class: None,
            generalizations: Vec::new(),
            specifications: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// The element label, if present and not blank.
    pub fn label(&self) -> Option<&str> {
        self.element_label
            .as_deref()
            .filter(|label| !label.trim().is_empty())
    }

    pub fn has_element_label(&self) -> bool {
        self.label().is_some()
    }

    pub fn is_structural_representative(&self) -> bool {
        self.represented_class.is_some()
    }
}

/// A specialization edge
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Generalization {
    pub general: Ref<PsmClass>,
    pub specific: Ref<PsmClass>,
}

/// A component ordered below a class, content container or content choice
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Subordinate {
    Association(Ref<PsmAssociation>),
    ContentContainer(Ref<PsmContentContainer>),
    ContentChoice(Ref<PsmContentChoice>),
    AttributeContainer(Ref<PsmAttributeContainer>),
}

/// Anything that can own [`Subordinate`] components
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SubordinateOwner {
    Class(Ref<PsmClass>),
    ContentContainer(Ref<PsmContentContainer>),
    ContentChoice(Ref<PsmContentChoice>),
}
