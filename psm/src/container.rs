#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{PsmAttribute, Ref, Subordinate};

/// Named grouping node; realized as a nested element.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PsmContentContainer {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub components: Vec<Subordinate>,
}

/// Exclusive-or grouping node; realized as `xs:choice`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PsmContentChoice {
    #[cfg_attr(feature = "serde", serde(default))]
    pub components: Vec<Subordinate>,
}

/// Attributes promoted out of a class body; each one is realized as an element.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PsmAttributeContainer {
    pub attributes: Vec<Ref<PsmAttribute>>,
}
