#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{PsmClass, Ref};

/// A PSM diagram: a forest of classes reachable from `roots`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PsmDiagram {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub target_namespace: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub roots: Vec<Ref<PsmClass>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub references: Vec<DiagramReference>,
}

/// A reference from one diagram to another; classes of the referenced diagram may be represented
/// from the referencing one.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiagramReference {
    pub referenced: Ref<PsmDiagram>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub namespace: Option<String>,
    pub namespace_prefix: String,
    pub schema_location: String,
}

impl DiagramReference {
    /// The namespace, if present and non-empty.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }
}
