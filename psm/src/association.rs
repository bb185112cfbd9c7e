#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{Multiplicity, PsmClass, Ref};

/// What an association (or a class union) points to
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AssociationChild {
    Class(Ref<PsmClass>),
    ClassUnion(Ref<PsmClassUnion>),
}

/// An ordered, multiplicity-bearing edge from a parent component to its child.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PsmAssociation {
    pub child: AssociationChild,
    #[cfg_attr(feature = "serde", serde(default))]
    pub multiplicity: Multiplicity,
}

/// Exclusive choice between several association children.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PsmClassUnion {
    pub components: Vec<AssociationChild>,
}
