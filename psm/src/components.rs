use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::num::{NonZeroU32, NonZeroUsize};

use super::{
    AssociationChild, Generalization, PsmAssociation, PsmAttribute, PsmAttributeContainer,
    PsmClass, PsmClassUnion, PsmContentChoice, PsmContentContainer, PsmDiagram, PsmProject,
    SimpleDataType,
};

/// Trait implemented by all model elements stored in a [`PsmProject`].
pub trait Component {
    const DISPLAY_NAME: &'static str;
}

/// Type on which the arena access traits are implemented.
///
/// This keeps the container accessors out of the public [`Component`] trait.
pub struct ComponentTraits;

/// A component stored in one of the project's arena containers. Intended for internal use.
pub trait HasArenaContainer<C: Component>: Sized {
    fn container(project: &PsmProject) -> &[C];
    fn container_mut(project: &mut PsmProject) -> &mut Vec<C>;
}

/// A reference to a [`Component`] stored in a [`PsmProject`].
pub struct Ref<C: Component>(NonZeroU32, PhantomData<C>);

impl<C: Component> Ref<C> {
    pub(crate) fn from_index(index: usize) -> Self {
        // IDs are one-based so that `Option<Ref<_>>` stays pointer-sized
        let size = NonZeroUsize::new(index + 1).expect("index + 1 is never zero");
        let id: NonZeroU32 = size.try_into().expect("ID did not fit into 32-bit integer");
        Self(id, PhantomData)
    }

    pub(crate) fn index(self) -> usize {
        let size: NonZeroUsize = self
            .0
            .try_into()
            .expect("Could not convert component reference to usize index");
        usize::from(size) - 1
    }

    /// The raw numeric ID, stable for the lifetime of the project.
    pub fn id(self) -> u32 {
        self.0.get()
    }

    pub fn get(self, project: &PsmProject) -> &C
    where
        ComponentTraits: HasArenaContainer<C>,
    {
        project.get(self)
    }
}

// derive(...) does not work if C itself does not derive the trait, even though it is only "used"
// in the PhantomData; hence the manual implementations.

impl<C: Component> Copy for Ref<C> {}

impl<C: Component> Clone for Ref<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Component> fmt::Debug for Ref<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{} #{}>", C::DISPLAY_NAME, self.0)
    }
}

impl<C: Component> PartialEq for Ref<C> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<C: Component> Eq for Ref<C> {}

impl<C: Component> PartialOrd for Ref<C> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<C: Component> Ord for Ref<C> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl<C: Component> Hash for Ref<C> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

#[cfg(feature = "serde")]
impl<C: Component> serde::Serialize for Ref<C> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0.get())
    }
}

#[cfg(feature = "serde")]
impl<'de, C: Component> serde::Deserialize<'de> for Ref<C> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = NonZeroU32::deserialize(deserializer)?;
        Ok(Self(id, PhantomData))
    }
}

macro_rules! has_arena_container_impl {
    ($type_name:ty, $field_name:ident) => {
        impl Component for $type_name {
            const DISPLAY_NAME: &'static str = stringify!($type_name);
        }

        impl HasArenaContainer<$type_name> for ComponentTraits {
            fn container(project: &PsmProject) -> &[$type_name] {
                &project.$field_name
            }

            fn container_mut(project: &mut PsmProject) -> &mut Vec<$type_name> {
                &mut project.$field_name
            }
        }
    };
}

has_arena_container_impl!(PsmDiagram, diagrams);
has_arena_container_impl!(PsmClass, classes);
has_arena_container_impl!(PsmAttribute, attributes);
has_arena_container_impl!(PsmAssociation, associations);
has_arena_container_impl!(PsmClassUnion, class_unions);
has_arena_container_impl!(PsmContentContainer, content_containers);
has_arena_container_impl!(PsmContentChoice, content_choices);
has_arena_container_impl!(PsmAttributeContainer, attribute_containers);
has_arena_container_impl!(Generalization, generalizations);
has_arena_container_impl!(SimpleDataType, simple_types);

impl From<Ref<PsmClass>> for AssociationChild {
    fn from(class: Ref<PsmClass>) -> Self {
        Self::Class(class)
    }
}

impl From<Ref<PsmClassUnion>> for AssociationChild {
    fn from(union: Ref<PsmClassUnion>) -> Self {
        Self::ClassUnion(union)
    }
}
