//! Reading XML Schema documents into a component model suitable for schema translation.
//!
//! Unlike a full schema processor, references between components (types, groups, element and
//! attribute references) are kept as qualified names; a [`SchemaSet`] provides the lookup tables
//! to follow them.

pub mod annotation;
pub mod attribute_decl;
pub mod attribute_group_def;
pub mod builtins;
pub mod complex_type_def;
pub mod element_decl;
pub mod error;
pub mod import;
pub mod model_group_def;
pub mod particle;
pub mod schema;
pub mod schema_set;
mod shared;
pub mod simple_type_def;
pub mod values;
pub mod xstypes;

pub use annotation::Annotation;
pub use attribute_decl::{AttributeDeclaration, AttributeUse, Use};
pub use attribute_group_def::AttributeGroupDefinition;
pub use complex_type_def::{ComplexTypeDefinition, ContentType, Derivation, DerivationMethod};
pub use element_decl::{ElementDeclaration, InlineType};
pub use error::XsdError;
pub use import::{FileImportResolver, Import, ImportError, ImportKind, ImportResolver};
pub use model_group_def::ModelGroupDefinition;
pub use particle::{Compositor, MaxOccurs, ModelGroup, Particle, Term};
pub use schema::{Schema, TopLevelComponent};
pub use schema_set::{Lookup, SchemaSet};
pub use simple_type_def::{ConstrainingFacet, SimpleTypeDefinition, SimpleVariety};
pub use xstypes::{QName, XS_NAMESPACE};
