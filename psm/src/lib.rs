//! Arena-based Platform-Specific Model (PSM) graph.
//!
//! The schema translators treat this model as a given data source: diagrams are forests of
//! [`PsmClass`]es reachable from their roots, connected through associations, content containers,
//! content choices, attribute containers, generalizations and structural-representative links.

pub mod association;
pub mod attribute;
pub mod class;
pub mod components;
pub mod container;
pub mod diagram;
pub mod multiplicity;
pub mod project;
pub mod validate;

pub use association::{AssociationChild, PsmAssociation, PsmClassUnion};
pub use attribute::{DataType, Facet, PsmAttribute, SimpleDataType};
pub use class::{Generalization, PsmClass, Subordinate, SubordinateOwner};
pub use components::{Component, Ref};
pub use container::{PsmAttributeContainer, PsmContentChoice, PsmContentContainer};
pub use diagram::{DiagramReference, PsmDiagram};
pub use multiplicity::{Multiplicity, MultiplicityError, UpperBound};
pub use project::PsmProject;
pub use validate::ValidationError;

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn project_survives_json() {
        let mut project = PsmProject::new();
        let diagram = project.add_diagram("library");
        let book = project.add_root_class(diagram, "Book");
        project.get_mut(book).element_label = Some("book".into());
        project.add_attribute(
            book,
            PsmAttribute::new("isbn")
                .with_type(DataType::builtin("string"))
                .with_multiplicity(Multiplicity::OPTIONAL),
        );

        let json = serde_json::to_string(&project).unwrap();
        assert!(json.contains("\"multiplicity\":\"0..1\""));
        let parsed: PsmProject = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, project);
    }
}
