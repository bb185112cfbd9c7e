use roxmltree::Node;

use super::{
    annotation::Annotation,
    error::XsdError,
    particle::ModelGroup,
    shared::target_namespace,
    values::required_attribute,
    xstypes::{AnyURI, NCName, QName},
};

/// Schema Component: Model Group Definition (§3.7)
#[derive(Clone, Debug, PartialEq)]
pub struct ModelGroupDefinition {
    pub name: NCName,
    pub target_namespace: Option<AnyURI>,
    /// `None` for a definition without content
    pub model_group: Option<ModelGroup>,
    pub annotation: Option<Annotation>,
}

impl ModelGroupDefinition {
    pub const TAG_NAME: &'static str = "group";

    pub(crate) fn map_from_xml(group: Node, schema: Node) -> Result<Self, XsdError> {
        Ok(Self {
            // {name} The ·actual value· of the name [attribute]
            name: required_attribute(group, "name")?,
            // {target namespace}
            //   The ·actual value· of the targetNamespace [attribute] of the <schema> ancestor
            //   element information item if present, otherwise ·absent·.
            target_namespace: target_namespace(schema),
            // {model group}
            //   A model group which is the {term} of a particle corresponding to the <all>,
            //   <choice> or <sequence> among the [children]
            model_group: ModelGroup::map_from_group_definition(group, schema)?,
            annotation: Annotation::of(group),
        })
    }

    pub fn qualified_name(&self) -> QName {
        QName::with_optional_namespace(self.target_namespace.as_ref(), &self.name)
    }
}
