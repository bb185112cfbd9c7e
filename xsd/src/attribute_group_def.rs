use roxmltree::Node;

use super::{
    annotation::Annotation,
    attribute_decl::AttributeUse,
    error::XsdError,
    shared::target_namespace,
    values::required_attribute,
    xstypes::{AnyURI, NCName, QName, Sequence},
};

/// Schema Component: Attribute Group Definition (§3.6)
///
/// Nested `<attributeGroup ref>`s are kept as [`AttributeUse::GroupRef`].
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeGroupDefinition {
    pub name: NCName,
    pub target_namespace: Option<AnyURI>,
    pub attribute_uses: Sequence<AttributeUse>,
    pub annotation: Option<Annotation>,
}

impl AttributeGroupDefinition {
    pub const TAG_NAME: &'static str = "attributeGroup";

    pub(crate) fn map_from_xml(attribute_group: Node, schema: Node) -> Result<Self, XsdError> {
        Ok(Self {
            name: required_attribute(attribute_group, "name")?,
            target_namespace: target_namespace(schema),
            attribute_uses: AttributeUse::map_children(attribute_group, schema)?,
            annotation: Annotation::of(attribute_group),
        })
    }

    pub fn qualified_name(&self) -> QName {
        QName::with_optional_namespace(self.target_namespace.as_ref(), &self.name)
    }
}
