use roxmltree::Node;

use super::{
    annotation::Annotation,
    attribute_decl::AttributeDeclaration,
    attribute_group_def::AttributeGroupDefinition,
    element_decl::ElementDeclaration,
    error::XsdError,
    import::Import,
    model_group_def::ModelGroupDefinition,
    shared::{target_namespace, xs_children},
    values::optional_attribute,
    xstypes::{AnyURI, Sequence, XS_NAMESPACE},
    ComplexTypeDefinition, SimpleTypeDefinition,
};

/// One top-level component of a schema document
#[derive(Clone, Debug, PartialEq)]
pub enum TopLevelComponent {
    SimpleType(SimpleTypeDefinition),
    ComplexType(ComplexTypeDefinition),
    Element(ElementDeclaration),
    Attribute(AttributeDeclaration),
    AttributeGroup(AttributeGroupDefinition),
    Group(ModelGroupDefinition),
}

/// A single schema document (§3.17), with its top-level components in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    pub target_namespace: Option<AnyURI>,
    pub element_form_default_qualified: bool,
    pub imports: Sequence<Import>,
    pub components: Sequence<TopLevelComponent>,
    pub annotations: Sequence<Annotation>,
}

macro_rules! components_of_kind {
    ($fn_name:ident, $variant:ident, $type_name:ty) => {
        pub fn $fn_name(&self) -> impl Iterator<Item = &$type_name> {
            self.components.iter().filter_map(|component| match component {
                TopLevelComponent::$variant(c) => Some(c),
                _ => None,
            })
        }
    };
}

impl Schema {
    pub fn parse(text: &str) -> Result<Self, XsdError> {
        let document = roxmltree::Document::parse(text)?;
        Self::map_from_xml(document.root_element())
    }

    pub fn map_from_xml(schema: Node) -> Result<Self, XsdError> {
        if schema.tag_name().name() != "schema"
            || schema.tag_name().namespace() != Some(XS_NAMESPACE)
        {
            return Err(XsdError::NotASchema(schema.tag_name().name().into()));
        }

        let element_form_default: Option<&str> =
            optional_attribute(schema, "elementFormDefault")?;

        let mut imports = Sequence::new();
        let mut components = Sequence::new();
        let mut annotations = Sequence::new();

        for child in xs_children(schema) {
            let component = match child.tag_name().name() {
                SimpleTypeDefinition::TAG_NAME => TopLevelComponent::SimpleType(
                    SimpleTypeDefinition::map_from_xml(child, schema, true)?,
                ),
                ComplexTypeDefinition::TAG_NAME => TopLevelComponent::ComplexType(
                    ComplexTypeDefinition::map_from_xml(child, schema, true)?,
                ),
                ElementDeclaration::TAG_NAME => TopLevelComponent::Element(
                    ElementDeclaration::map_from_xml(child, schema, true)?,
                ),
                AttributeDeclaration::TAG_NAME => TopLevelComponent::Attribute(
                    AttributeDeclaration::map_from_xml(child, schema, true)?,
                ),
                AttributeGroupDefinition::TAG_NAME => TopLevelComponent::AttributeGroup(
                    AttributeGroupDefinition::map_from_xml(child, schema)?,
                ),
                ModelGroupDefinition::TAG_NAME => {
                    TopLevelComponent::Group(ModelGroupDefinition::map_from_xml(child, schema)?)
                }
                Import::IMPORT_TAG_NAME | Import::INCLUDE_TAG_NAME => {
                    imports.push(Import::map_from_xml(child, schema)?);
                    continue;
                }
                Annotation::TAG_NAME => {
                    annotations.push(Annotation::map_from_xml(child));
                    continue;
                }
                other => {
                    tracing::debug!("skipping unsupported top-level element <{other}>");
                    continue;
                }
            };
            components.push(component);
        }

        Ok(Self {
            target_namespace: target_namespace(schema),
            element_form_default_qualified: element_form_default == Some("qualified"),
            imports,
            components,
            annotations,
        })
    }

    components_of_kind!(simple_types, SimpleType, SimpleTypeDefinition);
    components_of_kind!(complex_types, ComplexType, ComplexTypeDefinition);
    components_of_kind!(elements, Element, ElementDeclaration);
    components_of_kind!(attributes, Attribute, AttributeDeclaration);
    components_of_kind!(attribute_groups, AttributeGroup, AttributeGroupDefinition);
    components_of_kind!(groups, Group, ModelGroupDefinition);
}
