use roxmltree::Node;

use super::{
    annotation::Annotation,
    error::XsdError,
    shared::{target_namespace, xs_child},
    values::optional_attribute,
    xstypes::{AnyURI, NCName, QName},
    ComplexTypeDefinition, SimpleTypeDefinition,
};

/// Schema Component: Element Declaration (§3.3), restricted to what the translators consume.
///
/// Element references (`<element ref="..."/>`) are kept unresolved.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementDeclaration {
    pub name: Option<NCName>,
    pub target_namespace: Option<AnyURI>,
    pub reference: Option<QName>,
    pub type_name: Option<QName>,
    pub inline_type: Option<InlineType>,
    pub default: Option<String>,
    pub fixed: Option<String>,
    pub is_abstract: bool,
    pub annotation: Option<Annotation>,
}

/// An anonymous type definition nested in an element declaration
#[derive(Clone, Debug, PartialEq)]
pub enum InlineType {
    Simple(SimpleTypeDefinition),
    Complex(ComplexTypeDefinition),
}

impl ElementDeclaration {
    pub const TAG_NAME: &'static str = "element";

    pub(crate) fn map_from_xml(element: Node, schema: Node, global: bool) -> Result<Self, XsdError> {
        let name: Option<NCName> = optional_attribute(element, "name")?;
        let reference: Option<QName> = optional_attribute(element, "ref")?;
        if name.is_none() && reference.is_none() {
            return Err(XsdError::MissingAttribute {
                element: Self::TAG_NAME.into(),
                attribute: "name",
            });
        }

        // {target namespace}
        //   Global declarations take the targetNamespace of the <schema>; local ones depend on
        //   the form, which only matters for naming globals here.
        let target_namespace = if global {
            target_namespace(schema)
        } else {
            None
        };

        let inline_type = if let Some(simple_type) = xs_child(element, SimpleTypeDefinition::TAG_NAME)
        {
            Some(InlineType::Simple(SimpleTypeDefinition::map_from_xml(
                simple_type,
                schema,
                false,
            )?))
        } else if let Some(complex_type) = xs_child(element, ComplexTypeDefinition::TAG_NAME) {
            Some(InlineType::Complex(ComplexTypeDefinition::map_from_xml(
                complex_type,
                schema,
                false,
            )?))
        } else {
            None
        };

        Ok(Self {
            name,
            target_namespace,
            reference,
            type_name: optional_attribute(element, "type")?,
            inline_type,
            default: optional_attribute(element, "default")?,
            fixed: optional_attribute(element, "fixed")?,
            is_abstract: optional_attribute(element, "abstract")?.unwrap_or(false),
            annotation: Annotation::of(element),
        })
    }

    /// The qualified name of a global declaration
    pub fn qualified_name(&self) -> Option<QName> {
        self.name
            .as_ref()
            .map(|name| QName::with_optional_namespace(self.target_namespace.as_ref(), name))
    }

    /// The local name of the element, following the reference if necessary.
    pub fn local_name(&self) -> &str {
        self.name
            .as_deref()
            .or_else(|| self.reference.as_ref().map(|r| r.local_name.as_str()))
            .unwrap_or_default()
    }
}
