use roxmltree::Node;

use super::{
    annotation::Annotation,
    error::XsdError,
    shared::{target_namespace, xs_child, xs_children},
    values::{optional_attribute, required_attribute, ActualValue},
    xstypes::{AnyURI, NCName, QName},
    SimpleTypeDefinition,
};

/// Schema Component: Attribute Declaration (§3.2) together with its use (§3.5)
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeDeclaration {
    pub name: Option<NCName>,
    pub target_namespace: Option<AnyURI>,
    pub reference: Option<QName>,
    pub type_name: Option<QName>,
    pub inline_type: Option<SimpleTypeDefinition>,
    /// `{use}` as written; absent means [`Use::Optional`]
    pub use_: Option<Use>,
    pub default: Option<String>,
    pub fixed: Option<String>,
    pub annotation: Option<Annotation>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Use {
    #[default]
    Optional,
    Required,
    Prohibited,
}

impl ActualValue<'_> for Use {
    fn convert(src: &str, _parent: Node) -> Result<Self, XsdError> {
        match src.trim() {
            "optional" => Ok(Self::Optional),
            "required" => Ok(Self::Required),
            "prohibited" => Ok(Self::Prohibited),
            _ => Err(XsdError::InvalidValue {
                what: "attribute use",
                value: src.into(),
            }),
        }
    }
}

/// An entry of an attribute list: an attribute or a reference to an attribute group.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeUse {
    Attribute(AttributeDeclaration),
    GroupRef(QName),
}

impl AttributeDeclaration {
    pub const TAG_NAME: &'static str = "attribute";

    pub(crate) fn map_from_xml(
        attribute: Node,
        schema: Node,
        global: bool,
    ) -> Result<Self, XsdError> {
        let name: Option<NCName> = optional_attribute(attribute, "name")?;
        let reference: Option<QName> = optional_attribute(attribute, "ref")?;
        if name.is_none() && reference.is_none() {
            return Err(XsdError::MissingAttribute {
                element: Self::TAG_NAME.into(),
                attribute: "name",
            });
        }
        let inline_type = xs_child(attribute, SimpleTypeDefinition::TAG_NAME)
            .map(|simple_type| SimpleTypeDefinition::map_from_xml(simple_type, schema, false))
            .transpose()?;

        Ok(Self {
            name,
            target_namespace: if global { target_namespace(schema) } else { None },
            reference,
            type_name: optional_attribute(attribute, "type")?,
            inline_type,
            use_: optional_attribute(attribute, "use")?,
            default: optional_attribute(attribute, "default")?,
            fixed: optional_attribute(attribute, "fixed")?,
            annotation: Annotation::of(attribute),
        })
    }

    pub fn qualified_name(&self) -> Option<QName> {
        self.name
            .as_ref()
            .map(|name| QName::with_optional_namespace(self.target_namespace.as_ref(), name))
    }

    pub fn effective_use(&self) -> Use {
        self.use_.unwrap_or_default()
    }

    pub fn local_name(&self) -> &str {
        self.name
            .as_deref()
            .or_else(|| self.reference.as_ref().map(|r| r.local_name.as_str()))
            .unwrap_or_default()
    }
}

impl AttributeUse {
    /// Maps the `<attribute>` and `<attributeGroup ref>` children of `parent`, in order.
    pub(crate) fn map_children(parent: Node, schema: Node) -> Result<Vec<Self>, XsdError> {
        let mut uses = Vec::new();
        for child in xs_children(parent) {
            match child.tag_name().name() {
                AttributeDeclaration::TAG_NAME => uses.push(Self::Attribute(
                    AttributeDeclaration::map_from_xml(child, schema, false)?,
                )),
                "attributeGroup" => uses.push(Self::GroupRef(required_attribute(child, "ref")?)),
                _ => {}
            }
        }
        Ok(uses)
    }
}
