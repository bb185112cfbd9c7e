use roxmltree::Node;

use super::{
    annotation::Annotation,
    attribute_decl::AttributeUse,
    error::XsdError,
    particle::Particle,
    shared::{target_namespace, xs_child},
    values::{optional_attribute, required_attribute},
    xstypes::{AnyURI, NCName, QName, Sequence},
};

/// Schema Component: Complex Type Definition (§3.4)
///
/// The content is kept in the shape it was written in; derivations are not expanded.
#[derive(Clone, Debug, PartialEq)]
pub struct ComplexTypeDefinition {
    pub name: Option<NCName>,
    pub target_namespace: Option<AnyURI>,
    pub is_abstract: bool,
    pub mixed: bool,
    pub content: ContentType,
    /// Attributes declared directly on the `<complexType>`
    pub attributes: Sequence<AttributeUse>,
    pub annotation: Option<Annotation>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ContentType {
    Empty,
    Particle(Particle),
    /// `<simpleContent>`
    Simple(Derivation),
    /// `<complexContent>`
    Complex(Derivation),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DerivationMethod {
    Extension,
    Restriction,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Derivation {
    pub method: DerivationMethod,
    pub base: QName,
    pub particle: Option<Particle>,
    pub attributes: Sequence<AttributeUse>,
}

impl Derivation {
    fn map_from_xml(content: Node, schema: Node) -> Result<Self, XsdError> {
        let (method, derivation) = if let Some(extension) = xs_child(content, "extension") {
            (DerivationMethod::Extension, extension)
        } else if let Some(restriction) = xs_child(content, "restriction") {
            (DerivationMethod::Restriction, restriction)
        } else {
            return Err(XsdError::MissingAttribute {
                element: content.tag_name().name().into(),
                attribute: "extension",
            });
        };
        Ok(Self {
            method,
            base: required_attribute(derivation, "base")?,
            particle: Particle::map_model_group_child(derivation, schema)?,
            attributes: AttributeUse::map_children(derivation, schema)?,
        })
    }
}

impl ComplexTypeDefinition {
    pub const TAG_NAME: &'static str = "complexType";

    pub(crate) fn map_from_xml(
        complex_type: Node,
        schema: Node,
        global: bool,
    ) -> Result<Self, XsdError> {
        let name = optional_attribute(complex_type, "name")?;
        if global && name.is_none() {
            return Err(XsdError::MissingAttribute {
                element: Self::TAG_NAME.into(),
                attribute: "name",
            });
        }

        let mut mixed = optional_attribute(complex_type, "mixed")?.unwrap_or(false);
        let content = if let Some(simple_content) = xs_child(complex_type, "simpleContent") {
            ContentType::Simple(Derivation::map_from_xml(simple_content, schema)?)
        } else if let Some(complex_content) = xs_child(complex_type, "complexContent") {
            // The mixed [attribute] of <complexContent> takes precedence if present
            if let Some(content_mixed) = optional_attribute(complex_content, "mixed")? {
                mixed = content_mixed;
            }
            ContentType::Complex(Derivation::map_from_xml(complex_content, schema)?)
        } else {
            match Particle::map_model_group_child(complex_type, schema)? {
                Some(particle) => ContentType::Particle(particle),
                None => ContentType::Empty,
            }
        };

        Ok(Self {
            name,
            target_namespace: if global { target_namespace(schema) } else { None },
            is_abstract: optional_attribute(complex_type, "abstract")?.unwrap_or(false),
            mixed,
            content,
            attributes: AttributeUse::map_children(complex_type, schema)?,
            annotation: Annotation::of(complex_type),
        })
    }

    pub fn qualified_name(&self) -> Option<QName> {
        self.name
            .as_ref()
            .map(|name| QName::with_optional_namespace(self.target_namespace.as_ref(), name))
    }

    /// The particle describing the element content, wherever it is written.
    pub fn particle(&self) -> Option<&Particle> {
        match &self.content {
            ContentType::Particle(particle) => Some(particle),
            ContentType::Complex(derivation) => derivation.particle.as_ref(),
            ContentType::Empty | ContentType::Simple(_) => None,
        }
    }

    /// All attribute uses, those of a derivation following the directly declared ones.
    pub fn attribute_uses(&self) -> impl Iterator<Item = &AttributeUse> {
        let derived: &[AttributeUse] = match &self.content {
            ContentType::Simple(derivation) | ContentType::Complex(derivation) => {
                &derivation.attributes
            }
            _ => &[],
        };
        self.attributes.iter().chain(derived)
    }

    pub fn derivation(&self) -> Option<&Derivation> {
        match &self.content {
            ContentType::Simple(derivation) | ContentType::Complex(derivation) => Some(derivation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{particle::Term, AttributeUse, Schema};

    #[test]
    fn reads_extension_content() {
        let schema = Schema::parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:complexType name="Student">
                    <xs:complexContent>
                        <xs:extension base="Person">
                            <xs:sequence>
                                <xs:element name="school" type="xs:string"/>
                            </xs:sequence>
                            <xs:attribute name="id" type="xs:int" use="required"/>
                        </xs:extension>
                    </xs:complexContent>
                </xs:complexType>
            </xs:schema>"#,
        )
        .unwrap();
        let student = schema.complex_types().next().unwrap();
        let derivation = student.derivation().unwrap();
        assert_eq!(derivation.method, DerivationMethod::Extension);
        assert_eq!(derivation.base.local_name, "Person");
        let Some(Particle {
            term: Term::ModelGroup(group),
            ..
        }) = student.particle()
        else {
            panic!("expected a model group");
        };
        assert_eq!(group.particles.len(), 1);
        assert!(matches!(
            student.attribute_uses().next(),
            Some(AttributeUse::Attribute(attribute)) if attribute.local_name() == "id"
        ));
    }
}
