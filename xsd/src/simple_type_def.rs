use roxmltree::Node;

use super::{
    annotation::Annotation,
    error::XsdError,
    shared::{target_namespace, xs_child, xs_children},
    values::{optional_attribute, required_attribute},
    xstypes::{AnyURI, NCName, QName, Sequence},
};

/// Schema Component: Simple Type Definition (§3.16)
#[derive(Clone, Debug, PartialEq)]
pub struct SimpleTypeDefinition {
    pub name: Option<NCName>,
    pub target_namespace: Option<AnyURI>,
    pub variety: SimpleVariety,
    pub annotation: Option<Annotation>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SimpleVariety {
    /// `<restriction>`; the base is `None` when it is given as an anonymous `<simpleType>`.
    Restriction {
        base: Option<QName>,
        facets: Sequence<ConstrainingFacet>,
    },
    List {
        item_type: Option<QName>,
    },
    Union {
        member_types: Sequence<QName>,
    },
}

/// A constraining facet (§4.3) in its lexical form, e.g. `maxLength = "20"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstrainingFacet {
    pub kind: String,
    pub value: String,
}

const FACET_TAG_NAMES: &[&str] = &[
    "length",
    "minLength",
    "maxLength",
    "pattern",
    "enumeration",
    "whiteSpace",
    "maxInclusive",
    "maxExclusive",
    "minExclusive",
    "minInclusive",
    "totalDigits",
    "fractionDigits",
    "explicitTimezone",
];

impl SimpleTypeDefinition {
    pub const TAG_NAME: &'static str = "simpleType";

    pub(crate) fn map_from_xml(
        simple_type: Node,
        schema: Node,
        global: bool,
    ) -> Result<Self, XsdError> {
        let name = optional_attribute(simple_type, "name")?;
        if global && name.is_none() {
            return Err(XsdError::MissingAttribute {
                element: Self::TAG_NAME.into(),
                attribute: "name",
            });
        }

        let variety = if let Some(restriction) = xs_child(simple_type, "restriction") {
            let mut facets = Sequence::new();
            for facet in xs_children(restriction)
                .filter(|child| FACET_TAG_NAMES.contains(&child.tag_name().name()))
            {
                facets.push(ConstrainingFacet {
                    kind: facet.tag_name().name().to_string(),
                    value: required_attribute(facet, "value")?,
                });
            }
            SimpleVariety::Restriction {
                base: optional_attribute(restriction, "base")?,
                facets,
            }
        } else if let Some(list) = xs_child(simple_type, "list") {
            SimpleVariety::List {
                item_type: optional_attribute(list, "itemType")?,
            }
        } else if let Some(union) = xs_child(simple_type, "union") {
            SimpleVariety::Union {
                member_types: optional_attribute(union, "memberTypes")?.unwrap_or_default(),
            }
        } else {
            return Err(XsdError::MissingAttribute {
                element: Self::TAG_NAME.into(),
                attribute: "restriction",
            });
        };

        Ok(Self {
            name,
            target_namespace: if global { target_namespace(schema) } else { None },
            variety,
            annotation: Annotation::of(simple_type),
        })
    }

    pub fn qualified_name(&self) -> Option<QName> {
        self.name
            .as_ref()
            .map(|name| QName::with_optional_namespace(self.target_namespace.as_ref(), name))
    }

    /// The named base type of a restriction, if any.
    pub fn base(&self) -> Option<&QName> {
        match &self.variety {
            SimpleVariety::Restriction { base, .. } => base.as_ref(),
            _ => None,
        }
    }

    pub fn facets(&self) -> &[ConstrainingFacet] {
        match &self.variety {
            SimpleVariety::Restriction { facets, .. } => facets,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Schema;

    #[test]
    fn reads_restriction_facets() {
        let schema = Schema::parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:t">
                <xs:simpleType name="Code">
                    <xs:restriction base="xs:string">
                        <xs:maxLength value="8"/>
                        <xs:pattern value="[A-Z]+"/>
                    </xs:restriction>
                </xs:simpleType>
            </xs:schema>"#,
        )
        .unwrap();
        let code = schema.simple_types().next().unwrap();
        assert_eq!(code.qualified_name(), Some(QName::with_namespace("urn:t", "Code")));
        assert_eq!(code.base(), Some(&QName::xs("string")));
        let kinds: Vec<_> = code.facets().iter().map(|f| f.kind.as_str()).collect();
        assert_eq!(kinds, ["maxLength", "pattern"]);
    }
}
