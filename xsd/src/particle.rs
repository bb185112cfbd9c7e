use roxmltree::Node;

use super::{
    annotation::Annotation,
    error::XsdError,
    shared::xs_children,
    values::{optional_attribute, required_attribute},
    xstypes::{QName, Sequence},
    ElementDeclaration,
};

/// Schema Component: Particle (§3.9)
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    pub term: Term,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MaxOccurs {
    Unbounded,
    Count(u32),
}

/// The terms that can appear in a [`Particle`]. Group references are kept unresolved.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    Element(Box<ElementDeclaration>),
    ModelGroup(ModelGroup),
    GroupRef(QName),
    Any,
}

/// Schema Component: Model Group (§3.8)
#[derive(Clone, Debug, PartialEq)]
pub struct ModelGroup {
    pub compositor: Compositor,
    pub particles: Sequence<Particle>,
    pub annotation: Option<Annotation>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Compositor {
    All,
    Choice,
    Sequence,
}

impl Compositor {
    fn from_tag_name(tag_name: &str) -> Option<Self> {
        match tag_name {
            "all" => Some(Self::All),
            "choice" => Some(Self::Choice),
            "sequence" => Some(Self::Sequence),
            _ => None,
        }
    }
}

impl Particle {
    pub fn is_single(&self) -> bool {
        self.min_occurs == 1 && self.max_occurs == MaxOccurs::Count(1)
    }

    /// {min occurs} and {max occurs}: the actual values of the minOccurs and maxOccurs
    /// attributes, defaulting to 1.
    pub(crate) fn occurs(node: Node) -> Result<(u32, MaxOccurs), XsdError> {
        let min_occurs = optional_attribute(node, "minOccurs")?.unwrap_or(1);
        let max_occurs = optional_attribute(node, "maxOccurs")?.unwrap_or(MaxOccurs::Count(1));
        Ok((min_occurs, max_occurs))
    }

    /// Maps any particle-bearing child (`<element>`, `<sequence>`, `<choice>`, `<all>`,
    /// `<group ref>` or `<any>`). Other children yield `None`.
    pub(crate) fn map_from_xml(node: Node, schema: Node) -> Result<Option<Self>, XsdError> {
        let tag_name = node.tag_name().name();
        let term = if let Some(compositor) = Compositor::from_tag_name(tag_name) {
            Term::ModelGroup(ModelGroup::map_from_xml(node, schema, compositor)?)
        } else {
            match tag_name {
                ElementDeclaration::TAG_NAME => Term::Element(Box::new(
                    ElementDeclaration::map_from_xml(node, schema, false)?,
                )),
                "group" => Term::GroupRef(required_attribute(node, "ref")?),
                "any" => Term::Any,
                _ => return Ok(None),
            }
        };
        let (min_occurs, max_occurs) = Self::occurs(node)?;
        Ok(Some(Self {
            min_occurs,
            max_occurs,
            term,
        }))
    }

    /// Maps the single `<all>`, `<choice>` or `<sequence>` child of `parent`, if there is one.
    pub(crate) fn map_model_group_child(
        parent: Node,
        schema: Node,
    ) -> Result<Option<Self>, XsdError> {
        for child in xs_children(parent) {
            let name = child.tag_name().name();
            if Compositor::from_tag_name(name).is_some() || name == "group" {
                return Self::map_from_xml(child, schema);
            }
        }
        Ok(None)
    }
}

impl ModelGroup {
    pub(crate) fn map_from_xml(
        node: Node,
        schema: Node,
        compositor: Compositor,
    ) -> Result<Self, XsdError> {
        // {particles}
        //   A sequence of particles corresponding to all the <all>, <choice>, <sequence>,
        //   <any>, <group> or <element> items among the [children], in order.
        let mut particles = Sequence::new();
        for child in xs_children(node) {
            if let Some(particle) = Particle::map_from_xml(child, schema)? {
                particles.push(particle);
            }
        }
        Ok(Self {
            compositor,
            particles,
            annotation: Annotation::of(node),
        })
    }

    /// Maps the `<all>`, `<choice>` or `<sequence>` child of a `<group>` definition.
    pub(crate) fn map_from_group_definition(
        group: Node,
        schema: Node,
    ) -> Result<Option<Self>, XsdError> {
        for child in xs_children(group) {
            if let Some(compositor) = Compositor::from_tag_name(child.tag_name().name()) {
                return Self::map_from_xml(child, schema, compositor).map(Some);
            }
        }
        Ok(None)
    }
}
