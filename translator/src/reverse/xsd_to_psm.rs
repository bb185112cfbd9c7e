//! Reads a compiled schema into a [`PDiagram`].
//!
//! Global components are processed in declaration order: simple types, complex types, attribute
//! groups, model groups and finally elements. References between components are recorded
//! unresolved and followed by the post-processing passes.

use std::collections::{HashMap, HashSet};

use xcase_psm::{Facet, Multiplicity, SimpleDataType, UpperBound};
use xcase_xsd::builtins::{is_builtin_name, XS_ANY_TYPE_NAME};
use xcase_xsd::{
    Annotation, AttributeDeclaration, AttributeGroupDefinition, AttributeUse,
    ComplexTypeDefinition, Compositor, ContentType, DerivationMethod, ElementDeclaration,
    InlineType, MaxOccurs, ModelGroupDefinition, Particle, QName, SchemaSet, SimpleTypeDefinition,
    SimpleVariety, Term, Use,
};

use super::p_psm::{NodeId, PAttribute, PClass, PDiagram, PNodeKind, PType, SrTarget};
use crate::config::ReverseOptions;
use crate::forward::naming::{attribute_group_name, optional_attribute_group_name};
use crate::log::{MessageId, TranslationLog};

/// Name of the attribute that receives the text content of simple-content elements
pub const VALUE_ATTRIBUTE: &str = "value";

const MODEL_GROUP_SUFFIX: &str = "-c";

/// One reverse translation run.
pub struct XsdToPsm<'s, 'l> {
    pub(super) set: &'s SchemaSet,
    pub(super) options: ReverseOptions,
    pub(super) log: &'l mut TranslationLog,
    pub(super) diagram: PDiagram,
    used_names: HashMap<String, u32>,
}

impl<'s, 'l> XsdToPsm<'s, 'l> {
    pub fn new(set: &'s SchemaSet, options: ReverseOptions, log: &'l mut TranslationLog) -> Self {
        Self {
            set,
            options,
            log,
            diagram: PDiagram::new(),
            used_names: HashMap::new(),
        }
    }

    /// Builds and post-processes the tree of the whole schema set.
    pub fn process(mut self) -> PDiagram {
        let set = self.set;
        for (_, simple_type) in set.iter::<SimpleTypeDefinition>() {
            self.process_simple_type(simple_type);
        }
        for (name, complex_type) in set.iter::<ComplexTypeDefinition>() {
            let class = PClass::new(self.unique_name(&name.local_name));
            let node = self.diagram.add_node(None, PNodeKind::Class(class));
            self.diagram.type_roots.insert(name.clone(), node);
            self.process_complex_type(node, complex_type);
        }
        tracing::debug!(
            "{} attribute groups are resolved by copying",
            set.iter::<AttributeGroupDefinition>().count()
        );
        for (name, group) in set.iter::<ModelGroupDefinition>() {
            self.process_group(name, group);
        }
        for (name, element) in set.iter::<ElementDeclaration>() {
            self.process_global_element(name, element);
        }

        self.post_process();
        self.diagram
    }

    pub(super) fn unique_name(&mut self, base: &str) -> String {
        let base = if base.trim().is_empty() { "Class" } else { base };
        let counter = self.used_names.entry(base.to_string()).or_insert(0);
        *counter += 1;
        match *counter {
            1 => base.to_string(),
            n => format!("{base}{n}"),
        }
    }

    pub(super) fn lossy(&mut self, message: impl Into<String>) {
        self.log.add(MessageId::RevLossyConstruct, message);
    }

    pub(super) fn unresolved(&mut self, message: impl Into<String>) {
        self.log.add(MessageId::RevUnresolvedReference, message);
    }

    pub(super) fn internal(&mut self, message: impl Into<String>) {
        self.log.add(MessageId::RevInternal, message);
    }

    fn process_simple_type(&mut self, simple_type: &SimpleTypeDefinition) {
        let Some(name) = simple_type.name.clone() else {
            return;
        };
        let base = self.builtin_base(simple_type);
        let facets = simple_type
            .facets()
            .iter()
            .map(|facet| Facet {
                kind: facet.kind.clone(),
                value: facet.value.clone(),
            })
            .collect();
        self.diagram.simple_types.push(SimpleDataType { name, base, facets });
    }

    /// The built-in type a simple type ultimately restricts.
    fn builtin_base(&mut self, simple_type: &SimpleTypeDefinition) -> String {
        self.builtin_base_guarded(simple_type, &mut HashSet::new())
    }

    fn builtin_base_guarded(
        &mut self,
        simple_type: &SimpleTypeDefinition,
        seen: &mut HashSet<QName>,
    ) -> String {
        let set = self.set;
        match &simple_type.variety {
            SimpleVariety::Restriction {
                base: Some(base), ..
            } if is_builtin_name(base) => base.local_name.clone(),
            SimpleVariety::Restriction {
                base: Some(base), ..
            } => match set.get::<SimpleTypeDefinition>(base) {
                Some(next) if seen.insert(base.clone()) => self.builtin_base_guarded(next, seen),
                _ => {
                    self.unresolved(format!("base type {base} of a simple type does not resolve"));
                    "string".into()
                }
            },
            SimpleVariety::Restriction { base: None, .. }
            | SimpleVariety::List { .. }
            | SimpleVariety::Union { .. } => {
                self.lossy(format!(
                    "simple type {:?} is not a plain restriction and is read as a string",
                    simple_type.name.as_deref().unwrap_or_default()
                ));
                "string".into()
            }
        }
    }

    fn type_of(&mut self, name: &QName) -> Option<PType> {
        if *name == *XS_ANY_TYPE_NAME {
            None
        } else if is_builtin_name(name) {
            Some(PType::Builtin(name.local_name.clone()))
        } else if self.set.get::<SimpleTypeDefinition>(name).is_some() {
            Some(PType::Simple(name.local_name.clone()))
        } else {
            self.unresolved(format!("unknown simple type {name}; using string"));
            Some(PType::Builtin("string".into()))
        }
    }

    fn inline_simple_type(&mut self, simple_type: &SimpleTypeDefinition) -> Option<PType> {
        Some(PType::Builtin(self.builtin_base(simple_type)))
    }

    fn is_simple_type_name(&self, name: &QName) -> bool {
        (is_builtin_name(name) && *name != *XS_ANY_TYPE_NAME)
            || self.set.get::<SimpleTypeDefinition>(name).is_some()
    }

    fn documentation(annotation: Option<&Annotation>) -> Vec<String> {
        annotation
            .map(|annotation| {
                annotation
                    .documentation()
                    .map(|text| text.trim().to_string())
                    .filter(|text| !text.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn class_mut(&mut self, node: NodeId) -> Option<&mut PClass> {
        let class = self.diagram.class_mut(node);
        if class.is_none() {
            tracing::error!("node {node} was expected to be a class");
        }
        class
    }

    fn process_complex_type(&mut self, node: NodeId, complex_type: &ComplexTypeDefinition) {
        let documentation = Self::documentation(complex_type.annotation.as_ref());
        if let Some(class) = self.class_mut(node) {
            class.is_abstract |= complex_type.is_abstract;
            class.documentation.extend(documentation);
        }

        match &complex_type.content {
            ContentType::Empty => {}
            ContentType::Particle(particle) => self.process_particle(node, particle),
            ContentType::Complex(derivation) => {
                match derivation.method {
                    DerivationMethod::Extension if derivation.base != *XS_ANY_TYPE_NAME => {
                        if let Some(class) = self.class_mut(node) {
                            class.extension_of = Some(derivation.base.clone());
                        }
                    }
                    DerivationMethod::Extension => {}
                    DerivationMethod::Restriction => {
                        if derivation.base != *XS_ANY_TYPE_NAME {
                            self.lossy(format!(
                                "restriction of {} is read as an independent content model",
                                derivation.base
                            ));
                        }
                    }
                }
                if let Some(particle) = &derivation.particle {
                    self.process_particle(node, particle);
                }
            }
            ContentType::Simple(derivation) => {
                self.lossy(format!(
                    "simple content of base {} is read into a {VALUE_ATTRIBUTE:?} element",
                    derivation.base
                ));
                let type_ = self.type_of(&derivation.base);
                self.push_attribute_as_element(
                    node,
                    PAttribute::new(VALUE_ATTRIBUTE, type_, Multiplicity::ONE),
                );
            }
        }

        for attribute_use in complex_type.attribute_uses() {
            self.process_attribute_use(node, attribute_use);
        }
    }

    fn process_attribute_use(&mut self, node: NodeId, attribute_use: &AttributeUse) {
        match attribute_use {
            AttributeUse::Attribute(declaration) => {
                if let Some(attribute) = self.attribute_from_declaration(declaration) {
                    self.push_attribute(node, attribute);
                }
            }
            AttributeUse::GroupRef(name) => {
                if let Some(class) = self.class_mut(node) {
                    class.attribute_group_refs.push(name.clone());
                }
            }
        }
    }

    pub(super) fn attribute_from_declaration(
        &mut self,
        declaration: &AttributeDeclaration,
    ) -> Option<PAttribute> {
        if declaration.effective_use() == Use::Prohibited {
            return None;
        }
        let set = self.set;
        let global = match &declaration.reference {
            Some(reference) => match set.get::<AttributeDeclaration>(reference) {
                Some(global) => Some(global),
                None => {
                    self.unresolved(format!("attribute reference {reference} does not resolve"));
                    return None;
                }
            },
            None => None,
        };
        let typed = global.unwrap_or(declaration);
        let type_ = match (&typed.type_name, &typed.inline_type) {
            (Some(name), _) => self.type_of(name),
            (None, Some(simple_type)) => self.inline_simple_type(simple_type),
            (None, None) => None,
        };
        let multiplicity = match declaration.effective_use() {
            Use::Required => Multiplicity::ONE,
            _ => Multiplicity::OPTIONAL,
        };
        let mut attribute = PAttribute::new(declaration.local_name(), type_, multiplicity);
        attribute.default = declaration
            .default
            .clone()
            .or_else(|| global.and_then(|global| global.default.clone()));
        Some(attribute)
    }

    /// Adds an attribute to a class, renaming it if the class already has one of that name.
    pub(super) fn push_attribute(&mut self, node: NodeId, mut attribute: PAttribute) {
        let Some(class) = self.class_mut(node) else {
            return;
        };
        let taken = |name: &str| class.attributes.iter().any(|a| a.name == name);
        if taken(&attribute.name) {
            let original = attribute.name.clone();
            let mut suffix = 2;
            while taken(&format!("{original}{suffix}")) {
                suffix += 1;
            }
            attribute.name = format!("{original}{suffix}");
            if attribute.alias.is_none() {
                attribute.alias = Some(original);
            }
        }
        class.attributes.push(attribute);
    }

    /// Appends to the trailing attribute container of `parent`, creating one if needed.
    fn push_attribute_as_element(&mut self, parent: NodeId, attribute: PAttribute) {
        let last = self.diagram.children(parent).last().copied();
        if let Some(last) = last {
            if let PNodeKind::AttributeContainer { attributes } =
                &mut self.diagram.node_mut(last).kind
            {
                attributes.push(attribute);
                return;
            }
        }
        self.diagram.add_node(
            Some(parent),
            PNodeKind::AttributeContainer {
                attributes: vec![attribute],
            },
        );
    }

    fn process_group(&mut self, name: &QName, group: &ModelGroupDefinition) {
        let base = name
            .local_name
            .strip_suffix(MODEL_GROUP_SUFFIX)
            .filter(|base| !base.is_empty());
        let mut class = PClass::new(self.unique_name(base.unwrap_or(&name.local_name)));
        class.documentation = Self::documentation(group.annotation.as_ref());
        if let Some(base) = base {
            // The attributes that belong to the content of a `{base}-c` group. A class that is
            // only used inside choices has nothing but the optional variant.
            let normal = attribute_group_name(base);
            let optional = optional_attribute_group_name(&normal);
            let attribute_group = [normal, optional]
                .into_iter()
                .map(|local| QName::with_optional_namespace(name.namespace_name.as_ref(), local))
                .find(|candidate| self.set.get::<AttributeGroupDefinition>(candidate).is_some());
            class.attribute_group_refs.extend(attribute_group);
        }
        let node = self.diagram.add_node(None, PNodeKind::Class(class));
        self.diagram.group_roots.insert(name.clone(), node);

        if let Some(model_group) = &group.model_group {
            let particle = Particle {
                min_occurs: 1,
                max_occurs: MaxOccurs::Count(1),
                term: Term::ModelGroup(model_group.clone()),
            };
            self.process_particle(node, &particle);
        }
    }

    fn process_global_element(&mut self, name: &QName, element: &ElementDeclaration) {
        let label = element.local_name().to_string();
        let documentation = Self::documentation(element.annotation.as_ref());

        let node = match (&element.type_name, &element.inline_type) {
            (Some(type_name), _) if self.diagram.type_roots.contains_key(type_name) => {
                let root = self.diagram.type_roots[type_name];
                let free = self
                    .diagram
                    .class(root)
                    .is_some_and(|class| class.element_label.is_none());
                if free {
                    // The first element of a type takes over the type's root class
                    if let Some(class) = self.class_mut(root) {
                        class.element_label = Some(label);
                        class.documentation.extend(documentation);
                    }
                    root
                } else {
                    let mut class = PClass::labelled(type_name.local_name.clone(), label);
                    class.sr_of = Some(SrTarget::Type(type_name.clone()));
                    class.documentation = documentation;
                    self.diagram.add_node(None, PNodeKind::Class(class))
                }
            }
            (Some(type_name), _) if self.is_simple_type_name(type_name) => {
                let type_ = self.type_of(type_name);
                self.simple_root(&label, type_, documentation)
            }
            (Some(type_name), _) if *type_name != *XS_ANY_TYPE_NAME => {
                self.unresolved(format!(
                    "type {type_name} of global element {label:?} does not resolve"
                ));
                let class = PClass::labelled(self.unique_name(&label), label);
                self.diagram.add_node(None, PNodeKind::Class(class))
            }
            (None, Some(InlineType::Complex(complex_type))) => {
                let mut class = PClass::labelled(self.unique_name(&label), label);
                class.is_abstract = element.is_abstract;
                class.documentation = documentation;
                let node = self.diagram.add_node(None, PNodeKind::Class(class));
                self.process_complex_type(node, complex_type);
                node
            }
            (None, Some(InlineType::Simple(simple_type))) => {
                let type_ = self.inline_simple_type(simple_type);
                self.simple_root(&label, type_, documentation)
            }
            _ => {
                let class = PClass::labelled(self.unique_name(&label), label);
                self.diagram.add_node(None, PNodeKind::Class(class))
            }
        };
        self.diagram.element_nodes.insert(name.clone(), node);
    }

    fn simple_root(
        &mut self,
        label: &str,
        type_: Option<PType>,
        documentation: Vec<String>,
    ) -> NodeId {
        self.lossy(format!(
            "simple-typed global element {label:?} is read as a class with a \
             {VALUE_ATTRIBUTE:?} element"
        ));
        let mut class = PClass::labelled(self.unique_name(label), label);
        class.documentation = documentation;
        let node = self.diagram.add_node(None, PNodeKind::Class(class));
        self.push_attribute_as_element(
            node,
            PAttribute::new(VALUE_ATTRIBUTE, type_, Multiplicity::ONE),
        );
        node
    }

    fn process_particle(&mut self, parent: NodeId, particle: &Particle) {
        let multiplicity = multiplicity_of(particle);
        match &particle.term {
            Term::Element(element) => self.process_local_element(parent, element, multiplicity),
            Term::ModelGroup(model_group) => {
                if !particle.is_single() {
                    self.lossy(format!(
                        "the occurrence {multiplicity} of a {:?} compositor is not kept",
                        model_group.compositor
                    ));
                }
                let kind = match model_group.compositor {
                    Compositor::Sequence | Compositor::All => PNodeKind::Dummy,
                    Compositor::Choice => PNodeKind::ContentChoice,
                };
                let node = self.diagram.add_node(Some(parent), kind);
                for particle in &model_group.particles {
                    self.process_particle(node, particle);
                }
            }
            Term::GroupRef(name) => {
                let mut class = PClass::new(name.local_name.clone());
                class.multiplicity = multiplicity;
                class.sr_of = Some(SrTarget::Group(name.clone()));
                self.diagram.add_node(Some(parent), PNodeKind::Class(class));
            }
            Term::Any => self.lossy("wildcard content (xs:any) is ignored"),
        }
    }

    fn process_local_element(
        &mut self,
        parent: NodeId,
        element: &ElementDeclaration,
        multiplicity: Multiplicity,
    ) {
        if let Some(reference) = &element.reference {
            let mut class =
                PClass::labelled(reference.local_name.clone(), reference.local_name.clone());
            class.multiplicity = multiplicity;
            class.sr_of = Some(SrTarget::ElementRef(reference.clone()));
            self.diagram.add_node(Some(parent), PNodeKind::Class(class));
            return;
        }

        let label = element.local_name().to_string();
        match (&element.type_name, &element.inline_type) {
            (Some(type_name), _) if self.is_simple_type_name(type_name) => {
                let type_ = self.type_of(type_name);
                let mut attribute = PAttribute::new(label, type_, multiplicity);
                attribute.default = element.default.clone();
                self.push_attribute_as_element(parent, attribute);
            }
            (Some(type_name), _) if *type_name != *XS_ANY_TYPE_NAME => {
                let mut class = PClass::labelled(type_name.local_name.clone(), label);
                class.multiplicity = multiplicity;
                class.sr_of = Some(SrTarget::Type(type_name.clone()));
                class.documentation = Self::documentation(element.annotation.as_ref());
                self.diagram.add_node(Some(parent), PNodeKind::Class(class));
            }
            (None, Some(InlineType::Complex(complex_type))) => {
                let mut class = PClass::labelled(self.unique_name(&label), label);
                class.multiplicity = multiplicity;
                class.is_abstract = element.is_abstract;
                class.documentation = Self::documentation(element.annotation.as_ref());
                let node = self.diagram.add_node(Some(parent), PNodeKind::Class(class));
                self.process_complex_type(node, complex_type);
            }
            (None, Some(InlineType::Simple(simple_type))) => {
                let type_ = self.inline_simple_type(simple_type);
                let mut attribute = PAttribute::new(label, type_, multiplicity);
                attribute.default = element.default.clone();
                self.push_attribute_as_element(parent, attribute);
            }
            _ => {
                let mut attribute = PAttribute::new(label, None, multiplicity);
                attribute.default = element.default.clone();
                self.push_attribute_as_element(parent, attribute);
            }
        }
    }
}

fn multiplicity_of(particle: &Particle) -> Multiplicity {
    let upper = match particle.max_occurs {
        MaxOccurs::Unbounded => UpperBound::Unbounded,
        MaxOccurs::Count(count) => UpperBound::Count(count),
    };
    Multiplicity::new(particle.min_occurs, upper)
}

#[cfg(test)]
mod tests {
    use xcase_xsd::Schema;

    use super::*;
    use crate::log::Severities;

    fn read(xsd: &str) -> (PDiagram, TranslationLog) {
        let set = SchemaSet::from_schema(Schema::parse(xsd).unwrap()).unwrap();
        let mut log = TranslationLog::new(Severities::default());
        let diagram = XsdToPsm::new(&set, ReverseOptions::default(), &mut log).process();
        (diagram, log)
    }

    fn local(name: &str) -> QName {
        QName {
            namespace_name: None,
            local_name: name.into(),
        }
    }

    fn names(diagram: &PDiagram, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| diagram.class(*id))
            .map(|class| class.name.clone())
            .collect()
    }

    #[test]
    fn first_element_takes_over_the_type() {
        let (diagram, log) = read(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="person" type="Person"/>
                <xs:element name="employee" type="Person"/>
                <xs:complexType name="Person">
                    <xs:attribute name="name" type="xs:string" use="required"/>
                </xs:complexType>
            </xs:schema>"#,
        );
        assert!(!log.has_errors(), "{log:?}");

        let person = diagram.type_roots[&local("Person")];
        let class = diagram.class(person).unwrap();
        assert_eq!(class.element_label.as_deref(), Some("person"));
        assert_eq!(class.attributes[0].multiplicity, Multiplicity::ONE);

        // The second element stays as a representative of the type's class
        let employee = diagram.element_nodes[&local("employee")];
        assert_ne!(employee, person);
        assert_eq!(diagram.class(employee).unwrap().represents, Some(person));
    }

    #[test]
    fn sequences_are_flattened_and_choices_kept() {
        let (diagram, _) = read(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="order">
                    <xs:complexType>
                        <xs:sequence>
                            <xs:element name="id" type="xs:int"/>
                            <xs:choice>
                                <xs:element name="a"><xs:complexType/></xs:element>
                                <xs:element name="b"><xs:complexType/></xs:element>
                            </xs:choice>
                        </xs:sequence>
                    </xs:complexType>
                </xs:element>
            </xs:schema>"#,
        );
        let order = diagram.roots[0];
        let children = diagram.children(order);
        assert_eq!(children.len(), 2);
        assert!(matches!(
            &diagram.node(children[0]).kind,
            PNodeKind::AttributeContainer { attributes } if attributes[0].name == "id"
        ));
        assert_eq!(diagram.node(children[1]).kind, PNodeKind::ContentChoice);
        assert_eq!(names(&diagram, diagram.children(children[1])), ["a", "b"]);
        assert_eq!(diagram.classes_count, 3);
    }

    #[test]
    fn wildcards_are_reported() {
        let (_, log) = read(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="bag">
                    <xs:complexType><xs:sequence><xs:any/></xs:sequence></xs:complexType>
                </xs:element>
            </xs:schema>"#,
        );
        assert!(log.contains(MessageId::RevLossyConstruct));
    }
}
