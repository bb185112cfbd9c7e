//! PSM diagram → XML Schema.
//!
//! Translation runs in two phases. Planning walks the diagram and decides, for every class, its
//! names and whether it becomes a complex type, a model group / attribute group pair, or both.
//! Emission then writes global elements, class bodies and finally the attribute groups that were
//! actually requested.

pub mod class_data;
pub mod naming;
mod plan;
pub mod writer;

use std::collections::{HashMap, HashSet, VecDeque};

use xcase_psm::{
    AssociationChild, Multiplicity, PsmAttribute, PsmClass, PsmDiagram, PsmProject, Ref,
    Subordinate, SubordinateOwner,
};

use self::class_data::{AttributeGroupUsage, ClassTranslationData};
use self::naming::NamingSupport;
use self::plan::{Plan, Planner, ProjectFacts};
use self::writer::{AttributeForm, SchemaReference, SerializeError, WriterFactory, XmlSchemaWriter};
use crate::config::{Config, TranslationConfig};
use crate::log::{MessageId, Severities, TranslationLog};
use crate::CONTENT_CONTAINER_MARKER;

/// Target namespace of diagrams that declare none
pub const FALLBACK_NAMESPACE: &str = "http//www.example.org/";

#[derive(Debug)]
pub struct TranslationResult {
    pub schema: String,
    pub log: TranslationLog,
}

/// Translates PSM diagrams to XML Schema documents. Holds no per-run state.
#[derive(Clone, Debug, Default)]
pub struct XmlSchemaTranslator {
    config: TranslationConfig,
    severities: Severities,
}

impl XmlSchemaTranslator {
    pub fn new(config: TranslationConfig, severities: Severities) -> Self {
        Self { config, severities }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.translation.clone(), config.severities())
    }

    /// Translates one diagram. Problems of the model are reported in the log of the result.
    pub fn translate(
        &self,
        project: &PsmProject,
        diagram: Ref<PsmDiagram>,
    ) -> Result<TranslationResult, SerializeError> {
        let mut log = TranslationLog::new(self.severities.clone());
        let replacement = self.config.whitespace_replacement.as_str();
        tracing::debug!("translating diagram {:?}", project.get(diagram).name);

        let facts = ProjectFacts::new(project, &mut log);
        let mut naming = NamingSupport::new(project, diagram, replacement);
        naming.initialize();
        let plan = Planner::new(&facts, diagram, replacement).plan(&mut naming, &mut log);

        let namespace = self.target_namespace(project, diagram, &mut log);
        let references: Vec<_> = project
            .get(diagram)
            .references
            .iter()
            .map(|reference| SchemaReference {
                prefix: reference.namespace_prefix.clone(),
                namespace: reference.namespace().map(str::to_string),
                schema_location: reference.schema_location.clone(),
            })
            .collect();

        let mut emitter = Emitter {
            facts: &facts,
            project,
            naming: &mut naming,
            log: &mut log,
            plan,
            factory: WriterFactory::new(),
            attribute_items: HashMap::new(),
            worklist: VecDeque::new(),
            ghosts: HashSet::new(),
            missing: ClassTranslationData::default(),
        };
        emitter.emit_global_elements(diagram);
        emitter.emit_class_bodies();
        emitter.emit_attribute_groups();
        let factory = emitter.factory;

        let schema = factory.result(&namespace, &references)?;
        Ok(TranslationResult { schema, log })
    }

    fn target_namespace(
        &self,
        project: &PsmProject,
        diagram: Ref<PsmDiagram>,
        log: &mut TranslationLog,
    ) -> String {
        let candidates = [
            project.get(diagram).target_namespace.as_deref(),
            self.config.default_namespace.as_deref(),
            project.default_namespace.as_deref(),
        ];
        match candidates
            .into_iter()
            .flatten()
            .find(|namespace| !namespace.trim().is_empty())
        {
            Some(namespace) => namespace.trim().to_string(),
            None => {
                log.add(
                    MessageId::XsNoNamespace,
                    format!(
                        "diagram {:?} has no target namespace; using {FALLBACK_NAMESPACE:?}",
                        project.get(diagram).name
                    ),
                );
                FALLBACK_NAMESPACE.to_string()
            }
        }
    }
}

/// An entry of the attribute list of an element context
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum AttrItem {
    Attribute(Ref<PsmAttribute>),
    /// A reference to the attribute group of a class; `optional` selects the `-opt` variant
    Group { class: Ref<PsmClass>, optional: bool },
}

/// The element whose attributes are being collected
#[derive(Debug, Default)]
struct ElementContext {
    attributes: Vec<AttrItem>,
    /// Inside a content choice or class union, up to the next element boundary
    in_choice: bool,
}

struct Emitter<'a, 'p> {
    facts: &'a ProjectFacts<'p>,
    project: &'p PsmProject,
    naming: &'a mut NamingSupport<'p>,
    log: &'a mut TranslationLog,
    plan: Plan,
    factory: WriterFactory,
    /// The attribute list of each emitted model group, rendered later as attribute groups
    attribute_items: HashMap<Ref<PsmClass>, Vec<AttrItem>>,
    worklist: VecDeque<(Ref<PsmClass>, bool)>,
    ghosts: HashSet<Ref<PsmClass>>,
    missing: ClassTranslationData,
}

impl<'a, 'p> Emitter<'a, 'p> {
    fn data(&self, class: Ref<PsmClass>) -> &ClassTranslationData {
        match self.plan.data.get(&class) {
            Some(data) => data,
            None => {
                tracing::error!("{class:?} was not planned");
                &self.missing
            }
        }
    }

    fn normalize(&self, name: &str) -> String {
        self.naming.normalize(name).into_owned()
    }

    fn emit_global_elements(&mut self, diagram: Ref<PsmDiagram>) {
        let project = self.project;
        let roots = &project.get(diagram).roots;
        if roots.is_empty() {
            self.log.add(
                MessageId::XsNoRoot,
                format!("diagram {:?} has no root classes", project.get(diagram).name),
            );
            return;
        }

        for root in roots {
            let class = project.get(*root);
            match class.label() {
                Some(label) => {
                    let name = self.naming.name_for_global_element(label, self.log);
                    let mut writer = XmlSchemaWriter::new();
                    writer.element(&name);
                    self.element_type(*root, &mut writer);
                    writer.end_element();
                    self.factory.global_elements().append_content(writer);
                }
                None if !self.facts.is_referenced(*root) => {
                    self.log.add(
                        MessageId::XsUnreferencedRoot,
                        format!(
                            "root class {:?} has no element label and is not referenced; its \
                             declarations are omitted",
                            class.name
                        ),
                    );
                    self.ghosts.insert(*root);
                }
                None => {}
            }
        }
    }

    fn emit_class_bodies(&mut self) {
        let project = self.project;
        for class in self.plan.order.clone() {
            let data = self.data(class).clone();
            let ghost = self.ghosts.contains(&class);

            if let Some(group) = data.model_group_name.as_deref() {
                let mut writer = if ghost {
                    XmlSchemaWriter::ghost()
                } else {
                    XmlSchemaWriter::new()
                };
                writer.group(group);
                self.comments(class, &mut writer);
                writer.sequence();
                let mut context = ElementContext::default();
                self.class_content(class, &mut writer, &mut context);
                writer.end_element();
                writer.end_element();
                self.attribute_items.insert(class, context.attributes);
                self.factory.add_global(writer);
            }

            if let Some(name) = data.complex_type_name.as_deref() {
                let mut writer = XmlSchemaWriter::new();
                writer.complex_type(Some(name));
                if project.get(class).is_abstract {
                    writer.attr("abstract", "true");
                }
                if data.has_groups() {
                    self.own_group_refs(class, &mut writer);
                } else {
                    self.comments(class, &mut writer);
                    let base = data
                        .uses_extension
                        .then(|| project.general_of(class))
                        .flatten()
                        .and_then(|general| self.data(general).complex_type_name.clone());
                    if let Some(base) = base.as_deref() {
                        writer.complex_content();
                        writer.extension(base);
                    }
                    writer.sequence();
                    let mut context = ElementContext::default();
                    self.class_content(class, &mut writer, &mut context);
                    writer.end_element();
                    self.write_attributes(&context.attributes, false, &mut writer);
                    if base.is_some() {
                        writer.end_element();
                        writer.end_element();
                    }
                }
                writer.end_element();
                self.factory.add_global(writer);
            }
        }
    }

    fn emit_attribute_groups(&mut self) {
        // Groups used from other diagrams are published in both variants
        let published: Vec<_> = self
            .plan
            .order
            .iter()
            .flat_map(|class| [(*class, false), (*class, true)])
            .filter(|(class, optional)| {
                let data = self.data(*class);
                data.has_attributes
                    && data
                        .requested_usage
                        .contains(AttributeGroupUsage::variant(*optional))
            })
            .collect();
        self.worklist.extend(published);

        while let Some((class, optional)) = self.worklist.pop_front() {
            let variant = AttributeGroupUsage::variant(optional);
            let Some(data) = self.plan.data.get_mut(&class) else {
                continue;
            };
            if data.foreign || !data.has_attributes || data.emitted_usage.contains(variant) {
                continue;
            }
            data.emitted_usage |= variant;
            let Some(name) = data.attribute_group_variant(optional) else {
                continue;
            };

            let items = self.attribute_items.get(&class).cloned().unwrap_or_default();
            let mut writer = if self.ghosts.contains(&class) {
                XmlSchemaWriter::ghost()
            } else {
                XmlSchemaWriter::new()
            };
            writer.attribute_group(&name);
            self.write_attributes(&items, optional, &mut writer);
            writer.end_element();
            self.factory.add_global(writer);
        }
    }

    fn comments(&self, class: Ref<PsmClass>, writer: &mut XmlSchemaWriter) {
        let comments = &self.project.get(class).comments;
        if !comments.is_empty() {
            writer.annotation_documentation(&comments.join("\n\n"));
        }
    }

    /// The `type` of an open element declaration, or an anonymous type referring to the groups.
    fn element_type(&mut self, class: Ref<PsmClass>, writer: &mut XmlSchemaWriter) {
        match self.data(class).complex_type_name.clone() {
            Some(name) => writer.attr("type", name),
            None => {
                writer.complex_type(None);
                self.own_group_refs(class, writer);
                writer.end_element();
            }
        }
    }

    /// The content of a type that consists of the class's own groups
    fn own_group_refs(&mut self, class: Ref<PsmClass>, writer: &mut XmlSchemaWriter) {
        if let Some(group) = self.data(class).model_group_name.clone() {
            writer.sequence();
            writer.group_ref(&group);
            writer.end_element();
            writer.end_element();
        }
        if self.data(class).has_attributes {
            self.attribute_group_ref(class, false, writer);
        }
    }

    fn request(&mut self, class: Ref<PsmClass>, optional: bool) {
        let variant = AttributeGroupUsage::variant(optional);
        if let Some(data) = self.plan.data.get_mut(&class) {
            if !data.foreign && !data.requested_usage.contains(variant) {
                data.requested_usage |= variant;
                self.worklist.push_back((class, optional));
            }
        }
    }

    fn attribute_group_ref(
        &mut self,
        class: Ref<PsmClass>,
        optional: bool,
        writer: &mut XmlSchemaWriter,
    ) {
        if let Some(name) = self.data(class).attribute_group_variant(optional) {
            self.request(class, optional);
            writer.attribute_group_ref(&name);
            writer.end_element();
        }
    }

    /// Content shared by the complex type and the model group of a class.
    fn class_content(
        &mut self,
        class: Ref<PsmClass>,
        writer: &mut XmlSchemaWriter,
        context: &mut ElementContext,
    ) {
        let project = self.project;
        if let Some(represented) = self.facts.represented(class) {
            self.class_reference(represented, Multiplicity::ONE, writer, context);
        }
        if let Some(general) = project.general_of(class) {
            if !self.facts.uses_extension(class) {
                if self.data(general).has_attributes {
                    self.log.add(
                        MessageId::XsSpecializedAttributeGroup,
                        format!(
                            "class {:?} inherits the attributes of {:?} through an attribute group",
                            project.get(class).name,
                            project.get(general).name
                        ),
                    );
                }
                self.class_reference(general, Multiplicity::ONE, writer, context);
            }
        }
        context.attributes.extend(
            project
                .get(class)
                .attributes
                .iter()
                .map(|attribute| AttrItem::Attribute(*attribute)),
        );
        self.subordinates(SubordinateOwner::Class(class), writer, context);
    }

    /// A reference to the groups of `class` from within another element's content.
    fn class_reference(
        &mut self,
        class: Ref<PsmClass>,
        multiplicity: Multiplicity,
        writer: &mut XmlSchemaWriter,
        context: &mut ElementContext,
    ) {
        let data = self.data(class);
        let group = data.model_group_name.clone();
        let has_attributes = data.has_attributes;
        match group {
            Some(group) => {
                writer.group_ref(&group);
                writer.occurs(multiplicity);
                writer.end_element();
            }
            None => tracing::error!("{class:?} is referenced but has no model group"),
        }
        if has_attributes {
            if multiplicity.upper.is_many() {
                self.log.add(
                    MessageId::XsGroupAttributesRepeated,
                    format!(
                        "class {:?} repeats ({multiplicity}) but its attributes can only \
                         occur once",
                        self.project.get(class).name
                    ),
                );
            }
            context.attributes.push(AttrItem::Group {
                class,
                optional: context.in_choice,
            });
        }
    }

    fn subordinates(
        &mut self,
        owner: SubordinateOwner,
        writer: &mut XmlSchemaWriter,
        context: &mut ElementContext,
    ) {
        let project = self.project;
        for subordinate in project.subordinates(owner) {
            match *subordinate {
                Subordinate::Association(association) => {
                    let association = project.get(association);
                    self.association(association.child, association.multiplicity, writer, context);
                }
                Subordinate::ContentContainer(container) => {
                    let name = self.normalize(&project.get(container).name);
                    writer.element(&name);
                    writer.annotation_documentation(CONTENT_CONTAINER_MARKER);
                    writer.complex_type(None);
                    writer.sequence();
                    let mut inner = ElementContext::default();
                    self.subordinates(
                        SubordinateOwner::ContentContainer(container),
                        writer,
                        &mut inner,
                    );
                    writer.end_element();
                    self.write_attributes(&inner.attributes, false, writer);
                    writer.end_element();
                    writer.end_element();
                }
                Subordinate::ContentChoice(choice) => {
                    writer.choice();
                    let outer = std::mem::replace(&mut context.in_choice, true);
                    self.subordinates(SubordinateOwner::ContentChoice(choice), writer, context);
                    context.in_choice = outer;
                    writer.end_element();
                }
                Subordinate::AttributeContainer(container) => {
                    for attribute in &project.get(container).attributes {
                        let attribute = project.get(*attribute);
                        writer.element(&self.normalize(attribute.xml_name()));
                        writer.type_attribute(
                            attribute,
                            AttributeForm::Element,
                            project,
                            &mut self.factory.simple_types,
                            self.log,
                        );
                        writer.end_element();
                    }
                }
            }
        }
    }

    fn association(
        &mut self,
        child: AssociationChild,
        multiplicity: Multiplicity,
        writer: &mut XmlSchemaWriter,
        context: &mut ElementContext,
    ) {
        let project = self.project;
        match child {
            AssociationChild::Class(class) if !project.get(class).has_element_label() => {
                self.class_reference(class, multiplicity, writer, context);
            }
            AssociationChild::Class(class) => {
                let alternatives: Vec<_> = self
                    .facts
                    .with_descendants(class)
                    .into_iter()
                    .filter(|candidate| {
                        let candidate = project.get(*candidate);
                        candidate.has_element_label() && !candidate.is_abstract
                    })
                    .collect();
                if alternatives.iter().any(|alternative| *alternative != class) {
                    writer.choice();
                    writer.occurs(multiplicity);
                    for alternative in alternatives {
                        self.element(alternative, Multiplicity::ONE, writer);
                    }
                    writer.end_element();
                } else {
                    if project.get(class).is_abstract {
                        self.log.add(
                            MessageId::XsAbstractNotSpecialized,
                            format!(
                                "abstract class {:?} has no concrete specialization with an \
                                 element label",
                                project.get(class).name
                            ),
                        );
                    }
                    self.element(class, multiplicity, writer);
                }
            }
            AssociationChild::ClassUnion(union) => {
                writer.choice();
                writer.occurs(multiplicity);
                let outer = std::mem::replace(&mut context.in_choice, true);
                for component in &project.get(union).components {
                    if let AssociationChild::Class(class) = *component {
                        if !project.get(class).has_element_label()
                            && self.data(class).has_attributes
                        {
                            self.log.add(
                                MessageId::XsUnionAttributes,
                                format!(
                                    "attributes of union member {:?} are copied to the enclosing \
                                     element as optional",
                                    project.get(class).name
                                ),
                            );
                        }
                    }
                    self.association(*component, Multiplicity::ONE, writer, context);
                }
                context.in_choice = outer;
                writer.end_element();
            }
        }
    }

    /// A local element declaration for a labelled class
    fn element(
        &mut self,
        class: Ref<PsmClass>,
        multiplicity: Multiplicity,
        writer: &mut XmlSchemaWriter,
    ) {
        let label = self.project.get(class).label().unwrap_or_default();
        writer.element(&self.normalize(label));
        writer.occurs(multiplicity);
        self.element_type(class, writer);
        writer.end_element();
    }

    fn write_attributes(
        &mut self,
        items: &[AttrItem],
        force_optional: bool,
        writer: &mut XmlSchemaWriter,
    ) {
        let project = self.project;
        for item in items {
            match *item {
                AttrItem::Attribute(attribute) => {
                    let attribute = project.get(attribute);
                    writer.attribute(&self.normalize(attribute.xml_name()));
                    writer.type_attribute(
                        attribute,
                        AttributeForm::Attribute {
                            optional: force_optional,
                        },
                        project,
                        &mut self.factory.simple_types,
                        self.log,
                    );
                    writer.end_element();
                }
                AttrItem::Group { class, optional } => {
                    self.attribute_group_ref(class, optional || force_optional, writer);
                }
            }
        }
    }
}
