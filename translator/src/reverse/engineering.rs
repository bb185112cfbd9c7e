use std::collections::{BTreeMap, HashMap};

use xcase_psm::{DataType, PsmAttribute, PsmClass, Ref, SimpleDataType, SubordinateOwner};

use super::p_psm::{NodeId, PAttribute, PClass, PDiagram, PNodeKind, PType};
use super::sink::{ModelSink, NewClass};
use crate::log::{MessageId, TranslationLog};

/// Writes a post-processed [`PDiagram`] into a [`ModelSink`].
pub struct ReverseEngineering<'a> {
    diagram: &'a PDiagram,
    sink: &'a mut dyn ModelSink,
    log: &'a mut TranslationLog,
    progress: &'a mut dyn FnMut(usize, usize),
    classes: BTreeMap<NodeId, Ref<PsmClass>>,
    simple_types: HashMap<String, Ref<SimpleDataType>>,
    step: usize,
}

impl<'a> ReverseEngineering<'a> {
    /// Creates the model of `diagram`. `progress` receives the number of classes created so far
    /// and the total.
    pub fn generate_psm(
        diagram: &'a PDiagram,
        sink: &'a mut dyn ModelSink,
        log: &'a mut TranslationLog,
        layout: bool,
        progress: &'a mut dyn FnMut(usize, usize),
    ) {
        let total = diagram.classes_count;
        let mut session = Self {
            diagram,
            sink,
            log,
            progress,
            classes: BTreeMap::new(),
            simple_types: HashMap::new(),
            step: (total / 10).min(25) + 1,
        };

        for simple_type in &diagram.simple_types {
            let created = session.sink.create_simple_type(simple_type.clone());
            session
                .simple_types
                .insert(simple_type.name.clone(), created);
        }
        for root in &diagram.roots {
            match diagram.class(*root) {
                Some(class) => {
                    let created = session.sink.create_root_class(new_class(class));
                    session.fill_class(*root, class, created);
                }
                None => session.log.add(
                    MessageId::RevInternal,
                    format!("root node {root} is not a class"),
                ),
            }
        }
        session.link_srs();
        if layout {
            session.sink.auto_layout();
        }
        (session.progress)(session.classes.len(), total);
    }

    fn fill_class(&mut self, node: NodeId, class: &PClass, created: Ref<PsmClass>) {
        self.classes.insert(node, created);
        let done = self.classes.len();
        if done % self.step == 0 {
            (self.progress)(done, self.diagram.classes_count);
        }

        for attribute in &class.attributes {
            let attribute = self.attribute(attribute);
            self.sink.add_attribute(created, attribute);
        }
        self.fill_children(node, SubordinateOwner::Class(created), created);
    }

    fn fill_children(&mut self, node: NodeId, owner: SubordinateOwner, class: Ref<PsmClass>) {
        let diagram = self.diagram;
        for child in diagram.children(node) {
            match &diagram.node(*child).kind {
                PNodeKind::Class(child_class) => {
                    let created = self.sink.create_child_class(
                        owner,
                        new_class(child_class),
                        child_class.multiplicity,
                    );
                    self.fill_class(*child, child_class, created);
                }
                PNodeKind::ContentContainer { name } => {
                    let container = self.sink.add_content_container(owner, name.clone());
                    let owner = SubordinateOwner::ContentContainer(container);
                    self.fill_children(*child, owner, class);
                }
                PNodeKind::ContentChoice => {
                    let choice = self.sink.add_content_choice(owner);
                    self.fill_children(*child, SubordinateOwner::ContentChoice(choice), class);
                }
                PNodeKind::AttributeContainer { attributes } => {
                    let attributes = attributes
                        .iter()
                        .map(|attribute| self.attribute(attribute))
                        .collect();
                    self.sink.add_attribute_container(owner, attributes);
                }
                PNodeKind::Dummy => self.fill_children(*child, owner, class),
                PNodeKind::Comment(text) => self.sink.add_comment(class, text.clone()),
            }
        }
    }

    fn attribute(&mut self, attribute: &PAttribute) -> PsmAttribute {
        let type_ = match &attribute.type_ {
            Some(PType::Builtin(name)) => Some(DataType::Builtin(name.clone())),
            Some(PType::Simple(name)) => match self.simple_types.get(name) {
                Some(simple_type) => Some(DataType::Simple(*simple_type)),
                None => {
                    self.log.add(
                        MessageId::RevInternal,
                        format!("simple type {name:?} was not created"),
                    );
                    None
                }
            },
            None => None,
        };
        PsmAttribute {
            name: attribute.name.clone(),
            alias: attribute.alias.clone(),
            multiplicity: attribute.multiplicity,
            default: attribute.default.clone(),
            type_,
        }
    }

    /// Second pass: representative links and generalizations, whose targets may have been
    /// created after their sources.
    fn link_srs(&mut self) {
        let diagram = self.diagram;
        let classes: Vec<_> = self.classes.iter().map(|(n, c)| (*n, *c)).collect();
        for (node, created) in classes {
            let Some(class) = diagram.class(node) else {
                continue;
            };
            if let Some(target) = class.represents {
                match self.classes.get(&target) {
                    Some(represented) => self.sink.set_represented(created, *represented),
                    None => self.log.add(
                        MessageId::RevInternal,
                        format!("represented class {:?} was not created", class.name),
                    ),
                }
            }
            if let Some(general) = class.general {
                match self.classes.get(&general) {
                    Some(general) => self.sink.add_generalization(*general, created),
                    None => self.log.add(
                        MessageId::RevInternal,
                        format!("general class of {:?} was not created", class.name),
                    ),
                }
            }
        }
    }
}

fn new_class(class: &PClass) -> NewClass {
    NewClass {
        name: class.name.clone(),
        element_label: class.element_label.clone(),
        is_abstract: class.is_abstract,
    }
}

#[cfg(test)]
mod tests {
    use xcase_psm::{Multiplicity, PsmProject, Subordinate};

    use super::*;
    use crate::log::Severities;
    use crate::reverse::sink::{create_diagram, ProjectSink};

    #[test]
    fn links_representatives_after_the_tree_is_built() {
        let mut tree = PDiagram::new();
        let holder = tree.add_node(None, PNodeKind::Class(PClass::labelled("Holder", "holder")));
        let placeholder = tree.add_node(Some(holder), PNodeKind::Class(PClass::new("Target")));
        let target = tree.add_node(None, PNodeKind::Class(PClass::new("Target")));
        if let Some(class) = tree.class_mut(placeholder) {
            class.represents = Some(target);
            class.multiplicity = Multiplicity::OPTIONAL;
        }
        tree.add_node(Some(target), PNodeKind::Comment("shared".into()));
        tree.classes_count = 3;

        let mut project = PsmProject::new();
        let diagram = create_diagram(&mut project, "imported", None);
        let mut log = TranslationLog::new(Severities::default());
        let mut reports = Vec::new();
        let mut progress = |done: usize, total: usize| reports.push((done, total));
        let mut sink = ProjectSink::new(&mut project, diagram);
        ReverseEngineering::generate_psm(&tree, &mut sink, &mut log, false, &mut progress);
        assert!(log.is_empty());
        assert_eq!(reports.last(), Some(&(3, 3)));

        let roots = project.get(diagram).roots.clone();
        assert_eq!(roots.len(), 2);
        let [Subordinate::Association(association)] = project.get(roots[0]).components[..] else {
            panic!("expected a single association below the holder");
        };
        let association = project.get(association);
        assert_eq!(association.multiplicity, Multiplicity::OPTIONAL);
        let xcase_psm::AssociationChild::Class(child) = association.child else {
            panic!("expected a class child");
        };
        assert_eq!(project.get(child).represented_class, Some(roots[1]));
        assert_eq!(project.get(roots[1]).comments, ["shared"]);
    }
}
