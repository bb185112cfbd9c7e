use std::collections::{HashMap, HashSet};

use xcase_psm::{
    AssociationChild, PsmAssociation, PsmClass, PsmDiagram, PsmProject, Ref, Subordinate,
    SubordinateOwner,
};

use super::class_data::{AttributeGroupUsage, ClassTranslationData};
use super::naming::{
    attribute_group_name, model_group_name, optional_attribute_group_name, NamingSupport,
};
use crate::log::{MessageId, Severities, TranslationLog};

/// Facts about the whole project that do not depend on the diagram being translated.
pub(super) struct ProjectFacts<'p> {
    project: &'p PsmProject,
    /// Structural-representative links that survived cycle detection
    represented: HashMap<Ref<PsmClass>, Ref<PsmClass>>,
    representatives: HashMap<Ref<PsmClass>, Vec<Ref<PsmClass>>>,
    association_targets: HashSet<Ref<PsmClass>>,
    needs_groups: HashMap<Ref<PsmClass>, bool>,
}

impl<'p> ProjectFacts<'p> {
    pub(super) fn new(project: &'p PsmProject, log: &mut TranslationLog) -> Self {
        let mut represented = HashMap::new();
        let mut representatives: HashMap<_, Vec<_>> = HashMap::new();
        for (class, psm_class) in project.iter::<PsmClass>() {
            let Some(target) = psm_class.represented_class else {
                continue;
            };
            if Self::on_representative_cycle(project, class) {
                log.add(
                    MessageId::XsRepresentativeCycle,
                    format!(
                        "class {:?} is part of a structural representative cycle; its link is \
                         ignored",
                        psm_class.name
                    ),
                );
                continue;
            }
            represented.insert(class, target);
            representatives.entry(target).or_default().push(class);
        }

        let mut association_targets = HashSet::new();
        for (_, association) in project.iter::<PsmAssociation>() {
            Self::collect_targets(project, association.child, &mut association_targets);
        }

        let mut facts = Self {
            project,
            represented,
            representatives,
            association_targets,
            needs_groups: HashMap::new(),
        };
        let mut in_progress = HashSet::new();
        for (class, _) in project.iter::<PsmClass>() {
            facts.compute_needs_groups(class, &mut in_progress);
        }
        facts
    }

    fn on_representative_cycle(project: &PsmProject, start: Ref<PsmClass>) -> bool {
        let mut seen = HashSet::new();
        let mut current = start;
        while let Some(next) = project.get(current).represented_class {
            if next == start {
                return true;
            }
            if !seen.insert(next) {
                // A cycle further down the chain, reported by its own members
                return false;
            }
            current = next;
        }
        false
    }

    fn collect_targets(
        project: &PsmProject,
        child: AssociationChild,
        targets: &mut HashSet<Ref<PsmClass>>,
    ) {
        match child {
            AssociationChild::Class(class) => {
                targets.insert(class);
            }
            AssociationChild::ClassUnion(union) => {
                for component in &project.get(union).components {
                    Self::collect_targets(project, *component, targets);
                }
            }
        }
    }

    pub(super) fn project(&self) -> &'p PsmProject {
        self.project
    }

    pub(super) fn represented(&self, class: Ref<PsmClass>) -> Option<Ref<PsmClass>> {
        self.represented.get(&class).copied()
    }

    pub(super) fn is_represented(&self, class: Ref<PsmClass>) -> bool {
        self.representatives.contains_key(&class)
    }

    /// Represented from a class of another diagram
    pub(super) fn is_externally_represented(&self, class: Ref<PsmClass>) -> bool {
        let diagram = self.project.get(class).diagram;
        self.representatives.get(&class).is_some_and(|representatives| {
            representatives
                .iter()
                .any(|r| self.project.get(*r).diagram != diagram)
        })
    }

    /// Whether anything can refer to the declarations of `class`
    pub(super) fn is_referenced(&self, class: Ref<PsmClass>) -> bool {
        self.is_represented(class)
            || self.association_targets.contains(&class)
            || !self.project.get(class).specifications.is_empty()
    }

    /// The class becomes a named complex type.
    pub(super) fn is_complex_type(&self, class: Ref<PsmClass>) -> bool {
        !self.is_represented(class)
            && (self.project.get(class).has_element_label() || self.is_base_type_only(class))
    }

    /// An unlabelled class that nothing but labelled specializations refers to. It becomes the
    /// base type of their `xs:extension`s.
    fn is_base_type_only(&self, class: Ref<PsmClass>) -> bool {
        let project = self.project;
        !project.get(class).has_element_label()
            && !self.association_targets.contains(&class)
            && project.specifics_of(class).into_iter().any(|specific| {
                project.get(specific).has_element_label() && !self.is_represented(specific)
            })
    }

    /// The class becomes a model group / attribute group pair.
    pub(super) fn needs_groups(&self, class: Ref<PsmClass>) -> bool {
        self.needs_groups.get(&class).copied().unwrap_or(true)
    }

    /// The class derives from its general through `complexContent/extension`.
    pub(super) fn uses_extension(&self, class: Ref<PsmClass>) -> bool {
        self.project.general_of(class).is_some_and(|general| {
            self.is_complex_type(general)
                && self.is_complex_type(class)
                && !self.needs_groups(class)
        })
    }

    fn compute_needs_groups(
        &mut self,
        class: Ref<PsmClass>,
        in_progress: &mut HashSet<Ref<PsmClass>>,
    ) -> bool {
        if let Some(needs) = self.needs_groups.get(&class) {
            return *needs;
        }
        if !in_progress.insert(class) {
            return false;
        }
        let project = self.project;
        let mut needs = !self.is_complex_type(class);
        for specific in project.specifics_of(class) {
            let specific_needs = self.compute_needs_groups(specific, in_progress);
            // A specific that cannot extend this class includes its groups instead
            let extends = self.is_complex_type(class)
                && self.is_complex_type(specific)
                && !specific_needs;
            needs |= !extends || specific_needs;
        }
        in_progress.remove(&class);
        self.needs_groups.insert(class, needs);
        needs
    }

    /// `class` and its specializations at any depth, in depth-first order.
    pub(super) fn with_descendants(&self, class: Ref<PsmClass>) -> Vec<Ref<PsmClass>> {
        let mut result = Vec::new();
        let mut stack = vec![class];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            result.push(current);
            let mut specifics = self.project.specifics_of(current);
            specifics.reverse();
            stack.extend(specifics);
        }
        result
    }
}

/// The outcome of the planning phase for one diagram.
#[derive(Debug, Default)]
pub(super) struct Plan {
    /// Classes of the diagram, in emission order
    pub(super) order: Vec<Ref<PsmClass>>,
    /// Decisions for the classes in `order` and for the foreign classes they use
    pub(super) data: HashMap<Ref<PsmClass>, ClassTranslationData>,
}

pub(super) struct Planner<'f, 'p> {
    facts: &'f ProjectFacts<'p>,
    diagram: Ref<PsmDiagram>,
    replacement: String,
    /// Diagrams whose planning is in progress, outermost first
    stack: Vec<Ref<PsmDiagram>>,
    seen: HashSet<Ref<PsmClass>>,
    foreign: Vec<Ref<PsmClass>>,
    plan: Plan,
}

impl<'f, 'p> Planner<'f, 'p> {
    pub(super) fn new(
        facts: &'f ProjectFacts<'p>,
        diagram: Ref<PsmDiagram>,
        replacement: &str,
    ) -> Self {
        Self {
            facts,
            diagram,
            replacement: replacement.to_string(),
            stack: vec![diagram],
            seen: HashSet::new(),
            foreign: Vec::new(),
            plan: Plan::default(),
        }
    }

    pub(super) fn plan(
        mut self,
        naming: &mut NamingSupport<'p>,
        log: &mut TranslationLog,
    ) -> Plan {
        let project = self.facts.project();
        for root in &project.get(self.diagram).roots {
            self.visit(*root);
        }
        tracing::debug!(
            classes = self.plan.order.len(),
            foreign = self.foreign.len(),
            "planned diagram {:?}",
            project.get(self.diagram).name
        );

        let mut foreign_plans = HashMap::new();
        for class in std::mem::take(&mut self.foreign) {
            let data = self.foreign_data(class, &mut foreign_plans);
            let name = data
                .complex_type_name
                .clone()
                .unwrap_or_else(|| data.name_base.clone());
            naming.suggest(class, name);
            self.plan.data.insert(class, data);
        }

        for class in self.plan.order.clone() {
            let data = self.decide(class, naming, log);
            self.plan.data.insert(class, data);
        }
        self.compute_has_attributes();
        self.plan
    }

    fn visit(&mut self, class: Ref<PsmClass>) {
        if !self.seen.insert(class) {
            return;
        }
        let project = self.facts.project();
        if project.get(class).diagram != self.diagram {
            self.foreign.push(class);
            return;
        }
        if let Some(represented) = self.facts.represented(class) {
            self.visit(represented);
        }
        if let Some(general) = project.general_of(class) {
            self.visit(general);
        }
        self.plan.order.push(class);
        self.visit_subordinates(SubordinateOwner::Class(class));
        for specific in project.specifics_of(class) {
            self.visit(specific);
        }
    }

    fn visit_subordinates(&mut self, owner: SubordinateOwner) {
        let project = self.facts.project();
        for subordinate in project.subordinates(owner) {
            match *subordinate {
                Subordinate::Association(association) => {
                    self.visit_child(project.get(association).child)
                }
                Subordinate::ContentContainer(container) => {
                    self.visit_subordinates(SubordinateOwner::ContentContainer(container))
                }
                Subordinate::ContentChoice(choice) => {
                    self.visit_subordinates(SubordinateOwner::ContentChoice(choice))
                }
                Subordinate::AttributeContainer(_) => {}
            }
        }
    }

    fn visit_child(&mut self, child: AssociationChild) {
        match child {
            AssociationChild::Class(class) => self.visit(class),
            AssociationChild::ClassUnion(union) => {
                for component in &self.facts.project().get(union).components {
                    self.visit_child(*component);
                }
            }
        }
    }

    fn decide(
        &self,
        class: Ref<PsmClass>,
        naming: &mut NamingSupport<'p>,
        log: &mut TranslationLog,
    ) -> ClassTranslationData {
        let facts = self.facts;
        let name_base = naming.name_for_complex_type(class, log);
        let complex_type_name = facts.is_complex_type(class).then(|| name_base.clone());
        let (model_group_name, attribute_group_name) = if facts.needs_groups(class) {
            let groups = (model_group_name(&name_base), attribute_group_name(&name_base));
            naming.register(groups.0.clone());
            naming.register(groups.1.clone());
            naming.register(optional_attribute_group_name(&groups.1));
            (Some(groups.0), Some(groups.1))
        } else {
            (None, None)
        };
        let requested_usage = if facts.is_externally_represented(class) {
            AttributeGroupUsage::BOTH
        } else {
            AttributeGroupUsage::NONE
        };

        ClassTranslationData {
            name_base,
            complex_type_name,
            model_group_name,
            attribute_group_name,
            uses_extension: facts.uses_extension(class),
            has_attributes: !facts.project().get(class).attributes.is_empty(),
            requested_usage,
            ..ClassTranslationData::default()
        }
    }

    /// Plans the diagram of a foreign class and takes over its decisions, with prefixed names.
    fn foreign_data(
        &self,
        class: Ref<PsmClass>,
        foreign_plans: &mut HashMap<Ref<PsmDiagram>, Plan>,
    ) -> ClassTranslationData {
        let project = self.facts.project();
        let psm_class = project.get(class);
        let diagram = psm_class.diagram;

        let mut data = if self.stack.contains(&diagram) {
            // Mutually referencing diagrams: decide locally without recursing.
            let name_base = psm_class.name.trim().to_string();
            ClassTranslationData {
                complex_type_name: self.facts.is_complex_type(class).then(|| name_base.clone()),
                model_group_name: self
                    .facts
                    .needs_groups(class)
                    .then(|| model_group_name(&name_base)),
                attribute_group_name: self
                    .facts
                    .needs_groups(class)
                    .then(|| attribute_group_name(&name_base)),
                has_attributes: !psm_class.attributes.is_empty(),
                name_base,
                ..ClassTranslationData::default()
            }
        } else {
            let plan = foreign_plans.entry(diagram).or_insert_with(|| {
                let mut planner = Planner::new(self.facts, diagram, &self.replacement);
                planner.stack = self.stack.clone();
                planner.stack.push(diagram);
                let mut naming = NamingSupport::new(project, diagram, &self.replacement);
                // Diagnostics belong to the translation of the other diagram
                let mut scratch = TranslationLog::new(Severities::default());
                planner.plan(&mut naming, &mut scratch)
            });
            plan.data.get(&class).cloned().unwrap_or_default()
        };

        let prefix = project
            .reference_between(self.diagram, diagram)
            .filter(|reference| reference.namespace().is_some())
            .map(|reference| reference.namespace_prefix.clone());
        if let Some(prefix) = prefix {
            let names = [
                Some(&mut data.name_base),
                data.complex_type_name.as_mut(),
                data.model_group_name.as_mut(),
                data.attribute_group_name.as_mut(),
            ];
            for name in names.into_iter().flatten() {
                *name = format!("{prefix}:{name}");
            }
        }
        data.foreign = true;
        data.requested_usage = AttributeGroupUsage::NONE;
        data.emitted_usage = AttributeGroupUsage::NONE;
        data
    }

    /// The classes whose attribute groups the content of `class` refers to.
    pub(super) fn attribute_sources(
        facts: &ProjectFacts,
        class: Ref<PsmClass>,
    ) -> Vec<Ref<PsmClass>> {
        let project = facts.project();
        let mut sources = Vec::new();
        if let Some(represented) = facts.represented(class) {
            sources.push(represented);
        }
        if let Some(general) = project.general_of(class) {
            if !facts.uses_extension(class) {
                sources.push(general);
            }
        }
        Self::subordinate_sources(project, SubordinateOwner::Class(class), &mut sources);
        sources
    }

    fn subordinate_sources(
        project: &PsmProject,
        owner: SubordinateOwner,
        sources: &mut Vec<Ref<PsmClass>>,
    ) {
        for subordinate in project.subordinates(owner) {
            match *subordinate {
                Subordinate::Association(association) => {
                    Self::child_sources(project, project.get(association).child, sources)
                }
                Subordinate::ContentChoice(choice) => Self::subordinate_sources(
                    project,
                    SubordinateOwner::ContentChoice(choice),
                    sources,
                ),
                // Content containers are elements of their own
                Subordinate::ContentContainer(_) | Subordinate::AttributeContainer(_) => {}
            }
        }
    }

    fn child_sources(
        project: &PsmProject,
        child: AssociationChild,
        sources: &mut Vec<Ref<PsmClass>>,
    ) {
        match child {
            AssociationChild::Class(class) => {
                if !project.get(class).has_element_label() {
                    sources.push(class);
                }
            }
            AssociationChild::ClassUnion(union) => {
                for component in &project.get(union).components {
                    Self::child_sources(project, *component, sources);
                }
            }
        }
    }

    /// Propagates `has_attributes` along attribute-group references until nothing changes.
    fn compute_has_attributes(&mut self) {
        let sources: Vec<_> = self
            .plan
            .order
            .iter()
            .map(|class| (*class, Self::attribute_sources(self.facts, *class)))
            .collect();
        loop {
            let mut changed = false;
            for (class, class_sources) in &sources {
                if self.plan.data[class].has_attributes {
                    continue;
                }
                let inherited = class_sources.iter().any(|source| {
                    self.plan
                        .data
                        .get(source)
                        .is_some_and(|data| data.has_attributes)
                });
                if inherited {
                    if let Some(data) = self.plan.data.get_mut(class) {
                        data.has_attributes = true;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use xcase_psm::{DataType, Multiplicity, PsmAttribute};

    use super::*;

    fn log() -> TranslationLog {
        TranslationLog::new(Severities::default())
    }

    #[test]
    fn decides_forms() {
        let mut project = PsmProject::new();
        let diagram = project.add_diagram("d");
        let person = project.add_root_class(diagram, "Person");
        project.get_mut(person).element_label = Some("person".into());
        let address = project.add_child_class(
            SubordinateOwner::Class(person),
            diagram,
            "Address",
            Multiplicity::ONE,
        );
        let employee = project.add_class(diagram, "Employee");
        project.get_mut(employee).element_label = Some("employee".into());
        project.add_generalization(person, employee);

        let facts = ProjectFacts::new(&project, &mut log());
        assert!(facts.is_complex_type(person));
        assert!(!facts.needs_groups(person));
        assert!(facts.uses_extension(employee));
        assert!(!facts.is_complex_type(address));
        assert!(facts.needs_groups(address));
    }

    #[test]
    fn unlabelled_generals_of_labelled_classes_become_base_types() {
        let mut project = PsmProject::new();
        let diagram = project.add_diagram("d");
        let base = project.add_root_class(diagram, "Base");
        let derived = project.add_root_class(diagram, "Derived");
        project.get_mut(derived).element_label = Some("derived".into());
        project.add_generalization(base, derived);
        let owner = project.add_root_class(diagram, "Owner");
        project.get_mut(owner).element_label = Some("owner".into());
        let part = project.add_child_class(
            SubordinateOwner::Class(owner),
            diagram,
            "Part",
            Multiplicity::ONE,
        );
        let special_part = project.add_class(diagram, "SpecialPart");
        project.get_mut(special_part).element_label = Some("special".into());
        project.add_generalization(part, special_part);

        let facts = ProjectFacts::new(&project, &mut log());
        assert!(facts.is_complex_type(base));
        assert!(!facts.needs_groups(base));
        assert!(facts.uses_extension(derived));
        // Associations refer to the groups of an unlabelled class
        assert!(!facts.is_complex_type(part));
        assert!(facts.needs_groups(part));
        assert!(!facts.uses_extension(special_part));
    }

    #[test]
    fn represented_classes_get_groups() {
        let mut project = PsmProject::new();
        let diagram = project.add_diagram("d");
        let address = project.add_root_class(diagram, "Address");
        project.get_mut(address).element_label = Some("address".into());
        let home = project.add_root_class(diagram, "Home");
        project.get_mut(home).element_label = Some("home".into());
        project.set_represented(home, Some(address));

        let facts = ProjectFacts::new(&project, &mut log());
        assert!(!facts.is_complex_type(address));
        assert!(facts.needs_groups(address));
        assert!(facts.is_complex_type(home));
        assert_eq!(facts.represented(home), Some(address));
    }

    #[test]
    fn ignores_representative_cycles() {
        let mut project = PsmProject::new();
        let diagram = project.add_diagram("d");
        let a = project.add_root_class(diagram, "A");
        let b = project.add_root_class(diagram, "B");
        project.set_represented(a, Some(b));
        project.set_represented(b, Some(a));

        let mut log = log();
        let facts = ProjectFacts::new(&project, &mut log);
        assert_eq!(facts.represented(a), None);
        assert_eq!(facts.represented(b), None);
        assert_eq!(log.count(MessageId::XsRepresentativeCycle), 2);
    }

    #[test]
    fn plans_in_depth_first_order_and_propagates_attributes() {
        let mut project = PsmProject::new();
        let diagram = project.add_diagram("d");
        let order = project.add_root_class(diagram, "Order");
        project.get_mut(order).element_label = Some("order".into());
        let customer = project.add_class(diagram, "Customer");
        let details = project.add_child_class(
            SubordinateOwner::Class(order),
            diagram,
            "Details",
            Multiplicity::ONE,
        );
        project.set_represented(details, Some(customer));
        project.add_attribute(
            customer,
            PsmAttribute::new("id").with_type(DataType::builtin("int")),
        );

        let mut log = log();
        let facts = ProjectFacts::new(&project, &mut log);
        let mut naming = NamingSupport::new(&project, diagram, "-");
        let plan = Planner::new(&facts, diagram, "-").plan(&mut naming, &mut log);

        assert_eq!(plan.order, vec![order, customer, details]);
        assert!(plan.data[&customer].has_attributes);
        assert!(plan.data[&details].has_attributes);
        // through the attribute group of the unlabelled child
        assert!(plan.data[&order].has_attributes);
        assert_eq!(plan.data[&details].model_group_name.as_deref(), Some("Details-c"));
    }
}
