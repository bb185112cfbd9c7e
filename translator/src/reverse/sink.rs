//! Where the reverse translation writes the model it creates.

use xcase_psm::{
    Multiplicity, PsmAttribute, PsmAttributeContainer, PsmClass, PsmContentChoice,
    PsmContentContainer, PsmDiagram, PsmProject, Ref, SimpleDataType, SubordinateOwner,
};

/// The properties of a class created by the reverse translation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewClass {
    pub name: String,
    pub element_label: Option<String>,
    pub is_abstract: bool,
}

/// The model operations the reverse translation needs. All classes are created in the diagram
/// the sink was opened for.
pub trait ModelSink {
    fn create_simple_type(&mut self, simple_type: SimpleDataType) -> Ref<SimpleDataType>;
    fn create_root_class(&mut self, class: NewClass) -> Ref<PsmClass>;
    fn create_child_class(
        &mut self,
        owner: SubordinateOwner,
        class: NewClass,
        multiplicity: Multiplicity,
    ) -> Ref<PsmClass>;
    fn add_attribute(&mut self, class: Ref<PsmClass>, attribute: PsmAttribute)
        -> Ref<PsmAttribute>;
    fn add_content_container(
        &mut self,
        owner: SubordinateOwner,
        name: String,
    ) -> Ref<PsmContentContainer>;
    fn add_content_choice(&mut self, owner: SubordinateOwner) -> Ref<PsmContentChoice>;
    fn add_attribute_container(
        &mut self,
        owner: SubordinateOwner,
        attributes: Vec<PsmAttribute>,
    ) -> Ref<PsmAttributeContainer>;
    fn add_generalization(&mut self, general: Ref<PsmClass>, specific: Ref<PsmClass>);
    fn set_represented(&mut self, class: Ref<PsmClass>, represented: Ref<PsmClass>);
    fn add_comment(&mut self, class: Ref<PsmClass>, text: String);
    /// Arranges the diagram; a no-op for sinks without a layout.
    fn auto_layout(&mut self) {}
}

/// Writes straight into a project. Nothing can be undone.
pub struct ProjectSink<'p> {
    project: &'p mut PsmProject,
    diagram: Ref<PsmDiagram>,
}

impl<'p> ProjectSink<'p> {
    pub fn new(project: &'p mut PsmProject, diagram: Ref<PsmDiagram>) -> Self {
        Self { project, diagram }
    }

    fn apply_class(&mut self, class: Ref<PsmClass>, new_class: NewClass) -> Ref<PsmClass> {
        let psm_class = self.project.get_mut(class);
        psm_class.element_label = new_class.element_label;
        psm_class.is_abstract = new_class.is_abstract;
        class
    }
}

impl ModelSink for ProjectSink<'_> {
    fn create_simple_type(&mut self, simple_type: SimpleDataType) -> Ref<SimpleDataType> {
        self.project.add_simple_type(simple_type)
    }

    fn create_root_class(&mut self, class: NewClass) -> Ref<PsmClass> {
        let created = self.project.add_root_class(self.diagram, class.name.clone());
        self.apply_class(created, class)
    }

    fn create_child_class(
        &mut self,
        owner: SubordinateOwner,
        class: NewClass,
        multiplicity: Multiplicity,
    ) -> Ref<PsmClass> {
        let created =
            self.project
                .add_child_class(owner, self.diagram, class.name.clone(), multiplicity);
        self.apply_class(created, class)
    }

    fn add_attribute(
        &mut self,
        class: Ref<PsmClass>,
        attribute: PsmAttribute,
    ) -> Ref<PsmAttribute> {
        self.project.add_attribute(class, attribute)
    }

    fn add_content_container(
        &mut self,
        owner: SubordinateOwner,
        name: String,
    ) -> Ref<PsmContentContainer> {
        self.project.add_content_container(owner, name)
    }

    fn add_content_choice(&mut self, owner: SubordinateOwner) -> Ref<PsmContentChoice> {
        self.project.add_content_choice(owner)
    }

    fn add_attribute_container(
        &mut self,
        owner: SubordinateOwner,
        attributes: Vec<PsmAttribute>,
    ) -> Ref<PsmAttributeContainer> {
        self.project.add_attribute_container(owner, attributes)
    }

    fn add_generalization(&mut self, general: Ref<PsmClass>, specific: Ref<PsmClass>) {
        self.project.add_generalization(general, specific);
    }

    fn set_represented(&mut self, class: Ref<PsmClass>, represented: Ref<PsmClass>) {
        self.project.set_represented(class, Some(represented));
    }

    fn add_comment(&mut self, class: Ref<PsmClass>, text: String) {
        self.project.add_comment(class, text);
    }
}

/// A recorded [`ModelSink`] operation
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    CreateSimpleType(SimpleDataType),
    CreateRootClass(NewClass),
    CreateChildClass {
        owner: SubordinateOwner,
        class: NewClass,
        multiplicity: Multiplicity,
    },
    AddAttribute {
        class: Ref<PsmClass>,
        attribute: PsmAttribute,
    },
    AddContentContainer {
        owner: SubordinateOwner,
        name: String,
    },
    AddContentChoice {
        owner: SubordinateOwner,
    },
    AddAttributeContainer {
        owner: SubordinateOwner,
        attributes: Vec<PsmAttribute>,
    },
    AddGeneralization {
        general: Ref<PsmClass>,
        specific: Ref<PsmClass>,
    },
    SetRepresented {
        class: Ref<PsmClass>,
        represented: Ref<PsmClass>,
    },
    AddComment {
        class: Ref<PsmClass>,
        text: String,
    },
    AutoLayout,
}

impl Command {
    /// Executes the command against `sink`.
    pub fn apply(&self, sink: &mut dyn ModelSink) {
        match self.clone() {
            Self::CreateSimpleType(simple_type) => {
                sink.create_simple_type(simple_type);
            }
            Self::CreateRootClass(class) => {
                sink.create_root_class(class);
            }
            Self::CreateChildClass {
                owner,
                class,
                multiplicity,
            } => {
                sink.create_child_class(owner, class, multiplicity);
            }
            Self::AddAttribute { class, attribute } => {
                sink.add_attribute(class, attribute);
            }
            Self::AddContentContainer { owner, name } => {
                sink.add_content_container(owner, name);
            }
            Self::AddContentChoice { owner } => {
                sink.add_content_choice(owner);
            }
            Self::AddAttributeContainer { owner, attributes } => {
                sink.add_attribute_container(owner, attributes);
            }
            Self::AddGeneralization { general, specific } => {
                sink.add_generalization(general, specific)
            }
            Self::SetRepresented { class, represented } => {
                sink.set_represented(class, represented)
            }
            Self::AddComment { class, text } => sink.add_comment(class, text),
            Self::AutoLayout => sink.auto_layout(),
        }
    }
}

/// Journals every operation before passing it on to a [`ProjectSink`].
pub struct CommandSink<'p> {
    inner: ProjectSink<'p>,
    commands: Vec<Command>,
}

impl<'p> CommandSink<'p> {
    pub fn new(inner: ProjectSink<'p>) -> Self {
        Self {
            inner,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}

impl ModelSink for CommandSink<'_> {
    fn create_simple_type(&mut self, simple_type: SimpleDataType) -> Ref<SimpleDataType> {
        self.commands
            .push(Command::CreateSimpleType(simple_type.clone()));
        self.inner.create_simple_type(simple_type)
    }

    fn create_root_class(&mut self, class: NewClass) -> Ref<PsmClass> {
        self.commands.push(Command::CreateRootClass(class.clone()));
        self.inner.create_root_class(class)
    }

    fn create_child_class(
        &mut self,
        owner: SubordinateOwner,
        class: NewClass,
        multiplicity: Multiplicity,
    ) -> Ref<PsmClass> {
        self.commands.push(Command::CreateChildClass {
            owner,
            class: class.clone(),
            multiplicity,
        });
        self.inner.create_child_class(owner, class, multiplicity)
    }

    fn add_attribute(
        &mut self,
        class: Ref<PsmClass>,
        attribute: PsmAttribute,
    ) -> Ref<PsmAttribute> {
        self.commands.push(Command::AddAttribute {
            class,
            attribute: attribute.clone(),
        });
        self.inner.add_attribute(class, attribute)
    }

    fn add_content_container(
        &mut self,
        owner: SubordinateOwner,
        name: String,
    ) -> Ref<PsmContentContainer> {
        self.commands.push(Command::AddContentContainer {
            owner,
            name: name.clone(),
        });
        self.inner.add_content_container(owner, name)
    }

    fn add_content_choice(&mut self, owner: SubordinateOwner) -> Ref<PsmContentChoice> {
        self.commands.push(Command::AddContentChoice { owner });
        self.inner.add_content_choice(owner)
    }

    fn add_attribute_container(
        &mut self,
        owner: SubordinateOwner,
        attributes: Vec<PsmAttribute>,
    ) -> Ref<PsmAttributeContainer> {
        self.commands.push(Command::AddAttributeContainer {
            owner,
            attributes: attributes.clone(),
        });
        self.inner.add_attribute_container(owner, attributes)
    }

    fn add_generalization(&mut self, general: Ref<PsmClass>, specific: Ref<PsmClass>) {
        self.commands
            .push(Command::AddGeneralization { general, specific });
        self.inner.add_generalization(general, specific);
    }

    fn set_represented(&mut self, class: Ref<PsmClass>, represented: Ref<PsmClass>) {
        self.commands
            .push(Command::SetRepresented { class, represented });
        self.inner.set_represented(class, represented);
    }

    fn add_comment(&mut self, class: Ref<PsmClass>, text: String) {
        self.commands.push(Command::AddComment {
            class,
            text: text.clone(),
        });
        self.inner.add_comment(class, text);
    }

    fn auto_layout(&mut self) {
        self.commands.push(Command::AutoLayout);
        self.inner.auto_layout();
    }
}

/// An import that can be undone and redone as one step.
///
/// Undo restores the project as it was before the import. Redo recreates the diagram and replays
/// the journal; since the project's arenas only grow, the replay reproduces the same references.
#[derive(Clone, Debug)]
pub struct ImportCommand {
    before: PsmProject,
    diagram_name: String,
    target_namespace: Option<String>,
    commands: Vec<Command>,
}

impl ImportCommand {
    pub fn new(
        before: PsmProject,
        diagram_name: String,
        target_namespace: Option<String>,
        commands: Vec<Command>,
    ) -> Self {
        Self {
            before,
            diagram_name,
            target_namespace,
            commands,
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn undo(&self, project: &mut PsmProject) {
        *project = self.before.clone();
    }

    /// Reapplies the import to the state restored by [`undo`](Self::undo).
    pub fn redo(&self, project: &mut PsmProject) -> Ref<PsmDiagram> {
        *project = self.before.clone();
        let diagram = create_diagram(project, &self.diagram_name, self.target_namespace.clone());
        let mut sink = ProjectSink::new(project, diagram);
        for command in &self.commands {
            command.apply(&mut sink);
        }
        diagram
    }
}

/// Adds the diagram an import writes into.
pub fn create_diagram(
    project: &mut PsmProject,
    name: &str,
    target_namespace: Option<String>,
) -> Ref<PsmDiagram> {
    let diagram = project.add_diagram(name);
    project.get_mut(diagram).target_namespace = target_namespace;
    diagram
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use xcase_psm::DataType;

    use super::*;

    fn populate(sink: &mut dyn ModelSink) {
        let person = sink.create_root_class(NewClass {
            name: "Person".into(),
            element_label: Some("person".into()),
            is_abstract: false,
        });
        sink.add_attribute(
            person,
            PsmAttribute::new("name").with_type(DataType::builtin("string")),
        );
        let address = sink.create_child_class(
            SubordinateOwner::Class(person),
            NewClass {
                name: "Address".into(),
                ..NewClass::default()
            },
            Multiplicity::MANY,
        );
        sink.add_comment(address, "postal address".into());
    }

    #[test]
    fn journal_replays_to_the_same_project() {
        let mut project = PsmProject::new();
        project.add_diagram("existing");
        let before = project.clone();

        let diagram = create_diagram(&mut project, "imported", Some("urn:x".into()));
        let mut sink = CommandSink::new(ProjectSink::new(&mut project, diagram));
        populate(&mut sink);
        assert_eq!(sink.commands().len(), 4);
        let command = ImportCommand::new(
            before.clone(),
            "imported".into(),
            Some("urn:x".into()),
            sink.into_commands(),
        );
        let after = project.clone();

        command.undo(&mut project);
        assert_eq!(project, before);
        assert_eq!(command.redo(&mut project), diagram);
        assert_eq!(project, after);
    }
}
