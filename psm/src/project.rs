#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::components::{Component, ComponentTraits, HasArenaContainer};
use super::{
    AssociationChild, DiagramReference, Generalization, Multiplicity, PsmAssociation,
    PsmAttribute, PsmAttributeContainer, PsmClass, PsmClassUnion, PsmContentChoice,
    PsmContentContainer, PsmDiagram, Ref, SimpleDataType, Subordinate, SubordinateOwner,
};

/// Arena holding every model element of a project.
///
/// Elements are never removed; a [`Ref`] obtained from a project stays valid for its lifetime.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PsmProject {
    #[cfg_attr(feature = "serde", serde(default))]
    pub default_namespace: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) diagrams: Vec<PsmDiagram>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) classes: Vec<PsmClass>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) attributes: Vec<PsmAttribute>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) associations: Vec<PsmAssociation>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) class_unions: Vec<PsmClassUnion>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) content_containers: Vec<PsmContentContainer>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) content_choices: Vec<PsmContentChoice>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) attribute_containers: Vec<PsmAttributeContainer>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) generalizations: Vec<Generalization>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) simple_types: Vec<SimpleDataType>,
}

impl PsmProject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves a component by reference.
    ///
    /// Panics if the reference was not created by this project.
    pub fn get<C>(&self, ref_: Ref<C>) -> &C
    where
        C: Component,
        ComponentTraits: HasArenaContainer<C>,
    {
        ComponentTraits::container(self)
            .get(ref_.index())
            .expect("Invalid component reference (out-of-bounds)")
    }

    pub fn get_mut<C>(&mut self, ref_: Ref<C>) -> &mut C
    where
        C: Component,
        ComponentTraits: HasArenaContainer<C>,
    {
        ComponentTraits::container_mut(self)
            .get_mut(ref_.index())
            .expect("Invalid component reference (out-of-bounds)")
    }

    /// Checks whether `ref_` points into this project.
    pub fn contains<C>(&self, ref_: Ref<C>) -> bool
    where
        C: Component,
        ComponentTraits: HasArenaContainer<C>,
    {
        ref_.index() < ComponentTraits::container(self).len()
    }

    pub fn create<C>(&mut self, value: C) -> Ref<C>
    where
        C: Component,
        ComponentTraits: HasArenaContainer<C>,
    {
        let container = ComponentTraits::container_mut(self);
        container.push(value);
        Ref::from_index(container.len() - 1)
    }

    /// Iterates over all components of one kind, in creation order.
    pub fn iter<'a, C: 'a>(&'a self) -> impl Iterator<Item = (Ref<C>, &'a C)>
    where
        C: Component,
        ComponentTraits: HasArenaContainer<C>,
    {
        ComponentTraits::container(self)
            .iter()
            .enumerate()
            .map(|(index, value)| (Ref::from_index(index), value))
    }

    pub fn count<C>(&self) -> usize
    where
        C: Component,
        ComponentTraits: HasArenaContainer<C>,
    {
        ComponentTraits::container(self).len()
    }

    pub fn add_diagram(&mut self, name: impl Into<String>) -> Ref<PsmDiagram> {
        self.create(PsmDiagram {
            name: name.into(),
            ..PsmDiagram::default()
        })
    }

    pub fn add_diagram_reference(&mut self, diagram: Ref<PsmDiagram>, reference: DiagramReference) {
        self.get_mut(diagram).references.push(reference);
    }

    /// Creates a class that is not yet attached anywhere in the diagram.
    pub fn add_class(&mut self, diagram: Ref<PsmDiagram>, name: impl Into<String>) -> Ref<PsmClass> {
        self.create(PsmClass::new(name, diagram))
    }

    pub fn add_root_class(
        &mut self,
        diagram: Ref<PsmDiagram>,
        name: impl Into<String>,
    ) -> Ref<PsmClass> {
        let class = self.add_class(diagram, name);
        self.get_mut(diagram).roots.push(class);
        class
    }

    /// Appends a subordinate component to its owner.
    pub fn push_subordinate(&mut self, owner: SubordinateOwner, subordinate: Subordinate) {
        match owner {
            SubordinateOwner::Class(class) => self.get_mut(class).components.push(subordinate),
            SubordinateOwner::ContentContainer(container) => {
                self.get_mut(container).components.push(subordinate)
            }
            SubordinateOwner::ContentChoice(choice) => {
                self.get_mut(choice).components.push(subordinate)
            }
        }
    }

    pub fn subordinates(&self, owner: SubordinateOwner) -> &[Subordinate] {
        match owner {
            SubordinateOwner::Class(class) => &self.get(class).components,
            SubordinateOwner::ContentContainer(container) => &self.get(container).components,
            SubordinateOwner::ContentChoice(choice) => &self.get(choice).components,
        }
    }

    /// The diagram an owner belongs to (content containers and choices are looked up through
    /// the class that transitively owns them).
    pub fn owner_diagram(&self, owner: SubordinateOwner) -> Option<Ref<PsmDiagram>> {
        match owner {
            SubordinateOwner::Class(class) => Some(self.get(class).diagram),
            _ => self
                .iter::<PsmClass>()
                .find(|(class, _)| self.owns_transitively(SubordinateOwner::Class(*class), owner))
                .map(|(_, class)| class.diagram),
        }
    }

    fn owns_transitively(&self, owner: SubordinateOwner, target: SubordinateOwner) -> bool {
        self.subordinates(owner).iter().any(|sub| {
            let nested = match *sub {
                Subordinate::ContentContainer(c) => SubordinateOwner::ContentContainer(c),
                Subordinate::ContentChoice(c) => SubordinateOwner::ContentChoice(c),
                _ => return false,
            };
            nested == target || self.owns_transitively(nested, target)
        })
    }

    pub fn add_association(
        &mut self,
        owner: SubordinateOwner,
        child: impl Into<AssociationChild>,
        multiplicity: Multiplicity,
    ) -> Ref<PsmAssociation> {
        let association = self.create(PsmAssociation {
            child: child.into(),
            multiplicity,
        });
        self.push_subordinate(owner, Subordinate::Association(association));
        association
    }

    /// Creates a class and attaches it to `owner` through a new association.
    pub fn add_child_class(
        &mut self,
        owner: SubordinateOwner,
        diagram: Ref<PsmDiagram>,
        name: impl Into<String>,
        multiplicity: Multiplicity,
    ) -> Ref<PsmClass> {
        let class = self.add_class(diagram, name);
        self.add_association(owner, class, multiplicity);
        class
    }

    pub fn add_class_union(
        &mut self,
        owner: SubordinateOwner,
        components: Vec<AssociationChild>,
        multiplicity: Multiplicity,
    ) -> Ref<PsmClassUnion> {
        let union = self.create(PsmClassUnion { components });
        self.add_association(owner, union, multiplicity);
        union
    }

    pub fn add_attribute(&mut self, class: Ref<PsmClass>, attribute: PsmAttribute) -> Ref<PsmAttribute> {
        let attribute = self.create(attribute);
        self.get_mut(class).attributes.push(attribute);
        attribute
    }

    pub fn add_content_container(
        &mut self,
        owner: SubordinateOwner,
        name: impl Into<String>,
    ) -> Ref<PsmContentContainer> {
        let container = self.create(PsmContentContainer {
            name: name.into(),
            components: Vec::new(),
        });
        self.push_subordinate(owner, Subordinate::ContentContainer(container));
        container
    }

    pub fn add_content_choice(&mut self, owner: SubordinateOwner) -> Ref<PsmContentChoice> {
        let choice = self.create(PsmContentChoice::default());
        self.push_subordinate(owner, Subordinate::ContentChoice(choice));
        choice
    }

    pub fn add_attribute_container(
        &mut self,
        owner: SubordinateOwner,
        attributes: Vec<PsmAttribute>,
    ) -> Ref<PsmAttributeContainer> {
        let attributes = attributes
            .into_iter()
            .map(|attribute| self.create(attribute))
            .collect();
        let container = self.create(PsmAttributeContainer { attributes });
        self.push_subordinate(owner, Subordinate::AttributeContainer(container));
        container
    }

    pub fn add_generalization(
        &mut self,
        general: Ref<PsmClass>,
        specific: Ref<PsmClass>,
    ) -> Ref<Generalization> {
        let generalization = self.create(Generalization { general, specific });
        self.get_mut(specific).generalizations.push(generalization);
        self.get_mut(general).specifications.push(generalization);
        generalization
    }

    pub fn set_represented(&mut self, class: Ref<PsmClass>, represented: Option<Ref<PsmClass>>) {
        self.get_mut(class).represented_class = represented;
    }

    pub fn add_comment(&mut self, class: Ref<PsmClass>, text: impl Into<String>) {
        self.get_mut(class).comments.push(text.into());
    }

    pub fn add_simple_type(&mut self, simple_type: SimpleDataType) -> Ref<SimpleDataType> {
        self.create(simple_type)
    }

    pub fn find_simple_type(&self, name: &str) -> Option<Ref<SimpleDataType>> {
        self.iter::<SimpleDataType>()
            .find(|(_, simple_type)| simple_type.name == name)
            .map(|(ref_, _)| ref_)
    }

    /// The general class of `class`, if it is a specialization. Only the first generalization is
    /// considered.
    pub fn general_of(&self, class: Ref<PsmClass>) -> Option<Ref<PsmClass>> {
        self.get(class)
            .generalizations
            .first()
            .map(|generalization| self.get(*generalization).general)
    }

    /// The direct specializations of `class`, in creation order.
    pub fn specifics_of(&self, class: Ref<PsmClass>) -> Vec<Ref<PsmClass>> {
        self.get(class)
            .specifications
            .iter()
            .map(|generalization| self.get(*generalization).specific)
            .collect()
    }

    /// All classes that structurally represent `class`.
    pub fn representatives_of(&self, class: Ref<PsmClass>) -> Vec<Ref<PsmClass>> {
        self.iter::<PsmClass>()
            .filter(|(_, candidate)| candidate.represented_class == Some(class))
            .map(|(ref_, _)| ref_)
            .collect()
    }

    /// The reference through which `from` sees `to`, if `to` is in another diagram.
    pub fn reference_between(
        &self,
        from: Ref<PsmDiagram>,
        to: Ref<PsmDiagram>,
    ) -> Option<&DiagramReference> {
        self.get(from)
            .references
            .iter()
            .find(|reference| reference.referenced == to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataType, UpperBound};

    #[test]
    fn builds_a_small_tree() {
        let mut project = PsmProject::new();
        let diagram = project.add_diagram("orders");
        let order = project.add_root_class(diagram, "Order");
        project.get_mut(order).element_label = Some("order".into());
        project.add_attribute(
            order,
            PsmAttribute::new("id").with_type(DataType::builtin("int")),
        );
        let item = project.add_child_class(
            SubordinateOwner::Class(order),
            diagram,
            "Item",
            Multiplicity::AT_LEAST_ONE,
        );

        assert_eq!(project.get(diagram).roots, vec![order]);
        assert_eq!(project.get(order).attributes.len(), 1);
        let association = match project.get(order).components.as_slice() {
            [Subordinate::Association(association)] => *association,
            other => panic!("expected a single association, got {other:?}"),
        };
        let association = project.get(association);
        assert_eq!(association.child, AssociationChild::Class(item));
        assert_eq!(association.multiplicity.upper, UpperBound::Unbounded);
    }

    #[test]
    fn generalizations_are_linked_both_ways() {
        let mut project = PsmProject::new();
        let diagram = project.add_diagram("d");
        let general = project.add_root_class(diagram, "Vehicle");
        let car = project.add_class(diagram, "Car");
        let bike = project.add_class(diagram, "Bike");
        project.add_generalization(general, car);
        project.add_generalization(general, bike);

        assert_eq!(project.general_of(car), Some(general));
        assert_eq!(project.general_of(general), None);
        assert_eq!(project.specifics_of(general), vec![car, bike]);
    }

    #[test]
    fn finds_representatives_and_owner_diagrams() {
        let mut project = PsmProject::new();
        let diagram = project.add_diagram("d");
        let address = project.add_root_class(diagram, "Address");
        let person = project.add_root_class(diagram, "Person");
        let choice = project.add_content_choice(SubordinateOwner::Class(person));
        let home = project.add_child_class(
            SubordinateOwner::ContentChoice(choice),
            diagram,
            "Home",
            Multiplicity::ONE,
        );
        project.set_represented(home, Some(address));

        assert_eq!(project.representatives_of(address), vec![home]);
        assert_eq!(
            project.owner_diagram(SubordinateOwner::ContentChoice(choice)),
            Some(diagram)
        );
    }
}
