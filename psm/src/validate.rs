use std::collections::HashSet;

use thiserror::Error;

use super::components::{Component, ComponentTraits, HasArenaContainer};
use super::{
    AssociationChild, DataType, Generalization, PsmAssociation, PsmAttribute,
    PsmAttributeContainer, PsmClass, PsmClassUnion, PsmContentChoice, PsmContentContainer,
    PsmDiagram, PsmProject, Ref, Subordinate, SubordinateOwner,
};

/// A project whose arena links do not form a usable model
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{owner} refers to {kind} #{id}, which does not exist")]
    DanglingReference {
        owner: String,
        kind: &'static str,
        id: u32,
    },
    #[error("{kind} #{id} contains itself")]
    Cycle { kind: &'static str, id: u32 },
}

fn describe<C: Component>(ref_: Ref<C>) -> String {
    format!("{} #{}", C::DISPLAY_NAME, ref_.id())
}

impl PsmProject {
    /// Checks a project that was not built through the mutation helpers, e.g. one read from a
    /// file. Every [`Ref`] must point into the project, and neither content containers, content
    /// choices nor class unions may contain themselves.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (diagram, psm_diagram) in self.iter::<PsmDiagram>() {
            let owner = describe(diagram);
            for root in &psm_diagram.roots {
                self.check(&owner, *root)?;
            }
            for reference in &psm_diagram.references {
                self.check(&owner, reference.referenced)?;
            }
        }
        for (class, psm_class) in self.iter::<PsmClass>() {
            let owner = describe(class);
            self.check(&owner, psm_class.diagram)?;
            for attribute in &psm_class.attributes {
                self.check(&owner, *attribute)?;
            }
            self.check_subordinates(&owner, &psm_class.components)?;
            if let Some(represented) = psm_class.represented_class {
                self.check(&owner, represented)?;
            }
            for generalization in psm_class
                .generalizations
                .iter()
                .chain(&psm_class.specifications)
            {
                self.check(&owner, *generalization)?;
            }
        }
        for (attribute, psm_attribute) in self.iter::<PsmAttribute>() {
            if let Some(DataType::Simple(simple_type)) = &psm_attribute.type_ {
                self.check(&describe(attribute), *simple_type)?;
            }
        }
        for (association, psm_association) in self.iter::<PsmAssociation>() {
            self.check_child(&describe(association), psm_association.child)?;
        }
        for (union, psm_union) in self.iter::<PsmClassUnion>() {
            let owner = describe(union);
            for component in &psm_union.components {
                self.check_child(&owner, *component)?;
            }
        }
        for (container, psm_container) in self.iter::<PsmContentContainer>() {
            self.check_subordinates(&describe(container), &psm_container.components)?;
        }
        for (choice, psm_choice) in self.iter::<PsmContentChoice>() {
            self.check_subordinates(&describe(choice), &psm_choice.components)?;
        }
        for (container, psm_container) in self.iter::<PsmAttributeContainer>() {
            let owner = describe(container);
            for attribute in &psm_container.attributes {
                self.check(&owner, *attribute)?;
            }
        }
        for (generalization, psm_generalization) in self.iter::<Generalization>() {
            let owner = describe(generalization);
            self.check(&owner, psm_generalization.general)?;
            self.check(&owner, psm_generalization.specific)?;
        }

        for (container, _) in self.iter::<PsmContentContainer>() {
            if self.owns_itself(SubordinateOwner::ContentContainer(container)) {
                return Err(cycle(container));
            }
        }
        for (choice, _) in self.iter::<PsmContentChoice>() {
            if self.owns_itself(SubordinateOwner::ContentChoice(choice)) {
                return Err(cycle(choice));
            }
        }
        for (union, _) in self.iter::<PsmClassUnion>() {
            if self.union_contains_itself(union) {
                return Err(cycle(union));
            }
        }
        Ok(())
    }

    fn check<C>(&self, owner: &str, ref_: Ref<C>) -> Result<(), ValidationError>
    where
        C: Component,
        ComponentTraits: HasArenaContainer<C>,
    {
        if self.contains(ref_) {
            Ok(())
        } else {
            Err(ValidationError::DanglingReference {
                owner: owner.to_string(),
                kind: C::DISPLAY_NAME,
                id: ref_.id(),
            })
        }
    }

    fn check_child(&self, owner: &str, child: AssociationChild) -> Result<(), ValidationError> {
        match child {
            AssociationChild::Class(class) => self.check(owner, class),
            AssociationChild::ClassUnion(union) => self.check(owner, union),
        }
    }

    fn check_subordinates(
        &self,
        owner: &str,
        components: &[Subordinate],
    ) -> Result<(), ValidationError> {
        for subordinate in components {
            match *subordinate {
                Subordinate::Association(association) => self.check(owner, association)?,
                Subordinate::ContentContainer(container) => self.check(owner, container)?,
                Subordinate::ContentChoice(choice) => self.check(owner, choice)?,
                Subordinate::AttributeContainer(container) => self.check(owner, container)?,
            }
        }
        Ok(())
    }

    fn owns_itself(&self, start: SubordinateOwner) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(owner) = stack.pop() {
            for subordinate in self.subordinates(owner) {
                let nested = match *subordinate {
                    Subordinate::ContentContainer(c) => SubordinateOwner::ContentContainer(c),
                    Subordinate::ContentChoice(c) => SubordinateOwner::ContentChoice(c),
                    _ => continue,
                };
                if nested == start {
                    return true;
                }
                if seen.insert(nested) {
                    stack.push(nested);
                }
            }
        }
        false
    }

    fn union_contains_itself(&self, start: Ref<PsmClassUnion>) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(union) = stack.pop() {
            for component in &self.get(union).components {
                let AssociationChild::ClassUnion(nested) = *component else {
                    continue;
                };
                if nested == start {
                    return true;
                }
                if seen.insert(nested) {
                    stack.push(nested);
                }
            }
        }
        false
    }
}

fn cycle<C: Component>(ref_: Ref<C>) -> ValidationError {
    ValidationError::Cycle {
        kind: C::DISPLAY_NAME,
        id: ref_.id(),
    }
}
