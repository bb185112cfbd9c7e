#![allow(dead_code)]

use std::collections::HashSet;

use xcase_psm::{
    AssociationChild, DataType, PsmAttribute, PsmClass, PsmDiagram, PsmProject, Ref, Subordinate,
    SubordinateOwner,
};

pub const XS: &str = "http://www.w3.org/2001/XMLSchema";

/// An indented outline of a diagram, independent of arena IDs.
pub fn describe(project: &PsmProject, diagram: Ref<PsmDiagram>) -> Vec<String> {
    let mut lines = Vec::new();
    for root in &project.get(diagram).roots {
        describe_class(project, *root, "root", 0, &mut lines);
    }
    lines
}

fn describe_attribute(project: &PsmProject, attribute: &PsmAttribute) -> String {
    let type_ = match &attribute.type_ {
        Some(DataType::Builtin(name)) => name.clone(),
        Some(DataType::Simple(simple_type)) => project.get(*simple_type).name.clone(),
        None => "-".into(),
    };
    format!("@{}: {type_} [{}]", attribute.xml_name(), attribute.multiplicity)
}

fn describe_class(
    project: &PsmProject,
    class: Ref<PsmClass>,
    multiplicity: &str,
    depth: usize,
    lines: &mut Vec<String>,
) {
    let indent = "  ".repeat(depth);
    let psm_class = project.get(class);
    let mut line = format!("{indent}class {} [{multiplicity}]", psm_class.name);
    if let Some(label) = psm_class.label() {
        line.push_str(&format!(" <{label}>"));
    }
    if psm_class.is_abstract {
        line.push_str(" abstract");
    }
    if let Some(general) = project.general_of(class) {
        line.push_str(&format!(" : {}", project.get(general).name));
    }
    if let Some(represented) = psm_class.represented_class {
        line.push_str(&format!(" = {}", project.get(represented).name));
    }
    lines.push(line);
    for attribute in &psm_class.attributes {
        lines.push(format!(
            "{indent}  {}",
            describe_attribute(project, project.get(*attribute))
        ));
    }
    describe_subordinates(project, SubordinateOwner::Class(class), depth + 1, lines);
}

fn describe_subordinates(
    project: &PsmProject,
    owner: SubordinateOwner,
    depth: usize,
    lines: &mut Vec<String>,
) {
    let indent = "  ".repeat(depth);
    for subordinate in project.subordinates(owner) {
        match *subordinate {
            Subordinate::Association(association) => {
                let association = project.get(association);
                let multiplicity = association.multiplicity.to_string();
                match association.child {
                    AssociationChild::Class(child) => {
                        describe_class(project, child, &multiplicity, depth, lines)
                    }
                    AssociationChild::ClassUnion(_) => {
                        lines.push(format!("{indent}union [{multiplicity}]"))
                    }
                }
            }
            Subordinate::ContentContainer(container) => {
                lines.push(format!("{indent}container {}", project.get(container).name));
                describe_subordinates(
                    project,
                    SubordinateOwner::ContentContainer(container),
                    depth + 1,
                    lines,
                );
            }
            Subordinate::ContentChoice(choice) => {
                lines.push(format!("{indent}choice"));
                describe_subordinates(
                    project,
                    SubordinateOwner::ContentChoice(choice),
                    depth + 1,
                    lines,
                );
            }
            Subordinate::AttributeContainer(container) => {
                lines.push(format!("{indent}attributes"));
                for attribute in &project.get(container).attributes {
                    lines.push(format!(
                        "{indent}  {}",
                        describe_attribute(project, project.get(*attribute))
                    ));
                }
            }
        }
    }
}

/// The `name` attributes of all top-level schema children called `kind` (e.g. `group`).
pub fn definitions(document: &roxmltree::Document, kind: &str) -> HashSet<String> {
    document
        .root_element()
        .children()
        .filter(|node| node.has_tag_name((XS, kind)))
        .filter_map(|node| node.attribute("name"))
        .map(str::to_string)
        .collect()
}

/// The top-level schema child of kind `kind` called `name`.
pub fn definition<'a, 'input>(
    document: &'a roxmltree::Document<'input>,
    kind: &str,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    document
        .root_element()
        .children()
        .find(|node| node.has_tag_name((XS, kind)) && node.attribute("name") == Some(name))
}

/// All descendants of `node` called `kind` that carry a `ref` attribute.
pub fn refs<'a>(node: roxmltree::Node<'a, '_>, kind: &str) -> Vec<&'a str> {
    node.descendants()
        .filter(|node| node.has_tag_name((XS, kind)))
        .filter_map(|node| node.attribute("ref"))
        .collect()
}

/// `node` is an `xs:{kind}` whose `name` is `name`.
pub fn is_named(node: &roxmltree::Node, kind: &str, name: &str) -> bool {
    node.has_tag_name((XS, kind)) && node.attribute("name") == Some(name)
}
