//! Passes that turn the raw tree read from a schema into one that can be emitted as PSM.

use std::collections::HashSet;

use xcase_psm::Multiplicity;
use xcase_xsd::{AttributeGroupDefinition, AttributeUse, QName, Use};

use super::p_psm::{NodeId, PClass, PNodeKind, SrTarget};
use super::xsd_to_psm::XsdToPsm;
use crate::forward::naming::{model_group_name, OPTIONAL_GROUP_SUFFIX};
use crate::CONTENT_CONTAINER_MARKER;

impl XsdToPsm<'_, '_> {
    pub(super) fn post_process(&mut self) {
        self.resolve_attribute_groups();
        self.resolve_sr_targets();
        self.resolve_extensions();
        self.flatten_dummies();
        self.merge_attribute_containers();
        self.post_process_sr();
        self.post_process_cc_and_comment();
    }

    /// Copies the attributes of referenced attribute groups into the referencing classes.
    fn resolve_attribute_groups(&mut self) {
        for node in self.diagram.class_ids() {
            let refs = match self.diagram.class_mut(node) {
                Some(class) => std::mem::take(&mut class.attribute_group_refs),
                None => continue,
            };
            if refs.is_empty() {
                continue;
            }
            let represented_groups = self.group_refs_below(node);
            for name in refs {
                let mut visiting = HashSet::new();
                self.copy_attribute_group(node, &name, &represented_groups, &mut visiting);
            }
        }
    }

    /// Model groups referenced from the content of `node`, up to the next element boundary.
    fn group_refs_below(&self, node: NodeId) -> HashSet<QName> {
        let mut groups = HashSet::new();
        let mut stack = self.diagram.children(node).to_vec();
        while let Some(current) = stack.pop() {
            match &self.diagram.node(current).kind {
                PNodeKind::Class(PClass {
                    sr_of: Some(SrTarget::Group(name)),
                    ..
                }) => {
                    groups.insert(name.clone());
                }
                PNodeKind::Dummy | PNodeKind::ContentChoice => {
                    stack.extend_from_slice(self.diagram.children(current));
                }
                _ => {}
            }
        }
        groups
    }

    fn copy_attribute_group(
        &mut self,
        node: NodeId,
        name: &QName,
        represented_groups: &HashSet<QName>,
        visiting: &mut HashSet<QName>,
    ) {
        // The attributes of `X-a` travel with the class read from `X-c`
        if belongs_to_group(name, represented_groups) {
            return;
        }
        if !visiting.insert(name.clone()) {
            self.unresolved(format!("attribute group {name} refers to itself"));
            return;
        }
        let set = self.set;
        // Inside an optional variant an explicit `use="optional"` stands for a required attribute
        let optional_variant = name.local_name.ends_with(OPTIONAL_GROUP_SUFFIX);
        match set.get::<AttributeGroupDefinition>(name) {
            Some(group) => {
                for attribute_use in &group.attribute_uses {
                    match attribute_use {
                        AttributeUse::Attribute(declaration) => {
                            if let Some(mut attribute) =
                                self.attribute_from_declaration(declaration)
                            {
                                if optional_variant && declaration.use_ == Some(Use::Optional) {
                                    attribute.multiplicity = Multiplicity::ONE;
                                }
                                self.push_attribute(node, attribute);
                            }
                        }
                        AttributeUse::GroupRef(nested) => {
                            self.copy_attribute_group(node, nested, represented_groups, visiting);
                        }
                    }
                }
            }
            None => self.unresolved(format!(
                "attribute group {name} does not resolve; the reference is dropped"
            )),
        }
        visiting.remove(name);
    }

    fn resolve_sr_targets(&mut self) {
        for node in self.diagram.class_ids() {
            let Some(class) = self.diagram.class(node) else {
                continue;
            };
            let Some(target) = class.sr_of.clone().filter(|_| class.represents.is_none()) else {
                continue;
            };
            let (kind, name, resolved) = match &target {
                SrTarget::Type(name) => ("type", name, self.diagram.type_roots.get(name)),
                SrTarget::ElementRef(name) => {
                    ("element", name, self.diagram.element_nodes.get(name))
                }
                SrTarget::Group(name) => ("group", name, self.diagram.group_roots.get(name)),
            };
            match resolved.copied() {
                Some(resolved) if resolved == node => {
                    self.internal(format!("{kind} {name} is represented by its own class"));
                }
                Some(resolved) => {
                    let target_name = self
                        .diagram
                        .class(resolved)
                        .map(|class| class.name.clone())
                        .unwrap_or_default();
                    if let Some(class) = self.diagram.class_mut(node) {
                        class.represents = Some(resolved);
                        class.name = target_name;
                    }
                }
                None => {
                    self.unresolved(format!(
                        "{kind} {name} does not resolve; the reference is dropped"
                    ));
                    self.diagram.remove_subtree(node);
                }
            }
        }
    }

    /// Turns `complexContent` extensions into generalizations. Extending classes that are not
    /// roots move to the roots and leave a representative behind.
    fn resolve_extensions(&mut self) {
        for node in self.diagram.class_ids() {
            let Some(base) = self
                .diagram
                .class_mut(node)
                .and_then(|class| class.extension_of.take())
            else {
                continue;
            };
            let Some(general) = self.diagram.type_roots.get(&base).copied() else {
                self.unresolved(format!(
                    "extension base {base} does not resolve; the generalization is dropped"
                ));
                continue;
            };
            if general == node {
                self.internal(format!("type {base} extends itself"));
                continue;
            }

            if self.diagram.node(node).parent.is_some() {
                let Some(class) = self.diagram.class_mut(node) else {
                    continue;
                };
                let stand_in = PClass {
                    name: class.name.clone(),
                    element_label: class.element_label.take(),
                    multiplicity: std::mem::take(&mut class.multiplicity),
                    represents: Some(node),
                    created_by_extension: true,
                    ..PClass::default()
                };
                let stand_in = self.diagram.add_node(None, PNodeKind::Class(stand_in));
                if !self.diagram.replace(node, stand_in) {
                    self.internal(format!("class {node} could not be relocated"));
                    continue;
                }
                let roots = self.diagram.roots.len();
                self.diagram.attach(node, None, roots);
            }
            if let Some(class) = self.diagram.class_mut(node) {
                class.general = Some(general);
            }
        }
    }

    fn flatten_dummies(&mut self) {
        for node in self.diagram.node_ids() {
            let node_ref = self.diagram.node(node);
            if node_ref.removed || node_ref.kind != PNodeKind::Dummy {
                continue;
            }
            if !self.diagram.splice_children(node) {
                self.internal(format!("sequence node {node} has no parent"));
            }
        }
    }

    /// Merges runs of adjacent attribute containers into the first one of each run.
    fn merge_attribute_containers(&mut self) {
        for parent in self.diagram.node_ids() {
            let children = self.diagram.children(parent).to_vec();
            let mut run_start: Option<NodeId> = None;
            for child in children {
                let PNodeKind::AttributeContainer { attributes } =
                    &mut self.diagram.node_mut(child).kind
                else {
                    run_start = None;
                    continue;
                };
                match run_start {
                    None => run_start = Some(child),
                    Some(first) => {
                        let moved = std::mem::take(attributes);
                        if let PNodeKind::AttributeContainer { attributes } =
                            &mut self.diagram.node_mut(first).kind
                        {
                            attributes.extend(moved);
                        }
                        self.diagram.remove_subtree(child);
                    }
                }
            }
        }
    }

    /// Drops representatives of removed classes and collapses the ones that are not needed.
    fn post_process_sr(&mut self) {
        for node in self.diagram.class_ids() {
            let target = self.diagram.class(node).and_then(|class| class.represents);
            if target.is_some_and(|target| self.diagram.node(target).removed) {
                self.diagram.remove_subtree(node);
            }
        }

        if self.options.delete_unnecessary_srs_made_by_extensions {
            for node in self.diagram.class_ids() {
                let Some(PClass {
                    created_by_extension: true,
                    represents: Some(target),
                    ..
                }) = self.diagram.class(node)
                else {
                    continue;
                };
                let target = *target;
                if self.diagram.node(node).removed
                    || self.diagram.node(target).parent.is_some()
                    || self.diagram.representatives_of(target).len() != 1
                {
                    continue;
                }
                self.collapse(target, node);
            }
        }

        if self.options.resolve_srs {
            for root in self.diagram.roots.clone() {
                let Some(class) = self.diagram.class(root) else {
                    continue;
                };
                // A labelled root is a global element of its own
                if class.element_label.is_some() || class.represents.is_some() {
                    continue;
                }
                let representatives = self.diagram.representatives_of(root);
                let [representative] = representatives[..] else {
                    continue;
                };
                if self.diagram.is_ancestor(root, representative)
                    || !self.is_bare_stand_in(representative)
                {
                    continue;
                }
                self.collapse(root, representative);
            }
        }
    }

    /// A nested representative without content of its own
    fn is_bare_stand_in(&self, node: NodeId) -> bool {
        let Some(class) = self.diagram.class(node) else {
            return false;
        };
        self.diagram.node(node).parent.is_some()
            && self.diagram.children(node).is_empty()
            && class.attributes.is_empty()
            && class.attribute_group_refs.is_empty()
            && class.general.is_none()
            && !class.created_by_extension
    }

    /// Moves the root `target` to where `stand_in` is; `stand_in` is removed.
    fn collapse(&mut self, target: NodeId, stand_in: NodeId) {
        let Some(stand_in_class) = self.diagram.class(stand_in).cloned() else {
            return;
        };
        if !self.diagram.replace(stand_in, target) {
            self.internal(format!("representative {stand_in} is not part of the tree"));
            return;
        }
        self.diagram.remove_subtree(stand_in);
        if let Some(class) = self.diagram.class_mut(target) {
            if stand_in_class.element_label.is_some() {
                class.element_label = stand_in_class.element_label;
            }
            class.multiplicity = stand_in_class.multiplicity;
            class.documentation.extend(stand_in_class.documentation);
        }
        for node in self.diagram.class_ids() {
            if let Some(class) = self.diagram.class_mut(node) {
                if class.represents == Some(stand_in) {
                    class.represents = Some(target);
                }
            }
        }
    }

    /// Converts marked classes into content containers and documentation into comments.
    fn post_process_cc_and_comment(&mut self) {
        let generals: HashSet<_> = self
            .diagram
            .class_ids()
            .into_iter()
            .filter_map(|node| self.diagram.class(node).and_then(|class| class.general))
            .collect();

        for node in self.diagram.class_ids() {
            let Some(class) = self.diagram.class(node) else {
                continue;
            };
            let marked = class
                .documentation
                .iter()
                .any(|text| text == CONTENT_CONTAINER_MARKER);
            let convertible = marked
                && self.diagram.node(node).parent.is_some()
                && class.element_label.is_some()
                && class.attributes.is_empty()
                && class.represents.is_none()
                && class.general.is_none()
                && class.multiplicity.is_one()
                && !generals.contains(&node)
                && self.diagram.representatives_of(node).is_empty();

            if convertible {
                let name = class.element_label.clone().unwrap_or_default();
                self.diagram.node_mut(node).kind = PNodeKind::ContentContainer { name };
                continue;
            }
            if marked {
                let message = format!(
                    "class {:?} is marked as a content container but cannot be one",
                    class.name
                );
                self.lossy(message);
            }
            let documentation = self
                .diagram
                .class_mut(node)
                .map(|class| std::mem::take(&mut class.documentation))
                .unwrap_or_default();
            for text in documentation {
                if text != CONTENT_CONTAINER_MARKER {
                    self.diagram.add_node(Some(node), PNodeKind::Comment(text));
                }
            }
        }

        self.diagram.classes_count = self.diagram.class_ids().len();
    }
}

/// `true` if `name` is the attribute group (`X-a` or `X-a-opt`) of one of the model groups `X-c`.
fn belongs_to_group(name: &QName, groups: &HashSet<QName>) -> bool {
    let local = name
        .local_name
        .strip_suffix(OPTIONAL_GROUP_SUFFIX)
        .unwrap_or(&name.local_name);
    local.strip_suffix("-a").is_some_and(|base| {
        groups.contains(&QName::with_optional_namespace(
            name.namespace_name.as_ref(),
            model_group_name(base),
        ))
    })
}

#[cfg(test)]
mod tests {
    use xcase_xsd::{Schema, SchemaSet};

    use super::super::p_psm::PDiagram;
    use super::*;
    use crate::config::ReverseOptions;
    use crate::log::{MessageId, Severities, TranslationLog};

    fn read_with(xsd: &str, options: ReverseOptions) -> (PDiagram, TranslationLog) {
        let set = SchemaSet::from_schema(Schema::parse(xsd).unwrap()).unwrap();
        let mut log = TranslationLog::new(Severities::default());
        let diagram = XsdToPsm::new(&set, options, &mut log).process();
        (diagram, log)
    }

    fn read(xsd: &str) -> (PDiagram, TranslationLog) {
        read_with(xsd, ReverseOptions::default())
    }

    fn root_names(diagram: &PDiagram) -> Vec<String> {
        diagram
            .roots
            .iter()
            .filter_map(|root| diagram.class(*root))
            .map(|class| class.name.clone())
            .collect()
    }

    const LIBRARY: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:element name="library" type="Library"/>
        <xs:complexType name="Library">
            <xs:sequence>
                <xs:element name="book" type="Book" minOccurs="0" maxOccurs="unbounded"/>
            </xs:sequence>
        </xs:complexType>
        <xs:complexType name="Book">
            <xs:attribute name="title" type="xs:string" use="required"/>
        </xs:complexType>
    </xs:schema>"#;

    #[test]
    fn single_use_types_are_collapsed_into_their_element() {
        let (diagram, log) = read(LIBRARY);
        assert!(log.is_empty(), "{log:?}");
        assert_eq!(root_names(&diagram), ["Library"]);

        let library = diagram.roots[0];
        let [book] = diagram.children(library)[..] else {
            panic!("expected one child of the library");
        };
        let book = diagram.class(book).unwrap();
        assert_eq!(book.name, "Book");
        assert_eq!(book.element_label.as_deref(), Some("book"));
        assert_eq!(book.multiplicity, Multiplicity::MANY);
        assert_eq!(book.attributes[0].name, "title");
        assert_eq!(diagram.classes_count, 2);
    }

    #[test]
    fn collapsing_can_be_switched_off() {
        let options = ReverseOptions {
            resolve_srs: false,
            ..ReverseOptions::default()
        };
        let (diagram, _) = read_with(LIBRARY, options);
        assert_eq!(root_names(&diagram), ["Library", "Book"]);
        let book = diagram.children(diagram.roots[0])[0];
        assert_eq!(diagram.class(book).unwrap().represents, Some(diagram.roots[1]));
    }

    #[test]
    fn group_attributes_are_not_copied_next_to_the_group_reference() {
        let (diagram, log) = read(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="order">
                    <xs:complexType>
                        <xs:sequence><xs:group ref="Address-c"/></xs:sequence>
                        <xs:attributeGroup ref="Address-a"/>
                    </xs:complexType>
                </xs:element>
                <xs:group name="Address-c">
                    <xs:sequence><xs:element name="street" type="xs:string"/></xs:sequence>
                </xs:group>
                <xs:attributeGroup name="Address-a">
                    <xs:attribute name="zip" type="xs:string"/>
                </xs:attributeGroup>
            </xs:schema>"#,
        );
        assert!(log.is_empty(), "{log:?}");
        assert_eq!(root_names(&diagram), ["order"]);

        let order = diagram.roots[0];
        assert!(diagram.class(order).unwrap().attributes.is_empty());
        let address = diagram.children(order)[0];
        let address = diagram.class(address).unwrap();
        assert_eq!(address.name, "Address");
        assert_eq!(address.element_label, None);
        assert_eq!(address.attributes[0].name, "zip");
    }

    #[test]
    fn extension_of_a_local_class_leaves_a_stand_in() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:complexType name="Base">
                <xs:attribute name="id" type="xs:ID"/>
            </xs:complexType>
            <xs:element name="root">
                <xs:complexType>
                    <xs:sequence>
                        <xs:element name="item" maxOccurs="unbounded">
                            <xs:complexType>
                                <xs:complexContent>
                                    <xs:extension base="Base">
                                        <xs:attribute name="extra" type="xs:string"/>
                                    </xs:extension>
                                </xs:complexContent>
                            </xs:complexType>
                        </xs:element>
                    </xs:sequence>
                </xs:complexType>
            </xs:element>
        </xs:schema>"#;
        let options = ReverseOptions {
            delete_unnecessary_srs_made_by_extensions: false,
            ..ReverseOptions::default()
        };
        let (diagram, _) = read_with(xsd, options);
        assert_eq!(root_names(&diagram), ["Base", "root", "item"]);

        let item = diagram.roots[2];
        let base = diagram.roots[0];
        assert_eq!(diagram.class(item).unwrap().general, Some(base));
        assert_eq!(diagram.class(item).unwrap().element_label, None);

        let stand_in = diagram.children(diagram.roots[1])[0];
        let stand_in = diagram.class(stand_in).unwrap();
        assert!(stand_in.created_by_extension);
        assert_eq!(stand_in.represents, Some(item));
        assert_eq!(stand_in.element_label.as_deref(), Some("item"));
        assert_eq!(stand_in.multiplicity, Multiplicity::AT_LEAST_ONE);

        // With the default options the stand-in is collapsed again
        let (diagram, _) = read(xsd);
        assert_eq!(root_names(&diagram), ["Base", "root"]);
        let item = diagram.children(diagram.roots[1])[0];
        let item = diagram.class(item).unwrap();
        assert_eq!(item.general, Some(diagram.roots[0]));
        assert_eq!(item.element_label.as_deref(), Some("item"));
    }

    #[test]
    fn unresolved_references_are_dropped() {
        let (diagram, log) = read(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="root">
                    <xs:complexType>
                        <xs:sequence><xs:group ref="Missing"/></xs:sequence>
                        <xs:attributeGroup ref="AlsoMissing"/>
                    </xs:complexType>
                </xs:element>
            </xs:schema>"#,
        );
        assert_eq!(log.count(MessageId::RevUnresolvedReference), 2);
        assert!(log.has_errors());
        assert!(diagram.children(diagram.roots[0]).is_empty());
    }

    #[test]
    fn content_container_marker_is_recognized() {
        let (diagram, _) = read(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="person">
                    <xs:complexType>
                        <xs:annotation><xs:documentation>A person</xs:documentation></xs:annotation>
                        <xs:sequence>
                            <xs:element name="address">
                                <xs:annotation>
                                    <xs:documentation>PSM: ContentContainer</xs:documentation>
                                </xs:annotation>
                                <xs:complexType>
                                    <xs:sequence>
                                        <xs:element name="city" type="xs:string"/>
                                    </xs:sequence>
                                </xs:complexType>
                            </xs:element>
                        </xs:sequence>
                    </xs:complexType>
                </xs:element>
            </xs:schema>"#,
        );
        let person = diagram.roots[0];
        let children = diagram.children(person);
        assert_eq!(
            diagram.node(children[0]).kind,
            PNodeKind::ContentContainer {
                name: "address".into()
            }
        );
        assert_eq!(diagram.node(children[1]).kind, PNodeKind::Comment("A person".into()));
        assert_eq!(diagram.classes_count, 1);
    }
}
