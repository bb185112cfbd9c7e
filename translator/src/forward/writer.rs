use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;
use xcase_psm::{
    DataType, Multiplicity, PsmAttribute, PsmProject, Ref, SimpleDataType, UpperBound,
};
use xcase_xsd::builtins::is_builtin_local_name;

use crate::log::{MessageId, TranslationLog};

#[derive(Debug, Error)]
#[error("failed to serialize the schema: {0}")]
pub struct SerializeError(String);

impl SerializeError {
    fn new(error: impl fmt::Display) -> Self {
        Self(error.to_string())
    }
}

/// An element of a schema fragment
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), SerializeError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (name, value) in &self.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }
        if self.children.is_empty() && self.text.is_none() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(SerializeError::new);
        }
        writer
            .write_event(Event::Start(start))
            .map_err(SerializeError::new)?;
        if let Some(text) = self.text.as_deref() {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(SerializeError::new)?;
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(SerializeError::new)
    }
}

/// How an attribute is rendered by [`XmlSchemaWriter::type_attribute`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AttributeForm {
    /// As `xs:element` with `minOccurs`/`maxOccurs`
    Element,
    /// As `xs:attribute` with `use`; `optional` turns `use="required"` into `use="optional"`
    Attribute { optional: bool },
}

/// Accumulates a schema fragment. Elements are opened with the start methods and closed with
/// [`end_element`](Self::end_element) in LIFO order.
#[derive(Clone, Debug, Default)]
pub struct XmlSchemaWriter {
    nodes: Vec<XmlNode>,
    open: Vec<XmlNode>,
    ghost: bool,
}

impl XmlSchemaWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A writer whose content is never written to the schema
    pub fn ghost() -> Self {
        Self {
            ghost: true,
            ..Self::default()
        }
    }

    pub fn is_ghost(&self) -> bool {
        self.ghost
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.open.is_empty()
    }

    /// The completed top-level nodes
    pub fn nodes(&self) -> &[XmlNode] {
        &self.nodes
    }

    fn start(&mut self, name: &str) {
        self.open.push(XmlNode::new(format!("xs:{name}")));
    }

    /// Sets an attribute of the innermost open element.
    pub fn attr(&mut self, name: &str, value: impl Into<String>) {
        match self.open.last_mut() {
            Some(node) => node.set_attribute(name, value),
            None => {
                tracing::error!("attribute {name:?} written outside of an element");
                debug_assert!(false, "attribute written outside of an element");
            }
        }
    }

    fn start_named(&mut self, element: &str, name: &str) {
        self.start(element);
        self.attr("name", name);
    }

    fn start_ref(&mut self, element: &str, name: &str) {
        self.start(element);
        self.attr("ref", name);
    }

    pub fn complex_type(&mut self, name: Option<&str>) {
        self.start("complexType");
        if let Some(name) = name {
            self.attr("name", name);
        }
    }

    pub fn complex_content(&mut self) {
        self.start("complexContent");
    }

    pub fn extension(&mut self, base: &str) {
        self.start("extension");
        self.attr("base", base);
    }

    pub fn sequence(&mut self) {
        self.start("sequence");
    }

    pub fn choice(&mut self) {
        self.start("choice");
    }

    /// A model group definition
    pub fn group(&mut self, name: &str) {
        self.start_named("group", name);
    }

    pub fn group_ref(&mut self, name: &str) {
        self.start_ref("group", name);
    }

    /// An attribute group definition
    pub fn attribute_group(&mut self, name: &str) {
        self.start_named("attributeGroup", name);
    }

    pub fn attribute_group_ref(&mut self, name: &str) {
        self.start_ref("attributeGroup", name);
    }

    pub fn element(&mut self, name: &str) {
        self.start_named("element", name);
    }

    pub fn attribute(&mut self, name: &str) {
        self.start_named("attribute", name);
    }

    /// Writes a complete `<xs:annotation><xs:documentation>` element.
    pub fn annotation_documentation(&mut self, text: &str) {
        self.start("annotation");
        self.start("documentation");
        if let Some(node) = self.open.last_mut() {
            node.text = Some(text.to_string());
        }
        self.end_element();
        self.end_element();
    }

    /// Writes `minOccurs`/`maxOccurs` where they differ from the default of 1.
    pub fn occurs(&mut self, multiplicity: Multiplicity) {
        if multiplicity.lower != 1 {
            self.attr("minOccurs", multiplicity.lower.to_string());
        }
        match multiplicity.upper {
            UpperBound::Unbounded => self.attr("maxOccurs", "unbounded"),
            UpperBound::Count(1) => {}
            UpperBound::Count(upper) => self.attr("maxOccurs", upper.to_string()),
        }
    }

    fn close(&mut self, node: XmlNode) {
        match self.open.last_mut() {
            Some(parent) => {
                // An empty sequence says nothing inside a type definition
                let redundant = node.name == "xs:sequence"
                    && node.children.is_empty()
                    && matches!(parent.name.as_str(), "xs:complexType" | "xs:extension");
                if !redundant {
                    parent.children.push(node);
                }
            }
            None => self.nodes.push(node),
        }
    }

    /// Closes the innermost open element.
    pub fn end_element(&mut self) {
        match self.open.pop() {
            Some(node) => self.close(node),
            None => {
                tracing::error!("end_element() without an open element");
                debug_assert!(false, "end_element() without an open element");
            }
        }
    }

    fn finish(&mut self) {
        while let Some(node) = self.open.pop() {
            self.close(node);
        }
    }

    /// Moves the content of `other` to the current position, closing its open elements first.
    pub fn append_content(&mut self, mut other: XmlSchemaWriter) {
        other.finish();
        match self.open.last_mut() {
            Some(parent) => parent.children.extend(other.nodes),
            None => self.nodes.extend(other.nodes),
        }
    }

    pub fn into_nodes(mut self) -> Vec<XmlNode> {
        self.finish();
        self.nodes
    }

    /// Writes the type of `attribute` and its multiplicity onto the innermost open element.
    pub fn type_attribute(
        &mut self,
        attribute: &PsmAttribute,
        form: AttributeForm,
        project: &PsmProject,
        simple_types: &mut SimpleTypesWriter,
        log: &mut TranslationLog,
    ) {
        match &attribute.type_ {
            Some(DataType::Builtin(name)) if is_builtin_local_name(name) => {
                self.attr("type", format!("xs:{name}"));
            }
            Some(DataType::Builtin(name)) => {
                log.add(
                    MessageId::XsTypeTranslatedAsString,
                    format!(
                        "type {name:?} of attribute {:?} is not an XML Schema type",
                        attribute.name
                    ),
                );
                self.attr("type", "xs:string");
            }
            Some(DataType::Simple(simple_type)) => {
                let name = simple_types.write(*simple_type, project, log);
                self.attr("type", name);
            }
            None => {
                log.add(
                    MessageId::XsTypeTranslatedAsString,
                    format!("attribute {:?} has no type", attribute.name),
                );
                self.attr("type", "xs:string");
            }
        }

        let multiplicity = attribute.multiplicity;
        match form {
            AttributeForm::Element => self.occurs(multiplicity),
            AttributeForm::Attribute { optional } => {
                if multiplicity.lower > 1 || multiplicity.upper.is_many() {
                    log.add(
                        MessageId::XsAttributeMultiplicityLost,
                        format!(
                            "attribute {:?} has multiplicity {multiplicity}, which an XML \
                             attribute cannot express",
                            attribute.name
                        ),
                    );
                }
                // An explicit `use="optional"` marks a required attribute made optional by context
                if multiplicity.lower >= 1 {
                    self.attr("use", if optional { "optional" } else { "required" });
                } else if let Some(default) = attribute.default.as_deref() {
                    self.attr("default", default);
                }
            }
        }
    }
}

/// Collects the `xs:simpleType` definitions used by a schema, each one once.
#[derive(Clone, Debug, Default)]
pub struct SimpleTypesWriter {
    names: HashMap<Ref<SimpleDataType>, String>,
    nodes: Vec<XmlNode>,
}

impl SimpleTypesWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the definition of `simple_type` unless already written, and returns its name.
    pub fn write(
        &mut self,
        simple_type: Ref<SimpleDataType>,
        project: &PsmProject,
        log: &mut TranslationLog,
    ) -> String {
        if let Some(name) = self.names.get(&simple_type) {
            return name.clone();
        }
        let definition = project.get(simple_type);
        let base = if is_builtin_local_name(&definition.base) {
            definition.base.as_str()
        } else {
            log.add(
                MessageId::XsTypeTranslatedAsString,
                format!(
                    "base type {:?} of simple type {:?} is not an XML Schema type",
                    definition.base, definition.name
                ),
            );
            "string"
        };

        let mut restriction = XmlNode::new("xs:restriction");
        restriction.set_attribute("base", format!("xs:{base}"));
        for facet in &definition.facets {
            let mut node = XmlNode::new(format!("xs:{}", facet.kind));
            node.set_attribute("value", facet.value.as_str());
            restriction.children.push(node);
        }
        let mut node = XmlNode::new("xs:simpleType");
        node.set_attribute("name", definition.name.as_str());
        node.children.push(restriction);
        self.nodes.push(node);

        self.names.insert(simple_type, definition.name.clone());
        definition.name.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A diagram reference as it appears in the schema header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaReference {
    pub prefix: String,
    pub namespace: Option<String>,
    pub schema_location: String,
}

/// Owns the writers of one translation and assembles the final document.
#[derive(Debug, Default)]
pub struct WriterFactory {
    global_elements: XmlSchemaWriter,
    writers: Vec<XmlSchemaWriter>,
    pub simple_types: SimpleTypesWriter,
}

impl WriterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global_elements(&mut self) -> &mut XmlSchemaWriter {
        &mut self.global_elements
    }

    /// Registers a finished global writer; writers are output in registration order.
    pub fn add_global(&mut self, writer: XmlSchemaWriter) {
        self.writers.push(writer);
    }

    /// The `<xs:schema>` document element with every non-ghost fragment.
    pub fn schema_node(self, target_namespace: &str, references: &[SchemaReference]) -> XmlNode {
        let mut schema = XmlNode::new("xs:schema");
        schema.set_attribute("xmlns:xs", xcase_xsd::XS_NAMESPACE);
        schema.set_attribute("xmlns", target_namespace);
        schema.set_attribute("targetNamespace", target_namespace);
        schema.set_attribute("elementFormDefault", "qualified");
        for reference in references {
            if let Some(namespace) = reference.namespace.as_deref() {
                schema.set_attribute(&format!("xmlns:{}", reference.prefix), namespace);
            }
        }

        for reference in references {
            let mut import = match reference.namespace.as_deref() {
                Some(namespace) => {
                    let mut import = XmlNode::new("xs:import");
                    import.set_attribute("namespace", namespace);
                    import
                }
                None => XmlNode::new("xs:include"),
            };
            import.set_attribute("schemaLocation", reference.schema_location.as_str());
            schema.children.push(import);
        }

        schema.children.extend(self.global_elements.into_nodes());
        for writer in self.writers {
            if !writer.is_ghost() {
                schema.children.extend(writer.into_nodes());
            }
        }
        schema.children.extend(self.simple_types.nodes);
        schema
    }

    /// Serializes the schema document with two-space indentation.
    pub fn result(
        self,
        target_namespace: &str,
        references: &[SchemaReference],
    ) -> Result<String, SerializeError> {
        let schema = self.schema_node(target_namespace, references);
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(SerializeError::new)?;
        schema.write(&mut writer)?;
        String::from_utf8(writer.into_inner().into_inner()).map_err(SerializeError::new)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use xcase_psm::Facet;

    use super::*;
    use crate::log::Severities;

    #[test]
    fn builds_nested_fragments() {
        let mut writer = XmlSchemaWriter::new();
        assert!(writer.is_empty());
        writer.complex_type(Some("Person"));
        writer.sequence();
        writer.element("name");
        writer.attr("type", "xs:string");
        writer.end_element();
        writer.end_element();
        writer.end_element();

        let nodes = writer.into_nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].attribute("name"), Some("Person"));
        assert_eq!(nodes[0].children[0].name, "xs:sequence");
        assert_eq!(nodes[0].children[0].children[0].attribute("type"), Some("xs:string"));
    }

    #[test]
    fn drops_empty_sequences_of_types_only() {
        let mut writer = XmlSchemaWriter::new();
        writer.complex_type(Some("Empty"));
        writer.sequence();
        writer.end_element();
        writer.end_element();
        writer.group("Empty-c");
        writer.sequence();
        writer.end_element();
        writer.end_element();

        let nodes = writer.into_nodes();
        assert!(nodes[0].children.is_empty());
        assert_eq!(nodes[1].children[0].name, "xs:sequence");
    }

    #[test]
    fn appends_and_closes_other_writers() {
        let mut inner = XmlSchemaWriter::new();
        inner.element("street");
        let mut outer = XmlSchemaWriter::new();
        outer.sequence();
        outer.append_content(inner);
        outer.end_element();

        let nodes = outer.into_nodes();
        assert_eq!(nodes[0].children[0].attribute("name"), Some("street"));
    }

    #[test]
    fn attribute_multiplicity_is_checked() {
        let project = PsmProject::new();
        let mut simple_types = SimpleTypesWriter::new();
        let mut log = TranslationLog::new(Severities::default());
        let attribute = PsmAttribute::new("phone")
            .with_type(DataType::builtin("string"))
            .with_multiplicity(Multiplicity::AT_LEAST_ONE);

        let mut writer = XmlSchemaWriter::new();
        writer.attribute("phone");
        writer.type_attribute(
            &attribute,
            AttributeForm::Attribute { optional: false },
            &project,
            &mut simple_types,
            &mut log,
        );
        writer.end_element();

        let nodes = writer.into_nodes();
        assert_eq!(nodes[0].attribute("use"), Some("required"));
        assert!(log.contains(MessageId::XsAttributeMultiplicityLost));
    }

    #[test]
    fn missing_types_fall_back_to_string() {
        let project = PsmProject::new();
        let mut simple_types = SimpleTypesWriter::new();
        let mut log = TranslationLog::new(Severities::default());

        let mut writer = XmlSchemaWriter::new();
        writer.attribute("note");
        writer.type_attribute(
            &PsmAttribute::new("note"),
            AttributeForm::Attribute { optional: true },
            &project,
            &mut simple_types,
            &mut log,
        );
        writer.end_element();

        let nodes = writer.into_nodes();
        assert_eq!(nodes[0].attribute("type"), Some("xs:string"));
        assert_eq!(nodes[0].attribute("use"), Some("optional"));
        assert_eq!(log.count(MessageId::XsTypeTranslatedAsString), 1);
    }

    #[test]
    fn serializes_a_complete_schema() {
        let mut project = PsmProject::new();
        let code = project.add_simple_type(SimpleDataType {
            name: "Code".into(),
            base: "string".into(),
            facets: vec![Facet {
                kind: "maxLength".into(),
                value: "3".into(),
            }],
        });
        let mut log = TranslationLog::new(Severities::default());
        let mut factory = WriterFactory::new();
        assert_eq!(factory.simple_types.write(code, &project, &mut log), "Code");
        factory.simple_types.write(code, &project, &mut log);

        factory.global_elements().element("code");
        factory.global_elements().attr("type", "Code");
        factory.global_elements().end_element();
        let mut ghost = XmlSchemaWriter::ghost();
        ghost.group("Ghost-c");
        factory.add_global(ghost);

        let text = factory
            .result(
                "urn:codes",
                &[SchemaReference {
                    prefix: "c".into(),
                    namespace: Some("urn:common".into()),
                    schema_location: "common.xsd".into(),
                }],
            )
            .unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(text.contains(
            "\n  <xs:import namespace=\"urn:common\" schemaLocation=\"common.xsd\"/>"
        ));
        assert!(text.contains("\n      <xs:maxLength value=\"3\"/>"));

        let document = roxmltree::Document::parse(&text).unwrap();
        let schema = document.root_element();
        assert_eq!(schema.attribute("targetNamespace"), Some("urn:codes"));
        assert_eq!(schema.lookup_namespace_uri(Some("c")), Some("urn:common"));
        let children: Vec<_> = schema
            .children()
            .filter(|node| node.is_element())
            .map(|node| node.tag_name().name())
            .collect();
        assert_eq!(children, ["import", "element", "simpleType"]);
    }
}
