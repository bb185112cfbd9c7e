mod common;

use std::collections::HashMap;

use pretty_assertions::assert_eq;
use xcase_psm::{
    AssociationChild, DataType, Multiplicity, PsmClass, PsmDiagram, PsmProject, Subordinate,
};
use xcase_translator::{MessageId, ReverseOptions, Severities, XsdImporter};
use xcase_xsd::{Import, ImportError, ImportResolver, Schema};

use common::describe;

fn import(project: &mut PsmProject, xsd: &str) -> xcase_translator::ImportResult {
    XsdImporter::default()
        .import_str(project, "imported", xsd)
        .unwrap()
}

#[test]
fn imports_a_minimal_schema() {
    let mut project = PsmProject::new();
    let result = import(
        &mut project,
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                targetNamespace="urn:people" xmlns="urn:people" elementFormDefault="qualified">
            <xs:element name="person" type="Person"/>
            <xs:complexType name="Person">
                <xs:attribute name="name" type="xs:string" use="required"/>
                <xs:attribute name="age" type="xs:int"/>
            </xs:complexType>
        </xs:schema>"#,
    );

    assert!(result.log.is_empty(), "{:?}", result.log);
    let diagram = project.get(result.diagram);
    assert_eq!(diagram.name, "imported");
    assert_eq!(diagram.target_namespace.as_deref(), Some("urn:people"));
    assert_eq!(
        describe(&project, result.diagram),
        [
            "class Person [root] <person>",
            "  @name: string [1]",
            "  @age: int [0..1]",
        ]
    );
}

#[test]
fn named_simple_types_become_data_types() {
    let mut project = PsmProject::new();
    let result = import(
        &mut project,
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:simpleType name="Isbn">
                <xs:restriction base="xs:string">
                    <xs:maxLength value="13"/>
                </xs:restriction>
            </xs:simpleType>
            <xs:element name="book">
                <xs:complexType>
                    <xs:attribute name="isbn" type="Isbn" use="required"/>
                </xs:complexType>
            </xs:element>
        </xs:schema>"#,
    );

    let book = project.get(result.diagram).roots[0];
    let isbn = project.get(project.get(book).attributes[0]);
    let Some(DataType::Simple(simple_type)) = isbn.type_.clone() else {
        panic!("expected a simple data type, got {:?}", isbn.type_);
    };
    let simple_type = project.get(simple_type);
    assert_eq!(simple_type.name, "Isbn");
    assert_eq!(simple_type.base, "string");
    assert_eq!(simple_type.facets[0].kind, "maxLength");
    assert_eq!(simple_type.facets[0].value, "13");
}

#[test]
fn element_references_may_point_forward() {
    let mut project = PsmProject::new();
    let result = import(
        &mut project,
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="order">
                <xs:complexType>
                    <xs:sequence>
                        <xs:element ref="item" maxOccurs="unbounded"/>
                    </xs:sequence>
                </xs:complexType>
            </xs:element>
            <xs:element name="item">
                <xs:complexType>
                    <xs:attribute name="sku" type="xs:string"/>
                </xs:complexType>
            </xs:element>
        </xs:schema>"#,
    );

    assert!(!result.log.contains(MessageId::RevUnresolvedReference));
    let roots = project.get(result.diagram).roots.clone();
    let names: Vec<_> = roots.iter().map(|root| project.get(*root).name.as_str()).collect();
    assert_eq!(names, ["order", "item"]);

    let [Subordinate::Association(association)] = project.get(roots[0]).components[..] else {
        panic!("expected a single association below the order");
    };
    let association = project.get(association);
    assert_eq!(association.multiplicity, Multiplicity::AT_LEAST_ONE);
    let AssociationChild::Class(reference) = association.child else {
        panic!("expected a class");
    };
    assert_eq!(project.get(reference).represented_class, Some(roots[1]));
    assert_eq!(project.get(reference).label(), Some("item"));
}

#[test]
fn unresolved_references_are_reported() {
    let mut project = PsmProject::new();
    let result = import(
        &mut project,
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="a" type="Missing"/>
        </xs:schema>"#,
    );

    assert_eq!(result.log.count(MessageId::RevUnresolvedReference), 1);
    assert_eq!(describe(&project, result.diagram), ["class a [root] <a>"]);
}

#[test]
fn malformed_documents_are_errors() {
    let mut project = PsmProject::new();
    let importer = XsdImporter::default();
    assert!(importer.import_str(&mut project, "broken", "<xs:schema").is_err());
    assert!(importer
        .import_str(&mut project, "not a schema", "<root/>")
        .is_err());
    assert_eq!(project.count::<PsmDiagram>(), 0);
}

#[test]
fn imports_can_be_undone_and_redone() {
    let mut project = PsmProject::new();
    let result = import(
        &mut project,
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="library">
                <xs:complexType>
                    <xs:sequence>
                        <xs:element name="book" maxOccurs="unbounded">
                            <xs:complexType>
                                <xs:attribute name="title" type="xs:string"/>
                            </xs:complexType>
                        </xs:element>
                    </xs:sequence>
                </xs:complexType>
            </xs:element>
        </xs:schema>"#,
    );
    let imported = describe(&project, result.diagram);
    let command = result.command.expect("imports are journaled by default");
    assert!(!command.commands().is_empty());

    command.undo(&mut project);
    assert_eq!(project.count::<PsmDiagram>(), 0);
    assert_eq!(project.count::<PsmClass>(), 0);

    let diagram = command.redo(&mut project);
    assert_eq!(describe(&project, diagram), imported);
}

#[test]
fn direct_imports_have_no_command() {
    let options = ReverseOptions {
        use_commands: false,
        ..ReverseOptions::default()
    };
    let mut project = PsmProject::new();
    let result = XsdImporter::new(options, Severities::default())
        .import_str(
            &mut project,
            "direct",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="a"/>
            </xs:schema>"#,
        )
        .unwrap();
    assert!(result.command.is_none());
    assert_eq!(describe(&project, result.diagram), ["class a [root] <a>"]);
}

#[test]
fn progress_reaches_the_total() {
    let mut project = PsmProject::new();
    let mut calls = Vec::new();
    let result = XsdImporter::default()
        .import_str_with_progress(
            &mut project,
            "progress",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="a"/>
                <xs:element name="b"/>
                <xs:element name="c"/>
            </xs:schema>"#,
            &mut |done: usize, total: usize| calls.push((done, total)),
        )
        .unwrap();
    assert!(result.log.is_empty(), "{:?}", result.log);
    assert_eq!(calls.last(), Some(&(3, 3)));
}

struct InMemoryResolver(HashMap<&'static str, &'static str>);

impl ImportResolver for InMemoryResolver {
    fn resolve_import(&self, import: &Import) -> Result<Schema, ImportError> {
        let text = import
            .schema_location
            .as_deref()
            .and_then(|location| self.0.get(location))
            .ok_or(ImportError::UnsupportedImport)?;
        Ok(Schema::parse(text)?)
    }
}

#[test]
fn included_schemas_are_resolved() {
    let resolver = InMemoryResolver(HashMap::from([(
        "types.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:complexType name="Person">
                <xs:attribute name="name" type="xs:string" use="required"/>
            </xs:complexType>
        </xs:schema>"#,
    )]));
    let mut project = PsmProject::new();
    let result = XsdImporter::default()
        .with_resolver(resolver)
        .import_str(
            &mut project,
            "included",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:include schemaLocation="types.xsd"/>
                <xs:element name="person" type="Person"/>
            </xs:schema>"#,
        )
        .unwrap();

    assert!(result.log.is_empty(), "{:?}", result.log);
    assert_eq!(
        describe(&project, result.diagram),
        ["class Person [root] <person>", "  @name: string [1]"]
    );
}
