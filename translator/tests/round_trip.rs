mod common;

use pretty_assertions::assert_eq;
use xcase_psm::{
    DataType, Multiplicity, PsmAttribute, PsmDiagram, PsmProject, Ref, SubordinateOwner,
};
use xcase_translator::{XmlSchemaTranslator, XsdImporter};

use common::{definition, describe, XS};

const NAMESPACE: &str = "urn:xcase:round-trip";

/// Exports `diagram` and imports the schema into a fresh project.
fn round_trip(project: &PsmProject, diagram: Ref<PsmDiagram>) -> (PsmProject, Ref<PsmDiagram>) {
    let exported = XmlSchemaTranslator::default()
        .translate(project, diagram)
        .unwrap();
    assert!(!exported.log.has_errors(), "{:?}", exported.log);

    let mut imported = PsmProject::new();
    let result = XsdImporter::default()
        .import_str(&mut imported, "imported", &exported.schema)
        .unwrap();
    assert!(result.log.is_empty(), "{:?}\n{}", result.log, exported.schema);
    (imported, result.diagram)
}

fn new_diagram(project: &mut PsmProject) -> Ref<PsmDiagram> {
    let diagram = project.add_diagram("original");
    project.get_mut(diagram).target_namespace = Some(NAMESPACE.into());
    diagram
}

fn attribute(name: &str, type_: &str) -> PsmAttribute {
    PsmAttribute::new(name).with_type(DataType::builtin(type_))
}

#[test]
fn minimal_person() {
    let mut project = PsmProject::new();
    let diagram = new_diagram(&mut project);
    let person = project.add_root_class(diagram, "Person");
    project.get_mut(person).element_label = Some("person".into());
    project.add_attribute(person, attribute("name", "string"));

    let (imported, imported_diagram) = round_trip(&project, diagram);
    assert_eq!(
        imported.get(imported_diagram).target_namespace.as_deref(),
        Some(NAMESPACE)
    );
    assert_eq!(
        describe(&imported, imported_diagram),
        describe(&project, diagram)
    );
}

#[test]
fn nested_classes_without_representatives() {
    let mut project = PsmProject::new();
    let diagram = new_diagram(&mut project);
    let person = project.add_root_class(diagram, "Person");
    project.get_mut(person).element_label = Some("person".into());
    project.add_attribute(person, attribute("name", "string"));
    project.add_attribute(
        person,
        attribute("age", "int").with_multiplicity(Multiplicity::OPTIONAL),
    );
    let address = project.add_child_class(
        SubordinateOwner::Class(person),
        diagram,
        "Address",
        Multiplicity::MANY,
    );
    project.get_mut(address).element_label = Some("address".into());
    project.add_attribute(address, attribute("street", "string"));
    let contact = project.add_content_container(SubordinateOwner::Class(person), "contact");
    project.add_attribute_container(
        SubordinateOwner::ContentContainer(contact),
        vec![attribute("email", "string")],
    );

    let (imported, imported_diagram) = round_trip(&project, diagram);
    assert_eq!(
        describe(&imported, imported_diagram),
        [
            "class Person [root] <person>",
            "  @name: string [1]",
            "  @age: int [0..1]",
            "  class Address [0..*] <address>",
            "    @street: string [1]",
            "  container contact",
            "    attributes",
            "      @email: string [1]",
        ]
    );
    assert_eq!(
        describe(&imported, imported_diagram),
        describe(&project, diagram)
    );
}

#[test]
fn extension_chain() {
    let mut project = PsmProject::new();
    let diagram = new_diagram(&mut project);
    let a = project.add_root_class(diagram, "A");
    project.get_mut(a).element_label = Some("a".into());
    project.add_attribute(a, attribute("x", "string"));
    let b = project.add_root_class(diagram, "B");
    project.get_mut(b).element_label = Some("b".into());
    project.add_attribute(b, attribute("y", "string"));
    project.add_generalization(a, b);

    let (imported, imported_diagram) = round_trip(&project, diagram);
    assert_eq!(
        describe(&imported, imported_diagram),
        [
            "class A [root] <a>",
            "  @x: string [1]",
            "class B [root] <b> : A",
            "  @y: string [1]",
        ]
    );
}

#[test]
fn classes_only_reached_inside_a_choice_keep_their_attributes() {
    let mut project = PsmProject::new();
    let diagram = new_diagram(&mut project);
    let order = project.add_root_class(diagram, "Order");
    project.get_mut(order).element_label = Some("order".into());
    let choice = project.add_content_choice(SubordinateOwner::Class(order));
    let item = project.add_child_class(
        SubordinateOwner::ContentChoice(choice),
        diagram,
        "Item",
        Multiplicity::ONE,
    );
    project.add_attribute(item, attribute("sku", "string"));
    project.add_attribute(
        item,
        attribute("note", "string").with_multiplicity(Multiplicity::OPTIONAL),
    );

    let (imported, imported_diagram) = round_trip(&project, diagram);
    assert_eq!(
        describe(&imported, imported_diagram),
        [
            "class Order [root] <order>",
            "  choice",
            "    class Item [1]",
            "      @sku: string [1]",
            "      @note: string [0..1]",
        ]
    );
    assert_eq!(
        describe(&imported, imported_diagram),
        describe(&project, diagram)
    );
}

#[test]
fn unlabelled_general_round_trips_as_base_type() {
    let mut project = PsmProject::new();
    let diagram = new_diagram(&mut project);
    let a = project.add_root_class(diagram, "A");
    project.add_attribute(a, attribute("x", "string"));
    let b = project.add_root_class(diagram, "B");
    project.get_mut(b).element_label = Some("b".into());
    project.add_attribute(b, attribute("y", "string"));
    project.add_generalization(a, b);

    let (imported, imported_diagram) = round_trip(&project, diagram);
    assert_eq!(
        describe(&imported, imported_diagram),
        [
            "class A [root]",
            "  @x: string [1]",
            "class B [root] <b> : A",
            "  @y: string [1]",
        ]
    );
}

#[test]
fn imported_extension_translates_back_to_an_extension() {
    let mut project = PsmProject::new();
    let imported = XsdImporter::default()
        .import_str(
            &mut project,
            "chain",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                    targetNamespace="urn:chain" xmlns="urn:chain" elementFormDefault="qualified">
                <xs:complexType name="A">
                    <xs:attribute name="x" type="xs:string" use="required"/>
                </xs:complexType>
                <xs:complexType name="B">
                    <xs:complexContent>
                        <xs:extension base="A">
                            <xs:attribute name="y" type="xs:string" use="required"/>
                        </xs:extension>
                    </xs:complexContent>
                </xs:complexType>
                <xs:element name="b" type="B"/>
            </xs:schema>"#,
        )
        .unwrap();
    assert!(imported.log.is_empty(), "{:?}", imported.log);
    assert_eq!(
        describe(&project, imported.diagram),
        [
            "class A [root]",
            "  @x: string [1]",
            "class B [root] <b> : A",
            "  @y: string [1]",
        ]
    );

    let exported = XmlSchemaTranslator::default()
        .translate(&project, imported.diagram)
        .unwrap();
    assert!(exported.log.is_empty(), "{:?}", exported.log);
    let document = roxmltree::Document::parse(&exported.schema).unwrap();
    let b_type = definition(&document, "complexType", "B").unwrap();
    let extension = b_type
        .descendants()
        .find(|node| node.has_tag_name((XS, "extension")))
        .unwrap();
    assert_eq!(extension.attribute("base"), Some("A"));
    assert_eq!(definition(&document, "element", "b").unwrap().attribute("type"), Some("B"));
}
