use roxmltree::Node;

use super::xstypes::XS_NAMESPACE;

/// Element children of `node` that belong to the XML Schema namespace.
pub(crate) fn xs_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(|child| child.is_element() && child.tag_name().namespace() == Some(XS_NAMESPACE))
}

/// The first XML Schema child of `node` named `name`, if any.
pub(crate) fn xs_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    xs_children(node).find(|child| child.tag_name().name() == name)
}

/// The target namespace declared on the `<schema>` element.
pub(crate) fn target_namespace(schema: Node) -> Option<String> {
    schema
        .attribute("targetNamespace")
        .filter(|ns| !ns.is_empty())
        .map(str::to_string)
}
