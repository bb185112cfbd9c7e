use roxmltree::Node;

use super::shared::xs_children;
use super::xstypes::Sequence;

/// Schema Component: Annotation (§3.15)
///
/// Instead of storing the actual element information items, this type stores a textual rendering
/// of the `<appinfo>` and `<documentation>` contents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Annotation {
    pub application_information: Sequence<String>,
    pub user_information: Sequence<String>,
}

impl Annotation {
    pub const TAG_NAME: &'static str = "annotation";

    /// Generate a textual representation of the content of an annotation.
    /// This is not meant to be the exact source; it should however be able to parse back into
    /// similar XML.
    fn content_to_text(node: Node) -> String {
        let mut text = String::new();
        for child in node.children() {
            match child.node_type() {
                roxmltree::NodeType::Text => text.push_str(child.text().unwrap_or_default()),
                roxmltree::NodeType::Element => {
                    let tag_name = child.tag_name().name();
                    text.push_str(&format!(
                        "<{tag_name}>{}</{tag_name}>",
                        Self::content_to_text(child)
                    ));
                }
                _ => {}
            }
        }
        text.trim().to_string()
    }

    pub(crate) fn map_from_xml(annotation: Node) -> Self {
        debug_assert_eq!(annotation.tag_name().name(), Self::TAG_NAME);

        // {application information}
        //   A sequence of the <appinfo> element information items from among the [children], in
        //   order, if any, otherwise the empty sequence.
        let application_information = xs_children(annotation)
            .filter(|child| child.tag_name().name() == "appinfo")
            .map(Self::content_to_text)
            .collect();

        // {user information}
        //   A sequence of the <documentation> element information items from among the [children],
        //   in order, if any, otherwise the empty sequence.
        let user_information = xs_children(annotation)
            .filter(|child| child.tag_name().name() == "documentation")
            .map(Self::content_to_text)
            .collect();

        Self {
            application_information,
            user_information,
        }
    }

    /// The annotation mapping of a single element: all `<annotation>` children merged into one.
    /// Returns `None` if there is nothing to record.
    pub(crate) fn of(node: Node) -> Option<Self> {
        let mut merged = Self::default();
        for annotation in xs_children(node).filter(|c| c.tag_name().name() == Self::TAG_NAME) {
            let annotation = Self::map_from_xml(annotation);
            merged
                .application_information
                .extend(annotation.application_information);
            merged.user_information.extend(annotation.user_information);
        }
        (!merged.is_empty()).then_some(merged)
    }

    pub fn is_empty(&self) -> bool {
        self.application_information.is_empty() && self.user_information.is_empty()
    }

    /// Non-empty documentation strings, in order.
    pub fn documentation(&self) -> impl Iterator<Item = &str> {
        self.user_information
            .iter()
            .map(String::as_str)
            .filter(|text| !text.is_empty())
    }
}
