use roxmltree::Node;

use super::{error::XsdError, particle::MaxOccurs, xstypes::QName};

/// Conversion of an attribute's normalized value to its actual value
pub trait ActualValue<'a>: Sized {
    fn convert(src: &'a str, parent: Node) -> Result<Self, XsdError>;
}

impl<'a> ActualValue<'a> for &'a str {
    fn convert(src: &'a str, _parent: Node) -> Result<Self, XsdError> {
        Ok(src)
    }
}

impl ActualValue<'_> for String {
    fn convert(src: &str, _parent: Node) -> Result<Self, XsdError> {
        Ok(src.to_string())
    }
}

impl ActualValue<'_> for QName {
    fn convert(src: &str, parent: Node) -> Result<Self, XsdError> {
        QName::parse(src, parent)
    }
}

impl<'a, T: ActualValue<'a>> ActualValue<'a> for Vec<T> {
    fn convert(src: &'a str, parent: Node) -> Result<Self, XsdError> {
        // NOTE: This assumes a list with whiteSpace="collapse"
        src.split_ascii_whitespace()
            .map(|item| ActualValue::convert(item, parent))
            .collect()
    }
}

impl ActualValue<'_> for bool {
    fn convert(src: &str, _parent: Node) -> Result<Self, XsdError> {
        match src.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(XsdError::InvalidValue {
                what: "boolean",
                value: src.into(),
            }),
        }
    }
}

impl ActualValue<'_> for u32 {
    fn convert(src: &str, _parent: Node) -> Result<Self, XsdError> {
        src.trim().parse().map_err(|_| XsdError::InvalidValue {
            what: "nonNegativeInteger",
            value: src.into(),
        })
    }
}

impl ActualValue<'_> for MaxOccurs {
    fn convert(src: &str, parent: Node) -> Result<Self, XsdError> {
        if src.trim() == "unbounded" {
            Ok(MaxOccurs::Unbounded)
        } else {
            u32::convert(src, parent).map(MaxOccurs::Count)
        }
    }
}

pub fn actual_value<'a, T: ActualValue<'a>>(x: &'a str, parent: Node) -> Result<T, XsdError> {
    T::convert(x, parent)
}

/// The actual value of the attribute `name` of `node`, if present.
pub fn optional_attribute<'a, 'input: 'a, T: ActualValue<'a>>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> Result<Option<T>, XsdError> {
    node.attribute(name)
        .map(|value| actual_value(value, node))
        .transpose()
}

/// The actual value of the attribute `name` of `node`; its absence is an error.
pub fn required_attribute<'a, 'input: 'a, T: ActualValue<'a>>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> Result<T, XsdError> {
    optional_attribute(node, name)?.ok_or_else(|| XsdError::MissingAttribute {
        element: node.tag_name().name().to_string(),
        attribute: name,
    })
}
