use std::collections::HashSet;

use lazy_static::lazy_static;

use super::xstypes::QName;

lazy_static! {
    /// The `xs:anyType` qualified name
    pub static ref XS_ANY_TYPE_NAME: QName = QName::xs("anyType");
    /// The `xs:string` qualified name
    pub static ref XS_STRING_NAME: QName = QName::xs("string");

    static ref BUILTIN_TYPE_NAMES: HashSet<&'static str> = [
        "anyType", "anySimpleType", "anyAtomicType", "string", "boolean", "decimal", "float",
        "double", "duration", "dateTime", "time", "date", "gYearMonth", "gYear", "gMonthDay",
        "gDay", "gMonth", "hexBinary", "base64Binary", "anyURI", "QName", "NOTATION",
        "normalizedString", "token", "language", "NMTOKEN", "NMTOKENS", "Name", "NCName", "ID",
        "IDREF", "IDREFS", "ENTITY", "ENTITIES", "integer", "nonPositiveInteger",
        "negativeInteger", "long", "int", "short", "byte", "nonNegativeInteger", "unsignedLong",
        "unsignedInt", "unsignedShort", "unsignedByte", "positiveInteger", "yearMonthDuration",
        "dayTimeDuration", "dateTimeStamp",
    ]
    .into_iter()
    .collect();
}

/// Checks whether `name` denotes one of the built-in XML Schema types.
pub fn is_builtin_name(name: &QName) -> bool {
    name.is_xs() && is_builtin_local_name(&name.local_name)
}

pub fn is_builtin_local_name(local_name: &str) -> bool {
    BUILTIN_TYPE_NAMES.contains(local_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_builtins_only_in_the_xs_namespace() {
        assert!(is_builtin_name(&XS_STRING_NAME));
        assert!(is_builtin_name(&QName::xs("unsignedShort")));
        assert!(!is_builtin_name(&QName::xs("Person")));
        assert!(!is_builtin_name(&QName::with_namespace("urn:x", "string")));
    }
}
