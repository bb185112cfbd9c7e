use std::fmt;

use super::error::XsdError;

pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
/// Bound to the reserved `xml` prefix in every document
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

pub type NCName = String;
pub type AnyURI = String;

/// An expanded name: an optional namespace URI and a local name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub namespace_name: Option<AnyURI>,
    pub local_name: NCName,
}

impl fmt::Display for QName {
    /// Clark notation, `{namespace}local`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace_name {
            Some(namespace) => write!(f, "{{{namespace}}}{}", self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

impl QName {
    pub fn with_namespace(
        namespace_name: impl Into<String>,
        local_name: impl Into<String>,
    ) -> Self {
        Self::with_optional_namespace(Some(namespace_name), local_name)
    }

    pub fn with_optional_namespace(
        namespace_name: Option<impl Into<String>>,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            namespace_name: namespace_name.map(Into::into),
            local_name: local_name.into(),
        }
    }

    /// A name in the XML Schema namespace, e.g. `xs:string`
    pub fn xs(local_name: impl Into<String>) -> Self {
        Self::with_namespace(XS_NAMESPACE, local_name)
    }

    pub fn is_xs(&self) -> bool {
        self.namespace_name.as_deref() == Some(XS_NAMESPACE)
    }

    /// Resolves a `prefix:local` or `local` reference against the namespace declarations in
    /// scope at `context`. Unprefixed names take the default namespace, if any.
    pub fn parse(source: &str, context: roxmltree::Node) -> Result<Self, XsdError> {
        let source = source.trim();
        let Some((prefix, local_name)) = source.rsplit_once(':') else {
            let default_namespace = context.lookup_namespace_uri(None);
            return Ok(Self::with_optional_namespace(default_namespace, source));
        };
        let namespace = match prefix {
            "xml" => XML_NAMESPACE,
            _ => context
                .lookup_namespace_uri(Some(prefix))
                .ok_or_else(|| XsdError::NamePrefixNotResolved(prefix.into()))?,
        };
        Ok(Self::with_namespace(namespace, local_name))
    }
}

pub type Sequence<T> = Vec<T>;
