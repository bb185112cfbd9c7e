use std::ops::{BitOr, BitOrAssign};

use super::naming::optional_attribute_group_name;

/// Which variants of a class's attribute group are in use.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AttributeGroupUsage {
    pub normal: bool,
    pub optional: bool,
}

impl AttributeGroupUsage {
    pub const NONE: Self = Self {
        normal: false,
        optional: false,
    };
    pub const NORMAL: Self = Self {
        normal: true,
        optional: false,
    };
    pub const OPTIONAL: Self = Self {
        normal: false,
        optional: true,
    };
    pub const BOTH: Self = Self {
        normal: true,
        optional: true,
    };

    /// The single-variant usage for the given context
    pub fn variant(optional: bool) -> Self {
        if optional {
            Self::OPTIONAL
        } else {
            Self::NORMAL
        }
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// `true` if every variant of `other` is already part of `self`
    pub fn contains(self, other: Self) -> bool {
        (self | other) == self
    }

    /// The variants in `self` but not in `other`
    pub fn without(self, other: Self) -> Self {
        Self {
            normal: self.normal && !other.normal,
            optional: self.optional && !other.optional,
        }
    }
}

impl BitOr for AttributeGroupUsage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            normal: self.normal || rhs.normal,
            optional: self.optional || rhs.optional,
        }
    }
}

impl BitOrAssign for AttributeGroupUsage {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

/// Per-class decisions and bookkeeping of one forward translation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassTranslationData {
    pub name_base: String,
    /// Set iff the class becomes a named complex type
    pub complex_type_name: Option<String>,
    /// Set iff the class becomes a model group / attribute group pair
    pub model_group_name: Option<String>,
    pub attribute_group_name: Option<String>,
    /// Derives from its general through `xs:extension`
    pub uses_extension: bool,
    pub has_attributes: bool,
    /// The class lives in a referenced diagram; its declarations belong to another schema
    pub foreign: bool,
    /// Attribute-group variants that must be emitted regardless of local use
    pub requested_usage: AttributeGroupUsage,
    pub emitted_usage: AttributeGroupUsage,
}

impl ClassTranslationData {
    pub fn has_groups(&self) -> bool {
        self.model_group_name.is_some()
    }

    pub fn is_complex_type(&self) -> bool {
        self.complex_type_name.is_some()
    }

    /// The name of one attribute-group variant: `{base}-a` or `{base}-a-opt`
    pub fn attribute_group_variant(&self, optional: bool) -> Option<String> {
        let name = self.attribute_group_name.as_deref()?;
        Some(if optional {
            optional_attribute_group_name(name)
        } else {
            name.to_string()
        })
    }
}
