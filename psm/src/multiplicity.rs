use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Upper bound of a [`Multiplicity`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UpperBound {
    Unbounded,
    Count(u32),
}

impl UpperBound {
    /// `true` if more than one occurrence is allowed.
    pub fn is_many(self) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Count(n) => n > 1,
        }
    }
}

impl fmt::Display for UpperBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => write!(f, "*"),
            Self::Count(n) => write!(f, "{n}"),
        }
    }
}

/// A `lower..upper` multiplicity as used on attributes and associations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Multiplicity {
    pub lower: u32,
    pub upper: UpperBound,
}

impl Default for Multiplicity {
    fn default() -> Self {
        Self::ONE
    }
}

impl Multiplicity {
    pub const ONE: Self = Self::new(1, UpperBound::Count(1));
    pub const OPTIONAL: Self = Self::new(0, UpperBound::Count(1));
    pub const MANY: Self = Self::new(0, UpperBound::Unbounded);
    pub const AT_LEAST_ONE: Self = Self::new(1, UpperBound::Unbounded);

    pub const fn new(lower: u32, upper: UpperBound) -> Self {
        Self { lower, upper }
    }

    pub const fn bounded(lower: u32, upper: u32) -> Self {
        Self::new(lower, UpperBound::Count(upper))
    }

    /// `true` for the default `1..1`
    pub fn is_one(&self) -> bool {
        *self == Self::ONE
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            UpperBound::Count(upper) if upper == self.lower => write!(f, "{upper}"),
            upper => write!(f, "{}..{}", self.lower, upper),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MultiplicityError {
    #[error("invalid multiplicity bound {0:?}")]
    InvalidBound(String),
    #[error("lower bound {lower} exceeds upper bound {upper}")]
    LowerExceedsUpper { lower: u32, upper: u32 },
    #[error("the lower bound of a multiplicity cannot be unbounded")]
    UnboundedLower,
}

fn parse_bound(source: &str) -> Result<UpperBound, MultiplicityError> {
    let source = source.trim();
    if source == "*" {
        Ok(UpperBound::Unbounded)
    } else {
        source
            .parse()
            .map(UpperBound::Count)
            .map_err(|_| MultiplicityError::InvalidBound(source.to_string()))
    }
}

impl FromStr for Multiplicity {
    type Err = MultiplicityError;

    /// Accepts `n`, `*`, and `lower..upper` where `upper` may be `*`.
    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let (lower, upper) = match source.split_once("..") {
            Some((lower, upper)) => (parse_bound(lower)?, parse_bound(upper)?),
            None => match parse_bound(source)? {
                UpperBound::Unbounded => (UpperBound::Count(0), UpperBound::Unbounded),
                single => (single, single),
            },
        };
        let UpperBound::Count(lower) = lower else {
            return Err(MultiplicityError::UnboundedLower);
        };
        if let UpperBound::Count(upper) = upper {
            if lower > upper {
                return Err(MultiplicityError::LowerExceedsUpper { lower, upper });
            }
        }
        Ok(Self::new(lower, upper))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Multiplicity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Multiplicity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        source.parse().map_err(serde::de::Error::custom)
    }
}
