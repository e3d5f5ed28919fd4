//! Instance keys

use std::fmt;

/// Discriminator of an instance within a resource or module call.
///
/// The derived ordering puts `NoKey` first, then integer keys in numeric
/// order, then string keys in lexical order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstanceKey {
    /// Scalar instance, no key
    #[default]
    NoKey,
    /// Position in a list
    Int(i64),
    /// Key in a map
    Str(String),
}

impl InstanceKey {
    /// Integer value of a list key.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<i64> for InstanceKey {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for InstanceKey {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for InstanceKey {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

/// Renders the bracketed suffix: nothing, `[3]` or `["a"]`.
impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoKey => Ok(()),
            Self::Int(n) => write!(f, "[{n}]"),
            Self::Str(s) => {
                f.write_str("[\"")?;
                for ch in s.chars() {
                    match ch {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        other => write!(f, "{other}")?,
                    }
                }
                f.write_str("\"]")
            }
        }
    }
}
