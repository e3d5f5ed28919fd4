//! Resource instances and their objects

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::addrs::AbsResource;

/// Opaque attribute payload of an instance object.
///
/// Held as the raw JSON text it was read from and written back unchanged.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(Box<RawValue>);

impl Attributes {
    /// Wrap JSON text, validating only that it is well formed.
    pub fn from_json(text: impl Into<String>) -> serde_json::Result<Self> {
        RawValue::from_string(text.into()).map(Self)
    }

    /// Serialize any value into an attribute payload.
    pub fn from_value<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        serde_json::value::to_raw_value(value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.get()
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Attributes {}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Attributes").field(&self.as_str()).finish()
    }
}

/// Members of a state file object that the engine does not interpret.
///
/// Kept as raw JSON keyed by member name and written back unchanged, so
/// fields such as `private` or `sensitive_attributes` travel with the object
/// they belong to.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraFields(BTreeMap<String, Box<RawValue>>);

impl ExtraFields {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, Box<RawValue>>> for ExtraFields {
    fn from(members: BTreeMap<String, Box<RawValue>>) -> Self {
        Self(members)
    }
}

impl PartialEq for ExtraFields {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|((a, x), (b, y))| a == b && x.get() == y.get())
    }
}

impl Eq for ExtraFields {}

impl fmt::Debug for ExtraFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.iter().map(|(name, value)| (name, value.get())))
            .finish()
    }
}

/// Lifecycle status of an instance object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStatus {
    #[default]
    Ready,
    Tainted,
}

impl ObjectStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// One recorded object of a resource instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceObject {
    pub attributes: Attributes,
    pub status: ObjectStatus,
    pub schema_version: u64,
    /// Resources this object depended on when it was last applied
    pub dependencies: Vec<AbsResource>,
    pub extra: ExtraFields,
}

impl InstanceObject {
    /// A ready object with no dependencies.
    pub fn new(attributes: Attributes) -> Self {
        Self {
            attributes,
            status: ObjectStatus::Ready,
            schema_version: 0,
            dependencies: Vec::new(),
            extra: ExtraFields::default(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<AbsResource>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

/// Everything recorded for one resource instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceInstanceState {
    pub current: Option<InstanceObject>,
    /// Objects awaiting destruction, keyed by deposed key
    pub deposed: BTreeMap<String, InstanceObject>,
}

impl ResourceInstanceState {
    pub fn with_current(object: InstanceObject) -> Self {
        Self {
            current: Some(object),
            deposed: BTreeMap::new(),
        }
    }

    /// Whether neither a current nor a deposed object is recorded.
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.deposed.is_empty()
    }

    /// Iterate over the current object and then every deposed object.
    pub fn objects(&self) -> impl Iterator<Item = &InstanceObject> {
        self.current.iter().chain(self.deposed.values())
    }
}
