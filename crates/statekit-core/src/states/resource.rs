//! Resources and their each-mode

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ExtraFields, ResourceInstanceState};
use crate::addrs::InstanceKey;

/// How a resource's instances are keyed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EachMode {
    /// Exactly one instance with no key
    #[default]
    #[serde(rename = "none")]
    NoEach,
    /// Instances keyed by list position
    #[serde(rename = "list")]
    EachList,
    /// Instances keyed by string
    #[serde(rename = "map")]
    EachMap,
}

impl EachMode {
    /// The each-mode implied by an instance key.
    pub fn for_key(key: &InstanceKey) -> Self {
        match key {
            InstanceKey::NoKey => Self::NoEach,
            InstanceKey::Int(_) => Self::EachList,
            InstanceKey::Str(_) => Self::EachMap,
        }
    }

    /// Whether `key` may appear under a resource with this each-mode.
    pub fn admits(&self, key: &InstanceKey) -> bool {
        Self::for_key(key) == *self
    }

    pub fn is_no_each(&self) -> bool {
        matches!(self, Self::NoEach)
    }
}

impl fmt::Display for EachMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEach => write!(f, "scalar"),
            Self::EachList => write!(f, "list"),
            Self::EachMap => write!(f, "map"),
        }
    }
}

/// A resource: its each-mode, provider binding and keyed instances
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceState {
    pub each: EachMode,
    /// Provider configuration address, e.g. `provider["registry.terraform.io/hashicorp/aws"]`
    pub provider: String,
    pub instances: BTreeMap<InstanceKey, ResourceInstanceState>,
    pub extra: ExtraFields,
}

impl ResourceState {
    pub fn new(each: EachMode, provider: impl Into<String>) -> Self {
        Self {
            each,
            provider: provider.into(),
            instances: BTreeMap::new(),
            extra: ExtraFields::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// First key that does not fit the each-mode, if any.
    pub fn mismatched_key(&self) -> Option<&InstanceKey> {
        if self.each.is_no_each() && self.instances.len() > 1 {
            return self.instances.keys().nth(1);
        }
        self.instances.keys().find(|key| !self.each.admits(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_mode_follows_key_kind() {
        assert_eq!(EachMode::for_key(&InstanceKey::NoKey), EachMode::NoEach);
        assert_eq!(EachMode::for_key(&InstanceKey::Int(4)), EachMode::EachList);
        assert_eq!(EachMode::for_key(&InstanceKey::from("a")), EachMode::EachMap);
    }

    #[test]
    fn mismatched_key_finds_wrong_kind() {
        let mut resource = ResourceState::new(EachMode::EachList, "provider");
        resource
            .instances
            .insert(InstanceKey::Int(0), ResourceInstanceState::default());
        assert_eq!(resource.mismatched_key(), None);

        resource
            .instances
            .insert(InstanceKey::from("x"), ResourceInstanceState::default());
        assert_eq!(resource.mismatched_key(), Some(&InstanceKey::from("x")));
    }

    #[test]
    fn each_mode_serializes_short_names() {
        assert_eq!(serde_json::to_string(&EachMode::EachMap).unwrap(), r#""map""#);
        assert_eq!(EachMode::NoEach.to_string(), "scalar");
    }
}
