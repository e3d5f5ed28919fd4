//! Resource and resource instance addresses

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{InstanceKey, ModuleInstance, Target};
use crate::{Error, Result};

/// Whether a resource is managed or a data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMode {
    Managed,
    Data,
}

/// A resource within a module: mode, type and name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resource {
    pub mode: ResourceMode,
    pub type_name: String,
    pub name: String,
}

impl Resource {
    /// A managed resource `type_name.name`.
    pub fn managed(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mode: ResourceMode::Managed,
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// A data source `data.type_name.name`.
    pub fn data(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mode: ResourceMode::Data,
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// Place this resource in a module instance.
    pub fn absolute(self, module: ModuleInstance) -> AbsResource {
        AbsResource {
            module,
            resource: self,
        }
    }

    /// Whether both resources have the same mode and type.
    pub fn same_kind(&self, other: &Self) -> bool {
        self.mode == other.mode && self.type_name == other.type_name
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mode == ResourceMode::Data {
            f.write_str("data.")?;
        }
        write!(f, "{}.{}", self.type_name, self.name)
    }
}

/// A resource placed in a module instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AbsResource {
    pub module: ModuleInstance,
    pub resource: Resource,
}

impl AbsResource {
    /// Address of one instance of this resource.
    pub fn instance(&self, key: InstanceKey) -> AbsResourceInstance {
        AbsResourceInstance {
            module: self.module.clone(),
            resource: self.resource.clone(),
            key,
        }
    }
}

impl fmt::Display for AbsResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.module.is_root() {
            write!(f, "{}.", self.module)?;
        }
        write!(f, "{}", self.resource)
    }
}

impl FromStr for AbsResource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match Target::parse(s)? {
            Target::Resource(addr) => Ok(addr),
            _ => Err(Error::malformed(s, s, "expected a resource address without an instance key")),
        }
    }
}

/// Dependency edges are persisted as address strings.
impl Serialize for AbsResource {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AbsResource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// One instance of a resource, fully qualified
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AbsResourceInstance {
    pub module: ModuleInstance,
    pub resource: Resource,
    pub key: InstanceKey,
}

impl AbsResourceInstance {
    /// Address of the resource containing this instance.
    pub fn containing_resource(&self) -> AbsResource {
        AbsResource {
            module: self.module.clone(),
            resource: self.resource.clone(),
        }
    }
}

impl fmt::Display for AbsResourceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.module.is_root() {
            write!(f, "{}.", self.module)?;
        }
        write!(f, "{}{}", self.resource, self.key)
    }
}

/// Parses an instance address; a missing key means [`InstanceKey::NoKey`].
impl FromStr for AbsResourceInstance {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match Target::parse(s)? {
            Target::Instance(addr) => Ok(addr),
            Target::Resource(addr) => Ok(addr.instance(InstanceKey::NoKey)),
            Target::Module(_) => Err(Error::malformed(s, s, "expected a resource instance address")),
        }
    }
}
