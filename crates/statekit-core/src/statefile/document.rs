//! Serialized shape of a state file
//!
//! Documents are written with serde. Reading goes through [`RawObject`]: each
//! known member is claimed by name and the rest is kept as [`ExtraFields`], so
//! members this crate does not model are written back as they were read.

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::addrs::{AbsResource, InstanceKey, ResourceMode};
use crate::states::{Attributes, EachMode, ExtraFields, InstanceObject, ObjectStatus};

/// A JSON object whose members stay raw until claimed.
#[derive(Deserialize)]
#[serde(transparent)]
pub(crate) struct RawObject(BTreeMap<String, Box<RawValue>>);

impl RawObject {
    pub fn parse(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Remove and decode member `name`. Absent and `null` members are `None`.
    fn take<T: DeserializeOwned>(&mut self, name: &str) -> serde_json::Result<Option<T>> {
        match self.0.remove(name) {
            None => Ok(None),
            Some(raw) => serde_json::from_str::<Option<T>>(raw.get())
                .map_err(|e| serde_json::Error::custom(format!("field `{name}`: {e}"))),
        }
    }

    fn take_or_default<T: DeserializeOwned + Default>(&mut self, name: &str) -> serde_json::Result<T> {
        Ok(self.take(name)?.unwrap_or_default())
    }

    fn require<T: DeserializeOwned>(&mut self, name: &str) -> serde_json::Result<T> {
        self.take(name)?
            .ok_or_else(|| serde_json::Error::custom(format!("missing field `{name}`")))
    }

    /// Every member not claimed so far.
    fn into_extra(self) -> ExtraFields {
        ExtraFields::from(self.0)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StateDocument {
    pub version: u64,
    pub serial: u64,
    pub lineage: String,
    pub resources: Vec<ResourceDocument>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StateDocument {
    pub fn from_raw(mut raw: RawObject) -> serde_json::Result<Self> {
        Ok(Self {
            version: raw.require("version")?,
            serial: raw.take_or_default("serial")?,
            lineage: raw.take_or_default("lineage")?,
            resources: raw
                .take_or_default::<Vec<RawObject>>("resources")?
                .into_iter()
                .map(ResourceDocument::from_raw)
                .collect::<serde_json::Result<_>>()?,
            extra: raw.into_extra(),
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResourceDocument {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub module: String,
    pub mode: ResourceMode,
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(skip_serializing_if = "EachMode::is_no_each")]
    pub each: EachMode,
    pub provider: String,
    pub instances: Vec<InstanceDocument>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ResourceDocument {
    fn from_raw(mut raw: RawObject) -> serde_json::Result<Self> {
        Ok(Self {
            module: raw.take_or_default("module")?,
            mode: raw.require("mode")?,
            type_name: raw.require("type")?,
            name: raw.require("name")?,
            each: raw.take_or_default("each")?,
            provider: raw.require("provider")?,
            instances: raw
                .take_or_default::<Vec<RawObject>>("instances")?
                .into_iter()
                .map(InstanceDocument::from_raw)
                .collect::<serde_json::Result<_>>()?,
            extra: raw.into_extra(),
        })
    }
}

/// `index_key` is a bare integer or string in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum IndexKey {
    Int(i64),
    Str(String),
}

impl IndexKey {
    pub fn from_key(key: &InstanceKey) -> Option<Self> {
        match key {
            InstanceKey::NoKey => None,
            InstanceKey::Int(n) => Some(Self::Int(*n)),
            InstanceKey::Str(s) => Some(Self::Str(s.clone())),
        }
    }

    pub fn into_key(key: Option<Self>) -> InstanceKey {
        match key {
            None => InstanceKey::NoKey,
            Some(Self::Int(n)) => InstanceKey::Int(n),
            Some(Self::Str(s)) => InstanceKey::Str(s),
        }
    }
}

/// An instance with its current object's members inlined.
///
/// `extra` belongs to the current object.
#[derive(Debug, Serialize)]
pub(crate) struct InstanceDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_key: Option<IndexKey>,
    #[serde(skip_serializing_if = "ObjectStatus::is_ready")]
    pub status: ObjectStatus,
    pub schema_version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<AbsResource>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub deposed: BTreeMap<String, ObjectDocument>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl InstanceDocument {
    fn from_raw(mut raw: RawObject) -> serde_json::Result<Self> {
        Ok(Self {
            index_key: raw.take("index_key")?,
            status: raw.take_or_default("status")?,
            schema_version: raw.take_or_default("schema_version")?,
            attributes: raw.take("attributes")?,
            dependencies: raw.take_or_default("dependencies")?,
            deposed: raw
                .take_or_default::<BTreeMap<String, RawObject>>("deposed")?
                .into_iter()
                .map(|(key, object)| Ok((key, ObjectDocument::from_raw(object)?)))
                .collect::<serde_json::Result<_>>()?,
            extra: raw.into_extra(),
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ObjectDocument {
    #[serde(skip_serializing_if = "ObjectStatus::is_ready")]
    pub status: ObjectStatus,
    pub schema_version: u64,
    pub attributes: Attributes,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<AbsResource>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ObjectDocument {
    fn from_raw(mut raw: RawObject) -> serde_json::Result<Self> {
        Ok(Self {
            status: raw.take_or_default("status")?,
            schema_version: raw.take_or_default("schema_version")?,
            attributes: raw.require("attributes")?,
            dependencies: raw.take_or_default("dependencies")?,
            extra: raw.into_extra(),
        })
    }
}

impl From<ObjectDocument> for InstanceObject {
    fn from(doc: ObjectDocument) -> Self {
        Self {
            attributes: doc.attributes,
            status: doc.status,
            schema_version: doc.schema_version,
            dependencies: doc.dependencies,
            extra: doc.extra,
        }
    }
}

impl From<&InstanceObject> for ObjectDocument {
    fn from(object: &InstanceObject) -> Self {
        Self {
            status: object.status,
            schema_version: object.schema_version,
            attributes: object.attributes.clone(),
            dependencies: object.dependencies.clone(),
            extra: object.extra.clone(),
        }
    }
}
