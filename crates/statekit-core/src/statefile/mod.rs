//! State file encoding
//!
//! States are stored as pretty-printed JSON (format version 4). Attribute
//! payloads are carried as raw JSON text and written back exactly as read.
//! Resources are written in address order and instances in key order, so
//! encoding the same [`State`] always yields the same bytes.

mod document;

use std::collections::BTreeMap;
use std::path::Path;

use statekit_fs::compute_checksum;
use uuid::Uuid;

use crate::addrs::{AbsResourceInstance, InstanceKey, ModuleInstance, Resource};
use crate::states::{ExtraFields, InstanceObject, ResourceInstanceState, ResourceState, State};
use crate::{Error, Result};

use document::{
    IndexKey, InstanceDocument, ObjectDocument, RawObject, ResourceDocument, StateDocument,
};

/// Format version written and accepted
pub const STATE_VERSION: u64 = 4;

/// Decode state file bytes read from `path`.
///
/// # Errors
///
/// Returns [`Error::InvalidState`] when the bytes are not a version 4 state
/// or when a resource's instance keys do not fit its each-mode.
pub fn decode(path: &Path, bytes: &[u8]) -> Result<State> {
    let doc = RawObject::parse(bytes)
        .and_then(StateDocument::from_raw)
        .map_err(|e| Error::invalid_state(path, e.to_string()))?;

    if doc.version != STATE_VERSION {
        return Err(Error::invalid_state(
            path,
            format!(
                "unsupported state format version {} (expected {STATE_VERSION})",
                doc.version
            ),
        ));
    }

    let lineage = if doc.lineage.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        doc.lineage
    };
    let mut state = State::with_lineage(lineage, doc.serial);
    state.extra = doc.extra;

    for resource_doc in doc.resources {
        let module: ModuleInstance = resource_doc
            .module
            .parse()
            .map_err(|e: Error| Error::invalid_state(path, e.to_string()))?;
        let resource = Resource {
            mode: resource_doc.mode,
            type_name: resource_doc.type_name,
            name: resource_doc.name,
        };
        let addr = resource.absolute(module);
        if state.resource(&addr).is_some() {
            return Err(Error::invalid_state(
                path,
                format!("resource {addr} is recorded more than once"),
            ));
        }

        let mut resource_state = ResourceState::new(resource_doc.each, resource_doc.provider);
        resource_state.extra = resource_doc.extra;
        for instance_doc in resource_doc.instances {
            let key = IndexKey::into_key(instance_doc.index_key.clone());
            let instance_addr = addr.instance(key.clone());
            if key.as_int().is_some_and(|n| n < 0) {
                return Err(Error::invalid_state(
                    path,
                    format!("instance {instance_addr} has a negative list index"),
                ));
            }
            if resource_state.instances.contains_key(&key) {
                return Err(Error::invalid_state(
                    path,
                    format!("instance {instance_addr} is recorded more than once"),
                ));
            }
            let instance = decode_instance(path, &instance_addr, instance_doc)?;
            resource_state.instances.insert(key, instance);
        }
        if let Some(key) = resource_state.mismatched_key() {
            return Err(Error::invalid_state(
                path,
                format!(
                    "instance {} does not fit {} resource {addr}",
                    addr.instance(key.clone()),
                    resource_state.each
                ),
            ));
        }

        state.insert_resource(&addr, resource_state);
    }

    tracing::debug!(
        path = %path.display(),
        serial = state.serial,
        resources = state.resources().count(),
        "decoded state"
    );
    Ok(state)
}

fn decode_instance(
    path: &Path,
    addr: &AbsResourceInstance,
    doc: InstanceDocument,
) -> Result<ResourceInstanceState> {
    let current = match doc.attributes {
        Some(attributes) => Some(InstanceObject {
            attributes,
            status: doc.status,
            schema_version: doc.schema_version,
            dependencies: doc.dependencies,
            extra: doc.extra,
        }),
        None if doc.extra.is_empty() => None,
        None => {
            return Err(Error::invalid_state(
                path,
                format!("instance {addr} records object fields but no attributes"),
            ));
        }
    };
    let deposed = doc
        .deposed
        .into_iter()
        .map(|(key, object)| (key, InstanceObject::from(object)))
        .collect();
    Ok(ResourceInstanceState { current, deposed })
}

fn encode_instance(key: &InstanceKey, instance: &ResourceInstanceState) -> InstanceDocument {
    let deposed: BTreeMap<String, ObjectDocument> = instance
        .deposed
        .iter()
        .map(|(key, object)| (key.clone(), ObjectDocument::from(object)))
        .collect();
    match &instance.current {
        Some(object) => InstanceDocument {
            index_key: IndexKey::from_key(key),
            status: object.status,
            schema_version: object.schema_version,
            attributes: Some(object.attributes.clone()),
            dependencies: object.dependencies.clone(),
            deposed,
            extra: object.extra.clone(),
        },
        None => InstanceDocument {
            index_key: IndexKey::from_key(key),
            status: Default::default(),
            schema_version: 0,
            attributes: None,
            dependencies: Vec::new(),
            deposed,
            extra: ExtraFields::default(),
        },
    }
}

/// Encode a state as pretty-printed JSON with a trailing newline.
pub fn encode(state: &State) -> Result<Vec<u8>> {
    let resources = state
        .resources()
        .map(|(addr, resource)| ResourceDocument {
            module: addr.module.to_string(),
            mode: addr.resource.mode,
            type_name: addr.resource.type_name.clone(),
            name: addr.resource.name.clone(),
            each: resource.each,
            provider: resource.provider.clone(),
            instances: resource
                .instances
                .iter()
                .map(|(key, instance)| encode_instance(key, instance))
                .collect(),
            extra: resource.extra.clone(),
        })
        .collect();

    let doc = StateDocument {
        version: STATE_VERSION,
        serial: state.serial,
        lineage: state.lineage.clone(),
        resources,
        extra: state.extra.clone(),
    };
    let mut bytes = serde_json::to_vec_pretty(&doc)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Checksum of the encoded form of `state`.
pub fn fingerprint(state: &State) -> Result<String> {
    Ok(compute_checksum(&encode(state)?))
}

/// Encode `state` for commit.
///
/// The serial is incremented when the content differs from `baseline`, the
/// fingerprint taken at load time. A state with no baseline is new and
/// always counts as changed.
pub fn finalize(state: &mut State, baseline: Option<&str>) -> Result<Vec<u8>> {
    let bytes = encode(state)?;
    if baseline == Some(compute_checksum(&bytes).as_str()) {
        return Ok(bytes);
    }
    state.serial += 1;
    tracing::debug!(serial = state.serial, "state changed, serial incremented");
    encode(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addrs::AbsResource;
    use crate::states::{EachMode, ObjectStatus};
    use crate::ErrorKind;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
  "version": 4,
  "serial": 3,
  "lineage": "be4e9a6c-2f4a-4c4a-9d1f-3f6c2b0d9a11",
  "resources": [
    {
      "mode": "managed",
      "type": "test_instance",
      "name": "foo",
      "each": "list",
      "provider": "provider[\"registry.terraform.io/-/test\"]",
      "instances": [
        {
          "index_key": 1,
          "status": "tainted",
          "schema_version": 2,
          "attributes": {"id": "one",  "z": [3, 1]},
          "dependencies": ["test_instance.bar"]
        },
        {
          "index_key": 0,
          "schema_version": 0,
          "attributes": {"id": "zero"}
        }
      ]
    },
    {
      "module": "module.child",
      "mode": "data",
      "type": "test_data_source",
      "name": "lookup",
      "provider": "provider[\"registry.terraform.io/-/test\"]",
      "instances": [
        {
          "schema_version": 0,
          "attributes": {"id": "data"},
          "deposed": {
            "00000001": {"schema_version": 0, "attributes": {"id": "old"}}
          }
        }
      ]
    }
  ]
}"#;

    fn decode_sample() -> State {
        decode(Path::new("terraform.tfstate"), SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn decode_reads_every_field() {
        let state = decode_sample();
        assert_eq!(state.serial, 3);
        assert_eq!(state.lineage, "be4e9a6c-2f4a-4c4a-9d1f-3f6c2b0d9a11");

        let foo: AbsResource = "test_instance.foo".parse().unwrap();
        let resource = state.resource(&foo).unwrap();
        assert_eq!(resource.each, EachMode::EachList);
        assert_eq!(resource.len(), 2);

        let one = state
            .resource_instance(&foo.instance(InstanceKey::Int(1)))
            .and_then(|instance| instance.current.as_ref())
            .unwrap();
        assert_eq!(one.status, ObjectStatus::Tainted);
        assert_eq!(one.schema_version, 2);
        assert_eq!(one.attributes.as_str(), r#"{"id": "one",  "z": [3, 1]}"#);
        assert_eq!(
            one.dependencies,
            vec!["test_instance.bar".parse::<AbsResource>().unwrap()]
        );

        let lookup: AbsResourceInstance = "module.child.data.test_data_source.lookup".parse().unwrap();
        let instance = state.resource_instance(&lookup).unwrap();
        assert_eq!(instance.deposed.len(), 1);
    }

    #[test]
    fn encode_orders_instances_and_keeps_attributes_verbatim() {
        let state = decode_sample();
        let text = String::from_utf8(encode(&state).unwrap()).unwrap();

        assert!(text.ends_with("}\n"));
        assert!(text.contains(r#""attributes": {"id": "one",  "z": [3, 1]}"#));
        let zero = text.find(r#""id": "zero""#).unwrap();
        let one = text.find(r#""id": "one""#).unwrap();
        assert!(zero < one, "instances should be written in key order");
    }

    #[test]
    fn encode_then_decode_preserves_state() {
        let state = decode_sample();
        let again = decode(Path::new("copy.tfstate"), &encode(&state).unwrap()).unwrap();
        assert_eq!(again, state);
    }

    #[test]
    fn decode_rejects_other_versions() {
        let err = decode(Path::new("old.tfstate"), br#"{"version": 3}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(err.to_string().contains("version 3"));
    }

    #[test]
    fn decode_rejects_malformed_json() {
        let err = decode(Path::new("bad.tfstate"), b"{not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(err.to_string().contains("bad.tfstate"));
    }

    #[test]
    fn decode_rejects_key_that_does_not_fit_each_mode() {
        let text = r#"{"version": 4, "resources": [{
            "mode": "managed", "type": "test_instance", "name": "foo", "each": "map",
            "provider": "p", "instances": [{"index_key": 0, "attributes": {}}]
        }]}"#;
        let err = decode(Path::new("s.tfstate"), text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("does not fit map resource"));
    }

    #[test]
    fn decode_rejects_duplicate_instances() {
        let text = r#"{"version": 4, "resources": [{
            "mode": "managed", "type": "test_instance", "name": "foo",
            "provider": "p", "instances": [{"attributes": {}}, {"attributes": {}}]
        }]}"#;
        let err = decode(Path::new("s.tfstate"), text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    const WITH_UNMODELED_FIELDS: &str = r#"{
  "version": 4,
  "terraform_version": "1.5.0",
  "serial": 2,
  "lineage": "be4e9a6c-2f4a-4c4a-9d1f-3f6c2b0d9a11",
  "outputs": {"ip": {"value": "10.0.0.1", "type": "string"}},
  "resources": [
    {
      "mode": "managed",
      "type": "test_instance",
      "name": "foo",
      "provider": "provider[\"registry.terraform.io/-/test\"]",
      "instances": [
        {
          "schema_version": 0,
          "attributes": {"id": "a"},
          "sensitive_attributes": [],
          "private": "c2VjcmV0",
          "create_before_destroy": true,
          "deposed": {
            "00000001": {"schema_version": 0, "attributes": {"id": "old"}, "private": "b2xk"}
          }
        }
      ]
    }
  ]
}"#;

    #[test]
    fn encode_keeps_unmodeled_fields() {
        let state = decode(Path::new("s.tfstate"), WITH_UNMODELED_FIELDS.as_bytes()).unwrap();
        let encoded = encode(&state).unwrap();

        let before: serde_json::Value = serde_json::from_str(WITH_UNMODELED_FIELDS).unwrap();
        let after: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn unmodeled_fields_stay_with_their_object() {
        let state = decode(Path::new("s.tfstate"), WITH_UNMODELED_FIELDS.as_bytes()).unwrap();
        let addr: AbsResourceInstance = "test_instance.foo".parse().unwrap();
        let instance = state.resource_instance(&addr).unwrap();

        let current = serde_json::to_value(&instance.current.as_ref().unwrap().extra).unwrap();
        assert_eq!(
            current,
            serde_json::json!({
                "sensitive_attributes": [],
                "private": "c2VjcmV0",
                "create_before_destroy": true
            })
        );
        let deposed = serde_json::to_value(&instance.deposed["00000001"].extra).unwrap();
        assert_eq!(deposed, serde_json::json!({ "private": "b2xk" }));
    }

    #[test]
    fn decode_rejects_negative_list_index() {
        let text = r#"{"version": 4, "resources": [{
            "mode": "managed", "type": "test_instance", "name": "foo", "each": "list",
            "provider": "p", "instances": [{"index_key": -1, "attributes": {}}]
        }]}"#;
        let err = decode(Path::new("s.tfstate"), text.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(err.to_string().contains("negative list index"));
    }

    #[test]
    fn decode_rejects_object_fields_without_attributes() {
        let text = r#"{"version": 4, "resources": [{
            "mode": "managed", "type": "test_instance", "name": "foo",
            "provider": "p", "instances": [{"private": "c2VjcmV0"}]
        }]}"#;
        let err = decode(Path::new("s.tfstate"), text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("no attributes"));
    }

    #[test]
    fn finalize_bumps_serial_only_on_change() {
        let mut state = decode_sample();
        let baseline = fingerprint(&state).unwrap();

        finalize(&mut state, Some(&baseline)).unwrap();
        assert_eq!(state.serial, 3);

        let foo: AbsResource = "test_instance.foo".parse().unwrap();
        state.remove_resource(&foo);
        finalize(&mut state, Some(&baseline)).unwrap();
        assert_eq!(state.serial, 4);
    }

    #[test]
    fn finalize_without_baseline_counts_as_changed() {
        let mut state = State::new();
        let bytes = finalize(&mut state, None).unwrap();
        assert_eq!(state.serial, 1);
        assert_eq!(decode(Path::new("new.tfstate"), &bytes).unwrap().serial, 1);
    }
}
