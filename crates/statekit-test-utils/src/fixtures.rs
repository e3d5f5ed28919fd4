//! State fixtures.

use statekit_core::{
    AbsResource, AbsResourceInstance, Attributes, EachMode, InstanceObject, State,
};

/// Provider address used by every fixture resource.
pub const TEST_PROVIDER: &str = r#"provider["registry.terraform.io/-/test"]"#;

/// A ready object with attributes `{"id": <id>, "foo": "value", "bar": "value"}`.
pub fn object(id: &str) -> InstanceObject {
    let attributes = Attributes::from_value(&serde_json::json!({
        "id": id,
        "foo": "value",
        "bar": "value",
    }))
    .unwrap();
    InstanceObject::new(attributes)
}

/// The `id` attribute of the current object at `addr`, if any.
pub fn attribute_id(state: &State, addr: &str) -> Option<String> {
    let addr: AbsResourceInstance = addr.parse().unwrap();
    let object = state.resource_instance(&addr)?.current.as_ref()?;
    let value: serde_json::Value = serde_json::from_str(object.attributes.as_str()).unwrap();
    value.get("id")?.as_str().map(str::to_string)
}

/// Fluent builder for [`State`] values.
///
/// # Example
///
/// ```rust,no_run
/// use statekit_test_utils::StateBuilder;
///
/// let state = StateBuilder::new()
///     .instance("test_instance.foo", "bar")
///     .instance("module.child.test_instance.baz[0]", "baz0")
///     .build();
/// ```
pub struct StateBuilder {
    state: State,
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StateBuilder {
    /// Start from an empty state with a fixed lineage and serial 1.
    pub fn new() -> Self {
        Self {
            state: State::with_lineage("00000000-0000-4000-8000-000000000000", 1),
        }
    }

    /// Add an instance whose object is [`object`]`(id)`.
    pub fn instance(self, addr: &str, id: &str) -> Self {
        self.object(addr, object(id))
    }

    /// Add an instance with the given object.
    pub fn object(mut self, addr: &str, object: InstanceObject) -> Self {
        let addr: AbsResourceInstance = addr.parse().unwrap();
        self.state
            .set_resource_instance_current(&addr, object, TEST_PROVIDER);
        self
    }

    /// Add an instance whose object depends on `dependencies`.
    pub fn dependent(self, addr: &str, id: &str, dependencies: &[&str]) -> Self {
        let dependencies = dependencies
            .iter()
            .map(|dep| dep.parse::<AbsResource>().unwrap())
            .collect();
        self.object(addr, object(id).with_dependencies(dependencies))
    }

    /// Add a list resource with `count` instances whose ids are `<prefix><n>`.
    pub fn counted(mut self, resource: &str, count: i64, prefix: &str) -> Self {
        let addr: AbsResource = resource.parse().unwrap();
        self.state
            .set_resource_meta(&addr, EachMode::EachList, TEST_PROVIDER);
        for n in 0..count {
            self = self.instance(&format!("{resource}[{n}]"), &format!("{prefix}{n}"));
        }
        self
    }

    /// Set the resource's provider address.
    pub fn provider(mut self, resource: &str, provider: &str) -> Self {
        let addr: AbsResource = resource.parse().unwrap();
        if let Some(resource) = self.state.resource_mut(&addr) {
            resource.provider = provider.to_string();
        }
        self
    }

    pub fn build(self) -> State {
        self.state
    }
}
