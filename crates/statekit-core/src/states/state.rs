//! The state tree

use std::collections::BTreeMap;

use uuid::Uuid;

use super::{EachMode, ExtraFields, InstanceObject, ResourceInstanceState, ResourceState};
use crate::addrs::{AbsResource, AbsResourceInstance, ModuleInstance, Resource};

/// Resources recorded for one module instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleState {
    pub resources: BTreeMap<Resource, ResourceState>,
}

impl ModuleState {
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// A complete state
///
/// The root module instance is always present. Other module instances exist
/// only while they hold at least one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// Identity shared by every serial of the same state
    pub lineage: String,
    pub serial: u64,
    pub modules: BTreeMap<ModuleInstance, ModuleState>,
    /// Top-level members such as `terraform_version` and `outputs`
    pub extra: ExtraFields,
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    /// An empty state with a fresh lineage.
    pub fn new() -> Self {
        Self::with_lineage(Uuid::new_v4().to_string(), 0)
    }

    pub fn with_lineage(lineage: impl Into<String>, serial: u64) -> Self {
        let mut modules = BTreeMap::new();
        modules.insert(ModuleInstance::root(), ModuleState::default());
        Self {
            lineage: lineage.into(),
            serial,
            modules,
            extra: ExtraFields::default(),
        }
    }

    /// Whether the state records no resources at all.
    pub fn is_empty(&self) -> bool {
        self.modules.values().all(ModuleState::is_empty)
    }

    pub fn module(&self, path: &ModuleInstance) -> Option<&ModuleState> {
        self.modules.get(path)
    }

    /// Get the module instance at `path`, creating it if needed.
    pub fn ensure_module(&mut self, path: &ModuleInstance) -> &mut ModuleState {
        self.modules.entry(path.clone()).or_default()
    }

    /// Paths of every module instance at or beneath `prefix`, in order.
    pub fn module_paths_under(&self, prefix: &ModuleInstance) -> Vec<ModuleInstance> {
        self.modules
            .keys()
            .filter(|path| path.has_prefix(prefix))
            .cloned()
            .collect()
    }

    pub fn resource(&self, addr: &AbsResource) -> Option<&ResourceState> {
        self.modules.get(&addr.module)?.resources.get(&addr.resource)
    }

    pub fn resource_mut(&mut self, addr: &AbsResource) -> Option<&mut ResourceState> {
        self.modules
            .get_mut(&addr.module)?
            .resources
            .get_mut(&addr.resource)
    }

    pub fn resource_instance(&self, addr: &AbsResourceInstance) -> Option<&ResourceInstanceState> {
        self.resource(&addr.containing_resource())?
            .instances
            .get(&addr.key)
    }

    /// Set the each-mode and provider of a resource, creating it if needed.
    pub fn set_resource_meta(&mut self, addr: &AbsResource, each: EachMode, provider: &str) {
        let resource = self
            .ensure_module(&addr.module)
            .resources
            .entry(addr.resource.clone())
            .or_default();
        resource.each = each;
        resource.provider = provider.to_string();
    }

    /// Record `object` as the current object of an instance.
    ///
    /// A missing resource is created with the each-mode implied by the key.
    pub fn set_resource_instance_current(
        &mut self,
        addr: &AbsResourceInstance,
        object: InstanceObject,
        provider: &str,
    ) {
        let resource = self.entry_resource(addr, provider);
        resource.instances.entry(addr.key.clone()).or_default().current = Some(object);
    }

    /// Record a whole instance, replacing anything at its key.
    pub fn set_resource_instance(
        &mut self,
        addr: &AbsResourceInstance,
        instance: ResourceInstanceState,
        provider: &str,
    ) {
        let resource = self.entry_resource(addr, provider);
        resource.instances.insert(addr.key.clone(), instance);
    }

    fn entry_resource(&mut self, addr: &AbsResourceInstance, provider: &str) -> &mut ResourceState {
        self.ensure_module(&addr.module)
            .resources
            .entry(addr.resource.clone())
            .or_insert_with(|| ResourceState::new(EachMode::for_key(&addr.key), provider))
    }

    /// Insert a resource, replacing any resource at the same address.
    pub fn insert_resource(&mut self, addr: &AbsResource, resource: ResourceState) {
        self.ensure_module(&addr.module)
            .resources
            .insert(addr.resource.clone(), resource);
    }

    /// Remove a whole resource, pruning its module if that empties it.
    pub fn remove_resource(&mut self, addr: &AbsResource) -> Option<ResourceState> {
        let removed = self
            .modules
            .get_mut(&addr.module)?
            .resources
            .remove(&addr.resource);
        self.prune_module(&addr.module);
        removed
    }

    /// Remove one instance, pruning its resource and module if they empty.
    pub fn remove_resource_instance(
        &mut self,
        addr: &AbsResourceInstance,
    ) -> Option<ResourceInstanceState> {
        let resource_addr = addr.containing_resource();
        let resource = self.resource_mut(&resource_addr)?;
        let removed = resource.instances.remove(&addr.key);
        if resource.is_empty() {
            self.remove_resource(&resource_addr);
        }
        removed
    }

    /// Remove a module instance if it is not the root and holds nothing.
    pub fn prune_module(&mut self, path: &ModuleInstance) {
        if path.is_root() {
            return;
        }
        if self.modules.get(path).is_some_and(ModuleState::is_empty) {
            self.modules.remove(path);
        }
    }

    /// Every resource in address order.
    pub fn resources(&self) -> impl Iterator<Item = (AbsResource, &ResourceState)> {
        self.modules.iter().flat_map(|(module, state)| {
            state.resources.iter().map(move |(resource, rs)| {
                (
                    AbsResource {
                        module: module.clone(),
                        resource: resource.clone(),
                    },
                    rs,
                )
            })
        })
    }

    /// Every resource instance in address order.
    pub fn instances(&self) -> impl Iterator<Item = (AbsResourceInstance, &ResourceInstanceState)> {
        self.resources().flat_map(|(addr, resource)| {
            resource
                .instances
                .iter()
                .map(move |(key, instance)| (addr.instance(key.clone()), instance))
        })
    }
}
