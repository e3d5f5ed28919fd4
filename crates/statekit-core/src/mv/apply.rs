//! Structural mutation for a validated [`MovePlan`]
//!
//! Every precondition has already been checked, so a violation found here is
//! an [`Error::Internal`].

use super::plan::{MovePlan, Stores, module_sources};
use super::reindex::{ListSlot, reindex};
use super::{MoveReport, Relocation};
use crate::addrs::{AbsResource, AbsResourceInstance, InstanceKey, ModuleInstance};
use crate::states::{EachMode, ResourceInstanceState, ResourceState};
use crate::{Error, Result};

pub(crate) fn apply(plan: &MovePlan, stores: &mut Stores<'_>, report: &mut MoveReport) -> Result<()> {
    match plan {
        MovePlan::Instance { from, to } => apply_instance(from, to, stores, report),
        MovePlan::Resource { from, to } => apply_resource(from, to, stores, report),
        MovePlan::Module { from, to } => apply_module(from, to, stores, report),
    }
}

fn missing(addr: &impl std::fmt::Display) -> Error {
    Error::Internal(format!("{addr} disappeared after validation"))
}

fn apply_instance(
    from: &AbsResourceInstance,
    to: &AbsResourceInstance,
    stores: &mut Stores<'_>,
    report: &mut MoveReport,
) -> Result<()> {
    let from_resource = from.containing_resource();
    let to_resource = to.containing_resource();

    let (provider, extra) = stores
        .source()
        .resource(&from_resource)
        .map(|resource| (resource.provider.clone(), resource.extra.clone()))
        .ok_or_else(|| missing(&from_resource))?;
    let instance = stores
        .source_mut()
        .remove_resource_instance(from)
        .ok_or_else(|| missing(from))?;

    let dest = stores.dest_mut();
    let Some(resource) = dest
        .resource_mut(&to_resource)
        .filter(|resource| !resource.is_empty())
    else {
        dest.set_resource_meta(&to_resource, EachMode::for_key(&to.key), &provider);
        dest.set_resource_instance(to, instance, &provider);
        if let Some(resource) = dest.resource_mut(&to_resource) {
            resource.extra = extra;
        }
        tracing::debug!(%from, %to, "moved instance");
        report.relocations.push(Relocation::new(from.clone(), to.clone()));
        return Ok(());
    };

    rebind_provider(resource, &to_resource, &provider);

    let Some(index) = to.key.as_int() else {
        if resource.instances.contains_key(&to.key) {
            return Err(Error::Internal(format!("{to} is already occupied")));
        }
        resource.instances.insert(to.key.clone(), instance);
        tracing::debug!(%from, %to, "moved instance");
        report.relocations.push(Relocation::new(from.clone(), to.clone()));
        return Ok(());
    };

    let mut entries = existing_entries(resource)?;
    entries.push((
        ListSlot::inserted(index),
        (Origin::Moved(from.clone()), instance),
    ));
    renumber(resource, &to_resource, entries, report);
    Ok(())
}

fn apply_resource(
    from: &AbsResource,
    to: &AbsResource,
    stores: &mut Stores<'_>,
    report: &mut MoveReport,
) -> Result<()> {
    let moved = stores
        .source_mut()
        .remove_resource(from)
        .ok_or_else(|| missing(from))?;

    let dest = stores.dest_mut();
    let Some(resource) = dest.resource_mut(to).filter(|resource| !resource.is_empty()) else {
        for key in moved.instances.keys() {
            report
                .relocations
                .push(Relocation::new(from.instance(key.clone()), to.instance(key.clone())));
        }
        tracing::debug!(%from, %to, instances = moved.len(), "moved resource");
        dest.insert_resource(to, moved);
        return Ok(());
    };

    rebind_provider(resource, to, &moved.provider);

    if moved.each != EachMode::EachList {
        for (key, instance) in moved.instances {
            if resource.instances.contains_key(&key) {
                return Err(Error::Internal(format!(
                    "{} is already occupied",
                    to.instance(key)
                )));
            }
            report
                .relocations
                .push(Relocation::new(from.instance(key.clone()), to.instance(key.clone())));
            resource.instances.insert(key, instance);
        }
        tracing::debug!(%from, %to, "merged resource by key");
        return Ok(());
    }

    let mut entries = existing_entries(resource)?;
    for (key, instance) in moved.instances {
        let index = key
            .as_int()
            .ok_or_else(|| Error::Internal(format!("{} is not a list key", from.instance(key.clone()))))?;
        entries.push((
            ListSlot::appended(index),
            (Origin::Moved(from.instance(key)), instance),
        ));
    }
    renumber(resource, to, entries, report);
    tracing::debug!(%from, %to, "appended list resource");
    Ok(())
}

fn apply_module(
    from: &ModuleInstance,
    to: &ModuleInstance,
    stores: &mut Stores<'_>,
    report: &mut MoveReport,
) -> Result<()> {
    let sources = module_sources(from, stores.source());

    let source = stores.source_mut();
    let mut detached = Vec::with_capacity(sources.len());
    for path in sources {
        let target = path
            .rebase(from, to)
            .ok_or_else(|| Error::Internal(format!("{path} is not beneath {from}")))?;
        let module = source.modules.remove(&path).ok_or_else(|| missing(&path))?;
        detached.push((path, target, module));
    }

    let dest = stores.dest_mut();
    for (path, target, module) in detached {
        for (resource, state) in &module.resources {
            let old = resource.clone().absolute(path.clone());
            let new = resource.clone().absolute(target.clone());
            for key in state.instances.keys() {
                report
                    .relocations
                    .push(Relocation::new(old.instance(key.clone()), new.instance(key.clone())));
            }
        }
        tracing::debug!(from = %path, to = %target, "moved module instance");
        if dest
            .modules
            .insert(target.clone(), module)
            .is_some_and(|previous| !previous.is_empty())
        {
            return Err(Error::Internal(format!("module {target} is already occupied")));
        }
    }
    Ok(())
}

/// Where a list entry came from before reindexing
enum Origin {
    /// Already under the destination resource at this key
    Existing(InstanceKey),
    /// Moved in from this address
    Moved(AbsResourceInstance),
}

type ListEntry = (Origin, ResourceInstanceState);

/// Drain a list resource into slots for [`reindex`].
fn existing_entries(resource: &mut ResourceState) -> Result<Vec<(ListSlot, ListEntry)>> {
    std::mem::take(&mut resource.instances)
        .into_iter()
        .map(|(key, instance)| {
            let index = key
                .as_int()
                .ok_or_else(|| Error::Internal(format!("list resource holds key {key}")))?;
            Ok((ListSlot::existing(index), (Origin::Existing(key), instance)))
        })
        .collect()
}

/// Reindex `entries` back into `resource`, reporting moved entries as
/// relocations and existing entries whose key changed as renumbered.
fn renumber(
    resource: &mut ResourceState,
    addr: &AbsResource,
    entries: Vec<(ListSlot, ListEntry)>,
    report: &mut MoveReport,
) {
    resource.each = EachMode::EachList;
    for (key, (origin, instance)) in reindex(entries) {
        let new_addr = addr.instance(key.clone());
        match origin {
            Origin::Moved(from) => {
                tracing::debug!(%from, to = %new_addr, "moved instance into list");
                report.relocations.push(Relocation::new(from, new_addr));
            }
            Origin::Existing(old) if old != key => {
                report
                    .renumbered
                    .push(Relocation::new(addr.instance(old), new_addr));
            }
            Origin::Existing(_) => {}
        }
        resource.instances.insert(key, instance);
    }
}

/// Point an existing destination resource at the provider of the moved data.
fn rebind_provider(resource: &mut ResourceState, addr: &AbsResource, provider: &str) {
    if resource.provider != provider {
        tracing::warn!(
            resource = %addr,
            old = %resource.provider,
            new = %provider,
            "destination resource now uses the provider of the moved data"
        );
        resource.provider = provider.to_string();
    }
}
