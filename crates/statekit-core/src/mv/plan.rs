//! Move resolution and validation
//!
//! A pair of [`Target`]s is resolved once into a [`MovePlan`] and checked
//! against the stores before anything is mutated.

use std::collections::BTreeSet;

use super::MoveKind;
use crate::addrs::{AbsResource, AbsResourceInstance, InstanceKey, ModuleInstance, Target};
use crate::states::{EachMode, State};
use crate::{Error, Result};

/// The stores a move operates on
pub(crate) enum Stores<'a> {
    /// Source and destination are the same store
    Same(&'a mut State),
    /// Distinct source and destination stores
    Split {
        source: &'a mut State,
        dest: &'a mut State,
    },
}

impl Stores<'_> {
    pub(crate) fn is_cross(&self) -> bool {
        matches!(self, Self::Split { .. })
    }

    pub(crate) fn source(&self) -> &State {
        match self {
            Self::Same(state) => state,
            Self::Split { source, .. } => source,
        }
    }

    pub(crate) fn dest(&self) -> &State {
        match self {
            Self::Same(state) => state,
            Self::Split { dest, .. } => dest,
        }
    }

    pub(crate) fn source_mut(&mut self) -> &mut State {
        match self {
            Self::Same(state) => state,
            Self::Split { source, .. } => source,
        }
    }

    pub(crate) fn dest_mut(&mut self) -> &mut State {
        match self {
            Self::Same(state) => state,
            Self::Split { dest, .. } => dest,
        }
    }
}

/// A resolved move
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MovePlan {
    Instance {
        from: AbsResourceInstance,
        to: AbsResourceInstance,
    },
    Resource {
        from: AbsResource,
        to: AbsResource,
    },
    Module {
        from: ModuleInstance,
        to: ModuleInstance,
    },
}

impl MovePlan {
    /// Resolve the plan for moving `from` to `to`, looking up `source` only
    /// where the address shapes alone are not enough.
    pub(crate) fn resolve(from: &Target, to: &Target, source: &State) -> Result<Self> {
        let plan = match (from, to) {
            (Target::Module(from), Target::Module(to)) => Self::Module {
                from: from.clone(),
                to: to.clone(),
            },
            (Target::Module(_), _) | (_, Target::Module(_)) => {
                return Err(Error::KindMismatch {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
            (Target::Instance(from), Target::Instance(to)) => Self::Instance {
                from: from.clone(),
                to: to.clone(),
            },
            (Target::Instance(from), Target::Resource(to)) => Self::Instance {
                from: from.clone(),
                to: to.instance(InstanceKey::NoKey),
            },
            (Target::Resource(from), Target::Instance(to)) => {
                let resource = source
                    .resource(from)
                    .filter(|resource| !resource.is_empty())
                    .ok_or_else(|| Error::SourceNotFound {
                        addr: from.to_string(),
                    })?;
                if resource.len() != 1 {
                    return Err(Error::InstanceCountMismatch {
                        addr: from.to_string(),
                        count: resource.len(),
                    });
                }
                let key = resource
                    .instances
                    .keys()
                    .next()
                    .cloned()
                    .unwrap_or_default();
                Self::Instance {
                    from: from.instance(key),
                    to: to.clone(),
                }
            }
            (Target::Resource(from), Target::Resource(to)) => Self::Resource {
                from: from.clone(),
                to: to.clone(),
            },
        };
        tracing::debug!(?plan, "resolved move plan");
        Ok(plan)
    }

    pub(crate) fn kind(&self) -> MoveKind {
        match self {
            Self::Instance { .. } => MoveKind::Instance,
            Self::Resource { .. } => MoveKind::Resource,
            Self::Module { .. } => MoveKind::Module,
        }
    }

    /// Whether the plan leaves everything where it is.
    pub(crate) fn is_identity(&self) -> bool {
        match self {
            Self::Instance { from, to } => from == to,
            Self::Resource { from, to } => from == to,
            Self::Module { from, to } => from == to,
        }
    }

    /// Check every precondition of the plan against the stores.
    ///
    /// Nothing is mutated. Returns whether the move is a no-op.
    pub(crate) fn validate(&self, stores: &Stores<'_>) -> Result<bool> {
        match self {
            Self::Instance { from, to } => validate_instance(from, to, stores)?,
            Self::Resource { from, to } => validate_resource(from, to, stores)?,
            Self::Module { from, to } => {
                validate_module(from, to, stores)?;
            }
        }
        Ok(!stores.is_cross() && self.is_identity())
    }
}

fn check_same_kind(from: &AbsResource, to: &AbsResource) -> Result<()> {
    if from.resource.same_kind(&to.resource) {
        Ok(())
    } else {
        Err(Error::ResourceTypeMismatch {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

fn validate_instance(
    from: &AbsResourceInstance,
    to: &AbsResourceInstance,
    stores: &Stores<'_>,
) -> Result<()> {
    if stores.source().resource_instance(from).is_none() {
        return Err(Error::SourceNotFound {
            addr: from.to_string(),
        });
    }
    let from_resource = from.containing_resource();
    let to_resource = to.containing_resource();
    check_same_kind(&from_resource, &to_resource)?;

    if !stores.is_cross() && from == to {
        return Ok(());
    }
    let Some(dest) = stores.dest().resource(&to_resource) else {
        return Ok(());
    };

    // In a single store the moved instance leaves before it arrives
    let vacated = !stores.is_cross() && from_resource == to_resource;
    let mut remaining = dest
        .instances
        .keys()
        .filter(|key| !(vacated && **key == from.key))
        .peekable();
    if remaining.peek().is_none() {
        return Ok(());
    }

    let incoming = EachMode::for_key(&to.key);
    if dest.each != incoming {
        return Err(Error::EachModeConflict {
            addr: to_resource.to_string(),
            existing: dest.each,
            incoming,
        });
    }
    if incoming != EachMode::EachList && remaining.any(|key| *key == to.key) {
        return Err(Error::DestinationKeyCollision {
            addr: to.to_string(),
        });
    }
    Ok(())
}

fn validate_resource(from: &AbsResource, to: &AbsResource, stores: &Stores<'_>) -> Result<()> {
    let source = stores
        .source()
        .resource(from)
        .filter(|resource| !resource.is_empty())
        .ok_or_else(|| Error::SourceNotFound {
            addr: from.to_string(),
        })?;
    check_same_kind(from, to)?;

    if !stores.is_cross() && from == to {
        return Ok(());
    }
    let Some(dest) = stores.dest().resource(to).filter(|dest| !dest.is_empty()) else {
        return Ok(());
    };

    if dest.each != source.each {
        return Err(Error::EachModeConflict {
            addr: to.to_string(),
            existing: dest.each,
            incoming: source.each,
        });
    }
    if source.each != EachMode::EachList
        && let Some(key) = source
            .instances
            .keys()
            .find(|key| dest.instances.contains_key(*key))
    {
        return Err(Error::DestinationKeyCollision {
            addr: to.instance(key.clone()).to_string(),
        });
    }
    Ok(())
}

/// Module paths a module move would relocate, in order.
pub(crate) fn module_sources(from: &ModuleInstance, source: &State) -> Vec<ModuleInstance> {
    source
        .module_paths_under(from)
        .into_iter()
        .filter(|path| source.module(path).is_some_and(|module| !module.is_empty()))
        .collect()
}

fn validate_module(from: &ModuleInstance, to: &ModuleInstance, stores: &Stores<'_>) -> Result<()> {
    let sources = module_sources(from, stores.source());
    if sources.is_empty() {
        return Err(Error::SourceNotFound {
            addr: from.to_string(),
        });
    }
    if !stores.is_cross() && from == to {
        return Ok(());
    }

    let vacated: BTreeSet<&ModuleInstance> = if stores.is_cross() {
        BTreeSet::new()
    } else {
        sources.iter().collect()
    };
    for path in &sources {
        let target = path
            .rebase(from, to)
            .ok_or_else(|| Error::Internal(format!("{path} is not beneath {from}")))?;
        let occupied = stores
            .dest()
            .module(&target)
            .is_some_and(|module| !module.is_empty());
        if occupied && !vacated.contains(&target) {
            return Err(Error::DestinationModuleExists {
                addr: target.to_string(),
            });
        }
    }
    Ok(())
}
