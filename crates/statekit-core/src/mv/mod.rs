//! Move engine
//!
//! Relocates a single instance, a whole resource or a module subtree from one
//! address to another, inside one [`StateStore`] or across two.
//!
//! A move runs in three steps:
//!
//! 1. **Resolve** the address pair into a plan (instance, resource or module
//!    move), rejecting mixed module and resource forms.
//! 2. **Validate** the plan against the stores. All conflict checks happen
//!    here, so a rejected move leaves both stores untouched.
//! 3. **Apply** the plan. List-mode destinations that end up holding both
//!    existing and moved instances are renumbered contiguously.
//!
//! Dependency edges are copied verbatim. Edges that still name a resource
//! moved away are reported in [`MoveReport::dangling_dependencies`] and are
//! left for the operator to repair.

mod apply;
mod plan;
mod reindex;

use std::collections::BTreeSet;
use std::fmt;

use crate::Result;
use crate::addrs::{AbsResource, AbsResourceInstance, Target};
use crate::states::{State, StateStore};

use plan::{MovePlan, Stores};

/// Granularity of a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Instance,
    Resource,
    Module,
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance => write!(f, "instance"),
            Self::Resource => write!(f, "resource"),
            Self::Module => write!(f, "module"),
        }
    }
}

/// One instance address change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub from: AbsResourceInstance,
    pub to: AbsResourceInstance,
}

impl Relocation {
    pub fn new(from: AbsResourceInstance, to: AbsResourceInstance) -> Self {
        Self { from, to }
    }
}

/// A dependency edge that names a resource which was moved away
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingDependency {
    /// Instance whose object records the edge
    pub instance: AbsResourceInstance,
    /// Address the edge points at
    pub dependency: AbsResource,
}

/// Outcome of a move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    pub kind: MoveKind,
    /// Source and destination were the same address in the same store
    pub noop: bool,
    /// Source and destination were distinct stores
    pub cross_store: bool,
    /// Moved instances, in the order they were applied
    pub relocations: Vec<Relocation>,
    /// Destination instances whose list index changed during reindexing
    pub renumbered: Vec<Relocation>,
    pub dangling_dependencies: Vec<DanglingDependency>,
}

impl MoveReport {
    fn new(kind: MoveKind, cross_store: bool) -> Self {
        Self {
            kind,
            noop: false,
            cross_store,
            relocations: Vec::new(),
            renumbered: Vec::new(),
            dangling_dependencies: Vec::new(),
        }
    }

    /// Number of instances moved.
    pub fn moved(&self) -> usize {
        self.relocations.len()
    }
}

/// Move `from` to `to`.
///
/// `source` and `dest` may be the same store. Both addresses must name
/// modules, or both must name resources or resource instances. On error
/// neither store has been modified.
pub fn move_state(
    from: &Target,
    to: &Target,
    source: &StateStore,
    dest: &StateStore,
) -> Result<MoveReport> {
    if std::ptr::eq(source, dest) {
        let mut state = source.lock()?;
        run(from, to, Stores::Same(&mut *state))
    } else {
        let mut source = source.lock()?;
        let mut dest = dest.lock()?;
        run(
            from,
            to,
            Stores::Split {
                source: &mut *source,
                dest: &mut *dest,
            },
        )
    }
}

fn run(from: &Target, to: &Target, mut stores: Stores<'_>) -> Result<MoveReport> {
    let plan = MovePlan::resolve(from, to, stores.source())?;
    let noop = plan.validate(&stores)?;

    let mut report = MoveReport::new(plan.kind(), stores.is_cross());
    if noop {
        tracing::debug!(%from, "source and destination are the same, nothing to move");
        report.noop = true;
        return Ok(report);
    }

    let before: BTreeSet<AbsResource> = stores.source().resources().map(|(addr, _)| addr).collect();
    apply::apply(&plan, &mut stores, &mut report)?;

    let vacated: BTreeSet<AbsResource> = before
        .into_iter()
        .filter(|addr| stores.source().resource(addr).is_none())
        .collect();
    report.dangling_dependencies = dangling(&stores, &vacated);

    tracing::info!(
        kind = %report.kind,
        moved = report.moved(),
        cross_store = report.cross_store,
        "move applied"
    );
    Ok(report)
}

/// Dependency edges in the touched stores that still name a vacated resource.
fn dangling(stores: &Stores<'_>, vacated: &BTreeSet<AbsResource>) -> Vec<DanglingDependency> {
    if vacated.is_empty() {
        return Vec::new();
    }
    let mut states: Vec<&State> = vec![stores.source()];
    if stores.is_cross() {
        states.push(stores.dest());
    }

    let mut found = Vec::new();
    for state in states {
        for (instance, recorded) in state.instances() {
            let mut seen = BTreeSet::new();
            for dependency in recorded.objects().flat_map(|object| &object.dependencies) {
                if vacated.contains(dependency)
                    && state.resource(dependency).is_none()
                    && seen.insert(dependency)
                {
                    tracing::warn!(
                        %instance,
                        %dependency,
                        "dependency names a resource that was moved; it is left unchanged"
                    );
                    found.push(DanglingDependency {
                        instance: instance.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
    }
    found
}
