//! State store
//!
//! In-memory tree of a whole state: module instances keyed by path, each
//! holding resources, each holding keyed instances with a current object.
//! Module instances are stored flat, so nesting is expressed by path
//! prefixes rather than parent links.
//!
//! [`StateStore`] wraps a [`State`] behind a single-writer lock and is the
//! handle the move engine operates on.

mod instance;
mod resource;
mod state;
mod store;

pub use instance::{Attributes, ExtraFields, InstanceObject, ObjectStatus, ResourceInstanceState};
pub use resource::{EachMode, ResourceState};
pub use state::{ModuleState, State};
pub use store::StateStore;
