//! Address model
//!
//! Hierarchical addresses locate module instances, resources and resource
//! instances inside a state:
//!
//! ```text
//! module.network[0].module.subnet["a"].aws_subnet.this[2]
//! |------ module instance path ------| |- resource -||key|
//! ```
//!
//! Addresses are immutable values. Equality and ordering are structural, and
//! integer instance keys order numerically, so `foo[2]` sorts before `foo[10]`.

mod key;
mod module;
mod parse;
mod resource;

pub use key::InstanceKey;
pub use module::{ModuleInstance, ModuleInstanceStep};
pub use parse::Target;
pub use resource::{AbsResource, AbsResourceInstance, Resource, ResourceMode};
