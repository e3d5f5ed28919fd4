//! Core layer for statekit
//!
//! This crate implements the resource-address move engine for an
//! infrastructure state store:
//!
//! - **Address model** ([`addrs`]): parsing, rendering and ordering of module,
//!   resource and resource-instance addresses
//! - **State store** ([`states`]): the in-memory tree of module instances,
//!   resources and instance objects behind a single-writer lock
//! - **Move engine** ([`mv`]): relocation of instances, whole resources and
//!   module subtrees, within one store or across two
//! - **Persistence gateway** ([`backend`], [`backup`], [`statefile`]): reading,
//!   backing up and committing state files
//! - **Sessions** ([`session`]): the load / move / backup / commit sequence used
//!   by the command line
//!
//! # Architecture
//!
//! ```text
//!                 statekit-cli
//!                      |
//!                   session
//!                 /    |     \
//!          backend    mv    config
//!          backup      |
//!        statefile   states
//!              \      |
//!                addrs
//!                  |
//!             statekit-fs
//! ```

pub mod addrs;
pub mod backend;
pub mod backup;
pub mod config;
pub mod error;
pub mod mv;
pub mod session;
pub mod statefile;
pub mod states;

pub use addrs::{
    AbsResource, AbsResourceInstance, InstanceKey, ModuleInstance, Resource, ResourceMode, Target,
};
pub use backend::{LocalBackend, StateBackend};
pub use backup::{BackupPolicy, BackupRecord};
pub use config::Settings;
pub use error::{Error, ErrorKind, PersistStage, Result};
pub use mv::{DanglingDependency, MoveKind, MoveReport, Relocation, move_state};
pub use session::{MoveOutcome, MoveRequest, list_instances, run_move, run_move_with};
pub use states::{
    Attributes, EachMode, ExtraFields, InstanceObject, ObjectStatus, ResourceInstanceState,
    ResourceState, State, StateStore,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_offending_token() {
        let error = Target::parse("test_instance.foo[").unwrap_err();
        let display = format!("{}", error);
        assert!(
            display.contains("test_instance.foo["),
            "Error display should contain the input, got: {}",
            display
        );
        assert_eq!(error.kind(), ErrorKind::MalformedAddress);
    }
}
