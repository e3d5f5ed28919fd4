//! Shared test utilities for the statekit workspace.
//!
//! This crate provides standardised test fixtures for state move scenarios.
//! It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fixtures`]: state builders and instance objects
//! - [`workspace`]: [`TestWorkspace`] holding state files in a temp directory

pub mod fixtures;
pub mod workspace;

pub use fixtures::{StateBuilder, TEST_PROVIDER, attribute_id, object};
pub use workspace::TestWorkspace;
