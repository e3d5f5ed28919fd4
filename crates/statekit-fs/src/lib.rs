//! Filesystem primitives for statekit
//!
//! Provides normalized path handling, locked reads, and atomic locked writes
//! used by the state persistence layer.

pub mod checksum;
pub mod error;
pub mod io;
pub mod path;

pub use checksum::compute_checksum;
pub use error::{Error, Result};
pub use path::NormalizedPath;
