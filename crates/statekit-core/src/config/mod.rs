//! Working-directory configuration
//!
//! An optional `statekit.toml` in the working directory supplies defaults for
//! the state path and for backups:
//!
//! ```toml
//! [state]
//! path = "terraform.tfstate"
//!
//! [backup]
//! enabled = true
//! suffix = ".backup"
//! ```
//!
//! Command line flags always take precedence over the file.

mod settings;

pub use settings::{BackupSection, CONFIG_FILE_NAME, Settings, StateSection};
