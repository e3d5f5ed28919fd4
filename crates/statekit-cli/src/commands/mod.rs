//! Command implementations for statekit-cli

pub mod list;
pub mod mv;

use std::path::Path;

use statekit_fs::NormalizedPath;

pub use list::run_list;
pub use mv::{MvOptions, run_mv};

/// Resolve a path given on the command line against the working directory.
fn resolve(cwd: &Path, path: &Path) -> NormalizedPath {
    NormalizedPath::new(cwd.join(path))
}
