//! List command implementation

use std::path::{Path, PathBuf};

use statekit_core::{Settings, Target, list_instances};
use statekit_fs::NormalizedPath;

use super::resolve;
use crate::error::Result;

/// Run the list command
///
/// Prints every resource instance address in the state, one per line.
pub fn run_list(cwd: &Path, state: Option<&PathBuf>, filter: Option<&str>) -> Result<()> {
    let root = NormalizedPath::new(cwd);
    let state_path = match state {
        Some(path) => resolve(cwd, path),
        None => Settings::load(&root)?.state_path(&root),
    };
    let filter = filter.map(Target::parse).transpose()?;

    for addr in list_instances(&state_path, filter.as_ref())? {
        println!("{addr}");
    }
    Ok(())
}
