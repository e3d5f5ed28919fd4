//! [`TestWorkspace`] for state file scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use statekit_core::State;
use statekit_core::statefile;
use tempfile::TempDir;

/// A temporary working directory holding state files.
///
/// # Example
///
/// ```rust,no_run
/// use statekit_test_utils::{StateBuilder, TestWorkspace};
///
/// let ws = TestWorkspace::new();
/// ws.write_state("terraform.tfstate", &StateBuilder::new().instance("test_instance.foo", "bar").build());
/// assert!(ws.backups().is_empty());
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `name` inside the workspace.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Encode `state` and write it to `name`.
    pub fn write_state(&self, name: &str, state: &State) {
        let bytes = statefile::encode(state).unwrap();
        self.write(name, &bytes);
    }

    /// Write raw bytes to `name`, creating parent directories.
    pub fn write(&self, name: &str, content: &[u8]) {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
    }

    /// Decode the state stored at `name`.
    ///
    /// # Panics
    /// Panics if the file is missing or not a valid state.
    pub fn read_state(&self, name: &str) -> State {
        let path = self.path(name);
        let bytes = fs::read(&path)
            .unwrap_or_else(|_| panic!("Could not read state file: {}", path.display()));
        statefile::decode(&path, &bytes).unwrap()
    }

    /// Raw text of `name`.
    pub fn read_raw(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).unwrap()
    }

    /// Every `*.backup` file in the workspace root, sorted by name.
    pub fn backups(&self) -> Vec<PathBuf> {
        let mut backups: Vec<PathBuf> = fs::read_dir(self.root())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.ends_with(".backup"))
            })
            .collect();
        backups.sort();
        backups
    }

    /// Every instance address in the state at `name`, in canonical order.
    pub fn addresses(&self, name: &str) -> Vec<String> {
        self.read_state(name)
            .instances()
            .map(|(addr, _)| addr.to_string())
            .collect()
    }

    /// Assert that `name` exists in the workspace.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, name: &str) {
        let full_path = self.path(name);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `name` does **not** exist in the workspace.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, name: &str) {
        let full_path = self.path(name);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }
}
