//! Move sessions
//!
//! A session runs one move end to end: parse both addresses, load the
//! state(s), run the move engine in memory, back up every state about to be
//! rewritten, then commit. Nothing is written unless the engine succeeds.
//!
//! For a move across two files the destination is committed before the
//! source. If the source commit then fails, the moved objects exist in both
//! files rather than in neither.

use statekit_fs::NormalizedPath;
use statekit_fs::io::same_file;

use crate::addrs::{AbsResourceInstance, Target};
use crate::backend::{LocalBackend, StateBackend};
use crate::backup::{BackupPolicy, BackupRecord};
use crate::mv::{MoveReport, move_state};
use crate::states::{State, StateStore};
use crate::statefile;
use crate::{Error, PersistStage, Result};

/// A move between local state files
#[derive(Debug, Clone)]
pub struct MoveRequest {
    /// Source address text
    pub source: String,
    /// Destination address text
    pub destination: String,
    /// State file to move from
    pub state_path: NormalizedPath,
    /// State file to move into; `None` or the same file means an in-place move
    pub state_out: Option<NormalizedPath>,
    /// Backup policy for the source state
    pub backup: BackupPolicy,
    /// Backup policy for a distinct destination state
    pub backup_out: BackupPolicy,
}

impl MoveRequest {
    /// An in-place move in `state_path` with derived backups.
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        state_path: impl Into<NormalizedPath>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            state_path: state_path.into(),
            state_out: None,
            backup: BackupPolicy::default(),
            backup_out: BackupPolicy::default(),
        }
    }

    pub fn with_state_out(mut self, state_out: impl Into<NormalizedPath>) -> Self {
        self.state_out = Some(state_out.into());
        self
    }

    pub fn with_backup(mut self, backup: BackupPolicy) -> Self {
        self.backup = backup;
        self
    }

    pub fn with_backup_out(mut self, backup_out: BackupPolicy) -> Self {
        self.backup_out = backup_out;
        self
    }
}

/// Result of a committed move
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub report: MoveReport,
    /// Backups written, destination first for cross-file moves
    pub backups: Vec<BackupRecord>,
    pub source_path: NormalizedPath,
    pub dest_path: NormalizedPath,
}

/// Run a move between local state files.
pub fn run_move(request: &MoveRequest) -> Result<MoveOutcome> {
    let source = LocalBackend::new(request.state_path.clone()).with_backup(request.backup.clone());
    let dest = request
        .state_out
        .as_ref()
        .filter(|out| !same_file(out, &request.state_path))
        .map(|out| LocalBackend::new(out.clone()).with_backup(request.backup_out.clone()));

    run_move_with(
        &request.source,
        &request.destination,
        &source,
        dest.as_ref().map(|backend| backend as &dyn StateBackend),
    )
}

/// A state read from a backend, with what is needed to write it back.
struct Loaded<'a> {
    backend: &'a dyn StateBackend,
    /// Bytes read at load time; `None` for a state that did not exist
    raw: Option<Vec<u8>>,
    /// Fingerprint of the state as loaded
    baseline: Option<String>,
    store: StateStore,
}

impl<'a> Loaded<'a> {
    fn read(backend: &'a dyn StateBackend) -> Result<Option<Self>> {
        let Some(raw) = backend.read()? else {
            return Ok(None);
        };
        let state = statefile::decode(&backend.location().to_native(), &raw)?;
        let baseline = statefile::fingerprint(&state)?;
        tracing::debug!(path = %backend.location(), serial = state.serial, "loaded state");
        Ok(Some(Self {
            backend,
            raw: Some(raw),
            baseline: Some(baseline),
            store: StateStore::new(state),
        }))
    }

    fn read_or_new(backend: &'a dyn StateBackend) -> Result<Self> {
        match Self::read(backend)? {
            Some(loaded) => Ok(loaded),
            None => {
                tracing::debug!(path = %backend.location(), "starting a new state");
                Ok(Self {
                    backend,
                    raw: None,
                    baseline: None,
                    store: StateStore::new(State::new()),
                })
            }
        }
    }

    /// Bytes to commit, incrementing the serial if the content changed.
    fn finalize(&self) -> Result<Vec<u8>> {
        let mut state = self.store.lock()?;
        statefile::finalize(&mut state, self.baseline.as_deref())
    }
}

/// Run a move against arbitrary backends.
///
/// `dest` is `None` for an in-place move inside `source`.
pub fn run_move_with(
    from: &str,
    to: &str,
    source: &dyn StateBackend,
    dest: Option<&dyn StateBackend>,
) -> Result<MoveOutcome> {
    let from = Target::parse(from)?;
    let to = Target::parse(to)?;

    let source = Loaded::read(source)?.ok_or_else(|| Error::StateNotFound {
        path: source.location().to_native(),
    })?;
    let dest = dest.map(Loaded::read_or_new).transpose()?;

    let report = match &dest {
        Some(dest) => move_state(&from, &to, &source.store, &dest.store)?,
        None => move_state(&from, &to, &source.store, &source.store)?,
    };

    // Destination first so the moved data is never only in memory
    let mut touched: Vec<&Loaded<'_>> = Vec::with_capacity(2);
    if let Some(dest) = &dest {
        touched.push(dest);
    }
    touched.push(&source);

    let backups = write_backups(&touched)?;
    let mut pending = Vec::with_capacity(touched.len());
    for loaded in &touched {
        pending.push((loaded.backend, loaded.finalize()?));
    }
    commit_all(&pending, &backups)?;

    let source_path = source.backend.location().clone();
    let dest_path = dest
        .as_ref()
        .map_or_else(|| source_path.clone(), |dest| dest.backend.location().clone());
    tracing::info!(
        from = %from,
        to = %to,
        source = %source_path,
        dest = %dest_path,
        moved = report.moved(),
        "move committed"
    );
    Ok(MoveOutcome {
        report,
        backups,
        source_path,
        dest_path,
    })
}

fn write_backups(touched: &[&Loaded<'_>]) -> Result<Vec<BackupRecord>> {
    let mut backups = Vec::new();
    for loaded in touched {
        let Some(raw) = &loaded.raw else {
            continue;
        };
        match loaded.backend.write_backup(raw) {
            Ok(Some(record)) => backups.push(record),
            Ok(None) => {}
            Err(source) => {
                return Err(Error::PersistenceFailure {
                    stage: PersistStage::Backup,
                    path: loaded.backend.location().to_native(),
                    committed: Vec::new(),
                    backups: backups.iter().map(|b| b.path.to_native()).collect(),
                    source,
                });
            }
        }
    }
    Ok(backups)
}

fn commit_all(pending: &[(&dyn StateBackend, Vec<u8>)], backups: &[BackupRecord]) -> Result<()> {
    let mut committed = Vec::new();
    for (backend, bytes) in pending {
        if let Err(source) = backend.commit(bytes) {
            return Err(Error::PersistenceFailure {
                stage: PersistStage::Commit,
                path: backend.location().to_native(),
                committed,
                backups: backups.iter().map(|b| b.path.to_native()).collect(),
                source,
            });
        }
        committed.push(backend.location().to_native());
    }
    Ok(())
}

/// Every instance address in the state at `state_path`, in canonical order.
///
/// With a filter, only addresses under that module, resource or instance are
/// returned.
pub fn list_instances(
    state_path: &NormalizedPath,
    filter: Option<&Target>,
) -> Result<Vec<AbsResourceInstance>> {
    let backend = LocalBackend::new(state_path.clone());
    let raw = backend.read()?.ok_or_else(|| Error::StateNotFound {
        path: state_path.to_native(),
    })?;
    let state = statefile::decode(&state_path.to_native(), &raw)?;

    Ok(state
        .instances()
        .map(|(addr, _)| addr)
        .filter(|addr| match filter {
            None => true,
            Some(Target::Module(module)) => addr.module.has_prefix(module),
            Some(Target::Resource(resource)) => addr.containing_resource() == *resource,
            Some(Target::Instance(instance)) => addr == instance,
        })
        .collect())
}
