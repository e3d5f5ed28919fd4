//! Error types for statekit-core

use std::path::PathBuf;

use crate::states::EachMode;

/// Result type for statekit-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Step of the persistence sequence that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStage {
    /// Writing the pre-move backup of a state
    Backup,
    /// Writing the mutated state to its location
    Commit,
}

impl std::fmt::Display for PersistStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backup => write!(f, "back up"),
            Self::Commit => write!(f, "write"),
        }
    }
}

/// Errors that can occur in statekit-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Address text failed to parse
    #[error("Malformed address {input:?}: {reason} (at {token:?})")]
    MalformedAddress {
        input: String,
        token: String,
        reason: String,
    },

    /// Source and destination mix module and resource address forms
    #[error(
        "Cannot move {from} to {to}: both addresses must name resources, or both must name modules"
    )]
    KindMismatch { from: String, to: String },

    /// Nothing exists at the source address
    #[error("Nothing to move: no state found at {addr}")]
    SourceNotFound { addr: String },

    /// Destination names a different resource type or mode
    #[error("Cannot move {from} to {to}: resource types don't match")]
    ResourceTypeMismatch { from: String, to: String },

    /// Merge would overwrite an instance already present at the destination
    #[error("Cannot move to {addr}: an instance already exists at that address")]
    DestinationKeyCollision { addr: String },

    /// Destination resource holds instances of an incompatible each-mode
    #[error("Cannot move to {addr}: it holds {existing} instances but the moved data is {incoming}")]
    EachModeConflict {
        addr: String,
        existing: EachMode,
        incoming: EachMode,
    },

    /// A multi-instance resource was moved to a single instance address
    #[error("Cannot move {addr} to a single instance address: it has {count} instances")]
    InstanceCountMismatch { addr: String, count: usize },

    /// A moved module instance would land on one that already exists
    #[error("Cannot move to {addr}: the module instance already exists")]
    DestinationModuleExists { addr: String },

    /// The state file to read does not exist
    #[error("No state file was found at {path}")]
    StateNotFound { path: PathBuf },

    /// The state file exists but does not describe a valid state
    #[error("Invalid state at {path}: {message}")]
    InvalidState { path: PathBuf, message: String },

    /// The configuration file could not be used
    #[error("Configuration error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// A backup or commit step failed at the persistence gateway
    #[error("Failed to {stage} state at {path}: {source}{}", committed_note(.committed, .backups))]
    PersistenceFailure {
        stage: PersistStage,
        path: PathBuf,
        /// Locations already committed when the failure happened
        committed: Vec<PathBuf>,
        /// Backups written before the failure
        backups: Vec<PathBuf>,
        #[source]
        source: statekit_fs::Error,
    },

    /// An invariant was violated while applying an already validated move
    #[error("Internal error: {0}")]
    Internal(String),

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from statekit-fs
    #[error(transparent)]
    Fs(#[from] statekit_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Stable classification of [`Error`] values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedAddress,
    KindMismatch,
    SourceNotFound,
    ResourceTypeMismatch,
    DestinationKeyCollision,
    EachModeConflict,
    InstanceCountMismatch,
    DestinationModuleExists,
    StateNotFound,
    InvalidState,
    Config,
    PersistenceFailure,
    Internal,
    Io,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedAddress { .. } => ErrorKind::MalformedAddress,
            Self::KindMismatch { .. } => ErrorKind::KindMismatch,
            Self::SourceNotFound { .. } => ErrorKind::SourceNotFound,
            Self::ResourceTypeMismatch { .. } => ErrorKind::ResourceTypeMismatch,
            Self::DestinationKeyCollision { .. } => ErrorKind::DestinationKeyCollision,
            Self::EachModeConflict { .. } => ErrorKind::EachModeConflict,
            Self::InstanceCountMismatch { .. } => ErrorKind::InstanceCountMismatch,
            Self::DestinationModuleExists { .. } => ErrorKind::DestinationModuleExists,
            Self::StateNotFound { .. } => ErrorKind::StateNotFound,
            Self::InvalidState { .. } | Self::Json(_) => ErrorKind::InvalidState,
            Self::Config { .. } => ErrorKind::Config,
            Self::PersistenceFailure { .. } => ErrorKind::PersistenceFailure,
            Self::Internal(_) => ErrorKind::Internal,
            Self::Fs(_) | Self::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn malformed(
        input: &str,
        token: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedAddress {
            input: input.to_string(),
            token: token.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_state(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidState {
            path: path.into(),
            message: message.into(),
        }
    }
}

fn committed_note(committed: &[PathBuf], backups: &[PathBuf]) -> String {
    let mut note = String::new();
    if !committed.is_empty() {
        let paths: Vec<String> = committed.iter().map(|p| p.display().to_string()).collect();
        note.push_str(&format!(
            "\nThe state at {} was already written; the moved objects may now be \
             present in more than one state file.",
            paths.join(", ")
        ));
    }
    if !backups.is_empty() {
        let paths: Vec<String> = backups.iter().map(|p| p.display().to_string()).collect();
        note.push_str(&format!(
            "\nPre-move backups were written to: {}",
            paths.join(", ")
        ));
    }
    note
}
