//! Lock-guarded state handle

use std::sync::{Mutex, MutexGuard};

use super::State;
use crate::{Error, Result};

/// Exclusively owned handle to one in-memory state.
///
/// Created when a command starts and dropped when it ends. Mutation goes
/// through [`StateStore::lock`], which admits a single writer at a time.
#[derive(Debug, Default)]
pub struct StateStore {
    inner: Mutex<State>,
}

impl StateStore {
    pub fn new(state: State) -> Self {
        Self {
            inner: Mutex::new(state),
        }
    }

    /// Acquire exclusive access to the state.
    pub fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.inner
            .lock()
            .map_err(|_| Error::Internal("state lock was poisoned".to_string()))
    }

    /// Consume the handle and return the state.
    pub fn into_inner(self) -> Result<State> {
        self.inner
            .into_inner()
            .map_err(|_| Error::Internal("state lock was poisoned".to_string()))
    }
}

impl From<State> for StateStore {
    fn from(state: State) -> Self {
        Self::new(state)
    }
}
