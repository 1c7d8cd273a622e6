use crate::services::Sampler;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub struct AppStateInner {
    pub sampler: Sampler,
}

/// The mutex is the single gate around a sampling cycle: a tick and an API
/// read of the targets never run at the same time. Metrics are shared
/// separately and do not wait on it.
pub type AppState = Arc<Mutex<AppStateInner>>;

pub fn new_state(sampler: Sampler) -> AppState {
    Arc::new(Mutex::new(AppStateInner { sampler }))
}

/// A panicked cycle leaves plain data behind, so keep serving it.
pub fn lock(state: &AppState) -> MutexGuard<'_, AppStateInner> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
