use serde::Serialize;

use crate::models::TargetState;

/// Cross-target liveness for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Liveness {
    pub any_running: bool,
    /// False for an empty registry
    pub all_running: bool,
}

impl Liveness {
    pub fn aggregate<'a>(states: impl IntoIterator<Item = &'a TargetState>) -> Self {
        let mut seen = false;
        let mut any_running = false;
        let mut all_running = true;
        for state in states {
            seen = true;
            any_running |= state.is_running();
            all_running &= state.is_running();
        }
        Self {
            any_running,
            all_running: seen && all_running,
        }
    }
}
