use crate::models::Target;

/// Decides on which ticks a target's memory gets sampled.
///
/// The schedule is counted in ticks so jitter in the scheduler never shifts
/// it. Each target carries its own counter and therefore its own phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalGate {
    global_interval: Option<u64>,
}

impl IntervalGate {
    pub fn new(global_interval: Option<u64>) -> Self {
        Self { global_interval }
    }

    /// Ticks between two memory samples, `None` meaning every tick.
    pub fn ratio(&self, target: &Target) -> Option<u64> {
        match (self.global_interval, target.memory_stats_interval) {
            (Some(global), Some(memory)) if global > 0 => Some((memory / global).max(1)),
            _ => None,
        }
    }

    /// Advances `counter` and says whether this tick is due.
    pub fn is_due(&self, target: &Target, counter: &mut u64) -> bool {
        if !target.collect_memory_stats {
            return false;
        }
        let Some(ratio) = self.ratio(target) else {
            return true;
        };

        let due = *counter == 0;
        *counter += 1;
        if *counter >= ratio {
            *counter = 0;
        }
        due
    }
}
