use log::{debug, error, info};
use std::time::{Duration, SystemTime};
use tokio::time::MissedTickBehavior;

use crate::state::{lock, AppState};

/// Runs a sampling cycle every `period`, starting immediately.
///
/// Each cycle is awaited before the next tick and late ticks are skipped, so
/// cycles never overlap.
pub async fn run(state: AppState, period: Duration) {
    info!("pid-tracker plugin: sampling every {:?}", period);

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let state = state.clone();
        let cycle = tokio::task::spawn_blocking(move || {
            // bound first so the guard drops before `state`
            let report = lock(&state).sampler.run_cycle(SystemTime::now());
            report
        });

        match cycle.await {
            Ok(report) => debug!(
                "cycle done: any_running={}, all_running={}, samples={}, memory={}, notified={}",
                report.liveness.any_running,
                report.liveness.all_running,
                report.samples_emitted,
                report.memory_sampled,
                report.notified
            ),
            Err(e) => error!("sampling cycle failed: {}", e),
        }
    }
}
