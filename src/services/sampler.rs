use log::{debug, info, warn};
use serde::Serialize;
use std::time::SystemTime;

use crate::error::TrackerError;
use crate::metrics::sink::{RSS_METRIC, SHARED_MEM_METRIC, UPTIME_METRIC};
use crate::metrics::{Dimensions, MetricKind, MetricSample, MetricSink};
use crate::models::{NotificationSpec, ProcessInfo, Registry, Target, TrackedTarget};
use crate::services::interval_gate::IntervalGate;
use crate::services::liveness::Liveness;
use crate::services::notifier::NotificationTrigger;
use crate::services::pid_file::read_pid_file;
use crate::services::process_inspector::{Inspection, ProcessInspector};

/// Summary of one sampling cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub liveness: Liveness,
    pub samples_emitted: usize,
    pub memory_sampled: usize,
    pub notified: bool,
}

/// Whether the one-shot notification is configured and has gone out.
#[derive(Debug, Serialize)]
pub struct NotificationStatus<'a> {
    pub configured: Option<&'a NotificationSpec>,
    pub sent: bool,
}

/// Drives one tick across every registered target.
///
/// The inspector and sink are injected so the same cycle runs against the
/// real process table and Prometheus in the service, stdout in the harness,
/// and scripted fakes in tests.
pub struct Sampler {
    registry: Registry,
    inspector: Box<dyn ProcessInspector + Send>,
    sink: Box<dyn MetricSink + Send>,
    gate: IntervalGate,
    trigger: NotificationTrigger,
    verbose: bool,
}

impl Sampler {
    pub fn new(
        registry: Registry,
        inspector: Box<dyn ProcessInspector + Send>,
        sink: Box<dyn MetricSink + Send>,
        interval: Option<u64>,
        notification: Option<NotificationSpec>,
    ) -> Self {
        Self {
            registry,
            inspector,
            sink,
            gate: IntervalGate::new(interval),
            trigger: NotificationTrigger::new(notification),
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn targets(&self) -> impl Iterator<Item = &TrackedTarget> {
        self.registry.iter()
    }

    pub fn notification_status(&self) -> NotificationStatus<'_> {
        NotificationStatus {
            configured: self.trigger.spec(),
            sent: self.trigger.already_sent(),
        }
    }

    pub fn run_cycle(&mut self, now: SystemTime) -> CycleReport {
        if self.registry.is_empty() {
            warn!("pid-tracker plugin: skipping because no pid files (\"PidFile\" blocks) has been configured");
            return CycleReport::default();
        }

        // every state is refreshed before anything is reported so that the
        // aggregate flags describe this tick
        for tracked in self.registry.iter_mut() {
            match resolve(self.inspector.as_mut(), &tracked.target) {
                Ok((pid, info)) => tracked.state.set_up(pid, info.start_time, now),
                Err(e) => {
                    if e.is_warning() {
                        warn!("pid-tracker plugin: {}", e);
                    } else {
                        debug!("pid-tracker plugin: {}", e);
                    }
                    tracked.state.set_down();
                }
            }
        }

        let liveness = Liveness::aggregate(self.registry.iter().map(|t| &t.state));
        let notified = self.trigger.evaluate(liveness, self.sink.as_mut());

        let mut memory_sampled = 0;
        for tracked in self.registry.iter_mut() {
            let Some(pid) = tracked.state.pid() else {
                continue;
            };
            if !self
                .gate
                .is_due(&tracked.target, &mut tracked.state.interval_counter)
            {
                continue;
            }
            match self.inspector.inspect(pid, true) {
                Inspection::Found(ProcessInfo {
                    memory: Some(usage),
                    ..
                }) => {
                    tracked.state.record_memory(usage);
                    memory_sampled += 1;
                }
                other => debug!(
                    "pid-tracker plugin: no memory stats for PidFile={}, pid={}: {:?}",
                    tracked.target.pid_file.display(),
                    pid,
                    other
                ),
            }
        }

        let mut samples_emitted = 0;
        for tracked in self.registry.iter() {
            let state = &tracked.state;
            let dimensions = Dimensions {
                all_running: liveness.all_running,
                label: tracked.target.label.clone(),
                running: state.is_running(),
            };

            let mut samples = vec![MetricSample {
                plugin_instance: tracked.target.label.clone(),
                kind: MetricKind::Counter,
                name: UPTIME_METRIC,
                dimensions: dimensions.clone(),
                value: state.uptime_millis(),
            }];
            if state.memory_sampled() {
                for (name, value) in [
                    (RSS_METRIC, state.rss_bytes()),
                    (SHARED_MEM_METRIC, state.shared_mem_bytes()),
                ] {
                    samples.push(MetricSample {
                        plugin_instance: tracked.target.label.clone(),
                        kind: MetricKind::Gauge,
                        name,
                        dimensions: dimensions.clone(),
                        value,
                    });
                }
            }

            for sample in &samples {
                if self.verbose {
                    info!(
                        "pid-tracker plugin [verbose]: Sending value {}.{}[plugin_instance={}]={}, extra_dimensions: {}",
                        sample.kind.as_str(),
                        sample.name,
                        sample.plugin_instance,
                        sample.value,
                        sample.dimensions
                    );
                }
                self.sink.dispatch(sample);
                samples_emitted += 1;
            }
        }

        CycleReport {
            liveness,
            samples_emitted,
            memory_sampled,
            notified,
        }
    }
}

/// Reads the target's pid file and asks the OS whether that pid is alive.
fn resolve(
    inspector: &mut dyn ProcessInspector,
    target: &Target,
) -> Result<(u32, ProcessInfo), TrackerError> {
    let pid = read_pid_file(&target.pid_file).map_err(|source| TrackerError::TargetUnreadable {
        path: target.pid_file.clone(),
        source,
    })?;

    match inspector.inspect(pid, false) {
        Inspection::Found(info) => Ok((pid, info)),
        Inspection::NotFound => Err(TrackerError::ProcessResolution {
            pid,
            reason: "no such process",
        }),
        Inspection::AccessDenied => Err(TrackerError::ProcessResolution {
            pid,
            reason: "permission denied",
        }),
    }
}
