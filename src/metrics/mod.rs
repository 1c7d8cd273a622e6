pub mod sink;

use lazy_static::lazy_static;
use prometheus::{
    register_gauge_vec_with_registry, register_int_counter_vec_with_registry, Encoder, GaugeVec,
    IntCounterVec, Opts, Registry, TextEncoder,
};
use sysinfo::System;

pub use sink::{ConsoleSink, Dimensions, MetricKind, MetricSample, MetricSink, PrometheusSink};

lazy_static! {
    pub static ref HOSTNAME: String = System::host_name().unwrap_or_else(|| "unknown".to_string());
}

const BOOLS: [bool; 2] = [true, false];

fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

pub struct MetricsRegistry {
    registry: Registry,

    pub process_up: GaugeVec,
    pub process_uptime: GaugeVec,
    pub process_rss_bytes: GaugeVec,
    pub process_shared_mem_bytes: GaugeVec,
    pub all_services_running: GaugeVec,

    pub notifications: IntCounterVec,
}

impl MetricsRegistry {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let common_labels = &["label", "hostname"];

        let process_up = register_gauge_vec_with_registry!(
            Opts::new("pid_tracker_process_up", "Process is running (1) or down (0)"),
            common_labels,
            registry
        )?;

        let process_uptime = register_gauge_vec_with_registry!(
            Opts::new(
                "pid_tracker_process_uptime_milliseconds",
                "Milliseconds since the tracked process started, 0 when down"
            ),
            &["label", "all_services_running", "running", "hostname"],
            registry
        )?;

        let process_rss_bytes = register_gauge_vec_with_registry!(
            Opts::new("pid_tracker_process_rss_bytes", "Resident set size in bytes"),
            common_labels,
            registry
        )?;

        let process_shared_mem_bytes = register_gauge_vec_with_registry!(
            Opts::new(
                "pid_tracker_process_shared_mem_bytes",
                "Shared resident memory in bytes"
            ),
            common_labels,
            registry
        )?;

        let all_services_running = register_gauge_vec_with_registry!(
            Opts::new(
                "pid_tracker_all_services_running",
                "Every tracked process is running (1) or not (0)"
            ),
            &["hostname"],
            registry
        )?;

        let notifications = register_int_counter_vec_with_registry!(
            Opts::new("pid_tracker_notifications_total", "Notifications dispatched"),
            &["label", "severity", "hostname"],
            registry
        )?;

        Ok(Self {
            registry,
            process_up,
            process_uptime,
            process_rss_bytes,
            process_shared_mem_bytes,
            all_services_running,
            notifications,
        })
    }

    pub fn render(&self) -> Result<String, Box<dyn std::error::Error>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Sets the uptime series and drops the other flag combinations for the
    /// same label so that only the current dimensions are exported.
    pub fn set_uptime(&self, label: &str, all_running: bool, running: bool, uptime_millis: u64) {
        let hostname = HOSTNAME.as_str();
        for all in BOOLS {
            for up in BOOLS {
                if all != all_running || up != running {
                    let _ = self
                        .process_uptime
                        .remove_label_values(&[label, flag(all), flag(up), hostname]);
                }
            }
        }
        self.process_uptime
            .with_label_values(&[label, flag(all_running), flag(running), hostname])
            .set(uptime_millis as f64);

        self.process_up
            .with_label_values(&[label, hostname])
            .set(if running { 1.0 } else { 0.0 });
        self.all_services_running
            .with_label_values(&[hostname])
            .set(if all_running { 1.0 } else { 0.0 });

        if !running {
            self.reset_memory_metrics(label);
        }
    }

    pub fn set_rss(&self, label: &str, bytes: u64) {
        self.process_rss_bytes
            .with_label_values(&[label, HOSTNAME.as_str()])
            .set(bytes as f64);
    }

    pub fn set_shared_mem(&self, label: &str, bytes: u64) {
        self.process_shared_mem_bytes
            .with_label_values(&[label, HOSTNAME.as_str()])
            .set(bytes as f64);
    }

    pub fn count_notification(&self, label: &str, severity: &str) {
        self.notifications
            .with_label_values(&[label, severity, HOSTNAME.as_str()])
            .inc();
    }

    pub fn reset_memory_metrics(&self, label: &str) {
        let labels = &[label, HOSTNAME.as_str()];
        let _ = self.process_rss_bytes.remove_label_values(labels);
        let _ = self.process_shared_mem_bytes.remove_label_values(labels);
    }
}
