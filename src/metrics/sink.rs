use log::Level;
use std::fmt;
use std::sync::Arc;

use crate::metrics::MetricsRegistry;
use crate::models::{NotificationSpec, Severity};

pub const PLUGIN: &str = "pid-tracker";

pub const UPTIME_METRIC: &str = "process-uptime";
pub const RSS_METRIC: &str = "process.rss.bytes";
pub const SHARED_MEM_METRIC: &str = "process.shared-mem.bytes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

/// Extra dimensions attached to every value of one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimensions {
    pub all_running: bool,
    pub label: String,
    pub running: bool,
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[all-services-running={},{}-running={}]",
            self.all_running, self.label, self.running
        )
    }
}

/// One value bound for the monitoring backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSample {
    pub plugin_instance: String,
    pub kind: MetricKind,
    pub name: &'static str,
    pub dimensions: Dimensions,
    pub value: u64,
}

impl MetricSample {
    /// Metric name with its dimensions appended, e.g.
    /// `process-uptime[all-services-running=true,web-running=true]`.
    pub fn type_instance(&self) -> String {
        format!("{}{}", self.name, self.dimensions)
    }
}

/// Where the sampler delivers values and notifications.
pub trait MetricSink {
    fn dispatch(&mut self, sample: &MetricSample);

    fn notify(&mut self, notification: &NotificationSpec);
}

/// Publishes into the Prometheus registry served on `/metrics`.
pub struct PrometheusSink {
    metrics: Arc<MetricsRegistry>,
}

impl PrometheusSink {
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self { metrics }
    }
}

impl MetricSink for PrometheusSink {
    fn dispatch(&mut self, sample: &MetricSample) {
        let label = sample.plugin_instance.as_str();
        match sample.name {
            UPTIME_METRIC => self.metrics.set_uptime(
                label,
                sample.dimensions.all_running,
                sample.dimensions.running,
                sample.value,
            ),
            RSS_METRIC => self.metrics.set_rss(label, sample.value),
            SHARED_MEM_METRIC => self.metrics.set_shared_mem(label, sample.value),
            other => log::debug!("no prometheus series for {}", other),
        }
    }

    fn notify(&mut self, notification: &NotificationSpec) {
        let level = match notification.severity {
            Severity::Failure => Level::Error,
            Severity::Warning => Level::Warn,
            Severity::Informational => Level::Info,
        };
        log::log!(
            level,
            "{} notification [{}]: {}",
            PLUGIN,
            notification.label,
            notification.message
        );
        self.metrics
            .count_notification(&notification.label, notification.severity.as_str());
    }
}

/// Prints everything to stdout. Used by the `--once` harness.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl MetricSink for ConsoleSink {
    fn dispatch(&mut self, sample: &MetricSample) {
        println!(
            "<Values plugin={} plugin_instance={} type={} type_instance={} values=[{}]>",
            PLUGIN,
            sample.plugin_instance,
            sample.kind.as_str(),
            sample.type_instance(),
            sample.value
        );
    }

    fn notify(&mut self, notification: &NotificationSpec) {
        println!(
            "<Notification plugin={} plugin_instance={} type={} type_instance={} severity={} message={:?}>",
            PLUGIN,
            notification.label,
            notification.kind,
            notification.type_instance,
            notification.severity,
            notification.message
        );
    }
}

#[cfg(test)]
pub mod recording {
    use super::*;
    use std::sync::Mutex;

    /// Keeps everything it receives. Clones share the same buffers.
    #[derive(Clone, Default)]
    pub struct RecordingSink {
        samples: Arc<Mutex<Vec<MetricSample>>>,
        notifications: Arc<Mutex<Vec<NotificationSpec>>>,
    }

    impl RecordingSink {
        pub fn samples(&self) -> Vec<MetricSample> {
            self.samples.lock().unwrap().clone()
        }

        pub fn take_samples(&self) -> Vec<MetricSample> {
            std::mem::take(&mut *self.samples.lock().unwrap())
        }

        pub fn notifications(&self) -> Vec<NotificationSpec> {
            self.notifications.lock().unwrap().clone()
        }
    }

    impl MetricSink for RecordingSink {
        fn dispatch(&mut self, sample: &MetricSample) {
            self.samples.lock().unwrap().push(sample.clone());
        }

        fn notify(&mut self, notification: &NotificationSpec) {
            self.notifications.lock().unwrap().push(notification.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &'static str, value: u64, running: bool) -> MetricSample {
        MetricSample {
            plugin_instance: "web".to_string(),
            kind: MetricKind::Counter,
            name,
            dimensions: Dimensions {
                all_running: running,
                label: "web".to_string(),
                running,
            },
            value,
        }
    }

    #[test]
    fn type_instance_appends_dimensions() {
        assert_eq!(
            sample(UPTIME_METRIC, 10, true).type_instance(),
            "process-uptime[all-services-running=true,web-running=true]"
        );
    }

    #[test]
    fn prometheus_sink_routes_by_metric_name() {
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        let mut sink = PrometheusSink::new(metrics.clone());
        sink.dispatch(&sample(UPTIME_METRIC, 3000, true));
        sink.dispatch(&sample(RSS_METRIC, 8192, true));
        sink.dispatch(&sample(SHARED_MEM_METRIC, 512, true));

        let text = metrics.render().unwrap();
        assert!(text.contains("pid_tracker_process_uptime_milliseconds{"));
        assert!(text.contains("pid_tracker_process_rss_bytes{"));
        assert!(text.contains("8192"));
        assert!(text.contains("pid_tracker_process_shared_mem_bytes{"));
    }

    #[test]
    fn prometheus_sink_counts_notifications() {
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        let mut sink = PrometheusSink::new(metrics.clone());
        sink.notify(&NotificationSpec {
            label: "deploy".to_string(),
            kind: "gauge".to_string(),
            type_instance: String::new(),
            severity: Severity::Failure,
            message: "up".to_string(),
        });
        assert!(metrics
            .render()
            .unwrap()
            .contains("pid_tracker_notifications_total{"));
    }
}
