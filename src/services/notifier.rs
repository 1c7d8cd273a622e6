use crate::metrics::MetricSink;
use crate::models::NotificationSpec;
use crate::services::liveness::Liveness;

/// Sends the configured notification the first time any target is seen
/// running. It never re-arms for the lifetime of the sampler.
#[derive(Debug, Default)]
pub struct NotificationTrigger {
    spec: Option<NotificationSpec>,
    already_sent: bool,
}

impl NotificationTrigger {
    pub fn new(spec: Option<NotificationSpec>) -> Self {
        Self {
            spec,
            already_sent: false,
        }
    }

    pub fn spec(&self) -> Option<&NotificationSpec> {
        self.spec.as_ref()
    }

    pub fn already_sent(&self) -> bool {
        self.already_sent
    }

    /// Returns true when the notification went out on this call.
    pub fn evaluate(&mut self, liveness: Liveness, sink: &mut dyn MetricSink) -> bool {
        if self.already_sent || !liveness.any_running {
            return false;
        }
        let Some(spec) = &self.spec else {
            return false;
        };
        log::info!(
            "pid-tracker plugin: sending \"{}\" notification for {}",
            spec.severity,
            spec.label
        );
        sink.notify(spec);
        self.already_sent = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::sink::recording::RecordingSink;
    use crate::models::Severity;

    const UP: Liveness = Liveness {
        any_running: true,
        all_running: false,
    };
    const DOWN: Liveness = Liveness {
        any_running: false,
        all_running: false,
    };

    fn spec() -> NotificationSpec {
        NotificationSpec {
            label: "deploy".to_string(),
            kind: "gauge".to_string(),
            type_instance: "started".to_string(),
            severity: Severity::Informational,
            message: "service is up".to_string(),
        }
    }

    #[test]
    fn unconfigured_never_fires() {
        let mut sink = RecordingSink::default();
        let mut trigger = NotificationTrigger::new(None);
        assert!(!trigger.evaluate(UP, &mut sink));
        assert!(sink.notifications().is_empty());
        assert!(!trigger.already_sent());
    }

    #[test]
    fn waits_for_a_running_target() {
        let mut sink = RecordingSink::default();
        let mut trigger = NotificationTrigger::new(Some(spec()));
        assert!(!trigger.evaluate(DOWN, &mut sink));
        assert!(trigger.evaluate(UP, &mut sink));
        assert_eq!(sink.notifications(), vec![spec()]);
    }

    #[test]
    fn fires_only_once() {
        let mut sink = RecordingSink::default();
        let mut trigger = NotificationTrigger::new(Some(spec()));
        assert!(trigger.evaluate(UP, &mut sink));
        assert!(!trigger.evaluate(DOWN, &mut sink));
        assert!(!trigger.evaluate(UP, &mut sink));
        assert_eq!(sink.notifications().len(), 1);
        assert!(trigger.already_sent());
    }
}
