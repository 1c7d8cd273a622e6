use log::warn;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::error::TrackerError;
use crate::models::target::{Target, TrackedTarget};

/// Every tracked target, keyed by pid file. Built once at startup.
#[derive(Debug, Default)]
pub struct Registry {
    targets: HashMap<PathBuf, TrackedTarget>,
}

impl Registry {
    /// Registers the usable targets. Invalid definitions, and definitions
    /// reusing a pid file or a label, are reported and skipped; having none
    /// left is fatal.
    pub fn build(targets: Vec<Target>) -> Result<Self, TrackerError> {
        let mut registry = Registry::default();
        // every exported series is keyed by label
        let mut labels = HashSet::new();

        for target in targets {
            if let Err(e) = target.validate() {
                warn!("pid-tracker plugin: {}", e);
                continue;
            }
            if registry.targets.contains_key(&target.pid_file) {
                warn!(
                    "pid-tracker plugin: PidFile {} configured more than once, ignoring \"{}\"",
                    target.pid_file.display(),
                    target.label
                );
                continue;
            }
            if !labels.insert(target.label.clone()) {
                warn!(
                    "pid-tracker plugin: instance \"{}\" already used, ignoring PidFile {}",
                    target.label,
                    target.pid_file.display()
                );
                continue;
            }
            registry
                .targets
                .insert(target.pid_file.clone(), TrackedTarget::new(target));
        }

        if registry.is_empty() {
            return Err(TrackerError::EmptyRegistry);
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, pid_file: &std::path::Path) -> Option<&TrackedTarget> {
        self.targets.get(pid_file)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedTarget> {
        self.targets.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TrackedTarget> {
        self.targets.values_mut()
    }
}
