use anyhow::Context;
use log::warn;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::CommandArgs;
use crate::error::TrackerError;
use crate::models::{NotificationSpec, Target};

/// Used by the scheduler when no interval is configured anywhere.
pub const DEFAULT_INTERVAL_SECS: u64 = 10;

/// Accepted tokens, case-insensitive: `true`/`false`, `yes`/`no`, `on`/`off`, `1`/`0`.
pub fn parse_bool(value: &str) -> Result<bool, TrackerError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(TrackerError::config(format!(
            "\"{}\" is not a boolean (expected true/false, yes/no, on/off or 1/0)",
            other
        ))),
    }
}

/// `PIDFILE=LABEL`, as given to `--target`.
pub fn parse_target_arg(value: &str) -> Result<(PathBuf, String), TrackerError> {
    match value.rsplit_once('=') {
        Some((path, label)) if !path.is_empty() && !label.is_empty() => {
            Ok((PathBuf::from(path), label.to_string()))
        }
        _ => Err(TrackerError::config(format!(
            "\"{}\" is not of the form PIDFILE=LABEL",
            value
        ))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => parse_bool(&text).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetEntry {
    pid_file: PathBuf,
    label: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    collect_memory_stats: bool,
    #[serde(default)]
    memory_stats_interval: Option<u64>,
}

impl From<TargetEntry> for Target {
    fn from(entry: TargetEntry) -> Self {
        let target = Target::new(entry.pid_file, entry.label);
        if entry.collect_memory_stats {
            target.with_memory_stats(entry.memory_stats_interval)
        } else {
            target
        }
    }
}

/// On-disk JSON configuration.
///
/// Targets and the notification stay raw here so that one malformed entry is
/// dropped on its own in [`Settings::merge`] instead of failing the whole file.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    interval: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    verbose: bool,
    #[serde(default)]
    targets: Vec<Value>,
    #[serde(default)]
    notification: Option<Value>,
    #[serde(flatten)]
    unknown: Map<String, Value>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| TrackerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    fn usable_targets(&self) -> Vec<Target> {
        self.targets
            .iter()
            .enumerate()
            .filter_map(|(index, raw)| {
                match serde_json::from_value::<TargetEntry>(raw.clone()) {
                    Ok(entry) => Some(Target::from(entry)),
                    Err(e) => {
                        warn!("pid-tracker plugin: skipping target #{}: {}", index, e);
                        None
                    }
                }
            })
            .collect()
    }

    fn usable_notification(&self) -> Option<NotificationSpec> {
        let raw = self.notification.as_ref()?;
        let spec = match serde_json::from_value::<NotificationSpec>(raw.clone()) {
            Ok(spec) => spec,
            Err(e) => {
                warn!("pid-tracker plugin: notification disabled: {}", e);
                return None;
            }
        };
        match spec.validate() {
            Ok(()) => Some(spec),
            Err(e) => {
                warn!("pid-tracker plugin: notification disabled: {}", e);
                None
            }
        }
    }
}

/// Effective settings after merging the config file with the command line.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Seconds between ticks, as configured
    pub interval: Option<u64>,
    pub verbose: bool,
    pub targets: Vec<Target>,
    pub notification: Option<NotificationSpec>,
}

impl Settings {
    pub fn load(args: &CommandArgs) -> anyhow::Result<Self> {
        let file = match &args.config {
            Some(path) => ConfigFile::load(path)
                .with_context(|| format!("cannot load configuration {}", path.display()))?,
            None => ConfigFile::default(),
        };
        Ok(Self::merge(file, args))
    }

    /// Command-line values win over the file. Targets from both are kept.
    pub fn merge(file: ConfigFile, args: &CommandArgs) -> Self {
        let interval = match args.interval.or(file.interval) {
            Some(0) => {
                warn!("pid-tracker plugin: ignoring zero Interval");
                None
            }
            other => other,
        };

        for key in file.unknown.keys() {
            warn!("pid-tracker plugin: ignoring unknown config option \"{}\"", key);
        }

        let mut targets = file.usable_targets();
        targets.extend(args.targets.iter().map(|(pid_file, label)| {
            let target = Target::new(pid_file.clone(), label.clone());
            if args.memory_stats {
                target.with_memory_stats(args.memory_stats_interval)
            } else {
                target
            }
        }));

        let notification = file.usable_notification();

        Self {
            interval,
            verbose: args.verbose.unwrap_or(file.verbose),
            targets,
            notification,
        }
    }

    /// Period used by the scheduler.
    pub fn tick_secs(&self) -> u64 {
        self.interval.unwrap_or(DEFAULT_INTERVAL_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn args(extra: &[&str]) -> CommandArgs {
        let mut argv = vec!["pid-tracker"];
        argv.extend_from_slice(extra);
        CommandArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn parse_bool_accepts_documented_tokens() {
        for token in ["true", "True", "YES", "on", "1", " true "] {
            assert!(parse_bool(token).unwrap(), "{}", token);
        }
        for token in ["false", "False", "no", "OFF", "0"] {
            assert!(!parse_bool(token).unwrap(), "{}", token);
        }
    }

    #[test]
    fn parse_bool_rejects_anything_else() {
        for token in ["", "y", "2", "truthy", "nope"] {
            assert!(matches!(
                parse_bool(token),
                Err(TrackerError::Configuration { .. })
            ));
        }
    }

    #[test]
    fn parse_target_arg_splits_on_last_equals() {
        let (path, label) = parse_target_arg("/run/a=b/web.pid=web").unwrap();
        assert_eq!(path, PathBuf::from("/run/a=b/web.pid"));
        assert_eq!(label, "web");
        assert!(parse_target_arg("/run/web.pid").is_err());
        assert!(parse_target_arg("/run/web.pid=").is_err());
        assert!(parse_target_arg("=web").is_err());
    }

    #[test]
    fn parses_config_file() {
        let file = ConfigFile::parse(
            r#"{
                "interval": 10,
                "verbose": "yes",
                "targets": [
                    {"pid_file": "/run/web.pid", "label": "web", "collect_memory_stats": "True", "memory_stats_interval": 30},
                    {"pid_file": "/run/db.pid", "label": "db", "collect_memory_stats": false}
                ],
                "notification": {
                    "label": "deploy", "type": "gauge", "type_instance": "started",
                    "severity": "informational", "message": "services started"
                }
            }"#,
        )
        .unwrap();

        let settings = Settings::merge(file, &args(&[]));
        assert_eq!(settings.interval, Some(10));
        assert!(settings.verbose);
        assert_eq!(settings.targets.len(), 2);
        assert_eq!(
            settings.targets[0],
            Target::new("/run/web.pid", "web").with_memory_stats(Some(30))
        );
        assert!(!settings.targets[1].collect_memory_stats);
        let notification = settings.notification.unwrap();
        assert_eq!(notification.severity, Severity::Informational);
        assert_eq!(notification.type_instance, "started");
    }

    #[test]
    fn malformed_target_is_skipped_next_to_good_one() {
        let file = ConfigFile::parse(
            r#"{"targets": [
                {"pid_file": "/run/web.pid", "label": "web"},
                {"pid_file": "/run/db.pid", "label": "db", "collect_memory_stats": "maybe"},
                {"pid_file": "/run/cache.pid", "label": "cache", "memory_interval": 30},
                "/run/queue.pid"
            ]}"#,
        )
        .unwrap();

        let settings = Settings::merge(file, &args(&[]));
        assert_eq!(settings.targets, vec![Target::new("/run/web.pid", "web")]);
    }

    #[test]
    fn unknown_top_level_keys_are_ignored() {
        let file = ConfigFile::parse(
            r#"{"Intervall": 10, "targets": [{"pid_file": "/run/web.pid", "label": "web"}]}"#,
        )
        .unwrap();
        let settings = Settings::merge(file, &args(&[]));
        assert_eq!(settings.interval, None);
        assert_eq!(settings.targets.len(), 1);
    }

    #[test]
    fn loose_boolean_at_top_level_is_an_error() {
        assert!(ConfigFile::parse(r#"{"verbose": "maybe"}"#).is_err());
    }

    #[test]
    fn unknown_severity_drops_notification_only() {
        let file = ConfigFile::parse(
            r#"{
                "targets": [{"pid_file": "/run/web.pid", "label": "web"}],
                "notification": {"label": "deploy", "type": "gauge", "severity": "fatal", "message": "up"}
            }"#,
        )
        .unwrap();
        let settings = Settings::merge(file, &args(&[]));
        assert!(settings.notification.is_none());
        assert_eq!(settings.targets.len(), 1);
    }

    #[test]
    fn invalid_notification_is_dropped() {
        let file = ConfigFile::parse(
            r#"{"notification": {"label": "deploy", "type": "gauge", "severity": "failure", "message": ""}}"#,
        )
        .unwrap();
        assert!(Settings::merge(file, &args(&[])).notification.is_none());
    }

    #[test]
    fn command_line_overrides_file() {
        let file = ConfigFile::parse(
            r#"{"interval": 30, "verbose": true, "targets": [{"pid_file": "/run/web.pid", "label": "web"}]}"#,
        )
        .unwrap();
        let settings = Settings::merge(
            file,
            &args(&[
                "--interval",
                "5",
                "--verbose",
                "off",
                "--memory-stats",
                "on",
                "-t",
                "/run/db.pid=db",
            ]),
        );
        assert_eq!(settings.interval, Some(5));
        assert!(!settings.verbose);
        assert_eq!(settings.targets.len(), 2);
        assert!(!settings.targets[0].collect_memory_stats);
        assert_eq!(settings.targets[1].label, "db");
        assert!(settings.targets[1].collect_memory_stats);
    }

    #[test]
    fn zero_interval_falls_back_to_default_tick() {
        let settings = Settings::merge(ConfigFile::default(), &args(&["--interval", "0"]));
        assert_eq!(settings.interval, None);
        assert_eq!(settings.tick_secs(), DEFAULT_INTERVAL_SECS);
    }

    #[test]
    fn loads_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"targets": [{{"pid_file": "/run/web.pid", "label": "web"}}]}}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let settings = Settings::load(&args(&["--config", path.as_str()])).unwrap();
        assert_eq!(settings.targets, vec![Target::new("/run/web.pid", "web")]);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(Settings::load(&args(&["--config", "/nonexistent/pid-tracker.json"])).is_err());
    }
}
