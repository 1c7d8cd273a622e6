use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::config::{parse_bool, parse_target_arg};

/// PID Tracker - uptime and memory of pid-file tracked services
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 9999)]
    pub port: u16,

    /// Listen address
    #[arg(short = 'a', long, env = "ADDRESS", default_value = "0.0.0.0")]
    pub address: String,

    /// JSON configuration file
    #[arg(short, long, env = "PID_TRACKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Extra target as PIDFILE=LABEL, may be repeated
    #[arg(short = 't', long = "target", value_parser = parse_target_arg)]
    pub targets: Vec<(PathBuf, String)>,

    /// Collect memory stats for --target entries
    #[arg(long, action = ArgAction::Set, value_parser = parse_bool, default_value = "false")]
    pub memory_stats: bool,

    /// Memory stats interval in seconds for --target entries
    #[arg(long)]
    pub memory_stats_interval: Option<u64>,

    /// Seconds between two samples
    #[arg(short, long, env = "PID_TRACKER_INTERVAL")]
    pub interval: Option<u64>,

    /// Log every dispatched value
    #[arg(short, long, env = "PID_TRACKER_VERBOSE", value_parser = parse_bool)]
    pub verbose: Option<bool>,

    /// Sample once, print to stdout and exit
    #[arg(long)]
    pub once: bool,
}
