//! CLI argument definitions for tailguard-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use tailguard_core::TailguardConfig;

/// tailguard log incident monitor.
///
/// Tails local and remote log files, classifies incident lines and
/// raises threshold alerts once per scan cycle.
#[derive(Parser, Debug)]
#[command(name = "tailguard-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to tailguard.toml configuration file.
    #[arg(short, long, default_value = "/etc/tailguard/tailguard.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,

    /// Run a single scan cycle, print the cycle report as JSON and exit.
    #[arg(long)]
    pub once: bool,

    /// Keep checkpoints and events in memory only; alerts go to the log channel.
    #[arg(long)]
    pub dry_run: bool,

    /// Override PID file path (takes precedence over config file).
    #[arg(long)]
    pub pid_file: Option<String>,
}

impl DaemonCli {
    /// Apply CLI overrides on top of the file + environment configuration.
    pub fn apply_overrides(&self, config: &mut TailguardConfig) {
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(ref format) = self.log_format {
            config.general.log_format = format.clone();
        }
        if let Some(ref pid_file) = self.pid_file {
            config.general.pid_file = pid_file.clone();
        }
    }
}
