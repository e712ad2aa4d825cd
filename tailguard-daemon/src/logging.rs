//! Logging initialization for tailguard-daemon.
//!
//! Configures `tracing-subscriber` based on the `[general]` section
//! of `TailguardConfig`. Supports JSON structured logging and
//! human-readable pretty format.
//!
//! Every scan cycle runs inside a `scan_cycle` span carrying `cycle_id`.
//! The JSON layer emits the current span on each line so source failures,
//! rotations and alert dispatch can be grouped per cycle.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use tailguard_core::config::GeneralConfig;

/// Transport crates that log every request at `debug`.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "lettre"];

/// Filter directives for `level`: tailguard crates at `level`, HTTP/TLS/SMTP
/// internals capped at `warn`.
pub fn default_directives(level: &str) -> String {
    let mut directives = level.to_owned();
    for target in QUIET_TARGETS {
        directives.push_str(&format!(",{target}=warn"));
    }
    directives
}

/// Build the filter. `RUST_LOG` wins over `config.log_level` when set.
pub fn build_filter(config: &GeneralConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_directives(&config.log_level))
        .map_err(|e| anyhow::anyhow!("invalid log level '{}': {}", config.log_level, e))
}

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
///
/// # Formats
///
/// * `"json"` - One JSON object per line with the enclosing `scan_cycle`
///   span flattened in, so `cycle_id` sits next to the event fields
/// * `"pretty"` - Human-readable colored output (for development)
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let env_filter = build_filter(config)?;

    match config.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(false)
                        .flatten_event(true),
                )
                .try_init()
                .map_err(|e| {
                    anyhow::anyhow!("failed to initialize JSON tracing subscriber: {}", e)
                })?;
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .map_err(|e| {
                    anyhow::anyhow!("failed to initialize pretty tracing subscriber: {}", e)
                })?;
        }
        _ => {
            return Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'json' or 'pretty'",
                config.log_format
            ));
        }
    }

    tracing::debug!(
        level = %config.log_level,
        format = %config.log_format,
        "tracing initialized"
    );
    Ok(())
}
