//! # NS Telemetry
//!
//! Structured logging for Node-Sandbox tools.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ns_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `NS_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `NS_JSON_LOGS` | `false` (`true` in containers) | Emit JSON lines |
//! | `NS_CONSOLE_OUTPUT` | `true` | Write logs to stderr at all |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    #[error("Failed to install log subscriber: {0}")]
    SubscriberInit(String),
}

/// Initialize logging for a command invocation.
///
/// Returns a guard that should be held for the lifetime of the process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    init_logging(config)?;
    Ok(TelemetryGuard { _private: () })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _private: (),
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!("Shutting down telemetry");
    }
}

/// Helper to create structured log entries stamped with the workflow phase.
///
/// ```rust,ignore
/// log_event!(info, Phase::Provision, "Node started", service = %name);
/// ```
#[macro_export]
macro_rules! log_event {
    (info, $phase:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            phase = %$phase,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $phase:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            phase = %$phase,
            $($($field)*,)?
            $msg
        )
    };

    (error, $phase:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            phase = %$phase,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $phase:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            phase = %$phase,
            $($($field)*,)?
            $msg
        )
    };
}
