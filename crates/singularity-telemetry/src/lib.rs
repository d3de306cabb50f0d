//! # Singularity Telemetry
//!
//! Structured logging for the storage engine and its peers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use singularity_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//!     // storage service, host handler, peers ...
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SS_SERVICE_NAME` | `singularity-storage` | Name on the startup record |
//! | `SS_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `SS_CONSOLE_OUTPUT` | `true` | Write to stdout |
//! | `SS_JSON_LOGS` | `false` (`true` in containers) | JSON lines output |

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging. Hold the guard for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    init_tracing(&config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Logs shutdown when dropped.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Span scoped to one storage unit.
///
/// ```rust,ignore
/// let _span = singularity_telemetry::unit_span!("flush", unit = %id).entered();
/// ```
#[macro_export]
macro_rules! unit_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Log a replication event with the peer and unit attached.
#[macro_export]
macro_rules! log_replication_event {
    ($level:ident, $peer:expr, $unit:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            peer = %$peer,
            unit = %$unit,
            $($($field)*,)?
            $msg
        )
    };
}
