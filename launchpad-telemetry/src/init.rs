//! Telemetry initialization

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Level used when neither `RUST_LOG` nor the caller provide a usable filter.
pub const DEFAULT_LEVEL: &str = "warn";

/// Builds the subscriber filter. `RUST_LOG` wins over `default_directive`.
pub fn build_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Installs a console subscriber writing to stderr, once per process.
///
/// Later calls are no-ops, so tests and library callers may call it freely.
pub fn init_telemetry(service_name: &str, default_directive: &str) {
    INIT.call_once(|| {
        let installed = tracing_subscriber::registry()
            .with(build_filter(default_directive))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(true),
            )
            .try_init();

        if installed.is_ok() {
            tracing::debug!(service.name = service_name, "Telemetry initialized");
        }
    });
}
