//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants;

static INIT: Once = Once::new();

/// Initialize the Credence tracing/logging system.
///
/// Reads the `CREDENCE_LOG` environment variable for per-crate log levels.
/// Format: `CREDENCE_LOG=credence_provenance=debug,credence_factor=info`
///
/// Falls back to `credence=info` if `CREDENCE_LOG` is not set or is invalid.
/// Calling it more than once is a no-op.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(constants::LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(constants::DEFAULT_LOG_DIRECTIVE));

        // A host process may already own the global subscriber.
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
