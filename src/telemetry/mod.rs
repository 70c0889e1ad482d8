//! Logging setup for stylerag
//!
//! Installs a `tracing` fmt subscriber writing to stderr so stdout stays
//! reserved for JSON results.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::Verbosity;

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV: &str = "STYLERAG_LOG";

static INIT: Once = Once::new();

/// Default directive for a verbosity level
pub fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "stylerag=error",
        Verbosity::Normal => "stylerag=warn",
        Verbosity::Verbose => "stylerag=info",
        Verbosity::VeryVerbose => "stylerag=debug",
    }
}

/// Initialize tracing once per process.
///
/// `STYLERAG_LOG` wins over the verbosity flags when it parses.
pub fn init_tracing(verbosity: Verbosity) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .init();
    });
}
