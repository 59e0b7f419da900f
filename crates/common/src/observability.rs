//! Tracing subscriber setup for the function binaries.
//!
//! Logs are emitted as JSON lines so the log collector can index fields
//! (`target`, `secret_id`, `step`, ...) without parsing free text.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; `default_filter` applies when it is unset or
/// unparsable. Calling this more than once is harmless: later calls leave the
/// first subscriber in place.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_target(true)
                .without_time(),
        )
        .try_init();

    if result.is_err() {
        tracing::debug!(target: "common.observability", "Tracing subscriber already installed");
    }
}
