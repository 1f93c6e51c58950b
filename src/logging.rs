//! `tracing` subscriber setup for the binary.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const DEFAULT_FILTER: &str = "olympics_api=info,tower_http=info";

/// Install the global subscriber. `RUST_LOG` overrides [`DEFAULT_FILTER`].
///
/// Calling this twice is harmless; the second subscriber is discarded.
pub fn init_logging(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let layer = if json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer().compact().with_filter(env_filter).boxed()
    };

    // A subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::registry().with(layer).try_init();
}
