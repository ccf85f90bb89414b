use std::{env, sync::Once};

use tracing_subscriber::EnvFilter;

static LOG_INIT: Once = Once::new();

/// Install the global `tracing` subscriber.
///
/// Filtering follows `RUST_LOG`. Output is JSON when `RUST_LOG_FORMAT=json`,
/// otherwise human readable, coloured unless `NO_COLOR` is set. Calling this
/// more than once (e.g. from several tests) is harmless.
pub fn init_logging() {
    LOG_INIT.call_once(|| {
        let filter = EnvFilter::from_default_env();
        let result = if env::var("RUST_LOG_FORMAT").is_ok_and(|f| f == "json") {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .try_init()
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(use_color())
                .try_init()
        };
        if let Err(err) = result {
            eprintln!("logging already initialised: {err}")
        }
    });
}

fn use_color() -> bool {
    env::var("NO_COLOR").map(|v| v.is_empty()).unwrap_or(true)
}
