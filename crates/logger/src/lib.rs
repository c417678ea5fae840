use std::env;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber at INFO unless RUST_LOG says otherwise.
pub fn init() {
    init_with_level(LevelFilter::INFO);
}

/// Install the global subscriber with an explicit default level.
///
/// RUST_LOG still takes precedence over `level`; RUST_LOG_FORMAT=json
/// switches the fmt layer to structured output.
pub fn init_with_level(level: LevelFilter) {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let json = env::var("RUST_LOG_FORMAT").is_ok_and(|format| format == "json");

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry().with(fmt_layer).init();
}
