use tracing_subscriber::{filter::LevelFilter, prelude::*, util::SubscriberInitExt, EnvFilter};

/// Install a plain-text subscriber filtered by `RUST_LOG`, or at `info` when
/// it is unset or unparseable.
///
/// The struct-log replay logs through the `log` facade, which the fmt layer
/// picks up as well.
///
/// # Panics
/// If a global subscriber is already installed.
pub fn init() {
    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_filter(filter()),
        )
        .init();
}

fn filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy()
}
