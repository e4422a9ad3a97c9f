//! Observability infrastructure: tracing and metrics.
//!
//! The library only emits. Hosts call [`init`] once to install a subscriber and
//! pick a metrics recorder of their own.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod metrics;

/// Initialize the global tracing subscriber and register metric descriptions.
///
/// `level` is the default directive (e.g. `info`, `herogate_core=debug`); `RUST_LOG`
/// directives are applied on top of it.
pub fn init(level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::builder().parse(directives(level, env))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true).with_level(true))
        .try_init()?;

    metrics::register_core_metrics();
    tracing::debug!(level, "Observability initialized");

    Ok(())
}

/// Later directives win over earlier ones for the same target.
fn directives(level: &str, env: Option<String>) -> String {
    match env {
        Some(env) if !env.trim().is_empty() => format!("{},{}", level, env),
        _ => level.to_string(),
    }
}
