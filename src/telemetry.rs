//! Structured logging setup
//!
//! EnvFilter plus a plain fmt layer; the embedding shell calls this once
//! at startup. Safe to call again (later calls are no-ops), so tests can
//! use it freely.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sahayak=info"));

    let _ = Registry::default()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}
