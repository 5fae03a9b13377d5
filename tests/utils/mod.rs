//! Shared test helpers.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initialize the tracing subscriber once per test binary.
pub fn init_tracer() {
    INIT.call_once(|| {
        tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    });
}
