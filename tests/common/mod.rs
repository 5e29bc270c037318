#![allow(dead_code)]

pub mod gotoes_server;

use tracing_subscriber::EnvFilter;

/// Route library logs to the test harness. `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gotoes_timestamp=debug")),
        )
        .with_test_writer()
        .try_init();
}
