//! Shared helpers for assetdag's integration tests.

pub mod builders;
pub mod fake_executor;
pub mod fixture;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

pub use builders::{RegistryBuilder, noop_transform};
pub use fake_executor::FakeExecutor;
pub use fixture::ProjectFixture;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Uses `with_test_writer()`, so logs only show up for failing tests
/// (unless run with `-- --nocapture`). Levels come from `RUST_LOG`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .init();
    });
}

/// Run a future, panicking if it takes longer than `secs` seconds.
pub async fn with_timeout<F, T>(secs: u64, f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(secs), f)
        .await
        .unwrap_or_else(|_| panic!("test timed out after {secs} seconds"))
}
