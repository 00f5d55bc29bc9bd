use std::sync::Once;

use tracing_subscriber::EnvFilter;

static TEST_SUBSCRIBER: Once = Once::new();

/// Route `tracing` output through the test harness, once per process.
///
/// Level comes from `RUST_LOG`, `debug` when unset.
pub fn init_test_setup() {
    TEST_SUBSCRIBER.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        // another harness may already own the global subscriber
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
