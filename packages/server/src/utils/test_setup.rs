use dotenvy::dotenv;
use std::sync::Once;

static INIT: Once = Once::new();

/// Loads `.env` and routes tracing output through the test harness. Safe to
/// call from every test.
pub fn setup_test_env() {
    INIT.call_once(|| {
        dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}
