use std::sync::Once;

static INIT: Once = Once::new();

/// Sets up the tracing subscriber once per test binary, writing through the
/// libtest capture.
pub fn setup_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt().with_test_writer().init();
    });
}
