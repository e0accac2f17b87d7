/// Development helper: initialize a tracing subscriber when `RUST_LOG` is set.
///
/// Tests and demos can call `zsock::dev_tracing::init_tracing()` to see the
/// socket lifecycle and retry-loop events. This is a no-op when `RUST_LOG` is
/// not set or when a global subscriber is already installed.
pub fn init_tracing() {
    use std::env;

    if env::var("RUST_LOG").is_ok() {
        // Best-effort: a test binary may call this once per test.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}
