//! Opt-in diagnostics for tests. Not part of the public API surface; the
//! crate itself never installs a subscriber (that's an embedder's call), but
//! a test wanting to see `tracing` output while debugging a scenario can
//! call [`init_tracing`] first.

#[cfg(test)]
pub(crate) fn init_tracing() {
    use std::sync::Once;

    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .try_init();
    });
}
