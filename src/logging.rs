//! Logger installation.
//!
//! Library code only emits `tracing` events. Natively they go to a `tracing_subscriber`
//! formatter; in the browser `tracing` forwards them through its `log` bridge to
//! `console_log`, and panics are routed to the console.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install the process-wide logger once. Later calls do nothing.
pub fn init() {
    INIT.call_once(install);
}

#[cfg(not(feature = "web"))]
fn install() {
    if let Err(err) = tracing_subscriber::fmt().with_target(false).try_init() {
        tracing::debug!(%err, "tracing subscriber already installed");
    }
}

#[cfg(feature = "web")]
fn install() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Debug) {
        tracing::debug!(%err, "console logger already installed");
    }
}
