//! SIGINT/SIGTERM handling.

use signal_hook::{
    consts::{SIGINT, SIGTERM},
    flag,
};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Install handlers that raise the returned flag on the first SIGINT or
/// SIGTERM. A second signal, once the flag is up, terminates the process,
/// so a run stuck before its first poll can still be interrupted.
pub fn install_shutdown_handlers() -> std::io::Result<Arc<AtomicBool>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [SIGTERM, SIGINT] {
        // Order matters: the conditional exit must see the flag as it was
        // before this delivery.
        flag::register_conditional_shutdown(signal, 1, Arc::clone(&shutdown))?;
        flag::register(signal, Arc::clone(&shutdown))?;
    }
    Ok(shutdown)
}
