use log::warn;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Installs a Ctrl-C handler that sets the returned flag.
///
/// The organizer checks the flag between files, so an interrupted run stops
/// cleanly after the file currently being moved.
#[must_use]
pub fn setup_shutdown_signal() -> Arc<AtomicBool> {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let signal_clone = Arc::clone(&shutdown_signal);

    if let Err(e) = ctrlc::set_handler(move || {
        signal_clone.store(true, Ordering::SeqCst);
        eprintln!("\nInterrupt received, finishing the current file...");
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    shutdown_signal
}
