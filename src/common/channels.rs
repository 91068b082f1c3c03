//! Channel type definitions for inter-task communication

use tokio::sync::mpsc;

/// Shutdown channels carry a single message
pub const SHUTDOWN_CHANNEL_SIZE: usize = 1;

/// Create a shutdown channel for a background loop
///
/// Sending `()` or dropping the sender stops the loop at its next idle point.
pub fn create_shutdown_channel() -> (mpsc::Sender<()>, mpsc::Receiver<()>) {
    mpsc::channel(SHUTDOWN_CHANNEL_SIZE)
}
