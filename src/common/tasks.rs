//! Fire-and-forget task helpers

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::errors::Result;

/// Spawn a background unit of work behind an error boundary
///
/// A failure inside `fut` is logged under `label` and never reaches the caller.
/// The returned handle may be dropped or awaited; awaiting it cannot fail
/// unless the task panicked.
pub fn spawn_logged<F>(label: impl Into<String>, fut: F) -> JoinHandle<()>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    let label = label.into();
    tokio::spawn(async move {
        match fut.await {
            Ok(()) => debug!(task = %label, "background task finished"),
            Err(e) => error!(task = %label, error = %e, "background task failed"),
        }
    })
}
