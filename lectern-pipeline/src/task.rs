//! Detached background tasks
//!
//! All fire-and-forget work goes through [`spawn_logged`], which gives
//! dangling futures a defined error sink: failures are logged and dropped,
//! never allowed to crash the caller or go unobserved.

use std::future::Future;
use tracing::error;

/// Spawn a detached task whose error is logged and dropped
pub fn spawn_logged<F, E>(name: &'static str, future: F) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = future.await {
            error!(task = name, error = %err, "background task failed");
        }
    })
}
