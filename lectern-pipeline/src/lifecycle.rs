//! Resource lifecycle manager
//!
//! Guarantees that process shutdown leaves no dangling cancellation tokens
//! and no open external connections. Connection release runs even when token
//! cleanup partially fails, and the whole operation is safe to invoke more
//! than once.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{error, info};

use crate::registry::RunRegistry;

/// Errors surfaced while closing a connection
#[derive(Debug, Error)]
#[error("failed to close {name}: {reason}")]
pub struct CloseError {
    pub name: String,
    pub reason: String,
}

/// A pooled external connection the process must release on shutdown
///
/// Implementations must tolerate repeated `close` calls.
#[async_trait]
pub trait Closable: Send + Sync {
    fn name(&self) -> &str;

    async fn close(&self) -> Result<(), CloseError>;
}

/// Tracks closable connections and drives shutdown
pub struct ResourceLifecycle {
    registry: Arc<RunRegistry>,
    connections: Mutex<Vec<Arc<dyn Closable>>>,
}

impl ResourceLifecycle {
    pub fn new(registry: Arc<RunRegistry>) -> Self {
        Self {
            registry,
            connections: Mutex::new(Vec::new()),
        }
    }

    pub fn register(&self, connection: Arc<dyn Closable>) {
        self.connections().push(connection);
    }

    /// Release everything: signal outstanding runs, then close connections
    ///
    /// Close errors are logged and do not block the remaining connections.
    pub async fn shutdown(&self) {
        let cancelled = self.registry.cancel_all();
        info!(cancelled, "signalled outstanding pipeline runs");

        let connections: Vec<Arc<dyn Closable>> = self.connections().clone();
        for connection in connections {
            match connection.close().await {
                Ok(()) => info!(name = connection.name(), "connection closed"),
                Err(err) => error!(error = %err, "connection close failed, continuing shutdown"),
            }
        }
    }

    fn connections(&self) -> MutexGuard<'_, Vec<Arc<dyn Closable>>> {
        match self.connections.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
