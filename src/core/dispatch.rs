//! Fire-and-forget command dispatch
//!
//! `submit` returns immediately. Each command runs as its own detached tokio
//! task; failures are logged and dropped, never retried, never reported back.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::core::device::DeviceClient;
use crate::types::LedCommand;

/// Receives commands from the presence loop. Must not block.
pub trait CommandSink: Send + Sync {
    fn submit(&self, command: LedCommand);
}

impl<T: CommandSink + ?Sized> CommandSink for Arc<T> {
    fn submit(&self, command: LedCommand) {
        (**self).submit(command)
    }
}

/// Counters shared with the spawned tasks
#[derive(Debug, Default)]
struct DispatchStats {
    in_flight: AtomicUsize,
    submitted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

/// Snapshot of dispatcher counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchCounts {
    pub in_flight: usize,
    pub submitted: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Sends commands to the device over HTTP, one detached task per command
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    client: Arc<DeviceClient>,
    runtime: Handle,
    stats: Arc<DispatchStats>,
}

impl HttpDispatcher {
    /// Bind to the runtime the tasks will be spawned on
    pub fn new(client: Arc<DeviceClient>, runtime: Handle) -> Self {
        Self {
            client,
            runtime,
            stats: Arc::new(DispatchStats::default()),
        }
    }

    /// Bind to the runtime of the calling async context.
    /// Panics outside a tokio runtime, like `Handle::current`.
    pub fn on_current_runtime(client: Arc<DeviceClient>) -> Self {
        Self::new(client, Handle::current())
    }

    pub fn counts(&self) -> DispatchCounts {
        DispatchCounts {
            in_flight: self.stats.in_flight.load(Ordering::SeqCst),
            submitted: self.stats.submitted.load(Ordering::SeqCst),
            succeeded: self.stats.succeeded.load(Ordering::SeqCst),
            failed: self.stats.failed.load(Ordering::SeqCst),
        }
    }

    /// Wait until no request is in flight or `timeout` passes.
    /// Returns true if idle. Does not cancel anything.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.stats.in_flight.load(Ordering::SeqCst) == 0 {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

impl CommandSink for HttpDispatcher {
    fn submit(&self, command: LedCommand) {
        let client = Arc::clone(&self.client);
        let stats = Arc::clone(&self.stats);

        stats.submitted.fetch_add(1, Ordering::SeqCst);
        stats.in_flight.fetch_add(1, Ordering::SeqCst);

        self.runtime.spawn(async move {
            match client.send(command).await {
                Ok(()) => {
                    stats.succeeded.fetch_add(1, Ordering::SeqCst);
                    info!(command = command.tag(), "LED command delivered");
                }
                Err(e) => {
                    stats.failed.fetch_add(1, Ordering::SeqCst);
                    warn!(command = command.tag(), host = client.host(), error = %e, "LED command failed");
                }
            }
            stats.in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }
}
