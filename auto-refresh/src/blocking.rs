//! Sync facade over [`AutoRefresh`]
//!
//! Spawns a thread with its own single-threaded tokio runtime that drives the
//! controller, so hosts without an async runtime can still use it. Target
//! writes go straight to the shared slot; only shutdown crosses the channel.

use std::fmt;
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::config::RefreshConfig;
use crate::controller::AutoRefresh;
use crate::error::{RefreshError, Result};
use crate::fetch::FetchOperation;
use crate::handle::RefreshHandle;
use crate::stats::{RefreshCounters, RefreshStats};

/// Commands sent from the sync facade to the background worker
#[derive(Debug)]
enum Command {
    /// Stop the controller and exit the worker
    Shutdown,
}

/// Blocking wrapper that runs an [`AutoRefresh`] on a dedicated thread.
///
/// All methods are synchronous. [`shutdown`](Self::shutdown) stops the timer,
/// lets in-flight fetches finish (bounded by `shutdown_timeout`) and joins the
/// worker thread. Use it when a view is torn down.
///
/// Dropping the wrapper only signals the worker and returns at once. Until
/// the worker picks up the signal one more tick may still fire, and a fetch
/// can complete after `drop` has returned.
///
/// # Example
///
/// ```rust,ignore
/// use auto_refresh::{BlockingAutoRefresh, RefreshConfig};
///
/// let refresh = BlockingAutoRefresh::new(fetch_invoice, RefreshConfig::fast())?;
/// refresh.set_target(invoice_id);
/// // ...
/// refresh.shutdown()?;
/// ```
pub struct BlockingAutoRefresh<T: Send + 'static> {
    handle: RefreshHandle<T>,
    counters: Arc<RefreshCounters>,
    interval: Duration,
    command_tx: mpsc::UnboundedSender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl<T> BlockingAutoRefresh<T>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    /// Validate the configuration, spawn the worker and start ticking.
    ///
    /// Blocks until the worker's runtime is up.
    pub fn new<F>(fetch: F, config: RefreshConfig) -> Result<Self>
    where
        F: FetchOperation<T>,
    {
        Self::spawn(AutoRefresh::new(fetch, config)?)
    }

    /// Like [`new`](Self::new), with `target` set before the first tick.
    pub fn with_target<F>(fetch: F, config: RefreshConfig, target: T) -> Result<Self>
    where
        F: FetchOperation<T>,
    {
        let refresh = AutoRefresh::new(fetch, config)?;
        refresh.set_target(target);
        Self::spawn(refresh)
    }

    fn spawn(refresh: AutoRefresh<T>) -> Result<Self> {
        let handle = refresh.handle();
        let counters = refresh.counters();
        let interval = refresh.interval();

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = std_mpsc::channel();

        let worker = thread::Builder::new()
            .name("auto-refresh".to_string())
            .spawn(move || run_worker(refresh, command_rx, ready_tx))
            .map_err(|e| RefreshError::WorkerSpawn(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(message)) => {
                let _ = worker.join();
                return Err(RefreshError::WorkerSpawn(message));
            }
            Err(_) => {
                let _ = worker.join();
                return Err(RefreshError::WorkerSpawn(
                    "Worker exited before reporting readiness".to_string(),
                ));
            }
        }

        Ok(Self {
            handle,
            counters,
            interval,
            command_tx,
            worker: Some(worker),
        })
    }

    pub fn set_target(&self, target: T) {
        self.handle.set_target(target);
    }

    pub fn clear_target(&self) {
        self.handle.clear_target();
    }

    pub fn target(&self) -> Option<T> {
        self.handle.target()
    }

    pub fn handle(&self) -> RefreshHandle<T> {
        self.handle.clone()
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    pub fn stats(&self) -> RefreshStats {
        self.counters.snapshot(self.interval, self.is_running())
    }

    /// Stop the controller, let in-flight fetches finish and wait for the
    /// worker thread to exit.
    pub fn shutdown(mut self) -> Result<()> {
        self.shutdown_and_join()
    }

    fn shutdown_and_join(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        let _ = self.command_tx.send(Command::Shutdown);

        worker
            .join()
            .map_err(|_| RefreshError::Shutdown("Auto refresh worker panicked".to_string()))
    }
}

impl<T: Send + 'static> Drop for BlockingAutoRefresh<T> {
    fn drop(&mut self) {
        if self.worker.is_some() {
            tracing::debug!("BlockingAutoRefresh dropping, signalling worker shutdown");
            let _ = self.command_tx.send(Command::Shutdown);
        }
    }
}

fn run_worker<T>(
    mut refresh: AutoRefresh<T>,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
    ready_tx: std_mpsc::Sender<std::result::Result<(), String>>,
) where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime for auto refresh worker: {}", e);
            let _ = ready_tx.send(Err(e.to_string()));
            return;
        }
    };

    rt.block_on(async {
        if let Err(e) = refresh.start() {
            let _ = ready_tx.send(Err(e.to_string()));
            return;
        }
        let _ = ready_tx.send(Ok(()));

        tracing::debug!("Auto refresh worker started");

        // A dropped sender counts as shutdown too
        let _ = command_rx.recv().await;

        if let Err(e) = refresh.stop().await {
            tracing::warn!("Auto refresh worker did not stop cleanly: {}", e);
        }

        // Fetches run on this runtime, so it has to outlive them
        let drain_timeout = refresh.config().shutdown_timeout;
        if timeout(drain_timeout, refresh.wait_for_in_flight())
            .await
            .is_err()
        {
            tracing::warn!(
                "Auto refresh worker gave up waiting for {} in-flight fetch(es) after {:?}",
                refresh.stats().in_flight,
                drain_timeout
            );
        }
    });

    tracing::debug!("Auto refresh worker shut down");
}
