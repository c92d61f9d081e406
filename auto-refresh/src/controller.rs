//! The polling controller
//!
//! [`AutoRefresh`] owns a target slot and, once started, a single timer task.
//! Every tick reads the slot; when a target is set the fetch operation is
//! spawned for it. Ticks never wait for earlier fetches, so a slow fetch can
//! overlap with the next one.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout};

use crate::config::RefreshConfig;
use crate::error::{RefreshError, Result};
use crate::fetch::FetchOperation;
use crate::handle::RefreshHandle;
use crate::stats::{RefreshCounters, RefreshStats};
use crate::target::TargetSlot;

/// Periodically re-runs a fetch operation against a mutable target.
///
/// # Lifecycle
///
/// - [`start`](Self::start) fires the first tick immediately, then one tick
///   per interval. Starting a running controller is a no-op.
/// - [`stop`](Self::stop) cancels future ticks and returns once the timer
///   task has exited. Fetches already in flight run to completion.
/// - Dropping a started controller aborts the timer without waiting for it.
///   On a multi-thread runtime a tick already being dispatched on another
///   worker may still start one more fetch; call `stop` when that matters.
///
/// # Example
///
/// ```rust,ignore
/// use auto_refresh::{AutoRefresh, RefreshConfig};
///
/// let mut refresh = AutoRefresh::new(
///     move |customer_id: String| load_customer(customer_id),
///     RefreshConfig::default(),
/// )?;
///
/// refresh.set_target("C-1042".to_string());
/// refresh.start()?;
/// // ... view is unmounted
/// refresh.stop().await?;
/// ```
pub struct AutoRefresh<T: Send + 'static> {
    fetch: Arc<dyn FetchOperation<T>>,
    target: TargetSlot<T>,
    config: RefreshConfig,
    counters: Arc<RefreshCounters>,
    timer: Option<TimerHandle>,
}

struct TimerHandle {
    task: JoinHandle<()>,
    shutdown_tx: mpsc::Sender<()>,
}

impl<T> AutoRefresh<T>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    /// Create a stopped controller. Fails if the configuration is invalid.
    pub fn new<F>(fetch: F, config: RefreshConfig) -> Result<Self>
    where
        F: FetchOperation<T>,
    {
        config.validate()?;

        Ok(Self {
            fetch: Arc::new(fetch),
            target: TargetSlot::new(),
            config,
            counters: Arc::new(RefreshCounters::default()),
            timer: None,
        })
    }

    pub fn with_interval<F>(fetch: F, interval: Duration) -> Result<Self>
    where
        F: FetchOperation<T>,
    {
        Self::new(fetch, RefreshConfig::default().with_interval(interval))
    }

    /// Replace the target used by the next tick.
    pub fn set_target(&self, target: T) {
        tracing::trace!(?target, "Auto refresh target updated");
        self.target.set(target);
    }

    /// Unset the target; ticks are skipped until a new one is set.
    pub fn clear_target(&self) {
        self.target.clear();
    }

    pub fn target(&self) -> Option<T> {
        self.target.get()
    }

    /// A cloneable setter sharing this controller's target slot.
    pub fn handle(&self) -> RefreshHandle<T> {
        RefreshHandle::new(self.target.clone())
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.timer
            .as_ref()
            .is_some_and(|timer| !timer.task.is_finished())
    }

    pub fn stats(&self) -> RefreshStats {
        self.counters.snapshot(self.config.interval, self.is_running())
    }

    pub(crate) fn counters(&self) -> Arc<RefreshCounters> {
        Arc::clone(&self.counters)
    }

    /// Begin ticking on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError::NoRuntime`] when called outside a runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }

        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| RefreshError::NoRuntime)?;
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let task = runtime.spawn(Self::timer_task(
            Arc::clone(&self.fetch),
            self.target.clone(),
            Arc::clone(&self.counters),
            self.config.clone(),
            shutdown_rx,
        ));

        self.counters.mark_started();
        self.timer = Some(TimerHandle { task, shutdown_tx });

        tracing::debug!(interval = ?self.config.interval, "Auto refresh started");
        Ok(())
    }

    /// Stop ticking.
    ///
    /// Waits up to `shutdown_timeout` for the timer task to exit. If it has
    /// not, the task is aborted and awaited until cancelled. Either way the
    /// timer task is gone when this returns, so no further tick fires.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError::Shutdown`] if the timer task panicked or had to
    /// be aborted.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(TimerHandle {
            mut task,
            shutdown_tx,
        }) = self.timer.take()
        else {
            return Ok(());
        };

        // A closed channel means the task already exited
        let _ = shutdown_tx.send(()).await;

        let result = match timeout(self.config.shutdown_timeout, &mut task).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(RefreshError::Shutdown(format!(
                "Refresh timer task panicked: {e}"
            ))),
            Err(_) => {
                task.abort();
                // Resolves at the task's next yield point
                let _ = task.await;
                Err(RefreshError::Shutdown(format!(
                    "Refresh timer did not stop within {:?}",
                    self.config.shutdown_timeout
                )))
            }
        };

        tracing::debug!("Auto refresh stopped");
        result
    }

    /// Wait until every dispatched fetch has finished.
    ///
    /// Typically called after [`stop`](Self::stop) when the owner is about to
    /// tear down the runtime the fetches run on.
    pub async fn wait_for_in_flight(&self) {
        self.counters.wait_idle().await;
    }

    async fn timer_task(
        fetch: Arc<dyn FetchOperation<T>>,
        target: TargetSlot<T>,
        counters: Arc<RefreshCounters>,
        config: RefreshConfig,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let mut ticker = interval(config.interval);
        ticker.set_missed_tick_behavior(config.missed_tick_behavior.into());

        loop {
            tokio::select! {
                biased;

                // Also fires when the controller is dropped and the sender goes away
                _ = shutdown_rx.recv() => break,
                _ = ticker.tick() => Self::dispatch_tick(&fetch, &target, &counters),
            }
        }

        tracing::trace!("Auto refresh timer exited");
    }

    /// Runs on every tick. Never awaits: the fetch runs in its own task.
    fn dispatch_tick(
        fetch: &Arc<dyn FetchOperation<T>>,
        target: &TargetSlot<T>,
        counters: &Arc<RefreshCounters>,
    ) {
        let tick = counters.record_tick();

        let Some(current) = target.get() else {
            counters.record_skip();
            tracing::trace!(tick, "No refresh target set, skipping tick");
            return;
        };

        tracing::trace!(tick, target = ?current, "Dispatching refresh fetch");

        let guard = counters.begin_fetch();
        let fetch = Arc::clone(fetch);
        let counters = Arc::clone(counters);

        tokio::spawn(async move {
            let _guard = guard;
            let target = current.clone();

            // Inner task so a panicking fetch is reported like a failed one
            match tokio::spawn(async move { fetch.fetch(target).await }).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    counters.record_failure();
                    tracing::error!(tick, target = ?current, "Refresh fetch failed: {}", e);
                }
                Err(e) if e.is_panic() => {
                    counters.record_failure();
                    tracing::error!(tick, target = ?current, "Refresh fetch panicked");
                }
                // Runtime shutting down
                Err(_) => {}
            }
        });
    }
}

impl<T: Send + 'static> Drop for AutoRefresh<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            // Best effort: a dispatch already running on another worker thread
            // can still finish after this returns
            tracing::debug!("Auto refresh dropped while running, cancelling timer");
            timer.task.abort();
        }
    }
}

impl<T> fmt::Debug for AutoRefresh<T>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoRefresh")
            .field("target", &self.target)
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish()
    }
}
