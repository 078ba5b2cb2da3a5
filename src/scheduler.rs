//! Periodic refresh: every tick refreshes all subscriptions and, when that
//! succeeds, runs the update callback (normally rebuild and apply).
//!
//! Ticks and [`Scheduler::run_now`] share one mutex, so at most one cycle is
//! in flight and a build never sees a half-finished refresh.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// One year. Longer intervals would overflow the timer deadline.
pub const MAX_INTERVAL_MINUTES: u64 = 366 * 24 * 60;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Re-fetches all subscription sources.
pub type RefreshFn = Arc<dyn Fn() -> BoxFuture<Result<()>> + Send + Sync>;
/// Runs after a successful refresh.
pub type UpdateFn = Arc<dyn Fn() -> BoxFuture<Result<()>> + Send + Sync>;

fn boxed<F, Fut>(f: F) -> Arc<dyn Fn() -> BoxFuture<Result<()>> + Send + Sync>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()) as BoxFuture<Result<()>>)
}

pub struct Scheduler {
    refresh: RefreshFn,
    on_update: Option<UpdateFn>,
    cycle: Arc<Mutex<()>>,
    interval: Option<Duration>,
    next_update: watch::Sender<Option<Instant>>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new<F, Fut>(refresh: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            refresh: boxed(refresh),
            on_update: None,
            cycle: Arc::new(Mutex::new(())),
            interval: None,
            next_update: watch::Sender::new(None),
            handle: None,
        }
    }

    pub fn with_on_update<F, Fut>(mut self, on_update: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_update = Some(boxed(on_update));
        self
    }

    /// Starts ticking every `interval_minutes`; `0` leaves the scheduler
    /// stopped. Calling it while running does nothing.
    pub fn start(&mut self, interval_minutes: u64) {
        if self.is_running() {
            return;
        }
        if interval_minutes == 0 {
            info!("Scheduled refresh disabled");
            return;
        }

        if interval_minutes > MAX_INTERVAL_MINUTES {
            warn!(
                "Refresh interval of {} minutes capped to {}",
                interval_minutes, MAX_INTERVAL_MINUTES
            );
        }
        let minutes = interval_minutes.min(MAX_INTERVAL_MINUTES);
        let interval = Duration::from_secs(minutes.saturating_mul(60));
        let first = Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(first, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.interval = Some(interval);
        self.next_update.send_replace(Some(first));

        let refresh = self.refresh.clone();
        let on_update = self.on_update.clone();
        let cycle = self.cycle.clone();
        let next_update = self.next_update.clone();

        self.handle = Some(tokio::spawn(async move {
            loop {
                let deadline = ticker.tick().await;
                next_update.send_replace(Some(deadline + interval));
                if let Err(e) = run_cycle(&refresh, on_update.as_ref(), &cycle).await {
                    warn!("Scheduled refresh failed: {:#}", e);
                }
            }
        }));

        info!("Scheduler started, refreshing every {:?}", interval);
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Scheduler stopped");
        }
        self.next_update.send_replace(None);
    }

    /// Stops and starts again, typically after the interval setting changed.
    pub fn restart(&mut self, interval_minutes: u64) {
        self.stop();
        self.interval = None;
        self.start(interval_minutes);
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Interval of the running or last started schedule.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn next_update(&self) -> Option<Instant> {
        if !self.is_running() {
            return None;
        }
        *self.next_update.borrow()
    }

    /// Runs one refresh cycle immediately, waiting for any cycle in flight.
    pub async fn run_now(&self) -> Result<()> {
        run_cycle(&self.refresh, self.on_update.as_ref(), &self.cycle).await
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn run_cycle(
    refresh: &RefreshFn,
    on_update: Option<&UpdateFn>,
    cycle: &Mutex<()>,
) -> Result<()> {
    let _guard = cycle.lock().await;

    debug!("Refreshing subscriptions");
    refresh().await.context("Subscription refresh failed")?;

    if let Some(on_update) = on_update {
        on_update().await.context("Update callback failed")?;
        debug!("Update callback finished");
    }
    Ok(())
}
