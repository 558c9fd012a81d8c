//! Refresh scheduler
//!
//! Owns the refresh cadence. A single coordinating task holds the
//! [`RefreshState`] and the display surface; the one-second timer and the
//! network fetch run as separate tasks and report back through the event
//! channel, so neither can block the window or user input.
//!
//! The timer is armed as a periodic `tokio::time::interval` whose abort
//! handle is kept alongside a generation number. It is aborted before every
//! fetch and on shutdown, and ticks from an older generation are dropped.

mod state;

pub use state::{Phase, RefreshState, TickOutcome};

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::core::{CoinId, DisplaySurface, FetchError, FetchOutcome, PriceQuote, PriceSnapshot, PriceSource};

/// Countdown resolution
const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Message shown when the scheduler is started with nothing to track
pub const NO_COINS_MESSAGE: &str = "No cryptocurrencies configured";

/// Inputs to the coordinating task
#[derive(Debug)]
pub enum SchedulerEvent {
    /// One second elapsed on the timer armed as `generation`
    Tick { generation: u64 },
    /// User asked for a refresh
    ManualRefresh,
    /// The outstanding fetch finished
    FetchCompleted(Result<PriceQuote, FetchError>),
    /// Stop the scheduler
    Shutdown,
}

/// Cloneable handle for sending requests to a running scheduler
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<SchedulerEvent>,
}

impl SchedulerHandle {
    pub fn manual_refresh(&self) {
        if self.tx.send(SchedulerEvent::ManualRefresh).is_err() {
            tracing::debug!("Scheduler stopped, manual refresh dropped");
        }
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(SchedulerEvent::Shutdown);
    }
}

/// Armed countdown timer
struct Timer {
    generation: u64,
    handle: AbortHandle,
}

pub struct RefreshScheduler {
    coins: Arc<[CoinId]>,
    source: Arc<dyn PriceSource>,
    display: Box<dyn DisplaySurface>,
    state: RefreshState,
    events: mpsc::UnboundedSender<SchedulerEvent>,
    timer: Option<Timer>,
    next_generation: u64,
    fetch: Option<AbortHandle>,
}

impl RefreshScheduler {
    /// Build a scheduler and the receiver its `run` loop consumes
    pub fn new(
        coins: Vec<CoinId>,
        source: Arc<dyn PriceSource>,
        display: Box<dyn DisplaySurface>,
        interval_secs: u64,
    ) -> (Self, mpsc::UnboundedReceiver<SchedulerEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            coins: coins.into(),
            source,
            display,
            state: RefreshState::new(interval_secs),
            events,
            timer: None,
            next_generation: 0,
            fetch: None,
        };
        (scheduler, rx)
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            tx: self.events.clone(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &RefreshState {
        &self.state
    }

    /// Drive the scheduler until a `Shutdown` event arrives
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<SchedulerEvent>) {
        self.start();
        while let Some(event) = events.recv().await {
            if self.handle_event(event).is_break() {
                break;
            }
        }
        self.shutdown();
    }

    /// Kick off the first fetch right away. With no coins the scheduler
    /// stays idle and never touches the price source.
    pub fn start(&mut self) {
        if self.state.phase() != Phase::Idle {
            return;
        }
        if self.coins.is_empty() {
            tracing::error!("Refresh scheduler not started: no coins configured");
            self.display
                .show_outcome(&self.coins, &FetchOutcome::Failure(NO_COINS_MESSAGE.to_string()));
            return;
        }

        tracing::info!(
            "Starting refresh scheduler for {} coins every {}s",
            self.coins.len(),
            self.state.interval()
        );
        if self.state.begin_fetch() {
            self.spawn_fetch();
        }
    }

    pub fn handle_event(&mut self, event: SchedulerEvent) -> ControlFlow<()> {
        match event {
            SchedulerEvent::Tick { generation } => self.on_tick(generation),
            SchedulerEvent::ManualRefresh => self.on_manual_refresh(),
            SchedulerEvent::FetchCompleted(result) => self.on_fetch_completed(result),
            SchedulerEvent::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Cancel the timer and abandon any in-flight fetch
    pub fn shutdown(&mut self) {
        tracing::debug!("Refresh scheduler shutting down");
        self.cancel_timer();
        if let Some(fetch) = self.fetch.take() {
            fetch.abort();
        }
    }

    fn on_tick(&mut self, generation: u64) {
        let current = self.timer.as_ref().map(|t| t.generation);
        if current != Some(generation) {
            tracing::trace!("Dropping stale tick from timer {}", generation);
            return;
        }

        match self.state.tick() {
            TickOutcome::Remaining(remaining) => self.display.show_countdown(remaining),
            TickOutcome::Due => {
                self.display.show_countdown(0);
                tracing::debug!("Countdown elapsed, refreshing");
                self.cancel_timer();
                self.spawn_fetch();
            }
            TickOutcome::Ignored => {}
        }
    }

    fn on_manual_refresh(&mut self) {
        let remaining = self.state.remaining();
        if !self.state.request_manual() {
            tracing::debug!("Manual refresh ignored in {:?}", self.state.phase());
            return;
        }
        tracing::debug!("Manual refresh requested with {:?}s left on the countdown", remaining);
        self.cancel_timer();
        self.spawn_fetch();
    }

    fn on_fetch_completed(&mut self, result: Result<PriceQuote, FetchError>) {
        if !self.state.is_fetching() {
            tracing::debug!("Ignoring fetch result outside of a refresh");
            return;
        }
        self.fetch = None;

        let outcome = match result {
            Ok(prices) => {
                tracing::debug!("Fetched {} prices from {}", prices.len(), self.source.name());
                FetchOutcome::Success(PriceSnapshot::new(prices))
            }
            Err(e) => {
                tracing::warn!("Price fetch from {} failed: {}", self.source.name(), e);
                FetchOutcome::Failure(e.to_string())
            }
        };

        self.display.show_outcome(&self.coins, &outcome);

        let remaining = self.state.complete_fetch();
        self.display.show_countdown(remaining);
        self.arm_timer();
    }

    fn spawn_fetch(&mut self) {
        debug_assert!(self.timer.is_none(), "timer must be cancelled before fetching");
        self.display.show_fetching();

        let source = Arc::clone(&self.source);
        let coins = Arc::clone(&self.coins);
        let tx = self.events.clone();
        let task = tokio::spawn(async move {
            let result = source.fetch(&coins).await;
            let _ = tx.send(SchedulerEvent::FetchCompleted(result));
        });
        self.fetch = Some(task.abort_handle());
    }

    fn arm_timer(&mut self) {
        self.cancel_timer();

        let generation = self.next_generation;
        self.next_generation += 1;

        let tx = self.events.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(SchedulerEvent::Tick { generation }).is_err() {
                    break;
                }
            }
        });

        self.timer = Some(Timer {
            generation,
            handle: task.abort_handle(),
        });
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.handle.abort();
        }
    }
}
