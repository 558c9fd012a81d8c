//! Display surface abstraction
//!
//! The refresh scheduler talks to whatever renders prices through the
//! [`DisplaySurface`] trait. The desktop window sits on another thread, so it
//! receives [`DisplayUpdate`] messages over a channel instead of being
//! mutated directly.

use crossbeam_channel::Sender;

use super::{CoinId, FetchOutcome, PriceLine};

/// Consumer of refresh results and countdown values
pub trait DisplaySurface: Send {
    /// Render the result of a refresh (prices or an error message)
    fn show_outcome(&mut self, coins: &[CoinId], outcome: &FetchOutcome);

    /// Render the seconds left until the next automatic refresh
    fn show_countdown(&mut self, remaining_secs: u64);

    /// A fetch has started
    fn show_fetching(&mut self) {}
}

/// Message sent from the scheduler to a display living on another thread
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayUpdate {
    Prices {
        lines: Vec<PriceLine>,
        refreshed_at: String,
    },
    Error(String),
    Countdown(u64),
    Fetching,
}

impl DisplayUpdate {
    pub fn from_outcome(coins: &[CoinId], outcome: &FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Success(snapshot) => DisplayUpdate::Prices {
                lines: snapshot.lines(coins),
                refreshed_at: snapshot.format_fetched_at(),
            },
            FetchOutcome::Failure(message) => DisplayUpdate::Error(message.clone()),
        }
    }
}

/// Display surface that forwards every update over a channel
pub struct ChannelDisplay {
    tx: Sender<DisplayUpdate>,
    on_update: Option<Box<dyn Fn() + Send>>,
}

impl ChannelDisplay {
    pub fn new(tx: Sender<DisplayUpdate>) -> Self {
        Self { tx, on_update: None }
    }

    /// Call `f` after each update is queued (e.g., to wake the UI thread)
    pub fn with_wakeup(mut self, f: impl Fn() + Send + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    fn send(&self, update: DisplayUpdate) {
        if self.tx.send(update).is_err() {
            tracing::debug!("Display channel closed, dropping update");
            return;
        }
        if let Some(ref wake) = self.on_update {
            wake();
        }
    }
}

impl DisplaySurface for ChannelDisplay {
    fn show_outcome(&mut self, coins: &[CoinId], outcome: &FetchOutcome) {
        self.send(DisplayUpdate::from_outcome(coins, outcome));
    }

    fn show_countdown(&mut self, remaining_secs: u64) {
        self.send(DisplayUpdate::Countdown(remaining_secs));
    }

    fn show_fetching(&mut self) {
        self.send(DisplayUpdate::Fetching);
    }
}

/// Format seconds as a countdown string ("2:59", "1:02:03")
pub fn format_countdown(remaining_secs: u64) -> String {
    let hours = remaining_secs / 3600;
    let minutes = (remaining_secs % 3600) / 60;
    let seconds = remaining_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
