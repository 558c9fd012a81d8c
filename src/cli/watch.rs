//! `coinbar watch` - run the refresh scheduler against the terminal

use std::io::Write;
use std::sync::Arc;

use crate::core::{format_countdown, CoinId, DisplaySurface, DisplayUpdate, FetchOutcome};
use crate::providers::CoinGeckoProvider;
use crate::scheduler::RefreshScheduler;
use crate::settings::Settings;

/// Writes each refresh as a block of lines. The countdown only goes to the
/// log; printing it every second would bury the prices.
pub struct ConsoleDisplay<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> ConsoleDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn write_update(&mut self, update: &DisplayUpdate) -> std::io::Result<()> {
        match update {
            DisplayUpdate::Prices { lines, refreshed_at } => {
                writeln!(self.out, "--- {} ---", refreshed_at)?;
                for line in lines {
                    writeln!(self.out, "{}", line)?;
                }
            }
            DisplayUpdate::Error(message) => writeln!(self.out, "Error fetching prices: {}", message)?,
            DisplayUpdate::Countdown(_) | DisplayUpdate::Fetching => {}
        }
        self.out.flush()
    }
}

impl<W: Write + Send> DisplaySurface for ConsoleDisplay<W> {
    fn show_outcome(&mut self, coins: &[CoinId], outcome: &FetchOutcome) {
        let update = DisplayUpdate::from_outcome(coins, outcome);
        if let Err(e) = self.write_update(&update) {
            tracing::warn!("Failed to write prices: {}", e);
        }
    }

    fn show_countdown(&mut self, remaining_secs: u64) {
        tracing::trace!("Next refresh in {}", format_countdown(remaining_secs));
    }

    fn show_fetching(&mut self) {
        tracing::debug!("Refreshing prices");
    }
}

pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let source = Arc::new(CoinGeckoProvider::from_settings(settings)?);
    let display = ConsoleDisplay::new(std::io::stdout());

    let (scheduler, events) = RefreshScheduler::new(
        settings.cryptocurrencies.clone(),
        source,
        Box::new(display),
        settings.refresh_interval(),
    );
    let handle = scheduler.handle();
    let task = tokio::spawn(scheduler.run(events));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupted, stopping");
    handle.shutdown();
    task.await?;

    Ok(())
}
