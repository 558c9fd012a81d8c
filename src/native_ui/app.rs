//! Price window
//!
//! The window never touches refresh state. It drains [`DisplayUpdate`]s sent
//! by the scheduler every frame and forwards button clicks back as requests.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use eframe::egui::{self, Color32, RichText};
use tokio::runtime::Runtime;

use crate::core::{format_countdown, ChannelDisplay, DisplayUpdate, PriceLine};
use crate::providers::CoinGeckoProvider;
use crate::scheduler::{RefreshScheduler, SchedulerHandle};
use crate::settings::Settings;

const TEXT_MUTED: Color32 = Color32::from_rgb(140, 140, 150);
const TEXT_ERROR: Color32 = Color32::from_rgb(244, 67, 54);
const TEXT_PRICE: Color32 = Color32::from_rgb(76, 175, 80);

/// What the window shows, rebuilt from scheduler updates
#[derive(Debug, Clone, Default)]
pub struct PriceBoard {
    pub lines: Vec<PriceLine>,
    pub refreshed_at: Option<String>,
    pub error: Option<String>,
    pub countdown: Option<u64>,
    pub fetching: bool,
}

impl PriceBoard {
    /// Board listing every coin as unavailable until the first fetch lands
    pub fn pending(settings: &Settings) -> Self {
        Self {
            lines: settings
                .cryptocurrencies
                .iter()
                .cloned()
                .map(PriceLine::pending)
                .collect(),
            ..Default::default()
        }
    }

    pub fn apply(&mut self, update: DisplayUpdate) {
        match update {
            DisplayUpdate::Prices { lines, refreshed_at } => {
                self.lines = lines;
                self.refreshed_at = Some(refreshed_at);
                self.error = None;
                self.fetching = false;
            }
            DisplayUpdate::Error(message) => {
                self.error = Some(message);
                self.fetching = false;
            }
            DisplayUpdate::Countdown(remaining) => self.countdown = Some(remaining),
            DisplayUpdate::Fetching => self.fetching = true,
        }
    }

    pub fn status_text(&self) -> String {
        if self.fetching {
            "Refreshing…".to_string()
        } else {
            match self.countdown {
                Some(remaining) => format!("Next refresh in {}", format_countdown(remaining)),
                None => String::new(),
            }
        }
    }

    pub fn refreshed_text(&self) -> String {
        match self.refreshed_at {
            Some(ref at) => format!("Last refreshed: {}", at),
            None => "Waiting for first refresh".to_string(),
        }
    }
}

pub struct CoinBarApp {
    board: PriceBoard,
    updates: Receiver<DisplayUpdate>,
    scheduler: SchedulerHandle,
    runtime: Option<Runtime>,
}

impl CoinBarApp {
    fn new(board: PriceBoard, updates: Receiver<DisplayUpdate>, scheduler: SchedulerHandle, runtime: Runtime) -> Self {
        Self {
            board,
            updates,
            scheduler,
            runtime: Some(runtime),
        }
    }

    fn drain_updates(&mut self) {
        while let Ok(update) = self.updates.try_recv() {
            self.board.apply(update);
        }
    }
}

impl eframe::App for CoinBarApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_updates();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Crypto Prices");
            ui.separator();

            egui::Grid::new("price_grid")
                .num_columns(2)
                .striped(true)
                .spacing([24.0, 6.0])
                .show(ui, |ui| {
                    for line in &self.board.lines {
                        ui.label(RichText::new(line.name.as_str()).strong());
                        let color = if line.price.is_some() { TEXT_PRICE } else { TEXT_MUTED };
                        ui.label(RichText::new(line.format_price()).monospace().color(color));
                        ui.end_row();
                    }
                });

            if let Some(ref error) = self.board.error {
                ui.add_space(6.0);
                ui.label(RichText::new(error.as_str()).color(TEXT_ERROR));
            }

            ui.separator();
            ui.label(RichText::new(self.board.refreshed_text()).small().color(TEXT_MUTED));

            ui.horizontal(|ui| {
                ui.label(self.board.status_text());
                let refresh = ui.add_enabled(!self.board.fetching, egui::Button::new("Refresh now"));
                if refresh.clicked() {
                    self.scheduler.manual_refresh();
                }
            });
        });

        // Updates also wake the UI, this only keeps the clock honest
        ctx.request_repaint_after(Duration::from_secs(1));
    }
}

impl Drop for CoinBarApp {
    fn drop(&mut self) {
        self.scheduler.shutdown();
        if let Some(runtime) = self.runtime.take() {
            // Abandon an in-flight fetch rather than wait for it
            runtime.shutdown_background();
        }
    }
}

/// Open the price window and block until it is closed
pub fn run(settings: Settings, runtime: Runtime) -> anyhow::Result<()> {
    let source = Arc::new(CoinGeckoProvider::from_settings(&settings)?);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("CoinBar")
            .with_inner_size([320.0, 120.0 + 28.0 * settings.cryptocurrencies.len() as f32])
            .with_min_inner_size([260.0, 140.0]),
        ..Default::default()
    };

    eframe::run_native(
        "CoinBar",
        options,
        Box::new(move |cc| {
            let (tx, rx) = crossbeam_channel::unbounded();
            let ctx = cc.egui_ctx.clone();
            let display = ChannelDisplay::new(tx).with_wakeup(move || ctx.request_repaint());

            let (scheduler, events) = RefreshScheduler::new(
                settings.cryptocurrencies.clone(),
                source,
                Box::new(display),
                settings.refresh_interval(),
            );
            let handle = scheduler.handle();
            runtime.spawn(scheduler.run(events));

            Ok(Box::new(CoinBarApp::new(PriceBoard::pending(&settings), rx, handle, runtime)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Window failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CoinId;

    fn settings() -> Settings {
        Settings::from_toml_str(r#"cryptocurrencies = ["bitcoin", "dogecoin"]"#).unwrap()
    }

    #[test]
    fn test_pending_board() {
        let board = PriceBoard::pending(&settings());
        assert_eq!(board.lines.len(), 2);
        assert!(board.lines.iter().all(|l| l.price.is_none()));
        assert_eq!(board.refreshed_text(), "Waiting for first refresh");
        assert_eq!(board.status_text(), "");
    }

    #[test]
    fn test_apply_updates() {
        let mut board = PriceBoard::pending(&settings());

        board.apply(DisplayUpdate::Fetching);
        assert!(board.fetching);
        assert_eq!(board.status_text(), "Refreshing…");

        board.apply(DisplayUpdate::Prices {
            lines: vec![
                PriceLine::new(CoinId::from("bitcoin"), Some(65000.5)),
                PriceLine::new(CoinId::from("dogecoin"), None),
            ],
            refreshed_at: "2026-10-19 12:00:00".to_string(),
        });
        board.apply(DisplayUpdate::Countdown(180));
        assert!(!board.fetching);
        assert_eq!(board.lines[0].format_price(), "$65,000.50");
        assert_eq!(board.refreshed_text(), "Last refreshed: 2026-10-19 12:00:00");
        assert_eq!(board.status_text(), "Next refresh in 3:00");
    }

    #[test]
    fn test_error_keeps_last_prices() {
        let mut board = PriceBoard::pending(&settings());
        board.apply(DisplayUpdate::Prices {
            lines: vec![PriceLine::new(CoinId::from("bitcoin"), Some(1.0))],
            refreshed_at: "earlier".to_string(),
        });
        board.apply(DisplayUpdate::Fetching);
        board.apply(DisplayUpdate::Error("Request timed out".to_string()));

        assert!(!board.fetching);
        assert_eq!(board.error.as_deref(), Some("Request timed out"));
        assert_eq!(board.lines[0].price, Some(1.0));

        board.apply(DisplayUpdate::Prices {
            lines: Vec::new(),
            refreshed_at: "now".to_string(),
        });
        assert!(board.error.is_none());
    }
}
