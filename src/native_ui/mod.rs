//! Native egui window for CoinBar

mod app;

pub use app::run;
