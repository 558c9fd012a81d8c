//! Core data models and traits

mod coin;
mod display;
mod price_snapshot;
mod provider;

pub use coin::*;
pub use display::*;
pub use price_snapshot::*;
pub use provider::*;
