//! Price snapshot model - the quote returned by a fetch plus when it was taken

use std::fmt;

use chrono::{DateTime, Local};
use serde::Serialize;

use super::{CoinId, PriceQuote};

/// Text shown in place of a price the quote service did not return
pub const UNAVAILABLE: &str = "unavailable";

/// A set of prices captured at a point in time
#[derive(Debug, Clone)]
pub struct PriceSnapshot {
    /// Prices keyed by coin
    pub prices: PriceQuote,

    /// When the scheduler received this quote
    pub fetched_at: DateTime<Local>,
}

impl PriceSnapshot {
    /// Create a snapshot stamped with the current local time
    pub fn new(prices: PriceQuote) -> Self {
        Self::at(prices, Local::now())
    }

    pub fn at(prices: PriceQuote, fetched_at: DateTime<Local>) -> Self {
        Self { prices, fetched_at }
    }

    pub fn price(&self, coin: &CoinId) -> Option<f64> {
        self.prices.get(coin).copied()
    }

    /// One line per requested coin, in the requested order
    pub fn lines(&self, coins: &[CoinId]) -> Vec<PriceLine> {
        coins
            .iter()
            .map(|coin| PriceLine::new(coin.clone(), self.price(coin)))
            .collect()
    }

    /// Timestamp formatted for the "last refreshed" label
    pub fn format_fetched_at(&self) -> String {
        self.fetched_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Result of one refresh, handed to the display surface as a whole
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success(PriceSnapshot),
    Failure(String),
}

/// Display-ready price for a single coin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceLine {
    pub coin: CoinId,
    pub name: String,
    #[serde(rename = "usd")]
    pub price: Option<f64>,
}

impl PriceLine {
    pub fn new(coin: CoinId, price: Option<f64>) -> Self {
        let name = coin.display_name();
        Self { coin, name, price }
    }

    /// A line for a coin that has not been fetched yet
    pub fn pending(coin: CoinId) -> Self {
        Self::new(coin, None)
    }

    pub fn format_price(&self) -> String {
        match self.price {
            Some(price) => format_usd(price),
            None => UNAVAILABLE.to_string(),
        }
    }
}

impl fmt::Display for PriceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.format_price())
    }
}

/// Format a USD amount with thousands separators.
///
/// Amounts of a dollar or more get cents; smaller amounts keep up to six
/// decimals so sub-cent coins remain readable.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return UNAVAILABLE.to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    let formatted = if abs >= 1.0 || abs == 0.0 {
        format!("{:.2}", abs)
    } else {
        let raw = format!("{:.6}", abs);
        let trimmed = raw.trim_end_matches('0');
        // keep at least cents
        match trimmed.split_once('.') {
            Some((_, frac)) if frac.len() < 2 => format!("{:.2}", abs),
            _ => trimmed.to_string(),
        }
    };

    let (int_part, frac_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if frac_part.is_empty() {
        format!("{}${}", sign, grouped)
    } else {
        format!("{}${}.{}", sign, grouped, frac_part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(65000.5), "$65,000.50");
        assert_eq!(format_usd(1234567.891), "$1,234,567.89");
        assert_eq!(format_usd(999.999), "$1,000.00");
        assert_eq!(format_usd(42.0), "$42.00");
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(-1500.0), "-$1,500.00");
    }

    #[test]
    fn test_format_usd_sub_dollar() {
        assert_eq!(format_usd(0.1234), "$0.1234");
        assert_eq!(format_usd(0.5), "$0.50");
        assert_eq!(format_usd(0.00001234), "$0.000012");
        assert_eq!(format_usd(f64::NAN), UNAVAILABLE);
    }

    #[test]
    fn test_lines_mark_missing_coins_unavailable() {
        let mut prices = PriceQuote::new();
        prices.insert(CoinId::from("bitcoin"), 65000.5);
        let snapshot = PriceSnapshot::new(prices);

        let coins = vec![CoinId::from("bitcoin"), CoinId::from("dogecoin")];
        let lines: Vec<String> = snapshot.lines(&coins).iter().map(|l| l.to_string()).collect();

        assert_eq!(lines, vec!["Bitcoin: $65,000.50", "Dogecoin: unavailable"]);
    }

    #[test]
    fn test_lines_follow_requested_order() {
        let mut prices = PriceQuote::new();
        prices.insert(CoinId::from("ethereum"), 3000.0);
        prices.insert(CoinId::from("bitcoin"), 60000.0);
        let snapshot = PriceSnapshot::new(prices);

        let coins = vec![CoinId::from("ethereum"), CoinId::from("bitcoin")];
        let names: Vec<String> = snapshot.lines(&coins).into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Ethereum", "Bitcoin"]);
    }

    #[test]
    fn test_price_line_serializes_usd() {
        let line = PriceLine::new(CoinId::from("bitcoin"), Some(1.5));
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["coin"], "bitcoin");
        assert_eq!(json["usd"], 1.5);

        let pending = serde_json::to_value(PriceLine::pending(CoinId::from("dogecoin"))).unwrap();
        assert!(pending["usd"].is_null());
    }
}
