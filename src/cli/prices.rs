//! `coinbar prices` - fetch once and print

use std::io::Write;

use chrono::{DateTime, Local};
use serde::Serialize;

use super::PricesArgs;
use crate::core::{PriceLine, PriceSnapshot, PriceSource};
use crate::providers::CoinGeckoProvider;
use crate::settings::Settings;

#[derive(Serialize)]
struct PricesReport<'a> {
    fetched_at: DateTime<Local>,
    prices: &'a [PriceLine],
}

pub async fn run(settings: &Settings, args: PricesArgs) -> anyhow::Result<()> {
    let provider = CoinGeckoProvider::from_settings(settings)?;
    let prices = provider.fetch(&settings.cryptocurrencies).await?;
    let snapshot = PriceSnapshot::new(prices);

    let stdout = std::io::stdout();
    write_report(&mut stdout.lock(), settings, &snapshot, args.json)?;
    Ok(())
}

fn write_report(
    out: &mut impl Write,
    settings: &Settings,
    snapshot: &PriceSnapshot,
    json: bool,
) -> anyhow::Result<()> {
    let lines = snapshot.lines(&settings.cryptocurrencies);

    if json {
        let report = PricesReport {
            fetched_at: snapshot.fetched_at,
            prices: &lines,
        };
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        for line in &lines {
            writeln!(out, "{}", line)?;
        }
        writeln!(out, "Last refreshed: {}", snapshot.format_fetched_at())?;
    }

    Ok(())
}
