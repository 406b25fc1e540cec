pub mod analysis;
pub mod models;
pub mod report;
pub mod rollup;
pub mod sales;
pub mod sensing;
pub mod settings;
pub mod storage;
mod utils;

use std::path::PathBuf;

use anyhow::{bail, Result};
use log::{info, warn};

use models::{Insight, Month};
use rollup::MonthlyRollup;
use sales::{synthetic, CsvSalesFeed};
use settings::{Settings, SettingsStore};

pub const CONFIG_ENV: &str = "SHELFSENSE_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "shelfsense.json";

const USAGE: &str = "usage: shelfsense <rollup|analyze|pipeline|synth-sales> [MM-YYYY]";

/// Entry point of the `shelfsense` binary: `<command> [MM-YYYY]`, defaulting
/// to the current month.
pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        bail!(USAGE);
    };
    let month = match args.next() {
        Some(raw) => raw.parse::<Month>()?,
        None => Month::current(),
    };

    let config_path = std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
    let store = SettingsStore::load(config_path)?;
    let settings = store.settings();
    info!(
        "ShelfSense {command} for {month} (data root {})",
        settings.storage.data_root.display()
    );

    match command.as_str() {
        "rollup" => rollup_month(settings, month),
        "analyze" => analyze_month(settings, month),
        "pipeline" => {
            rollup_month(settings, month)?;
            analyze_month(settings, month)
        }
        "synth-sales" => synthesize_sales(settings, month),
        other => bail!("unknown command '{other}'\n{USAGE}"),
    }
}

fn rollup_month(settings: &Settings, month: Month) -> Result<()> {
    let layout = settings.layout();
    match rollup::run_rollup(&layout, month)? {
        MonthlyRollup::Data { rows, skipped } => {
            if !skipped.is_empty() {
                warn!("{} malformed reports skipped for {month}", skipped.len());
            }
            println!(
                "{} rows written to {}",
                rows.len(),
                layout.monthly_file(month).display()
            );
            Ok(())
        }
        MonthlyRollup::NoData { skipped } => bail!(
            "no valid report data for {month} under {} ({} malformed reports skipped)",
            layout.month_dir(month).display(),
            skipped.len()
        ),
    }
}

fn analyze_month(settings: &Settings, month: Month) -> Result<()> {
    let layout = settings.layout();
    let feed = CsvSalesFeed::new(
        layout.sales_file(month),
        settings.sales.signal,
        settings.sales.value_column.clone(),
    );
    let result = analysis::run_analysis(&layout, month, &feed)?;

    for insight in [
        Insight::OpportunityMissed,
        Insight::MandatoryProduct,
        Insight::Normal,
    ] {
        let count = result.rows.iter().filter(|row| row.insight == insight).count();
        println!("{insight}: {count}");
    }
    println!("Analysis saved to {}", layout.analysis_file(month).display());
    Ok(())
}

fn synthesize_sales(settings: &Settings, month: Month) -> Result<()> {
    let layout = settings.layout();
    let path = layout.sales_file(month);
    let lines = synthetic::generate_month(
        month,
        &synthetic::DEFAULT_CATALOGUE,
        &mut rand::thread_rng(),
    );
    synthetic::write_sales_csv(&path, &lines)?;
    println!("Dummy sales data saved as {}", path.display());
    Ok(())
}
