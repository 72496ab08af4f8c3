//! Order-cancellation analytics over a workbook of retail extracts.
//!
//! `load` ingests the per-sheet CSV files into a SQLite database with
//! inferred column types; `dashboard` joins, derives, filters, and
//! aggregates that database into cancellation summaries; `schema`
//! prints the stored table layouts.

use std::sync::OnceLock;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

pub mod aggregate;
pub mod cache;
pub mod cli;
pub mod dashboard;
pub mod data;
pub mod derive;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod io_utils;
pub mod query;
pub mod schema;
pub mod store;
pub mod table;
pub mod workbook;

use cli::{Cli, Commands, SchemaArgs};
use store::Store;
use workbook::SHEET_NAMES;

static LOGGER: OnceLock<()> = OnceLock::new();

pub fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .filter_module("cancel_metrics", LevelFilter::Info)
            .format_timestamp_millis()
            .init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match &cli.command {
        Commands::Load(args) => ingest::execute(args),
        Commands::Dashboard(args) => dashboard::execute(args),
        Commands::Schema(args) => print_schema(args),
    }
}

/// Prints the column layout of every ingested table present in the
/// database; absent tables are reported rather than treated as errors.
fn print_schema(args: &SchemaArgs) -> Result<()> {
    let store = Store::open_read_only(&args.db)?;
    let headers = vec!["column".to_string(), "type".to_string()];
    for sheet in SHEET_NAMES {
        if !store.table_exists(sheet)? {
            println!("== {sheet} == (not ingested)");
            continue;
        }
        println!("== {sheet} ==");
        let rows = store
            .table_columns(sheet)?
            .into_iter()
            .map(|(name, datatype)| vec![name, datatype])
            .collect::<Vec<_>>();
        table::print_table(&headers, &rows);
        println!();
    }
    Ok(())
}
