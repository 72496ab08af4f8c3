use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Retail order-cancellation analytics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load a workbook directory of sheet CSVs into the SQLite database
    Load(LoadArgs),
    /// Compute and render the cancellation dashboard from an ingested database
    Dashboard(DashboardArgs),
    /// Print each ingested table's columns and declared types
    Schema(SchemaArgs),
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Workbook directory containing one CSV per sheet (Orders.csv, Cancels.csv, ...)
    #[arg(short = 's', long = "source")]
    pub source: PathBuf,
    /// SQLite database file to (re)materialize tables into
    #[arg(short = 'd', long = "db")]
    pub db: PathBuf,
    /// Character encoding of the sheet CSVs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// SQLite database file produced by the load step
    #[arg(short = 'd', long = "db")]
    pub db: PathBuf,
    /// Start of the order-date range, inclusive (YYYY-MM-DD; defaults to earliest observed)
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// End of the order-date range, inclusive (YYYY-MM-DD; defaults to latest observed)
    #[arg(long)]
    pub end: Option<NaiveDate>,
    /// Restrict to these store regions (repeatable; defaults to all observed)
    #[arg(long = "region", action = clap::ArgAction::Append)]
    pub regions: Vec<String>,
    /// Restrict to these product departments (repeatable; defaults to all observed)
    #[arg(long = "department", action = clap::ArgAction::Append)]
    pub departments: Vec<String>,
    /// Restrict to these cancel reasons (repeatable; defaults to all observed)
    #[arg(long = "reason", action = clap::ArgAction::Append)]
    pub reasons: Vec<String>,
    /// Output format for the summary tables
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// SQLite database file produced by the load step
    #[arg(short = 'd', long = "db")]
    pub db: PathBuf,
}
