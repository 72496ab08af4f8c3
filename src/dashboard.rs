//! Online entry point: compute and render the cancellation dashboard.
//!
//! Loads the analytical dataset through the snapshot cache, applies the
//! operator-supplied filter, and renders one summary table per visual.
//! Any query or load failure aborts before the first table is printed,
//! so the operator never sees partial or stale numbers.

use anyhow::{Context, Result};
use itertools::Itertools;
use serde_json::json;

use crate::{
    aggregate::{CostBin, GroupKey, GroupSummary, cost_bins, summarize, top_n_by},
    cache::DatasetCache,
    cli::{DashboardArgs, OutputFormat},
    derive::AnalyticalRow,
    filter::FilterSpec,
    store::Store,
    table,
};

const TOP_REASONS: usize = 5;
const TOP_CATEGORIES: usize = 10;
const TOP_BRANDS: usize = 10;
const TOP_STATES: usize = 10;
const COST_HISTOGRAM_BINS: usize = 20;
// Volume floors carried over from the original analysis: states and
// risk-matrix categories below these ordered quantities are noise.
const STATE_MIN_ORDERED_QTY: f64 = 500.0;
const RISK_MIN_ORDERED_QTY: f64 = 100.0;

const NO_CANCEL: &str = "No Cancel";

pub fn execute(args: &DashboardArgs) -> Result<()> {
    let store = Store::open_read_only(&args.db)
        .with_context(|| format!("Opening database {:?}", args.db))?;
    let mut cache = DatasetCache::new();
    let dataset = cache
        .load(&args.db, &store)
        .context("Computing the analytical dataset")?;

    let spec = build_filter(args, dataset);
    let filtered = spec.apply(dataset);
    let report = Report::compute(&filtered);

    match args.format {
        OutputFormat::Table => report.print_tables(),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report.to_json())?),
    }
    Ok(())
}

fn build_filter(args: &DashboardArgs, dataset: &[AnalyticalRow]) -> FilterSpec {
    let mut spec = FilterSpec::all(dataset);
    if let Some(start) = args.start {
        spec.start = start;
    }
    if let Some(end) = args.end {
        spec.end = end;
    }
    if !args.regions.is_empty() {
        spec.regions = args.regions.iter().cloned().collect();
    }
    if !args.departments.is_empty() {
        spec.departments = args.departments.iter().cloned().collect();
    }
    if !args.reasons.is_empty() {
        spec.reasons = args.reasons.iter().cloned().collect();
    }
    spec
}

#[derive(Debug)]
pub struct Kpis {
    pub ordered_qty: f64,
    pub cancelled_qty: f64,
    pub ordered_amount: f64,
    pub cancelled_amount: f64,
}

impl Kpis {
    fn compute(rows: &[&AnalyticalRow]) -> Self {
        let mut kpis = Kpis {
            ordered_qty: 0.0,
            cancelled_qty: 0.0,
            ordered_amount: 0.0,
            cancelled_amount: 0.0,
        };
        for row in rows {
            kpis.ordered_qty += row.ordered_qty;
            kpis.cancelled_qty += row.cancelled_qty;
            kpis.ordered_amount += row.ordered_amount.unwrap_or(0.0);
            kpis.cancelled_amount += row.cancelled_amount.unwrap_or(0.0);
        }
        kpis
    }

    pub fn quantity_rate(&self) -> Option<f64> {
        (self.ordered_qty > 0.0).then(|| self.cancelled_qty / self.ordered_qty)
    }

    pub fn dollar_rate(&self) -> Option<f64> {
        (self.ordered_amount > 0.0).then(|| self.cancelled_amount / self.ordered_amount)
    }
}

/// All summary tables for one filtered view, computed before anything
/// is printed.
pub struct Report {
    pub kpis: Kpis,
    pub monthly_trend: Vec<GroupSummary>,
    pub day_of_week: Vec<GroupSummary>,
    pub reason_department: Vec<GroupSummary>,
    pub top_reasons: Vec<GroupSummary>,
    pub top_categories_by_loss: Vec<GroupSummary>,
    pub region_rates: Vec<GroupSummary>,
    pub state_drilldown: Vec<GroupSummary>,
    pub top_brands: Vec<GroupSummary>,
    pub cost_distribution: Vec<CostBin>,
    pub risk_matrix: Vec<GroupSummary>,
}

impl Report {
    pub fn compute(filtered: &[&AnalyticalRow]) -> Self {
        let cancelled_only: Vec<&AnalyticalRow> = filtered
            .iter()
            .copied()
            .filter(|row| row.cancel_reason != NO_CANCEL)
            .collect();

        let monthly_trend = summarize(filtered, GroupKey::OrderMonth)
            .into_iter()
            .sorted_by(|a, b| a.key.cmp(&b.key))
            .collect();
        let day_of_week = summarize(filtered, GroupKey::DayOfWeek)
            .into_iter()
            .sorted_by(|a, b| a.key.cmp(&b.key))
            .collect();

        let top_reasons = top_n_by(
            summarize(&cancelled_only, GroupKey::Reason),
            TOP_REASONS,
            |s| s.cancelled_qty,
        );
        let top_categories_by_loss = top_n_by(
            summarize(filtered, GroupKey::Category),
            TOP_CATEGORIES,
            |s| s.cancelled_amount,
        );

        let mut region_rates = summarize(filtered, GroupKey::Region);
        region_rates.retain(|s| s.ordered_qty > 0.0);
        let region_rates = top_n_by(region_rates, usize::MAX, |s| s.cancellation_rate);

        let mut state_drilldown = summarize(filtered, GroupKey::State);
        state_drilldown.retain(|s| s.ordered_qty > STATE_MIN_ORDERED_QTY);
        let state_drilldown = top_n_by(state_drilldown, TOP_STATES, |s| s.cancellation_rate);

        let top_brands = top_n_by(summarize(filtered, GroupKey::Brand), TOP_BRANDS, |s| {
            s.cancelled_qty
        });

        let mut risk_matrix = summarize(&cancelled_only, GroupKey::Category);
        risk_matrix.retain(|s| s.ordered_qty > RISK_MIN_ORDERED_QTY);

        Report {
            kpis: Kpis::compute(filtered),
            monthly_trend,
            day_of_week,
            reason_department: summarize(filtered, GroupKey::ReasonDepartment),
            top_reasons,
            top_categories_by_loss,
            region_rates,
            state_drilldown,
            top_brands,
            cost_distribution: cost_bins(filtered, COST_HISTOGRAM_BINS),
            risk_matrix,
        }
    }

    fn print_tables(&self) {
        println!("== Key performance indicators ==");
        let kpi_headers = vec!["metric".to_string(), "value".to_string()];
        let kpi_rows = vec![
            vec!["total ordered qty".to_string(), fmt_qty(self.kpis.ordered_qty)],
            vec![
                "total cancelled qty".to_string(),
                fmt_qty(self.kpis.cancelled_qty),
            ],
            vec![
                "total ordered $".to_string(),
                fmt_amount(self.kpis.ordered_amount),
            ],
            vec![
                "total cancelled $".to_string(),
                fmt_amount(self.kpis.cancelled_amount),
            ],
            vec![
                "overall qty cancel rate".to_string(),
                self.kpis.quantity_rate().map_or_else(na, fmt_rate),
            ],
            vec![
                "overall $ cancel rate".to_string(),
                self.kpis.dollar_rate().map_or_else(na, fmt_rate),
            ],
        ];
        table::print_table(&kpi_headers, &kpi_rows);

        print_rate_table(
            "Monthly cancellation rate trend",
            GroupKey::OrderMonth,
            &self.monthly_trend,
        );
        print_rate_table(
            "Cancellation rate by day of week",
            GroupKey::DayOfWeek,
            &self.day_of_week,
        );
        print_quantity_table(
            "Cancelled quantity by reason and department",
            GroupKey::ReasonDepartment,
            &self.reason_department,
        );
        print_quantity_table(
            "Top cancel reasons by cancelled quantity",
            GroupKey::Reason,
            &self.top_reasons,
        );
        print_amount_table(
            "Top categories by cancelled dollar amount",
            GroupKey::Category,
            &self.top_categories_by_loss,
        );
        print_rate_table(
            "Cancellation rate by region",
            GroupKey::Region,
            &self.region_rates,
        );
        print_rate_table(
            "State drilldown (rate, high-volume states)",
            GroupKey::State,
            &self.state_drilldown,
        );
        print_quantity_table(
            "Top brands by cancelled quantity",
            GroupKey::Brand,
            &self.top_brands,
        );

        println!("\n== Cancelled order count by unit cost bin ==");
        let headers = vec!["unit_cost_bin".to_string(), "cancelled_orders".to_string()];
        let rows = self
            .cost_distribution
            .iter()
            .map(|bin| {
                vec![
                    format!("{:.2} - {:.2}", bin.lower, bin.upper),
                    bin.count.to_string(),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(&headers, &rows);

        println!("\n== Category risk matrix (cancelled orders only) ==");
        let headers = vec![
            "product_category".to_string(),
            "cancellation_rate".to_string(),
            "mean_unit_cost".to_string(),
            "cancelled_qty".to_string(),
        ];
        let rows = self
            .risk_matrix
            .iter()
            .map(|s| {
                vec![
                    s.key.join("  "),
                    fmt_rate(s.cancellation_rate),
                    s.mean_unit_cost.map_or_else(na, fmt_amount),
                    fmt_qty(s.cancelled_qty),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(&headers, &rows);
    }

    fn to_json(&self) -> serde_json::Value {
        json!({
            "kpis": {
                "ordered_qty": self.kpis.ordered_qty,
                "cancelled_qty": self.kpis.cancelled_qty,
                "ordered_amount": self.kpis.ordered_amount,
                "cancelled_amount": self.kpis.cancelled_amount,
                "quantity_rate": self.kpis.quantity_rate(),
                "dollar_rate": self.kpis.dollar_rate(),
            },
            "monthly_trend": self.monthly_trend,
            "day_of_week": self.day_of_week,
            "reason_department": self.reason_department,
            "top_reasons": self.top_reasons,
            "top_categories_by_loss": self.top_categories_by_loss,
            "region_rates": self.region_rates,
            "state_drilldown": self.state_drilldown,
            "top_brands": self.top_brands,
            "cost_distribution": self.cost_distribution,
            "risk_matrix": self.risk_matrix,
        })
    }
}

fn print_rate_table(title: &str, key: GroupKey, summaries: &[GroupSummary]) {
    println!("\n== {title} ==");
    let mut headers: Vec<String> = key.column_names().iter().map(|s| s.to_string()).collect();
    headers.extend([
        "ordered_qty".to_string(),
        "cancelled_qty".to_string(),
        "cancellation_rate".to_string(),
    ]);
    let rows = summaries
        .iter()
        .map(|s| {
            let mut row = s.key.clone();
            row.extend([
                fmt_qty(s.ordered_qty),
                fmt_qty(s.cancelled_qty),
                fmt_rate(s.cancellation_rate),
            ]);
            row
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
}

fn print_quantity_table(title: &str, key: GroupKey, summaries: &[GroupSummary]) {
    println!("\n== {title} ==");
    let mut headers: Vec<String> = key.column_names().iter().map(|s| s.to_string()).collect();
    headers.push("cancelled_qty".to_string());
    let rows = summaries
        .iter()
        .map(|s| {
            let mut row = s.key.clone();
            row.push(fmt_qty(s.cancelled_qty));
            row
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
}

fn print_amount_table(title: &str, key: GroupKey, summaries: &[GroupSummary]) {
    println!("\n== {title} ==");
    let mut headers: Vec<String> = key.column_names().iter().map(|s| s.to_string()).collect();
    headers.push("cancelled_amount".to_string());
    let rows = summaries
        .iter()
        .map(|s| {
            let mut row = s.key.clone();
            row.push(fmt_amount(s.cancelled_amount));
            row
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
}

fn fmt_qty(value: f64) -> String {
    format!("{value:.0}")
}

fn fmt_amount(value: f64) -> String {
    format!("{value:.2}")
}

fn fmt_rate(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn na() -> String {
    "N/A".to_string()
}
