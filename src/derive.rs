//! Metric derivation: raw query rows -> the typed analytical dataset.
//!
//! Coercion policy: rows whose ordered or cancelled quantity (or
//! order date) fails to parse are dropped, and the drop count is
//! logged. Dollar amounts and unit cost that fail to parse become
//! absent without dropping the row. The output guarantees no missing
//! ordered_qty, cancelled_qty, order_date, or order_month.

use chrono::NaiveDate;
use log::warn;

use crate::{
    data::{parse_f64, parse_naive_date},
    query::RawAnalyticalRow,
};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticalRow {
    pub order_date: NaiveDate,
    pub store_id: String,
    pub item_id: String,
    pub ordered_qty: f64,
    pub ordered_amount: Option<f64>,
    pub cancelled_qty: f64,
    pub cancelled_amount: Option<f64>,
    pub cancel_date: Option<NaiveDate>,
    pub cancel_reason: String,
    pub cancel_subreason: String,
    pub store_region: String,
    pub store_state: String,
    pub store_city: String,
    pub product_name: String,
    pub product_department: String,
    pub product_category: String,
    pub product_brand: String,
    pub unit_cost: Option<f64>,
    pub week_number: Option<String>,
    pub day_of_week: String,
    pub cancellation_rate: f64,
    pub order_month: String,
    pub lag_days: Option<i64>,
}

impl AnalyticalRow {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled_qty > 0.0
    }
}

/// Divides cancelled by ordered quantity with the denominator treated
/// as 1 when ordered is exactly 0. This inflates the rate for
/// zero-ordered rows to equal the cancelled quantity; the approximation
/// is part of the dataset's contract and downstream numbers depend on
/// it.
pub fn cancellation_rate(cancelled_qty: f64, ordered_qty: f64) -> f64 {
    let denominator = if ordered_qty == 0.0 { 1.0 } else { ordered_qty };
    cancelled_qty / denominator
}

pub fn derive_dataset(raw_rows: &[RawAnalyticalRow]) -> Vec<AnalyticalRow> {
    let mut dataset = Vec::with_capacity(raw_rows.len());
    let mut dropped = 0usize;
    for raw in raw_rows {
        match derive_row(raw) {
            Some(row) => dataset.push(row),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!("Dropped {dropped} row(s) failing quantity or order-date coercion");
    }
    dataset
}

fn derive_row(raw: &RawAnalyticalRow) -> Option<AnalyticalRow> {
    let ordered_qty = parse_f64(raw.ordered_qty.as_deref()?).ok()?;
    let cancelled_qty = parse_f64(raw.cancelled_qty.as_deref()?).ok()?;
    let order_date = parse_naive_date(raw.order_date.as_deref()?).ok()?;

    // An unparseable cancel date is expected on uncancelled rows and
    // never drops the row.
    let cancel_date = raw
        .cancel_date
        .as_deref()
        .and_then(|value| parse_naive_date(value).ok());
    let lag_days = cancel_date.map(|cancelled| (cancelled - order_date).num_days().max(0));

    Some(AnalyticalRow {
        order_date,
        store_id: text_or_empty(&raw.store_id),
        item_id: text_or_empty(&raw.item_id),
        ordered_qty,
        ordered_amount: optional_f64(&raw.ordered_amount),
        cancelled_qty,
        cancelled_amount: optional_f64(&raw.cancelled_amount),
        cancel_date,
        cancel_reason: text_or_empty(&raw.cancel_reason),
        cancel_subreason: text_or_empty(&raw.cancel_subreason),
        store_region: text_or_empty(&raw.store_region),
        store_state: text_or_empty(&raw.store_state),
        store_city: text_or_empty(&raw.store_city),
        product_name: text_or_empty(&raw.product_name),
        product_department: text_or_empty(&raw.product_department),
        product_category: text_or_empty(&raw.product_category),
        product_brand: text_or_empty(&raw.product_brand),
        unit_cost: optional_f64(&raw.unit_cost),
        week_number: raw.week_number.clone(),
        day_of_week: text_or_empty(&raw.day_of_week),
        cancellation_rate: cancellation_rate(cancelled_qty, ordered_qty),
        order_month: order_date.format("%Y-%m").to_string(),
        lag_days,
    })
}

fn text_or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn optional_f64(value: &Option<String>) -> Option<f64> {
    value.as_deref().and_then(|raw| parse_f64(raw).ok())
}
