//! Grouped summary tables over the filtered analytical dataset.
//!
//! Groups appear in first-encountered order, which makes explicit
//! descending sorts stable with ties broken by encounter order. An
//! empty filtered input produces an empty summary, never an error.

use std::collections::HashMap;

use serde::Serialize;

use crate::derive::{AnalyticalRow, cancellation_rate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    OrderMonth,
    DayOfWeek,
    Region,
    State,
    Category,
    Brand,
    Reason,
    ReasonDepartment,
}

impl GroupKey {
    pub fn column_names(&self) -> &'static [&'static str] {
        match self {
            GroupKey::OrderMonth => &["order_month"],
            GroupKey::DayOfWeek => &["day_of_week"],
            GroupKey::Region => &["store_region"],
            GroupKey::State => &["store_state"],
            GroupKey::Category => &["product_category"],
            GroupKey::Brand => &["product_brand"],
            GroupKey::Reason => &["cancel_reason"],
            GroupKey::ReasonDepartment => &["cancel_reason", "product_department"],
        }
    }

    fn key_parts(&self, row: &AnalyticalRow) -> Vec<String> {
        match self {
            GroupKey::OrderMonth => vec![row.order_month.clone()],
            GroupKey::DayOfWeek => vec![row.day_of_week.clone()],
            GroupKey::Region => vec![row.store_region.clone()],
            GroupKey::State => vec![row.store_state.clone()],
            GroupKey::Category => vec![row.product_category.clone()],
            GroupKey::Brand => vec![row.product_brand.clone()],
            GroupKey::Reason => vec![row.cancel_reason.clone()],
            GroupKey::ReasonDepartment => {
                vec![row.cancel_reason.clone(), row.product_department.clone()]
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub key: Vec<String>,
    pub row_count: usize,
    pub ordered_qty: f64,
    pub cancelled_qty: f64,
    pub ordered_amount: f64,
    pub cancelled_amount: f64,
    pub cancellation_rate: f64,
    pub mean_unit_cost: Option<f64>,
}

#[derive(Debug, Clone, Default)]
struct Accumulator {
    row_count: usize,
    ordered_qty: f64,
    cancelled_qty: f64,
    ordered_amount: f64,
    cancelled_amount: f64,
    unit_cost_sum: f64,
    unit_cost_count: usize,
}

impl Accumulator {
    fn ingest(&mut self, row: &AnalyticalRow) {
        self.row_count += 1;
        self.ordered_qty += row.ordered_qty;
        self.cancelled_qty += row.cancelled_qty;
        if let Some(amount) = row.ordered_amount {
            self.ordered_amount += amount;
        }
        if let Some(amount) = row.cancelled_amount {
            self.cancelled_amount += amount;
        }
        if let Some(cost) = row.unit_cost {
            self.unit_cost_sum += cost;
            self.unit_cost_count += 1;
        }
    }

    fn finalize(self, key: Vec<String>) -> GroupSummary {
        // Same zero-floored-to-1 denominator as the per-row rate.
        let rate = cancellation_rate(self.cancelled_qty, self.ordered_qty);
        let mean_unit_cost = (self.unit_cost_count > 0)
            .then(|| self.unit_cost_sum / self.unit_cost_count as f64);
        GroupSummary {
            key,
            row_count: self.row_count,
            ordered_qty: self.ordered_qty,
            cancelled_qty: self.cancelled_qty,
            ordered_amount: self.ordered_amount,
            cancelled_amount: self.cancelled_amount,
            cancellation_rate: rate,
            mean_unit_cost,
        }
    }
}

pub fn summarize(rows: &[&AnalyticalRow], key: GroupKey) -> Vec<GroupSummary> {
    let mut order: Vec<Vec<String>> = Vec::new();
    let mut groups: HashMap<Vec<String>, Accumulator> = HashMap::new();
    for row in rows {
        let parts = key.key_parts(row);
        if !groups.contains_key(&parts) {
            order.push(parts.clone());
        }
        groups.entry(parts).or_default().ingest(row);
    }
    order
        .into_iter()
        .map(|parts| {
            let accumulator = groups
                .remove(&parts)
                .expect("group recorded in encounter order");
            accumulator.finalize(parts)
        })
        .collect()
}

/// One fixed-width unit-cost bin and the number of cancelled order
/// lines whose unit cost falls inside it. The upper edge is exclusive
/// except for the last bin, which absorbs the range maximum.
#[derive(Debug, Clone, Serialize)]
pub struct CostBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Bins the unit costs of cancelled rows into `bins` equal-width
/// intervals spanning the observed cost range. Rows without a unit
/// cost are skipped. A single distinct cost yields one degenerate bin.
pub fn cost_bins(rows: &[&AnalyticalRow], bins: usize) -> Vec<CostBin> {
    let costs: Vec<f64> = rows
        .iter()
        .filter(|row| row.is_cancelled())
        .filter_map(|row| row.unit_cost)
        .collect();
    let Some((&first, rest)) = costs.split_first() else {
        return Vec::new();
    };
    let (min, max) = rest.iter().fold((first, first), |(lo, hi), &cost| {
        (lo.min(cost), hi.max(cost))
    });
    if min == max || bins == 0 {
        return vec![CostBin {
            lower: min,
            upper: max,
            count: costs.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for cost in &costs {
        let idx = (((cost - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(idx, count)| CostBin {
            lower: min + width * idx as f64,
            upper: min + width * (idx + 1) as f64,
            count,
        })
        .collect()
}

/// Stable descending sort by `metric`, truncated to `n`. Ties keep the
/// first-encountered group first.
pub fn top_n_by(
    mut summaries: Vec<GroupSummary>,
    n: usize,
    metric: impl Fn(&GroupSummary) -> f64,
) -> Vec<GroupSummary> {
    summaries.sort_by(|a, b| metric(b).total_cmp(&metric(a)));
    summaries.truncate(n);
    summaries
}
