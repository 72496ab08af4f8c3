//! Filter contract consumed by every dashboard visual.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::derive::AnalyticalRow;

/// A date range inclusive on both ends plus allowed-value sets for
/// region, department, and cancel reason. A row is retained iff it
/// passes all four predicates. An empty allowed set legitimately
/// selects nothing.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub regions: BTreeSet<String>,
    pub departments: BTreeSet<String>,
    pub reasons: BTreeSet<String>,
}

impl FilterSpec {
    /// The default filter: full observed date range and every observed
    /// value for each selection set.
    pub fn all(rows: &[AnalyticalRow]) -> Self {
        let start = rows
            .iter()
            .map(|r| r.order_date)
            .min()
            .unwrap_or(NaiveDate::MIN);
        let end = rows
            .iter()
            .map(|r| r.order_date)
            .max()
            .unwrap_or(NaiveDate::MAX);
        Self {
            start,
            end,
            regions: rows.iter().map(|r| r.store_region.clone()).collect(),
            departments: rows.iter().map(|r| r.product_department.clone()).collect(),
            reasons: rows.iter().map(|r| r.cancel_reason.clone()).collect(),
        }
    }

    pub fn matches(&self, row: &AnalyticalRow) -> bool {
        row.order_date >= self.start
            && row.order_date <= self.end
            && self.regions.contains(&row.store_region)
            && self.departments.contains(&row.product_department)
            && self.reasons.contains(&row.cancel_reason)
    }

    pub fn apply<'a>(&self, rows: &'a [AnalyticalRow]) -> Vec<&'a AnalyticalRow> {
        rows.iter().filter(|row| self.matches(row)).collect()
    }
}
