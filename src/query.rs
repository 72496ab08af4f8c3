//! The analytical query: one fixed five-table join.
//!
//! Produces exactly one row per Order row that satisfies the mandatory
//! Store/Product/Calendar joins, left-extended with Cancel fields.
//! Cancelled quantity and amount default to 0, reason to "No Cancel",
//! and sub-reason to "N/A" when no cancel record exists. Physical
//! column names are renamed in the SELECT to the documented output
//! schema, so every downstream consumer sees a fixed column list.
//!
//! Before the join runs, the required tables and columns are validated
//! against the live database so schema drift surfaces as a specific
//! missing identifier instead of an opaque SQLite error.

use rusqlite::types::ValueRef;

use crate::{error::PipelineError, store::Store};

const ANALYTICAL_SQL: &str = "\
SELECT
    O.ORDER_DT                               AS order_date,
    O.STORE_NUM                              AS store_id,
    O.ITEM_ID                                AS item_id,
    O.PLCD_QTY                               AS ordered_qty,
    O.PLCD_AMT                               AS ordered_amount,
    COALESCE(C.CNCL_QTY, 0)                  AS cancelled_qty,
    COALESCE(C.CNCL_AMT, 0)                  AS cancelled_amount,
    C.CANCEL_DT                              AS cancel_date,
    COALESCE(C.CNCL_RSN_DESC, 'No Cancel')   AS cancel_reason,
    COALESCE(C.CNCL_RSN_SUB_DESC, 'N/A')     AS cancel_subreason,
    S.Region                                 AS store_region,
    S.State                                  AS store_state,
    S.City                                   AS store_city,
    P.PRODUCT_NAME                           AS product_name,
    P.Department                             AS product_department,
    P.Category                               AS product_category,
    P.Brand                                  AS product_brand,
    P.UNIT_COST                              AS unit_cost,
    CAL.\"Week_#\"                           AS week_number,
    CAL.DayofWeek                            AS day_of_week
FROM Orders AS O
LEFT JOIN Cancels AS C
    ON O.STORE_NUM = C.STORE_NUM
    AND O.ITEM_ID = C.ITEM_ID
    AND O.ORDER_DT = C.ORDER_DT
JOIN Store AS S
    ON O.STORE_NUM = S.STORE_NUM
JOIN Product AS P
    ON O.ITEM_ID = P.ITEM_ID
JOIN Calendar AS CAL
    ON O.ORDER_DT = CAL.Date";

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (
        "Orders",
        &["ORDER_DT", "STORE_NUM", "ITEM_ID", "PLCD_QTY", "PLCD_AMT"],
    ),
    (
        "Cancels",
        &[
            "STORE_NUM",
            "ITEM_ID",
            "ORDER_DT",
            "CANCEL_DT",
            "CNCL_QTY",
            "CNCL_AMT",
            "CNCL_RSN_DESC",
            "CNCL_RSN_SUB_DESC",
        ],
    ),
    ("Store", &["STORE_NUM", "Region", "State", "City"]),
    (
        "Product",
        &[
            "ITEM_ID",
            "PRODUCT_NAME",
            "Department",
            "Category",
            "Brand",
            "UNIT_COST",
        ],
    ),
    ("Calendar", &["Date", "Week_#", "DayofWeek"]),
];

/// One undenatured row from the analytical join. Every field is kept as
/// an optional string; numeric and date coercion (and the drop policy
/// that goes with it) belongs to the derivation layer.
#[derive(Debug, Clone, Default)]
pub struct RawAnalyticalRow {
    pub order_date: Option<String>,
    pub store_id: Option<String>,
    pub item_id: Option<String>,
    pub ordered_qty: Option<String>,
    pub ordered_amount: Option<String>,
    pub cancelled_qty: Option<String>,
    pub cancelled_amount: Option<String>,
    pub cancel_date: Option<String>,
    pub cancel_reason: Option<String>,
    pub cancel_subreason: Option<String>,
    pub store_region: Option<String>,
    pub store_state: Option<String>,
    pub store_city: Option<String>,
    pub product_name: Option<String>,
    pub product_department: Option<String>,
    pub product_category: Option<String>,
    pub product_brand: Option<String>,
    pub unit_cost: Option<String>,
    pub week_number: Option<String>,
    pub day_of_week: Option<String>,
}

pub fn validate_store_schema(store: &Store) -> Result<(), PipelineError> {
    for (table, required) in REQUIRED_COLUMNS {
        if !store.table_exists(table)? {
            return Err(PipelineError::MissingTable(table.to_string()));
        }
        let present = store.table_columns(table)?;
        for column in *required {
            // SQLite identifiers are case-insensitive.
            if !present
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case(column))
            {
                return Err(PipelineError::MissingColumn {
                    table: table.to_string(),
                    column: column.to_string(),
                });
            }
        }
    }
    Ok(())
}

pub fn run_analytical_query(store: &Store) -> Result<Vec<RawAnalyticalRow>, PipelineError> {
    validate_store_schema(store)?;

    let mut statement = store.connection().prepare(ANALYTICAL_SQL)?;
    let rows = statement
        .query_map([], |row| {
            Ok(RawAnalyticalRow {
                order_date: cell_text(row.get_ref(0)?),
                store_id: cell_text(row.get_ref(1)?),
                item_id: cell_text(row.get_ref(2)?),
                ordered_qty: cell_text(row.get_ref(3)?),
                ordered_amount: cell_text(row.get_ref(4)?),
                cancelled_qty: cell_text(row.get_ref(5)?),
                cancelled_amount: cell_text(row.get_ref(6)?),
                cancel_date: cell_text(row.get_ref(7)?),
                cancel_reason: cell_text(row.get_ref(8)?),
                cancel_subreason: cell_text(row.get_ref(9)?),
                store_region: cell_text(row.get_ref(10)?),
                store_state: cell_text(row.get_ref(11)?),
                store_city: cell_text(row.get_ref(12)?),
                product_name: cell_text(row.get_ref(13)?),
                product_department: cell_text(row.get_ref(14)?),
                product_category: cell_text(row.get_ref(15)?),
                product_brand: cell_text(row.get_ref(16)?),
                unit_cost: cell_text(row.get_ref(17)?),
                week_number: cell_text(row.get_ref(18)?),
                day_of_week: cell_text(row.get_ref(19)?),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn cell_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => None,
    }
}
