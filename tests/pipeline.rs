//! End-to-end behavior of ingest -> query -> derive -> cache.

use std::{fs, path::Path};

use cancel_metrics::{
    cache::DatasetCache,
    derive::{AnalyticalRow, derive_dataset},
    error::PipelineError,
    ingest::ingest_workbook,
    query::run_analytical_query,
    store::Store,
};
use encoding_rs::UTF_8;
use tempfile::tempdir;

fn write_workbook(dir: &Path) {
    let sheets: &[(&str, &str)] = &[
        (
            "Orders",
            "ORDER_DT,STORE_NUM,ITEM_ID,PLCD_QTY,PLCD_AMT\n\
             2024-01-05,1,100,10,100.00\n\
             2024-01-06,1,101,4,40.00\n\
             2024-02-10,2,100,5,50.00\n\
             2024-01-06,9,100,2,20.00\n",
        ),
        (
            "Cancels",
            "STORE_NUM,ITEM_ID,ORDER_DT,CANCEL_DT,CNCL_QTY,CNCL_AMT,CNCL_RSN_DESC,CNCL_RSN_SUB_DESC\n\
             1,100,2024-01-05,2024-01-07,3,30.00,Customer Request,Changed Mind\n\
             2,100,2024-02-10,2024-02-12,5,50.00,Out of Stock,Warehouse\n",
        ),
        (
            "Inventory",
            "STORE_NUM,ITEM_ID,ON_HAND_QTY\n1,100,25\n2,100,7\n",
        ),
        (
            "Store",
            "STORE_NUM,Region,State,City\n1,East,NY,New York\n2,West,CA,Los Angeles\n",
        ),
        (
            "Product",
            "ITEM_ID,PRODUCT_NAME,Department,Category,Brand,UNIT_COST\n\
             100,Widget,Home,Decor,Acme,2.50\n\
             101,Gadget,Electronics,Audio,Hum,10.00\n",
        ),
        (
            "Calendar",
            "Date,Week_#,DayofWeek\n\
             2024-01-05,1,Friday\n\
             2024-01-06,1,Saturday\n\
             2024-02-10,6,Saturday\n",
        ),
    ];
    for (name, contents) in sheets {
        fs::write(dir.join(format!("{name}.csv")), contents).expect("write sheet");
    }
}

fn dataset(db: &Path) -> Vec<AnalyticalRow> {
    let store = Store::open_read_only(db).expect("open db");
    let raw = run_analytical_query(&store).expect("query");
    derive_dataset(&raw)
}

fn find<'a>(rows: &'a [AnalyticalRow], item_id: &str) -> &'a AnalyticalRow {
    rows.iter()
        .find(|row| row.item_id == item_id)
        .expect("row present")
}

#[test]
fn cancelled_rows_carry_rate_lag_and_month() {
    let dir = tempdir().expect("temp dir");
    write_workbook(dir.path());
    let db = dir.path().join("retail.db");
    ingest_workbook(dir.path(), &db, UTF_8).expect("ingest");

    let rows = dataset(&db);
    let cancelled = rows
        .iter()
        .find(|row| row.item_id == "100" && row.store_id == "1")
        .expect("cancelled row");
    assert_eq!(cancelled.ordered_qty, 10.0);
    assert_eq!(cancelled.cancelled_qty, 3.0);
    assert!((cancelled.cancellation_rate - 0.3).abs() < 1e-9);
    assert_eq!(cancelled.lag_days, Some(2));
    assert_eq!(cancelled.order_month, "2024-01");
    assert_eq!(cancelled.cancel_reason, "Customer Request");
    assert_eq!(cancelled.store_region, "East");
    assert_eq!(cancelled.day_of_week, "Friday");
    assert!(cancelled.is_cancelled());
}

#[test]
fn uncancelled_rows_receive_left_join_defaults() {
    let dir = tempdir().expect("temp dir");
    write_workbook(dir.path());
    let db = dir.path().join("retail.db");
    ingest_workbook(dir.path(), &db, UTF_8).expect("ingest");

    let rows = dataset(&db);
    let clean = find(&rows, "101");
    assert_eq!(clean.cancelled_qty, 0.0);
    assert_eq!(clean.cancelled_amount, Some(0.0));
    assert_eq!(clean.cancel_reason, "No Cancel");
    assert_eq!(clean.cancel_subreason, "N/A");
    assert_eq!(clean.cancel_date, None);
    assert_eq!(clean.lag_days, None);
    assert_eq!(clean.cancellation_rate, 0.0);
    assert!(!clean.is_cancelled());
}

#[test]
fn orders_for_unknown_stores_are_excluded() {
    let dir = tempdir().expect("temp dir");
    write_workbook(dir.path());
    let db = dir.path().join("retail.db");
    ingest_workbook(dir.path(), &db, UTF_8).expect("ingest");

    let rows = dataset(&db);
    // Store 9 has no Store row; the mandatory join drops its order.
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.store_id != "9"));
}

#[test]
fn dropping_a_required_column_is_a_schema_error() {
    let dir = tempdir().expect("temp dir");
    write_workbook(dir.path());
    let db = dir.path().join("retail.db");
    ingest_workbook(dir.path(), &db, UTF_8).expect("ingest");

    {
        let store = Store::open(&db).expect("open writable");
        store
            .connection()
            .execute_batch("ALTER TABLE Orders DROP COLUMN PLCD_AMT")
            .expect("drop column");
    }

    let store = Store::open_read_only(&db).expect("open db");
    let err = run_analytical_query(&store).expect_err("must fail");
    assert!(matches!(
        err,
        PipelineError::MissingColumn { ref table, ref column }
            if table == "Orders" && column == "PLCD_AMT"
    ));
}

#[test]
fn dropping_a_required_table_is_a_schema_error() {
    let dir = tempdir().expect("temp dir");
    write_workbook(dir.path());
    let db = dir.path().join("retail.db");
    ingest_workbook(dir.path(), &db, UTF_8).expect("ingest");

    {
        let store = Store::open(&db).expect("open writable");
        store
            .connection()
            .execute_batch("DROP TABLE Calendar")
            .expect("drop table");
    }

    let store = Store::open_read_only(&db).expect("open db");
    let err = run_analytical_query(&store).expect_err("must fail");
    assert!(matches!(err, PipelineError::MissingTable(ref name) if name == "Calendar"));
}

#[test]
fn cache_recomputes_only_when_the_snapshot_changes() {
    let dir = tempdir().expect("temp dir");
    write_workbook(dir.path());
    let db = dir.path().join("retail.db");
    ingest_workbook(dir.path(), &db, UTF_8).expect("ingest");

    let store = Store::open_read_only(&db).expect("open db");
    let mut cache = DatasetCache::new();
    assert!(!cache.is_warm());
    let initial_len = cache.load(&db, &store).expect("first load").len();
    assert_eq!(initial_len, 3);
    assert!(cache.is_warm());
    drop(store);

    // Re-ingest with an extra cancel; the stamp changes and the next
    // load must observe the new data.
    fs::write(
        dir.path().join("Cancels.csv"),
        "STORE_NUM,ITEM_ID,ORDER_DT,CANCEL_DT,CNCL_QTY,CNCL_AMT,CNCL_RSN_DESC,CNCL_RSN_SUB_DESC\n\
         1,100,2024-01-05,2024-01-07,3,30.00,Customer Request,Changed Mind\n\
         1,101,2024-01-06,2024-01-06,1,10.00,Out of Stock,Warehouse\n",
    )
    .expect("rewrite cancels");
    ingest_workbook(dir.path(), &db, UTF_8).expect("re-ingest");

    let store = Store::open_read_only(&db).expect("reopen db");
    let rows = cache.load(&db, &store).expect("second load").to_vec();
    let updated = find(&rows, "101");
    assert_eq!(updated.cancelled_qty, 1.0);
    assert_eq!(updated.cancel_reason, "Out of Stock");

    cache.invalidate();
    assert!(!cache.is_warm());
}
