use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::{boolean::PredicateBooleanExt, str::contains};
use tempfile::tempdir;

fn write_workbook(dir: &Path) {
    let sheets: &[(&str, &str)] = &[
        (
            "Orders",
            "ORDER_DT,STORE_NUM,ITEM_ID,PLCD_QTY,PLCD_AMT\n\
             2024-01-05,1,100,10,100.00\n\
             2024-01-06,1,101,4,40.00\n\
             2024-02-10,2,100,5,50.00\n",
        ),
        (
            "Cancels",
            "STORE_NUM,ITEM_ID,ORDER_DT,CANCEL_DT,CNCL_QTY,CNCL_AMT,CNCL_RSN_DESC,CNCL_RSN_SUB_DESC\n\
             1,100,2024-01-05,2024-01-07,3,30.00,Customer Request,Changed Mind\n",
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

fn binary() -> Command {
    Command::cargo_bin("cancel-metrics").expect("binary exists")
}

#[test]
fn load_then_dashboard_renders_summary_tables() {
    let dir = tempdir().expect("temp dir");
    write_workbook(dir.path());
    let db = dir.path().join("retail.db");

    binary()
        .args([
            "load",
            "-s",
            dir.path().to_str().unwrap(),
            "-d",
            db.to_str().unwrap(),
        ])
        .assert()
        .success();

    binary()
        .args(["dashboard", "-d", db.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Key performance indicators"))
        .stdout(contains("Monthly cancellation rate trend"))
        .stdout(contains("Cancelled order count by unit cost bin"))
        .stdout(contains("Category risk matrix"))
        .stdout(contains("Customer Request"));
}

#[test]
fn dashboard_emits_json_when_requested() {
    let dir = tempdir().expect("temp dir");
    write_workbook(dir.path());
    let db = dir.path().join("retail.db");

    binary()
        .args([
            "load",
            "-s",
            dir.path().to_str().unwrap(),
            "-d",
            db.to_str().unwrap(),
        ])
        .assert()
        .success();

    binary()
        .args(["dashboard", "-d", db.to_str().unwrap(), "--format", "json"])
        .assert()
        .success()
        .stdout(contains("\"kpis\""))
        .stdout(contains("\"monthly_trend\""))
        .stdout(contains("\"cost_distribution\""));
}

#[test]
fn dashboard_filters_restrict_the_dataset() {
    let dir = tempdir().expect("temp dir");
    write_workbook(dir.path());
    let db = dir.path().join("retail.db");

    binary()
        .args([
            "load",
            "-s",
            dir.path().to_str().unwrap(),
            "-d",
            db.to_str().unwrap(),
        ])
        .assert()
        .success();

    // Restricting to the West region leaves only the uncancelled
    // February order; the cancelled January reason disappears.
    binary()
        .args([
            "dashboard",
            "-d",
            db.to_str().unwrap(),
            "--region",
            "West",
            "--format",
            "json",
        ])
        .assert()
        .success()
        .stdout(contains("Customer Request").not());
}

#[test]
fn schema_prints_stored_table_layouts() {
    let dir = tempdir().expect("temp dir");
    write_workbook(dir.path());
    let db = dir.path().join("retail.db");

    binary()
        .args([
            "load",
            "-s",
            dir.path().to_str().unwrap(),
            "-d",
            db.to_str().unwrap(),
        ])
        .assert()
        .success();

    binary()
        .args(["schema", "-d", db.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("== Orders =="))
        .stdout(contains("ORDER_DT"))
        .stdout(contains("Week_#"));
}

#[test]
fn load_reports_a_missing_source_directory() {
    let dir = tempdir().expect("temp dir");
    let missing = dir.path().join("nowhere");
    let db = dir.path().join("retail.db");

    binary()
        .args([
            "load",
            "-s",
            missing.to_str().unwrap(),
            "-d",
            db.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("source workbook not found"));
}

#[test]
fn dashboard_reports_a_missing_database() {
    let dir = tempdir().expect("temp dir");
    let db = dir.path().join("absent.db");

    binary()
        .args(["dashboard", "-d", db.to_str().unwrap()])
        .assert()
        .failure();
}
