// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketbook::commands::dashboard;
use pocketbook::store::SqliteStore;
use pocketbook::{cli, db, utils};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn setup() -> (Connection, i64) {
    let conn = db::open_in_memory().unwrap();
    let alice = SqliteStore::new(&conn).create_user("alice").unwrap().id;
    let expenses = [
        ("Food", "30", "2025-07-02"),
        ("Rent", "800", "2025-07-01"),
        ("Food", "20.5", "2025-07-20"),
        ("Travel", "400", "2025-06-28"),
        ("Fun", "15", "2025-08-01"),
        ("Fun", "5", "2025-07-31"),
    ];
    for (cat, amount, date) in expenses {
        conn.execute(
            "INSERT INTO expenses(user_id, category, amount, expense_date) VALUES (?1, ?2, ?3, ?4)",
            params![alice, cat, amount, date],
        )
        .unwrap();
    }
    conn.execute(
        "INSERT INTO incomes(user_id, source, amount, income_date) VALUES (?1, 'Salary', '2000', '2025-07-25')",
        params![alice],
    )
    .unwrap();
    (conn, alice)
}

#[test]
fn month_totals_and_breakdown() {
    let (conn, alice) = setup();
    let (first, last) = utils::parse_month("2025-07").unwrap();
    let s = dashboard::monthly_summary(&conn, alice, first, last).unwrap();

    assert_eq!(s.month, "2025-07");
    assert_eq!(s.total_income, Decimal::from(2000));
    assert_eq!(s.total_expenses.to_string(), "855.5");
    assert_eq!(s.net_balance.to_string(), "1144.5");

    let cats: Vec<(&str, String)> = s
        .expense_by_category
        .iter()
        .map(|c| (c.category.as_str(), c.total.to_string()))
        .collect();
    assert_eq!(
        cats,
        vec![
            ("Rent", "800".to_string()),
            ("Food", "50.5".to_string()),
            ("Fun", "5".to_string())
        ]
    );
}

#[test]
fn recent_expenses_span_all_months() {
    let (conn, alice) = setup();
    let (first, last) = utils::parse_month("2025-07").unwrap();
    let s = dashboard::monthly_summary(&conn, alice, first, last).unwrap();

    let dates: Vec<String> = s.recent_expenses.iter().map(|e| e.date().to_string()).collect();
    assert_eq!(
        dates,
        vec!["2025-08-01", "2025-07-31", "2025-07-20", "2025-07-02", "2025-07-01"]
    );
}

#[test]
fn empty_month_is_all_zero() {
    let (conn, alice) = setup();
    let (first, last) = utils::parse_month("2024-02").unwrap();
    assert_eq!(last.to_string(), "2024-02-29");
    let s = dashboard::monthly_summary(&conn, alice, first, last).unwrap();
    assert_eq!(s.total_income, Decimal::ZERO);
    assert_eq!(s.net_balance, Decimal::ZERO);
    assert!(s.expense_by_category.is_empty());
}

#[test]
fn dashboard_command_rejects_bad_month() {
    let (conn, alice) = setup();
    let matches =
        cli::build_cli().get_matches_from(["pocketbook", "dashboard", "--month", "2025-13"]);
    if let Some(("dashboard", sub)) = matches.subcommand() {
        let err = dashboard::handle(&conn, alice, sub).unwrap_err();
        assert!(err.to_string().contains("Invalid month"));
    } else {
        panic!("no dashboard subcommand");
    }
}
