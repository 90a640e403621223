// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use pocketbook::history::{self, HistoryRow};
use pocketbook::models::{EntryKind, Expense, Income, NewEntry};
use pocketbook::store::SqliteStore;
use pocketbook::{cli, commands, db};
use rust_decimal::Decimal;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn at(date: NaiveDate, h: u32, min: u32) -> NaiveDateTime {
    date.and_hms_opt(h, min, 0).unwrap()
}

fn expense(id: i64, category: &str, amount: i64, date: NaiveDate, created: NaiveDateTime) -> Expense {
    Expense {
        id,
        user_id: 1,
        category: category.into(),
        amount: Decimal::from(amount),
        expense_date: date,
        notes: None,
        created_at: created,
        seq: id,
    }
}

fn income(id: i64, source: &str, amount: i64, date: NaiveDate, created: NaiveDateTime) -> Income {
    Income {
        id,
        user_id: 1,
        source: source.into(),
        amount: Decimal::from(amount),
        income_date: date,
        notes: None,
        created_at: created,
        seq: id,
    }
}

fn balances(rows: &[HistoryRow]) -> Vec<Decimal> {
    rows.iter().map(|r| r.running_balance).collect()
}

#[test]
fn running_balance_is_chronological_and_displayed_newest_first() {
    let rows = history::aggregate(
        vec![
            expense(1, "Food", 300, d(2025, 1, 2), at(d(2025, 1, 2), 9, 0)),
            expense(2, "Transport", 200, d(2025, 1, 3), at(d(2025, 1, 3), 9, 0)),
        ],
        vec![income(1, "Salary", 1000, d(2025, 1, 1), at(d(2025, 1, 1), 9, 0))],
    );

    assert_eq!(
        balances(&rows),
        vec![Decimal::from(500), Decimal::from(700), Decimal::from(1000)]
    );
    assert_eq!(rows[0].label, "Transport");
    assert_eq!(rows[0].kind, EntryKind::Expense);
    assert_eq!(rows[2].label, "Salary");
    assert_eq!(rows[2].kind, EntryKind::Income);
}

#[test]
fn final_balance_equals_income_minus_expenses() {
    let day = d(2025, 2, 1);
    let expenses: Vec<Expense> = (1..=7)
        .map(|i| expense(i, "Misc", 13 * i, d(2025, 2, i as u32), at(day, 8, 0)))
        .collect();
    let incomes: Vec<Income> = (1..=4)
        .map(|i| income(i, "Gig", 50 * i, d(2025, 2, 2 * i as u32), at(day, 8, 0)))
        .collect();

    let total_in: Decimal = incomes.iter().map(|i| i.amount).sum();
    let total_out: Decimal = expenses.iter().map(|e| e.amount).sum();
    let rows = history::aggregate(expenses, incomes);

    assert_eq!(rows.len(), 11);
    assert_eq!(rows[0].running_balance, total_in - total_out);
}

#[test]
fn entry_date_orders_before_creation_time() {
    // Backdated expense recorded after the income still sorts by its date.
    let rows = history::aggregate(
        vec![expense(1, "Late entry", 40, d(2025, 3, 1), at(d(2025, 3, 10), 20, 0))],
        vec![income(1, "Refund", 100, d(2025, 3, 5), at(d(2025, 3, 5), 8, 0))],
    );

    assert_eq!(rows[1].label, "Late entry");
    assert_eq!(rows[1].running_balance, Decimal::from(-40));
    assert_eq!(rows[0].running_balance, Decimal::from(60));
}

#[test]
fn same_date_ties_break_on_creation_order() {
    let day = d(2025, 4, 1);
    let rows = history::aggregate(
        vec![expense(1, "Coffee", 5, day, at(day, 10, 30))],
        vec![income(1, "Allowance", 50, day, at(day, 9, 0))],
    );

    // Ascending: Allowance (09:00) then Coffee (10:30); displayed reversed.
    assert_eq!(rows[0].label, "Coffee");
    assert_eq!(rows[0].running_balance, Decimal::from(45));
    assert_eq!(rows[1].label, "Allowance");
    assert_eq!(rows[1].running_balance, Decimal::from(50));
}

#[test]
fn identical_timestamps_fall_back_to_recording_order() {
    let day = d(2025, 3, 5);
    let mut salary = income(1, "Salary", 1000, day, at(day, 9, 0));
    salary.seq = 1;
    let mut rent = expense(1, "Rent", 300, day, at(day, 9, 0));
    rent.seq = 2;

    let rows = history::aggregate(vec![rent], vec![salary]);

    assert_eq!(rows[0].label, "Rent");
    assert_eq!(rows[0].running_balance, Decimal::from(700));
    assert_eq!(rows[1].label, "Salary");
    assert_eq!(rows[1].running_balance, Decimal::from(1000));
}

#[test]
fn empty_ledgers_give_empty_history() {
    assert!(history::aggregate(Vec::new(), Vec::new()).is_empty());
}

fn seed(conn: &rusqlite::Connection, user_id: i64, kind: EntryKind, label: &str, amount: i64, date: NaiveDate) {
    SqliteStore::new(conn)
        .insert_entry(&NewEntry {
            user_id,
            kind,
            label: label.into(),
            amount: Decimal::from(amount),
            date,
            notes: None,
        })
        .unwrap();
}

#[test]
fn store_history_is_owner_scoped_and_repeatable() {
    let conn = db::open_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let alice = store.create_user("alice").unwrap().id;
    let bob = store.create_user("bob").unwrap().id;

    seed(&conn, alice, EntryKind::Income, "Salary", 1000, d(2025, 1, 1));
    seed(&conn, alice, EntryKind::Expense, "Rent", 300, d(2025, 1, 2));
    seed(&conn, bob, EntryKind::Expense, "Rent", 9999, d(2025, 1, 2));

    let first = history::for_owner(&store, alice).unwrap();
    let second = history::for_owner(&store, alice).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].running_balance, Decimal::from(700));

    let bobs = history::for_owner(&store, bob).unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].running_balance, Decimal::from(-9999));
}

#[test]
fn same_day_store_entries_keep_insertion_order() {
    let conn = db::open_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let alice = store.create_user("alice").unwrap().id;
    let day = d(2025, 6, 6);
    seed(&conn, alice, EntryKind::Expense, "First", 10, day);
    seed(&conn, alice, EntryKind::Expense, "Second", 20, day);
    seed(&conn, alice, EntryKind::Expense, "Third", 30, day);

    let rows = history::for_owner(&store, alice).unwrap();
    let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["Third", "Second", "First"]);
    assert_eq!(balances(&rows), vec![
        Decimal::from(-60),
        Decimal::from(-30),
        Decimal::from(-10)
    ]);
}

#[test]
fn income_recorded_first_stays_older_on_timestamp_collision() {
    let conn = db::open_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let alice = store.create_user("alice").unwrap().id;
    conn.execute(
        "INSERT INTO incomes(user_id, source, amount, income_date, created_at)
         VALUES (?1, 'Salary', '1000', '2025-03-05', '2025-03-05 09:00:00.000')",
        [alice],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO expenses(user_id, category, amount, expense_date, created_at)
         VALUES (?1, 'Rent', '300', '2025-03-05', '2025-03-05 09:00:00.000')",
        [alice],
    )
    .unwrap();

    let rows = history::for_owner(&store, alice).unwrap();
    let view: Vec<(&str, Decimal)> = rows
        .iter()
        .map(|r| (r.label.as_str(), r.running_balance))
        .collect();
    assert_eq!(view, vec![
        ("Rent", Decimal::from(700)),
        ("Salary", Decimal::from(1000))
    ]);
}

#[test]
fn read_failure_surfaces_to_caller() {
    let conn = db::open_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let alice = store.create_user("alice").unwrap().id;
    conn.execute_batch("DROP TABLE incomes").unwrap();

    assert!(history::for_owner(&store, alice).is_err());
}

#[test]
fn history_command_limits_display() {
    let conn = db::open_in_memory().unwrap();
    let alice = SqliteStore::new(&conn).create_user("alice").unwrap().id;
    seed(&conn, alice, EntryKind::Income, "Salary", 1000, d(2025, 1, 1));
    seed(&conn, alice, EntryKind::Expense, "Rent", 300, d(2025, 1, 2));

    let matches =
        cli::build_cli().get_matches_from(["pocketbook", "history", "--limit", "1", "--json"]);
    if let Some(("history", sub)) = matches.subcommand() {
        commands::history::handle(&conn, alice, sub).unwrap();
    } else {
        panic!("no history subcommand");
    }
}
