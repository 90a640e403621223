// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketbook::error::Error;
use pocketbook::models::EntryKind;
use pocketbook::store::SqliteStore;
use pocketbook::{cli, commands::ledger, db};
use rusqlite::{Connection, params};

fn setup() -> (Connection, i64) {
    let conn = db::open_in_memory().unwrap();
    let alice = SqliteStore::new(&conn).create_user("alice").unwrap().id;
    for (i, (cat, amount)) in [("Food", "12.50"), ("Rent", "900"), ("Food", "7"), ("Fun", "120")]
        .iter()
        .enumerate()
    {
        conn.execute(
            "INSERT INTO expenses(user_id, category, amount, expense_date, notes) VALUES (?1, ?2, ?3, ?4, NULL)",
            params![alice, cat, amount, format!("2025-01-0{}", i + 1)],
        )
        .unwrap();
    }
    (conn, alice)
}

fn run(conn: &Connection, owner: i64, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["pocketbook"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("expense", sub)) => ledger::handle(conn, owner, EntryKind::Expense, sub),
        Some(("income", sub)) => ledger::handle(conn, owner, EntryKind::Income, sub),
        _ => panic!("no ledger subcommand"),
    }
}

fn list(conn: &Connection, owner: i64, args: &[&str]) -> Vec<String> {
    let mut argv = vec!["pocketbook", "expense", "list"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("expense", exp)) = matches.subcommand() {
        if let Some(("list", list_m)) = exp.subcommand() {
            return ledger::query_rows(conn, owner, EntryKind::Expense, list_m)
                .unwrap()
                .iter()
                .map(|e| e.date().to_string())
                .collect();
        }
    }
    panic!("no expense list subcommand");
}

#[test]
fn list_is_newest_first_and_paged() {
    let (conn, alice) = setup();
    assert_eq!(
        list(&conn, alice, &[]),
        vec!["2025-01-04", "2025-01-03", "2025-01-02", "2025-01-01"]
    );
    assert_eq!(
        list(&conn, alice, &["--per-page", "3", "--page", "2"]),
        vec!["2025-01-01"]
    );
}

#[test]
fn list_filters_combine() {
    let (conn, alice) = setup();
    assert_eq!(
        list(&conn, alice, &["--category", "Food"]),
        vec!["2025-01-03", "2025-01-01"]
    );
    assert_eq!(list(&conn, alice, &["--category", "all"]).len(), 4);
    assert_eq!(
        list(&conn, alice, &["--from", "2025-01-02", "--to", "2025-01-03"]),
        vec!["2025-01-03", "2025-01-02"]
    );
    assert_eq!(
        list(&conn, alice, &["--amount-search", "12"]),
        vec!["2025-01-04", "2025-01-01"]
    );
}

#[test]
fn list_hides_other_users_rows() {
    let (conn, _) = setup();
    let bob = SqliteStore::new(&conn).create_user("bob").unwrap().id;
    assert!(list(&conn, bob, &[]).is_empty());
}

#[test]
fn add_validates_input() {
    let (conn, alice) = setup();

    let err = run(&conn, alice, &[
        "expense", "add", "--date", "2025-01-05", "--category", "Food", "--amount", "0",
    ])
    .unwrap_err();
    assert!(err.to_string().contains("Amount must be between 1"));

    let err = run(&conn, alice, &[
        "expense", "add", "--date", "2999-01-01", "--category", "Food", "--amount", "5",
    ])
    .unwrap_err();
    assert!(err.to_string().contains("in the future"));

    let err = run(&conn, alice, &[
        "income", "add", "--date", "2025-01-05", "--source", "  ", "--amount", "5",
    ])
    .unwrap_err();
    assert!(err.to_string().contains("Source is required"));

    run(&conn, alice, &[
        "income", "add", "--date", "2025-01-05", "--source", "Salary", "--amount", "2500.75",
        "--notes", "January",
    ])
    .unwrap();
    let incomes = SqliteStore::new(&conn)
        .query_entries(EntryKind::Income, alice, &Default::default())
        .unwrap();
    assert_eq!(incomes.len(), 1);
    assert_eq!(incomes[0].label(), "Salary");
    assert_eq!(incomes[0].amount().to_string(), "2500.75");
    assert_eq!(incomes[0].notes(), Some("January"));
}

#[test]
fn edit_and_delete_are_owner_scoped() {
    let (conn, alice) = setup();
    let bob = SqliteStore::new(&conn).create_user("bob").unwrap().id;
    let id: i64 = conn
        .query_row("SELECT id FROM expenses WHERE category='Rent'", [], |r| r.get(0))
        .unwrap();

    let err = run(&conn, bob, &["expense", "rm", &id.to_string()]).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Forbidden(_))));

    run(&conn, alice, &[
        "expense", "edit", &id.to_string(), "--amount", "950", "--notes", "raised",
    ])
    .unwrap();
    let entry = SqliteStore::new(&conn)
        .get_entry(EntryKind::Expense, alice, id)
        .unwrap();
    assert_eq!(entry.amount().to_string(), "950");
    assert_eq!(entry.notes(), Some("raised"));
    assert_eq!(entry.label(), "Rent");

    run(&conn, alice, &["expense", "edit", &id.to_string(), "--clear-notes"]).unwrap();
    let entry = SqliteStore::new(&conn)
        .get_entry(EntryKind::Expense, alice, id)
        .unwrap();
    assert_eq!(entry.notes(), None);

    run(&conn, alice, &["expense", "rm", &id.to_string()]).unwrap();
    let err = SqliteStore::new(&conn)
        .get_entry(EntryKind::Expense, alice, id)
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn distinct_categories_are_sorted() {
    let (conn, alice) = setup();
    let labels = SqliteStore::new(&conn)
        .distinct_labels(EntryKind::Expense, alice)
        .unwrap();
    assert_eq!(labels, vec!["Food", "Fun", "Rent"]);
}

#[test]
fn corrupt_amount_is_reported() {
    let (conn, alice) = setup();
    conn.execute("UPDATE expenses SET amount='abc' WHERE category='Fun'", [])
        .unwrap();
    let err = SqliteStore::new(&conn)
        .query_entries(EntryKind::Expense, alice, &Default::default())
        .unwrap_err();
    assert!(matches!(err, Error::CorruptData(_)));
}

#[test]
fn huge_page_is_rejected() {
    let (conn, alice) = setup();
    let page = usize::MAX.to_string();
    let matches = cli::build_cli().get_matches_from([
        "pocketbook",
        "expense",
        "list",
        "--page",
        page.as_str(),
    ]);
    let Some(("expense", exp)) = matches.subcommand() else {
        panic!("no expense subcommand");
    };
    let Some(("list", list_m)) = exp.subcommand() else {
        panic!("no list subcommand");
    };
    let err = ledger::query_rows(&conn, alice, EntryKind::Expense, list_m).unwrap_err();
    assert!(err.to_string().contains("out of range"));
}
