// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{EntryKind, NewRecurring, RecurringDefinition};
use crate::recurring::{self, Outcome, RunSummary, SkipReason};
use crate::store::{RecurringPatch, SqliteStore};
use crate::utils::{
    fmt_money, get_currency_symbol, maybe_print_json, owner_id, parse_date, parse_decimal,
    parse_id, pretty_table, required, today, validate_amount, validate_day_of_month,
    validate_label, validate_notes,
};
use anyhow::Result;
use rusqlite::Connection;

/// `run` is the daily batch over every owner; all other subcommands act on
/// the definitions of the acting user.
pub fn handle(conn: &Connection, user: Option<&str>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("run", sub)) => run(conn, sub),
        Some((name, sub)) => {
            let owner = owner_id(conn, user)?;
            manage(conn, owner, name, sub)
        }
        None => Ok(()),
    }
}

fn manage(conn: &Connection, owner: i64, name: &str, sub: &clap::ArgMatches) -> Result<()> {
    let store = SqliteStore::new(conn);
    match name {
        "add" => {
            let kind = required(sub, "type")?.parse::<EntryKind>()?;
            let new = NewRecurring {
                user_id: owner,
                kind,
                category: validate_label("Category", required(sub, "category")?)?,
                amount: validate_amount(parse_decimal(required(sub, "amount")?)?)?,
                day_of_month: validate_day_of_month(
                    sub.get_one::<u32>("day").copied().unwrap_or(0),
                )?,
                notes: validate_notes(sub.get_one::<String>("notes").map(String::as_str))?,
            };
            let def = store.insert_recurring(&new)?;
            println!(
                "Added recurring {} {}: {} on day {}",
                def.kind, def.id, def.category, def.day_of_month
            );
        }
        "list" => {
            let defs = store.list_recurring(owner)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &defs)? {
                let symbol = get_currency_symbol(conn)?;
                let rows = defs.iter().map(|d| definition_row(d, &symbol)).collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Type", "Category", "Amount", "Day", "Active", "Last run", "Notes"],
                        rows,
                    )
                );
            }
        }
        "show" => {
            let id = parse_id(required(sub, "id")?)?;
            let def = store.get_owned_recurring(owner, id)?;
            println!("{}", serde_json::to_string_pretty(&def)?);
        }
        "edit" => {
            let id = parse_id(required(sub, "id")?)?;
            let patch = RecurringPatch {
                kind: sub
                    .get_one::<String>("type")
                    .map(|t| t.parse::<EntryKind>())
                    .transpose()?,
                category: sub
                    .get_one::<String>("category")
                    .map(|c| validate_label("Category", c))
                    .transpose()?,
                amount: match sub.get_one::<String>("amount") {
                    Some(a) => Some(validate_amount(parse_decimal(a)?)?),
                    None => None,
                },
                day_of_month: sub
                    .get_one::<u32>("day")
                    .map(|d| validate_day_of_month(*d))
                    .transpose()?,
                notes: if sub.get_flag("clear_notes") {
                    Some(None)
                } else {
                    sub.get_one::<String>("notes")
                        .map(|n| validate_notes(Some(n.as_str())))
                        .transpose()?
                },
                is_active: sub.get_one::<bool>("active").copied(),
            };
            let def = store.update_recurring(owner, id, &patch)?;
            println!("Updated recurring transaction {}", def.id);
        }
        "toggle" => {
            let id = parse_id(required(sub, "id")?)?;
            let def = store.toggle_recurring(owner, id)?;
            let status = if def.is_active {
                "activated"
            } else {
                "deactivated"
            };
            println!("Recurring transaction {} {}", def.id, status);
        }
        "rm" => {
            let id = parse_id(required(sub, "id")?)?;
            store.delete_recurring(owner, id)?;
            println!("Deleted recurring transaction {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn definition_row(d: &RecurringDefinition, symbol: &str) -> Vec<String> {
    vec![
        d.id.to_string(),
        d.kind.to_string(),
        d.category.clone(),
        fmt_money(symbol, &d.amount),
        d.day_of_month.to_string(),
        if d.is_active { "yes" } else { "no" }.to_string(),
        d.last_executed_at
            .map(|x| x.to_string())
            .unwrap_or_else(|| "never".into()),
        d.notes.clone().unwrap_or_default(),
    ]
}

fn run(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => today(),
    };
    let mut store = SqliteStore::new(conn);
    let summary = recurring::run(&mut store, date)?;

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &summary)? {
        print_summary(&summary, &get_currency_symbol(conn)?);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary, symbol: &str) {
    println!("Processing recurring transactions for {}", summary.date);
    if !summary.outcomes.is_empty() {
        let rows = summary
            .outcomes
            .iter()
            .map(|o| match o {
                Outcome::Created {
                    definition_id,
                    kind,
                    category,
                    amount,
                    entry_id,
                    ..
                } => vec![
                    definition_id.to_string(),
                    category.clone(),
                    "created".into(),
                    format!("{} #{}: {}", kind, entry_id, fmt_money(symbol, amount)),
                ],
                Outcome::Skipped {
                    definition_id,
                    category,
                    reason,
                } => vec![
                    definition_id.to_string(),
                    category.clone(),
                    "skipped".into(),
                    match reason {
                        SkipReason::AlreadyExecuted(d) => {
                            format!("already processed this month ({})", d)
                        }
                        SkipReason::Inactive => "deactivated".into(),
                        SkipReason::NotDue => "no longer due today".into(),
                    },
                ],
                Outcome::Failed {
                    definition_id,
                    category,
                    error,
                } => vec![
                    definition_id.to_string(),
                    category.clone(),
                    "failed".into(),
                    error.clone(),
                ],
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Definition", "Category", "Result", "Detail"], rows)
        );
    }
    println!("Summary:");
    println!("  Processed: {}", summary.processed());
    println!("  Skipped: {}", summary.skipped());
    println!("  Failed: {}", summary.failed());
}
