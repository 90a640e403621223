// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .conflicts_with("jsonl")
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print one JSON object per line"),
    )
}

fn id_arg() -> Arg {
    Arg::new("id").required(true).help("Row id")
}

fn notes_arg() -> Arg {
    Arg::new("notes").long("notes").help("Free-form notes")
}

/// `expense` and `income` share the same shape; only the label differs
/// (`category` vs `source`).
fn ledger_command(name: &'static str, label: &'static str, about: &'static str) -> Command {
    let labels_cmd = if label == "category" {
        "categories"
    } else {
        "sources"
    };
    Command::new(name)
        .about(about)
        .subcommand(
            Command::new("add")
                .about(format!("Record a new {}", name))
                .arg(Arg::new("date").long("date").required(true).help("YYYY-MM-DD"))
                .arg(Arg::new(label).long(label).required(true))
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(notes_arg()),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about(format!("List {} rows, newest first", name))
                .arg(Arg::new("from").long("from").help("Start date (inclusive)"))
                .arg(Arg::new("to").long("to").help("End date (inclusive)"))
                .arg(
                    Arg::new(label)
                        .long(label)
                        .help("Exact match; 'all' disables the filter"),
                )
                .arg(
                    Arg::new("amount_search")
                        .long("amount-search")
                        .help("Substring match on the amount"),
                )
                .arg(
                    Arg::new("page")
                        .long("page")
                        .value_parser(value_parser!(usize))
                        .default_value("1"),
                )
                .arg(
                    Arg::new("per_page")
                        .long("per-page")
                        .value_parser(value_parser!(usize))
                        .default_value("20"),
                ),
        ))
        .subcommand(
            Command::new("show")
                .about("Print one row as JSON")
                .arg(id_arg()),
        )
        .subcommand(
            Command::new("edit")
                .about(format!("Update a {}", name))
                .arg(id_arg())
                .arg(Arg::new("date").long("date"))
                .arg(Arg::new(label).long(label))
                .arg(Arg::new("amount").long("amount"))
                .arg(notes_arg())
                .arg(
                    Arg::new("clear_notes")
                        .long("clear-notes")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("notes"),
                ),
        )
        .subcommand(Command::new("rm").about(format!("Delete a {}", name)).arg(id_arg()))
        .subcommand(json_flags(
            Command::new(labels_cmd).about(format!("Distinct {} in use", labels_cmd)),
        ))
}

pub fn build_cli() -> Command {
    Command::new("pocketbook")
        .about("Pocketbook: expenses, income, recurring transactions and running balance")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env("POCKETBOOK_DB")
                .help("Path to the SQLite database"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .short('u')
                .global(true)
                .env("POCKETBOOK_USER")
                .help("Acting user"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Log more (-v info, -vv debug)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("user")
                .about("Manage users")
                .subcommand(Command::new("add").arg(Arg::new("name").required(true)))
                .subcommand(Command::new("list"))
                .subcommand(Command::new("rm").arg(Arg::new("name").required(true))),
        )
        .subcommand(
            Command::new("config")
                .about("Display settings")
                .subcommand(Command::new("get").arg(Arg::new("key").required(true)))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
        .subcommand(ledger_command("expense", "category", "Manage expenses"))
        .subcommand(ledger_command("income", "source", "Manage income"))
        .subcommand(
            Command::new("recurring")
                .about("Recurring monthly transactions")
                .subcommand(
                    Command::new("add")
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .required(true)
                                .value_parser(["expense", "income"]),
                        )
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .required(true)
                                .help("Category for expenses, source for income"),
                        )
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("day")
                                .long("day")
                                .required(true)
                                .value_parser(value_parser!(u32))
                                .help("Day of month, 1-31"),
                        )
                        .arg(notes_arg()),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("show").arg(id_arg()))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .value_parser(["expense", "income"]),
                        )
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("day").long("day").value_parser(value_parser!(u32)))
                        .arg(notes_arg())
                        .arg(
                            Arg::new("clear_notes")
                                .long("clear-notes")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("notes"),
                        )
                        .arg(
                            Arg::new("active")
                                .long("active")
                                .value_parser(value_parser!(bool)),
                        ),
                )
                .subcommand(Command::new("toggle").arg(id_arg()))
                .subcommand(Command::new("rm").arg(id_arg()))
                .subcommand(json_flags(
                    Command::new("run")
                        .about("Materialize definitions due today (run daily from cron)")
                        .arg(
                            Arg::new("date")
                                .long("date")
                                .help("Run as if today were YYYY-MM-DD"),
                        ),
                )),
        )
        .subcommand(json_flags(
            Command::new("history")
                .about("All transactions, newest first, with running balance")
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize)),
                ),
        ))
        .subcommand(json_flags(
            Command::new("dashboard")
                .about("Monthly totals, recent expenses and spend by category")
                .arg(Arg::new("month").long("month").help("YYYY-MM (default: current)")),
        ))
        .subcommand(
            Command::new("export")
                .about("Export data for the acting user")
                .subcommand_required(true)
                .subcommand(export_target("history"))
                .subcommand(export_target("expenses"))
                .subcommand(export_target("income")),
        )
}

fn export_target(name: &'static str) -> Command {
    Command::new(name)
        .arg(
            Arg::new("format")
                .long("format")
                .default_value("csv")
                .value_parser(["csv", "json"]),
        )
        .arg(Arg::new("out").long("out").required(true))
}
