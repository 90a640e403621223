// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use pocketbook::models::EntryKind;
use pocketbook::{cli, commands, db, logging, utils};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    logging::init(matches.get_count("verbose"));

    let path = db::db_path(matches.get_one::<String>("db").map(String::as_str))?;
    let conn = db::open_or_init(&path)?;
    let user = matches.get_one::<String>("user").map(String::as_str);

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", path.display());
        }
        Some(("user", sub)) => commands::users::handle(&conn, sub)?,
        Some(("config", sub)) => commands::config::handle(&conn, sub)?,
        Some(("expense", sub)) => {
            let owner = utils::owner_id(&conn, user)?;
            commands::ledger::handle(&conn, owner, EntryKind::Expense, sub)?
        }
        Some(("income", sub)) => {
            let owner = utils::owner_id(&conn, user)?;
            commands::ledger::handle(&conn, owner, EntryKind::Income, sub)?
        }
        Some(("recurring", sub)) => commands::recurring::handle(&conn, user, sub)?,
        Some(("history", sub)) => {
            commands::history::handle(&conn, utils::owner_id(&conn, user)?, sub)?
        }
        Some(("dashboard", sub)) => {
            commands::dashboard::handle(&conn, utils::owner_id(&conn, user)?, sub)?
        }
        Some(("export", sub)) => {
            commands::exporter::handle(&conn, utils::owner_id(&conn, user)?, sub)?
        }
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
