// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::SqliteStore;
use crate::utils::{pretty_table, required, validate_label};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let store = SqliteStore::new(conn);
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = validate_label("Name", required(sub, "name")?)?;
            store.create_user(&name)?;
            println!("Added user '{}'", name);
        }
        Some(("list", _)) => {
            let data = store
                .list_users()?
                .into_iter()
                .map(|u| {
                    vec![
                        u.id.to_string(),
                        u.name,
                        u.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    ]
                })
                .collect();
            println!("{}", pretty_table(&["ID", "Name", "Created"], data));
        }
        Some(("rm", sub)) => {
            let name = required(sub, "name")?;
            store.delete_user(name.trim())?;
            println!("Removed user '{}' and all of their data", name.trim());
        }
        _ => {}
    }
    Ok(())
}
