// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Lucas Carvalho
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use bankroll_ledger_rs::{
    AccountId, AccountLedger, BetDraft, BetEngine, BetId, BetStatus, LedgerError, MemoryStore,
};
use chrono::Utc;
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Bankroll Ledger - Replay betting operations from a CSV file
///
/// Reads ledger operations from a CSV file and outputs final account states
/// to stdout. Supports account creation, deposits, withdrawals, transfers,
/// bet placement, settlement, and undo.
#[derive(Parser, Debug)]
#[command(name = "bankroll-ledger-rs")]
#[command(about = "A bankroll ledger that replays betting operation CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: op,account,counterparty,amount,odds,event,market,status
    /// Example: cargo run -- operations.csv > accounts.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let replay = match process_operations(BufReader::new(file)) {
        Ok(replay) => replay,
        Err(e) => {
            eprintln!("Error processing operations: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_accounts(&replay, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, account, counterparty, amount, odds, event, market, status`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    account: String,
    #[serde(default)]
    counterparty: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    odds: Option<Decimal>,
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    market: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// One parsed ledger operation. Accounts are referenced by display name;
/// settle/undo reference a bet by its event name.
#[derive(Debug)]
enum Operation {
    Create { name: String, opening: Decimal },
    Deposit { name: String, amount: Decimal },
    Withdraw { name: String, amount: Decimal },
    Transfer { from: String, to: String, amount: Decimal },
    Bet { name: String, stake: Decimal, odds: Decimal, event: String, market: String },
    Settle { event: String, status: BetStatus },
    Undo { event: String },
}

impl CsvRecord {
    /// Converts a CSV record to an operation.
    ///
    /// Returns `None` for unknown ops or missing required fields.
    fn into_operation(self) -> Option<Operation> {
        match self.op.to_lowercase().as_str() {
            "create" => Some(Operation::Create {
                name: self.account,
                opening: self.amount.unwrap_or(Decimal::ZERO),
            }),
            "deposit" => Some(Operation::Deposit {
                name: self.account,
                amount: self.amount?,
            }),
            "withdraw" => Some(Operation::Withdraw {
                name: self.account,
                amount: self.amount?,
            }),
            "transfer" => Some(Operation::Transfer {
                from: self.account,
                to: self.counterparty?,
                amount: self.amount?,
            }),
            "bet" => Some(Operation::Bet {
                name: self.account,
                stake: self.amount?,
                odds: self.odds?,
                event: self.event?,
                market: self.market?,
            }),
            "settle" => {
                let status = self.status?.parse().ok()?;
                Some(Operation::Settle {
                    event: self.event?,
                    status,
                })
            }
            "undo" => Some(Operation::Undo { event: self.event? }),
            _ => None,
        }
    }
}

/// Ledger components plus the name/event lookups a replay needs.
struct Replay {
    accounts: AccountLedger,
    bets: BetEngine,
    by_name: HashMap<String, AccountId>,
}

impl Replay {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            accounts: AccountLedger::new(Arc::clone(&store)),
            bets: BetEngine::new(store),
            by_name: HashMap::new(),
        }
    }

    fn apply(&mut self, operation: Operation) -> Result<(), LedgerError> {
        match operation {
            Operation::Create { name, opening } => {
                let id = self.accounts.create(&name, opening)?;
                self.by_name.insert(name.trim().to_string(), id);
                Ok(())
            }
            Operation::Deposit { name, amount } => {
                let id = self.lookup_account(&name)?;
                self.accounts.deposit(id, amount, "")
            }
            Operation::Withdraw { name, amount } => {
                let id = self.lookup_account(&name)?;
                self.accounts.withdraw(id, amount, "")
            }
            Operation::Transfer { from, to, amount } => {
                let from = self.lookup_account(&from)?;
                let to = self.lookup_account(&to)?;
                self.accounts.transfer(from, to, amount, "")
            }
            Operation::Bet {
                name,
                stake,
                odds,
                event,
                market,
            } => {
                let account_id = self.lookup_account(&name)?;
                self.bets
                    .place(BetDraft {
                        account_id,
                        event_date: Utc::now(),
                        event,
                        market,
                        stake,
                        odds,
                    })
                    .map(|_| ())
            }
            Operation::Settle { event, status } => {
                let id = self.lookup_bet(&event)?;
                self.bets.update_status(id, status)
            }
            Operation::Undo { event } => {
                let id = self.lookup_bet(&event)?;
                self.bets.undo(id)
            }
        }
    }

    fn lookup_account(&self, name: &str) -> Result<AccountId, LedgerError> {
        self.by_name
            .get(name.trim())
            .copied()
            .ok_or(LedgerError::AccountNotFound)
    }

    /// Resolves a bet by event name (first match).
    fn lookup_bet(&self, event: &str) -> Result<BetId, LedgerError> {
        self.bets
            .list()
            .iter()
            .find(|bet| bet.event == event.trim())
            .map(|bet| bet.id)
            .ok_or(LedgerError::BetNotFound)
    }
}

/// Process operations from a CSV reader.
///
/// Streams the file row by row. Malformed rows and failed operations are
/// skipped; the skip reason goes to stderr in debug builds.
///
/// # CSV Format
///
/// Expected columns: `op, account, counterparty, amount, odds, event, market, status`
///
/// ```csv
/// op,account,counterparty,amount,odds,event,market,status
/// create,Bet365,,500.00,,,,
/// bet,Bet365,,50.00,2.0,Arsenal v Spurs,1X2,
/// settle,,,,,Arsenal v Spurs,,won
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
fn process_operations<R: Read>(reader: R) -> Result<Replay, csv::Error> {
    let mut replay = Replay::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => {
                let Some(operation) = record.into_operation() else {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping invalid operation record");
                    continue;
                };

                if let Err(e) = replay.apply(operation) {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping operation: {}", e);
                }
            }
            Err(e) => {
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed row: {}", e);
                continue;
            }
        }
    }

    Ok(replay)
}

/// Output row with balances rounded to 2 decimal places.
#[derive(Debug, Serialize)]
struct AccountRow {
    id: u32,
    name: String,
    balance: Decimal,
    roi: Decimal,
    bet_count: u64,
    hit_rate: Decimal,
}

/// Write final account states to a CSV writer.
///
/// Columns: `id, name, balance, roi, bet_count, hit_rate`, sorted by id so
/// the output is deterministic.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
fn write_accounts<W: Write>(replay: &Replay, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    let mut accounts = replay.accounts.list();
    accounts.sort_by_key(|account| account.id.0);
    for account in accounts {
        wtr.serialize(AccountRow {
            id: account.id.0,
            name: account.name,
            balance: account.balance.round_dp(2),
            roi: account.roi,
            bet_count: account.bet_count,
            hit_rate: account.hit_rate,
        })?;
    }

    wtr.flush()?;
    Ok(())
}
