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

//! # Bankroll Ledger
//!
//! A personal bankroll-management ledger for sports betting. It tracks
//! betting-house balances, runs the bet lifecycle (pending/won/lost with
//! reversals in every direction), and keeps an append-only transaction trail
//! explaining every balance change.
//!
//! ## Core Components
//!
//! - [`AccountLedger`]: betting-house accounts, deposits/withdrawals/
//!   transfers, derived statistics (ROI, hit rate)
//! - [`BetEngine`]: bet lifecycle; each status transition applies its
//!   balance delta and compensating ledger entry
//! - [`TransactionLog`]: read-side aggregation over the audit trail
//! - [`Settings`]: monthly profit goal and progress
//! - [`MemoryStore`]: the shared storage handle injected into each component
//!
//! ## Example
//!
//! ```
//! use bankroll_ledger_rs::{AccountLedger, BetDraft, BetEngine, BetStatus, MemoryStore};
//! use chrono::Utc;
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let accounts = AccountLedger::new(Arc::clone(&store));
//! let bets = BetEngine::new(Arc::clone(&store));
//!
//! let house = accounts.create("Bet365", dec!(500.00)).unwrap();
//! let bet = bets
//!     .place(BetDraft {
//!         account_id: house,
//!         event_date: Utc::now(),
//!         event: "Arsenal v Spurs".to_string(),
//!         market: "1X2".to_string(),
//!         stake: dec!(50.00),
//!         odds: dec!(2.0),
//!     })
//!     .unwrap();
//!
//! // Stake is reserved at placement; the return moves on settlement.
//! assert_eq!(accounts.get(house).unwrap().balance, dec!(450.00));
//! bets.update_status(bet, BetStatus::Won).unwrap();
//! assert_eq!(accounts.get(house).unwrap().balance, dec!(550.00));
//! ```

pub mod account;
mod base;
mod bet;
pub mod error;
mod settings;
mod store;
mod transaction;

pub use account::{Account, AccountLedger};
pub use base::{AccountId, BetId, EntryId};
pub use bet::{Bet, BetDraft, BetEngine, BetPatch, BetStatus};
pub use error::{ErrorKind, LedgerError};
pub use settings::{DEFAULT_MONTHLY_GOAL, Settings};
pub use store::{MemoryStore, Record, Table};
pub use transaction::{EntryKind, HistoryEntry, LedgerEntry, TransactionLog};

/// Monetary figures derived for display round to 2 decimal places.
pub(crate) const MONEY_DP: u32 = 2;
