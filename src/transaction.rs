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

//! Ledger entries and the read-side transaction log.
//!
//! Every balance change writes exactly one [`LedgerEntry`] (transfers write
//! one per side). Entries are append-only: once inserted they are never
//! updated or removed, so the log explains every balance the store holds.
//!
//! [`TransactionLog`] is the read side: per-account statements, the joined
//! full history, and the global balance total. It never writes.

use crate::MONEY_DP;
use crate::base::{AccountId, EntryId};
use crate::error::LedgerError;
use crate::store::{MemoryStore, Record};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What a ledger entry records. The wire/storage names are snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Cash in (`+amount`).
    Deposit,
    /// Cash out (`-amount`).
    Withdrawal,
    /// Source side of a transfer (`-amount`).
    TransferOut,
    /// Destination side of a transfer (`+amount`).
    TransferIn,
    /// Stake reserved when a bet is placed (`-stake`).
    BetReserved,
    /// Winnings credited (`+stake*odds`).
    BetReturn,
    /// Bet settled as lost. Amount 0: the stake was already reserved.
    BetLost,
    /// Lost bet reopened as pending. Amount 0, audit only.
    BetPending,
    /// A previously credited return taken back (`-stake*odds`).
    ReturnReversal,
    /// Stake refunded when a pending bet is undone (`+stake`).
    BetRefund,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::TransferOut => "transfer_out",
            Self::TransferIn => "transfer_in",
            Self::BetReserved => "bet_reserved",
            Self::BetReturn => "bet_return",
            Self::BetLost => "bet_lost",
            Self::BetPending => "bet_pending",
            Self::ReturnReversal => "return_reversal",
            Self::BetRefund => "bet_refund",
        };
        f.write_str(name)
    }
}

/// One immutable audit record of a balance change.
///
/// `amount` is signed: positive for money entering the account, negative for
/// money leaving it, zero for audit-only entries. `counterparty` carries the
/// other account of a transfer and is `None` for everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub account_id: AccountId,
    pub kind: EntryKind,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub counterparty: Option<AccountId>,
}

impl LedgerEntry {
    /// Builds an entry stamped with the current time. The store assigns the
    /// real id on insert.
    pub(crate) fn new(
        account_id: AccountId,
        kind: EntryKind,
        amount: Decimal,
        description: String,
        counterparty: Option<AccountId>,
    ) -> Self {
        Self {
            id: EntryId(0),
            account_id,
            kind,
            amount,
            timestamp: Utc::now(),
            description,
            counterparty,
        }
    }
}

impl Record for LedgerEntry {
    fn key(&self) -> u32 {
        self.id.0
    }

    fn set_key(&mut self, key: u32) {
        self.id = EntryId(key);
    }
}

/// A ledger entry joined with display names for history views.
///
/// `counterparty_name` is set only for transfer entries; a name falls back
/// to `"unknown"` when the account was removed after the entry was written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub entry: LedgerEntry,
    pub account_name: String,
    pub counterparty_name: Option<String>,
}

/// Read-side aggregation over the append-only entry table.
pub struct TransactionLog {
    store: Arc<MemoryStore>,
}

impl TransactionLog {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, id: EntryId) -> Option<LedgerEntry> {
        self.store.entries.get(id.0)
    }

    pub fn all(&self) -> Vec<LedgerEntry> {
        self.store.entries.all()
    }

    pub fn by_account(&self, account_id: AccountId) -> Vec<LedgerEntry> {
        self.store.entries.find(|e| e.account_id == account_id)
    }

    pub fn by_kind(&self, kind: EntryKind) -> Vec<LedgerEntry> {
        self.store.entries.find(|e| e.kind == kind)
    }

    /// Entries with `start <= timestamp <= end`.
    pub fn in_period(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<LedgerEntry> {
        self.store
            .entries
            .find(|e| e.timestamp >= start && e.timestamp <= end)
    }

    /// One account's statement, newest first.
    pub fn history_for_account(&self, account_id: AccountId) -> Result<Vec<LedgerEntry>, LedgerError> {
        if self.store.accounts.get(account_id.0).is_none() {
            return Err(LedgerError::AccountNotFound);
        }
        let mut entries = self.by_account(account_id);
        sort_newest_first(&mut entries);
        Ok(entries)
    }

    /// Every entry across all accounts, joined with account display names
    /// and transfer counterparty names, newest first.
    pub fn full_history(&self) -> Vec<HistoryEntry> {
        let mut entries = self.all();
        sort_newest_first(&mut entries);

        entries
            .into_iter()
            .map(|entry| {
                let account_name = self.display_name(entry.account_id);
                let counterparty_name = entry.counterparty.map(|id| self.display_name(id));
                HistoryEntry {
                    entry,
                    account_name,
                    counterparty_name,
                }
            })
            .collect()
    }

    /// Sum of all account balances, rounded to 2 decimal places.
    ///
    /// By the ledger invariant this equals the sum of all entry amounts for
    /// accounts created with a zero opening balance.
    pub fn total_balance(&self) -> Decimal {
        self.store
            .accounts
            .all()
            .iter()
            .map(|account| account.balance)
            .sum::<Decimal>()
            .round_dp(MONEY_DP)
    }

    fn display_name(&self, account_id: AccountId) -> String {
        self.store
            .accounts
            .get(account_id.0)
            .map(|account| account.name)
            .unwrap_or_else(|| "unknown".to_string())
    }
}

fn sort_newest_first(entries: &mut [LedgerEntry]) {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}
