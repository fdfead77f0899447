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

//! Betting-house accounts and the balance-mutating ledger operations.
//!
//! Every operation that changes a balance appends a matching [`LedgerEntry`]
//! whose signed amount equals the delta applied, keeping the invariant
//! `balance == opening balance + sum(entry amounts)` for the account.
//!
//! All precondition checks run before the first write. Multi-step operations
//! (transfer: two account updates plus two entries) are not wrapped in a
//! storage transaction; a failure between the writes leaves the ledger
//! inconsistent. The store serializes individual operations and the ledger
//! assumes a single writer, so the window is accepted and documented rather
//! than papered over.
//!
//! # Example
//!
//! ```
//! use bankroll_ledger_rs::{AccountLedger, MemoryStore};
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let ledger = AccountLedger::new(Arc::clone(&store));
//!
//! let id = ledger.create("Bet365", dec!(100.00)).unwrap();
//! ledger.deposit(id, dec!(50.00), "top up").unwrap();
//! assert_eq!(ledger.get(id).unwrap().balance, dec!(150.00));
//! ```

use crate::MONEY_DP;
use crate::base::AccountId;
use crate::bet::BetStatus;
use crate::error::LedgerError;
use crate::store::{MemoryStore, Record};
use crate::transaction::{EntryKind, LedgerEntry};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A betting-house account: a bankroll bucket with its own balance.
///
/// `roi`, `bet_count`, and `hit_rate` are derived from the account's bets and
/// refreshed by [`AccountLedger::recompute_statistics`] after every bet
/// mutation; they are stored denormalized for cheap reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub balance: Decimal,
    /// Percent over settled bets, rounded to 2 decimal places.
    pub roi: Decimal,
    pub bet_count: u64,
    /// Percent of settled bets won, rounded to 2 decimal places.
    pub hit_rate: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Record for Account {
    fn key(&self) -> u32 {
        self.id.0
    }

    fn set_key(&mut self, key: u32) {
        self.id = AccountId(key);
    }
}

/// Owns betting-house accounts and their balance-mutating operations.
pub struct AccountLedger {
    store: Arc<MemoryStore>,
}

impl AccountLedger {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Creates an account with an optional opening balance.
    ///
    /// The opening balance is seed capital, not a ledger event: no entry is
    /// written for it.
    ///
    /// # Errors
    ///
    /// [`LedgerError::EmptyAccountName`] if `name` is empty or whitespace.
    pub fn create(&self, name: &str, opening_balance: Decimal) -> Result<AccountId, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::EmptyAccountName);
        }

        let account = Account {
            id: AccountId(0),
            name: name.to_string(),
            balance: opening_balance,
            roi: Decimal::ZERO,
            bet_count: 0,
            hit_rate: Decimal::ZERO,
            created_at: Utc::now(),
        };
        Ok(AccountId(self.store.accounts.insert(account)))
    }

    /// Renames an account.
    pub fn rename(&self, id: AccountId, name: &str) -> Result<(), LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::EmptyAccountName);
        }

        let mut account = self.get(id).ok_or(LedgerError::AccountNotFound)?;
        account.name = name.to_string();
        self.persist(account)
    }

    pub fn get(&self, id: AccountId) -> Option<Account> {
        self.store.accounts.get(id.0)
    }

    pub fn list(&self) -> Vec<Account> {
        self.store.accounts.all()
    }

    /// Credits `amount` and appends a `deposit` entry.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidAmount`] if `amount <= 0`,
    /// [`LedgerError::AccountNotFound`] if the account is missing.
    pub fn deposit(
        &self,
        id: AccountId,
        amount: Decimal,
        description: &str,
    ) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let mut account = self.get(id).ok_or(LedgerError::AccountNotFound)?;
        account.balance += amount;
        self.persist(account)?;

        self.append_entry(id, EntryKind::Deposit, amount, description.to_string(), None);
        Ok(())
    }

    /// Debits `amount` and appends a `withdrawal` entry with negative amount.
    ///
    /// The balance check reads the pre-operation balance; the single-writer
    /// assumption makes that sufficient.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidAmount`] if `amount <= 0`,
    /// [`LedgerError::AccountNotFound`] if the account is missing,
    /// [`LedgerError::InsufficientFunds`] if the balance cannot cover it.
    pub fn withdraw(
        &self,
        id: AccountId,
        amount: Decimal,
        description: &str,
    ) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let mut account = self.get(id).ok_or(LedgerError::AccountNotFound)?;
        if account.balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }
        account.balance -= amount;
        self.persist(account)?;

        self.append_entry(
            id,
            EntryKind::Withdrawal,
            -amount,
            description.to_string(),
            None,
        );
        Ok(())
    }

    /// Moves `amount` between two accounts, appending a `transfer_out` entry
    /// on the source and a `transfer_in` entry on the destination. The
    /// destination description is annotated with the source account's name.
    ///
    /// The four writes (two accounts, two entries) are sequential, not
    /// transactional; every precondition is checked before the first one.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidAmount`] if `amount <= 0`,
    /// [`LedgerError::SameAccount`] if `from == to`,
    /// [`LedgerError::AccountNotFound`] if either account is missing,
    /// [`LedgerError::InsufficientFunds`] if the source cannot cover it.
    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        description: &str,
    ) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        if from == to {
            return Err(LedgerError::SameAccount);
        }

        let mut source = self.get(from).ok_or(LedgerError::AccountNotFound)?;
        let mut destination = self.get(to).ok_or(LedgerError::AccountNotFound)?;
        if source.balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }

        let source_name = source.name.clone();
        source.balance -= amount;
        destination.balance += amount;
        self.persist(source)?;
        self.persist(destination)?;

        self.append_entry(
            from,
            EntryKind::TransferOut,
            -amount,
            description.to_string(),
            Some(to),
        );
        let received = if description.is_empty() {
            format!("Transfer received from {source_name}")
        } else {
            format!("Transfer received from {source_name}: {description}")
        };
        self.append_entry(to, EntryKind::TransferIn, amount, received, Some(from));

        debug!(%from, %to, %amount, "transfer applied");
        Ok(())
    }

    /// Removes an account that owns no bets.
    ///
    /// Ledger entries referencing the account are kept; history views render
    /// the missing name as `unknown`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::AccountNotFound`] if the account is missing,
    /// [`LedgerError::AccountHasBets`] if any bet still references it.
    pub fn remove(&self, id: AccountId) -> Result<(), LedgerError> {
        if self.get(id).is_none() {
            return Err(LedgerError::AccountNotFound);
        }
        let linked = self.store.bets.find(|bet| bet.account_id == id);
        if !linked.is_empty() {
            return Err(LedgerError::AccountHasBets);
        }

        self.store.accounts.remove(id.0);
        Ok(())
    }

    /// All ledger entries for the account, in storage order.
    pub fn statement(&self, id: AccountId) -> Vec<LedgerEntry> {
        self.store.entries.find(|entry| entry.account_id == id)
    }

    /// Recomputes `bet_count`, `roi`, and `hit_rate` from the account's bets.
    ///
    /// ROI counts only settled bets: `investment` is the stake sum,
    /// `returns` is `stake * odds` over won bets, and
    /// `roi = (returns - investment) / investment * 100` (0 when nothing is
    /// settled). Hit rate is won over settled. Both rounded to 2 dp.
    ///
    /// Must be called after every bet mutation touching this account. A full
    /// recompute over the bet set keeps the figures auditable.
    pub fn recompute_statistics(&self, id: AccountId) -> Result<(), LedgerError> {
        let mut account = self.get(id).ok_or(LedgerError::AccountNotFound)?;
        let bets = self.store.bets.find(|bet| bet.account_id == id);

        let mut investment = Decimal::ZERO;
        let mut returns = Decimal::ZERO;
        let mut settled = 0u64;
        let mut won = 0u64;
        for bet in &bets {
            if bet.status.is_settled() {
                settled += 1;
                investment += bet.stake;
                if bet.status == BetStatus::Won {
                    won += 1;
                    returns += bet.stake * bet.odds;
                }
            }
        }

        account.bet_count = bets.len() as u64;
        account.roi = if investment > Decimal::ZERO {
            ((returns - investment) / investment * Decimal::ONE_HUNDRED).round_dp(MONEY_DP)
        } else {
            Decimal::ZERO
        };
        account.hit_rate = if settled > 0 {
            (Decimal::from(won) / Decimal::from(settled) * Decimal::ONE_HUNDRED).round_dp(MONEY_DP)
        } else {
            Decimal::ZERO
        };

        self.persist(account)
    }

    pub(crate) fn persist(&self, account: Account) -> Result<(), LedgerError> {
        if self.store.accounts.update(account) {
            Ok(())
        } else {
            Err(LedgerError::AccountNotFound)
        }
    }

    pub(crate) fn append_entry(
        &self,
        account_id: AccountId,
        kind: EntryKind,
        amount: Decimal,
        description: String,
        counterparty: Option<AccountId>,
    ) {
        let entry = LedgerEntry::new(account_id, kind, amount, description, counterparty);
        self.store.entries.insert(entry);
    }
}
