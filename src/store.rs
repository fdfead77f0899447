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

//! In-memory record store.
//!
//! The store is the single storage handle shared by every ledger component.
//! Each entity kind lives in its own [`Table`]: a concurrent map keyed by an
//! auto-increment id, mirroring the add/update/delete/get contract of a
//! generic record store. Secondary-index lookups are predicate scans via
//! [`Table::find`]; at personal-ledger scale the scan is the index.
//!
//! Components receive the store as an `Arc<MemoryStore>` handle at
//! construction time, so tests can inject a fresh store per case.

use crate::account::Account;
use crate::bet::Bet;
use crate::transaction::LedgerEntry;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// A row that carries its own store key.
///
/// `set_key` is called exactly once, by [`Table::insert`], when the row is
/// assigned its auto-increment id.
pub trait Record: Clone {
    fn key(&self) -> u32;
    fn set_key(&mut self, key: u32);
}

/// One record collection: concurrent rows plus an id counter.
///
/// Keys start at 1 and are never reused, so a removed row's id stays dead.
#[derive(Debug)]
pub struct Table<T> {
    rows: DashMap<u32, T>,
    next_key: AtomicU32,
}

impl<T: Record> Table<T> {
    fn new() -> Self {
        Self {
            rows: DashMap::new(),
            next_key: AtomicU32::new(1),
        }
    }

    /// Assigns the next id to `row`, stores it, and returns the id.
    pub fn insert(&self, mut row: T) -> u32 {
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        row.set_key(key);
        self.rows.insert(key, row);
        key
    }

    /// Replaces the stored row carrying the same key.
    ///
    /// Returns `false` if no such row exists; the caller decides which
    /// not-found error that maps to.
    pub fn update(&self, row: T) -> bool {
        match self.rows.entry(row.key()) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(row);
                true
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Removes and returns the row with the given key, if present.
    pub fn remove(&self, key: u32) -> Option<T> {
        self.rows.remove(&key).map(|(_, row)| row)
    }

    /// Returns a copy of the row with the given key, if present.
    pub fn get(&self, key: u32) -> Option<T> {
        self.rows.get(&key).map(|row| row.clone())
    }

    /// Returns copies of every row, in no particular order.
    pub fn all(&self) -> Vec<T> {
        self.rows.iter().map(|row| row.clone()).collect()
    }

    /// Returns copies of every row matching `predicate`.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows
            .iter()
            .filter(|row| predicate(row.value()))
            .map(|row| row.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Storage handle shared by every ledger component.
///
/// Settings live in a plain string-keyed map rather than a [`Table`] because
/// they are keyed by name, not by auto-increment id.
#[derive(Debug)]
pub struct MemoryStore {
    pub accounts: Table<Account>,
    pub bets: Table<Bet>,
    pub entries: Table<LedgerEntry>,
    pub(crate) settings: RwLock<HashMap<String, Decimal>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            accounts: Table::new(),
            bets: Table::new(),
            entries: Table::new(),
            settings: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
