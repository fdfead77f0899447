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

//! Key-value settings and monthly-goal progress.

use crate::MONEY_DP;
use crate::bet::BetEngine;
use crate::error::LedgerError;
use crate::store::MemoryStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

const MONTHLY_GOAL_KEY: &str = "monthly_goal";

/// Default monthly profit goal when none has been set: 1000 currency units.
pub const DEFAULT_MONTHLY_GOAL: Decimal = dec!(1000);

/// String-keyed settings over the shared store.
pub struct Settings {
    store: Arc<MemoryStore>,
}

impl Settings {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, key: &str) -> Option<Decimal> {
        self.store.settings.read().get(key).copied()
    }

    pub fn set(&self, key: &str, value: Decimal) {
        self.store.settings.write().insert(key.to_string(), value);
    }

    /// Stored monthly profit goal, or [`DEFAULT_MONTHLY_GOAL`] if unset.
    pub fn monthly_goal(&self) -> Decimal {
        self.get(MONTHLY_GOAL_KEY).unwrap_or(DEFAULT_MONTHLY_GOAL)
    }

    /// # Errors
    ///
    /// [`LedgerError::InvalidGoal`] if `value <= 0`.
    pub fn set_monthly_goal(&self, value: Decimal) -> Result<(), LedgerError> {
        if value <= Decimal::ZERO {
            return Err(LedgerError::InvalidGoal);
        }
        self.set(MONTHLY_GOAL_KEY, value);
        Ok(())
    }

    /// Total profit as a percentage of the monthly goal, rounded to 2
    /// decimal places. Losses pull the figure below zero.
    pub fn monthly_progress(&self, bets: &BetEngine) -> Decimal {
        (bets.total_profit() / self.monthly_goal() * Decimal::ONE_HUNDRED).round_dp(MONEY_DP)
    }
}
