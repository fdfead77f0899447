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

//! Bet lifecycle and its ledger effects.
//!
//! A bet's stake is reserved (deducted from the account) exactly once, when
//! the bet is placed. After that only the *return* (`stake * odds`) moves as
//! the outcome is set, unset, or flipped. Settling a bet as lost therefore
//! never touches the balance a second time.
//!
//! Lifecycle state machine
//!
//! ```text
//!  place ──► Pending ──won──► Won
//!               ▲  ▲           │
//!               │  └──pending──┘  (return reversed)
//!               │
//!               └──pending── Lost ◄──lost── Won  (return reversed)
//!                            Lost ──won──► Won   (return credited)
//! ```
//!
//! | Transition        | Balance effect  | Entry kind        |
//! |-------------------|-----------------|-------------------|
//! | place → pending   | `-stake`        | `bet_reserved`    |
//! | pending → won     | `+stake*odds`   | `bet_return`      |
//! | pending → lost    | none            | `bet_lost` (0)    |
//! | won → pending     | `-stake*odds`   | `return_reversal` |
//! | lost → pending    | none            | `bet_pending` (0) |
//! | won → lost        | `-stake*odds`   | `return_reversal` |
//! | lost → won        | `+stake*odds`   | `bet_return`      |

use crate::MONEY_DP;
use crate::account::AccountLedger;
use crate::base::{AccountId, BetId};
use crate::error::LedgerError;
use crate::store::{MemoryStore, Record};
use crate::transaction::EntryKind;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Bet lifecycle status.
///
/// `Won` and `Lost` are settled but not final: every directed transition
/// between the three states is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
}

impl BetStatus {
    /// Settled means the outcome is known: won or lost.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Won => "won",
            Self::Lost => "lost",
        };
        f.write_str(name)
    }
}

impl FromStr for BetStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "won" => Ok(Self::Won),
            "lost" => Ok(Self::Lost),
            _ => Err(LedgerError::InvalidStatus),
        }
    }
}

/// A wagered stake against odds, linked to the account it was placed on.
///
/// `potential_return` is fixed at placement and recomputed on edit; it is a
/// 2-dp display figure, while balance math uses the raw `stake * odds`
/// product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub account_id: AccountId,
    pub event_date: DateTime<Utc>,
    pub event: String,
    pub market: String,
    pub stake: Decimal,
    pub odds: Decimal,
    pub potential_return: Decimal,
    pub status: BetStatus,
    pub created_at: DateTime<Utc>,
}

impl Bet {
    /// Raw payout if the bet wins; the amount moved on settlement.
    fn gross_return(&self) -> Decimal {
        self.stake * self.odds
    }
}

impl Record for Bet {
    fn key(&self) -> u32 {
        self.id.0
    }

    fn set_key(&mut self, key: u32) {
        self.id = BetId(key);
    }
}

/// Input for placing a new bet.
#[derive(Debug, Clone)]
pub struct BetDraft {
    pub account_id: AccountId,
    pub event_date: DateTime<Utc>,
    pub event: String,
    pub market: String,
    pub stake: Decimal,
    pub odds: Decimal,
}

/// Partial update for [`BetEngine::edit`]; `None` fields keep their stored
/// values. Status is deliberately absent: outcomes go through
/// [`BetEngine::update_status`] so the balance effects are applied.
#[derive(Debug, Clone, Default)]
pub struct BetPatch {
    pub account_id: Option<AccountId>,
    pub event_date: Option<DateTime<Utc>>,
    pub event: Option<String>,
    pub market: Option<String>,
    pub stake: Option<Decimal>,
    pub odds: Option<Decimal>,
}

/// Owns the bet lifecycle; delegates balance mutation and statistics to the
/// account ledger over the same store.
pub struct BetEngine {
    store: Arc<MemoryStore>,
    accounts: AccountLedger,
}

impl BetEngine {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        let accounts = AccountLedger::new(Arc::clone(&store));
        Self { store, accounts }
    }

    /// Places a bet: reserves the stake from the account, persists the bet
    /// as `pending`, logs a `bet_reserved` entry, and refreshes statistics.
    ///
    /// # Errors
    ///
    /// [`LedgerError::EmptyEvent`] / [`LedgerError::EmptyMarket`] on blank
    /// required fields, [`LedgerError::InvalidStake`] if `stake <= 0`,
    /// [`LedgerError::InvalidOdds`] if `odds <= 1`,
    /// [`LedgerError::AccountNotFound`] if the account is missing,
    /// [`LedgerError::InsufficientFunds`] if the balance cannot cover the
    /// stake.
    pub fn place(&self, draft: BetDraft) -> Result<BetId, LedgerError> {
        let event = draft.event.trim();
        let market = draft.market.trim();
        if event.is_empty() {
            return Err(LedgerError::EmptyEvent);
        }
        if market.is_empty() {
            return Err(LedgerError::EmptyMarket);
        }
        if draft.stake <= Decimal::ZERO {
            return Err(LedgerError::InvalidStake);
        }
        if draft.odds <= Decimal::ONE {
            return Err(LedgerError::InvalidOdds);
        }

        let mut account = self
            .accounts
            .get(draft.account_id)
            .ok_or(LedgerError::AccountNotFound)?;
        if account.balance < draft.stake {
            return Err(LedgerError::InsufficientFunds);
        }

        account.balance -= draft.stake;
        self.accounts.persist(account)?;

        let bet = Bet {
            id: BetId(0),
            account_id: draft.account_id,
            event_date: draft.event_date,
            event: event.to_string(),
            market: market.to_string(),
            stake: draft.stake,
            odds: draft.odds,
            potential_return: (draft.stake * draft.odds).round_dp(MONEY_DP),
            status: BetStatus::Pending,
            created_at: Utc::now(),
        };
        let description = format!("Bet placed: {} - {}", bet.event, bet.market);
        let id = BetId(self.store.bets.insert(bet));

        self.accounts.append_entry(
            draft.account_id,
            EntryKind::BetReserved,
            -draft.stake,
            description,
            None,
        );
        self.accounts.recompute_statistics(draft.account_id)?;

        debug!(bet = %id, account = %draft.account_id, stake = %draft.stake, "bet placed");
        Ok(id)
    }

    /// Moves a bet to `status`, applying the transition's balance delta and
    /// compensating entry (see the module table), then refreshes the
    /// account's statistics. Setting the current status is a no-op.
    ///
    /// # Errors
    ///
    /// [`LedgerError::BetNotFound`] if the bet is missing,
    /// [`LedgerError::AccountNotFound`] if its account is missing.
    pub fn update_status(&self, id: BetId, status: BetStatus) -> Result<(), LedgerError> {
        let mut bet = self.get(id).ok_or(LedgerError::BetNotFound)?;
        let previous = bet.status;
        if previous == status {
            return Ok(());
        }

        let mut account = self
            .accounts
            .get(bet.account_id)
            .ok_or(LedgerError::AccountNotFound)?;

        bet.status = status;
        if !self.store.bets.update(bet.clone()) {
            return Err(LedgerError::BetNotFound);
        }

        let gross = bet.gross_return();
        let tag = format!("{} - {}", bet.event, bet.market);
        match (previous, status) {
            (BetStatus::Pending, BetStatus::Won) | (BetStatus::Lost, BetStatus::Won) => {
                account.balance += gross;
                self.accounts.persist(account)?;
                self.accounts.append_entry(
                    bet.account_id,
                    EntryKind::BetReturn,
                    gross,
                    format!("Winning bet return: {tag}"),
                    None,
                );
            }
            (BetStatus::Won, BetStatus::Pending) | (BetStatus::Won, BetStatus::Lost) => {
                account.balance -= gross;
                self.accounts.persist(account)?;
                self.accounts.append_entry(
                    bet.account_id,
                    EntryKind::ReturnReversal,
                    -gross,
                    format!("Return reversal: {tag}"),
                    None,
                );
            }
            (BetStatus::Pending, BetStatus::Lost) => {
                // Stake was reserved at placement; nothing moves.
                self.accounts.append_entry(
                    bet.account_id,
                    EntryKind::BetLost,
                    Decimal::ZERO,
                    format!("Bet lost: {tag}"),
                    None,
                );
            }
            (BetStatus::Lost, BetStatus::Pending) => {
                self.accounts.append_entry(
                    bet.account_id,
                    EntryKind::BetPending,
                    Decimal::ZERO,
                    format!("Bet back to pending: {tag}"),
                    None,
                );
            }
            (BetStatus::Pending, BetStatus::Pending)
            | (BetStatus::Won, BetStatus::Won)
            | (BetStatus::Lost, BetStatus::Lost) => unreachable!("no-op handled above"),
        }

        debug!(bet = %id, from = %previous, to = %status, "bet status changed");
        self.accounts.recompute_statistics(bet.account_id)
    }

    /// Applies a partial edit and recomputes `potential_return` from
    /// whichever of stake/odds changed, falling back to stored values.
    ///
    /// Does not retroactively adjust the account balance even when the stake
    /// changed after reservation; the original reservation entry stands.
    /// Statistics are refreshed for the bet's account, and for the previous
    /// account too when the bet moved.
    pub fn edit(&self, id: BetId, patch: BetPatch) -> Result<(), LedgerError> {
        let mut bet = self.get(id).ok_or(LedgerError::BetNotFound)?;
        let previous_account = bet.account_id;

        if let Some(event) = &patch.event {
            let event = event.trim();
            if event.is_empty() {
                return Err(LedgerError::EmptyEvent);
            }
            bet.event = event.to_string();
        }
        if let Some(market) = &patch.market {
            let market = market.trim();
            if market.is_empty() {
                return Err(LedgerError::EmptyMarket);
            }
            bet.market = market.to_string();
        }
        if let Some(stake) = patch.stake {
            if stake <= Decimal::ZERO {
                return Err(LedgerError::InvalidStake);
            }
            bet.stake = stake;
        }
        if let Some(odds) = patch.odds {
            if odds <= Decimal::ONE {
                return Err(LedgerError::InvalidOdds);
            }
            bet.odds = odds;
        }
        if let Some(account_id) = patch.account_id {
            if self.accounts.get(account_id).is_none() {
                return Err(LedgerError::AccountNotFound);
            }
            bet.account_id = account_id;
        }
        if let Some(event_date) = patch.event_date {
            bet.event_date = event_date;
        }
        if patch.stake.is_some() || patch.odds.is_some() {
            bet.potential_return = bet.gross_return().round_dp(MONEY_DP);
        }

        let account_id = bet.account_id;
        if !self.store.bets.update(bet) {
            return Err(LedgerError::BetNotFound);
        }

        self.accounts.recompute_statistics(previous_account)?;
        if account_id != previous_account {
            self.accounts.recompute_statistics(account_id)?;
        }
        Ok(())
    }

    /// Deletes a bet without touching the balance.
    ///
    /// The original stake reservation is *not* reversed; use [`Self::undo`]
    /// to refund a pending bet. Statistics are refreshed afterwards.
    pub fn delete(&self, id: BetId) -> Result<(), LedgerError> {
        let bet = self.get(id).ok_or(LedgerError::BetNotFound)?;
        self.store.bets.remove(id.0);
        self.accounts.recompute_statistics(bet.account_id)
    }

    /// Undoes a pending bet: refunds the reserved stake, logs a `bet_refund`
    /// entry, deletes the bet, and refreshes statistics. The safe removal
    /// path, in contrast to [`Self::delete`].
    ///
    /// # Errors
    ///
    /// [`LedgerError::BetNotFound`] if the bet is missing,
    /// [`LedgerError::BetNotPending`] if it is already settled,
    /// [`LedgerError::AccountNotFound`] if its account is missing.
    pub fn undo(&self, id: BetId) -> Result<(), LedgerError> {
        let bet = self.get(id).ok_or(LedgerError::BetNotFound)?;
        if bet.status != BetStatus::Pending {
            return Err(LedgerError::BetNotPending);
        }

        let mut account = self
            .accounts
            .get(bet.account_id)
            .ok_or(LedgerError::AccountNotFound)?;
        account.balance += bet.stake;
        self.accounts.persist(account)?;

        self.accounts.append_entry(
            bet.account_id,
            EntryKind::BetRefund,
            bet.stake,
            format!("Bet undone: {} - {}", bet.event, bet.market),
            None,
        );
        self.store.bets.remove(id.0);
        self.accounts.recompute_statistics(bet.account_id)
    }

    pub fn get(&self, id: BetId) -> Option<Bet> {
        self.store.bets.get(id.0)
    }

    pub fn list(&self) -> Vec<Bet> {
        self.store.bets.all()
    }

    pub fn by_account(&self, account_id: AccountId) -> Vec<Bet> {
        self.store.bets.find(|bet| bet.account_id == account_id)
    }

    pub fn by_status(&self, status: BetStatus) -> Vec<Bet> {
        self.store.bets.find(|bet| bet.status == status)
    }

    /// Bets whose event date falls within `start..=end`.
    pub fn in_period(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Bet> {
        self.store
            .bets
            .find(|bet| bet.event_date >= start && bet.event_date <= end)
    }

    /// Profit over settled bets: `return - stake` for won, `-stake` for
    /// lost. Rounded to 2 decimal places.
    pub fn total_profit(&self) -> Decimal {
        let (investment, returns) = self.settled_totals();
        (returns - investment).round_dp(MONEY_DP)
    }

    /// ROI over all settled bets, as a percentage rounded to 2 decimal
    /// places. Returns 0 when nothing is settled.
    pub fn overall_roi(&self) -> Decimal {
        let (investment, returns) = self.settled_totals();
        if investment > Decimal::ZERO {
            ((returns - investment) / investment * Decimal::ONE_HUNDRED).round_dp(MONEY_DP)
        } else {
            Decimal::ZERO
        }
    }

    /// Sum of stakes currently reserved by pending bets, rounded to 2
    /// decimal places.
    pub fn total_pending_value(&self) -> Decimal {
        self.by_status(BetStatus::Pending)
            .iter()
            .map(|bet| bet.stake)
            .sum::<Decimal>()
            .round_dp(MONEY_DP)
    }

    fn settled_totals(&self) -> (Decimal, Decimal) {
        let mut investment = Decimal::ZERO;
        let mut returns = Decimal::ZERO;
        for bet in self.list() {
            if bet.status.is_settled() {
                investment += bet.stake;
                if bet.status == BetStatus::Won {
                    returns += bet.gross_return();
                }
            }
        }
        (investment, returns)
    }
}
