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

//! Error types for ledger operations.

use thiserror::Error;

/// Broad failure category, for callers that dispatch on the class of error
/// rather than the exact variant (e.g. mapping to user-visible messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input: missing field, non-positive amount, invalid odds or status.
    Validation,
    /// Referenced account or bet does not exist.
    NotFound,
    /// Operation exceeds the available balance.
    InsufficientFunds,
    /// Operation violates a referential or state invariant.
    Conflict,
}

/// Ledger operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Account name is empty or whitespace
    #[error("account name must not be empty")]
    EmptyAccountName,

    /// Amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Stake is zero or negative
    #[error("invalid stake (must be positive)")]
    InvalidStake,

    /// Odds are not greater than 1
    #[error("invalid odds (must be greater than 1)")]
    InvalidOdds,

    /// Status string is not pending/won/lost
    #[error("invalid status (use pending, won, or lost)")]
    InvalidStatus,

    /// Bet event name is empty
    #[error("event name must not be empty")]
    EmptyEvent,

    /// Bet market is empty
    #[error("market must not be empty")]
    EmptyMarket,

    /// Monthly goal is zero or negative
    #[error("invalid goal (must be positive)")]
    InvalidGoal,

    /// Transfer source and destination are the same account
    #[error("transfer source and destination must differ")]
    SameAccount,

    /// Referenced account does not exist
    #[error("account not found")]
    AccountNotFound,

    /// Referenced bet does not exist
    #[error("bet not found")]
    BetNotFound,

    /// Withdrawal, transfer, or stake exceeds the available balance
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Account still has bets linked to it
    #[error("account has linked bets")]
    AccountHasBets,

    /// Undo attempted on a bet that is not pending
    #[error("only pending bets can be undone")]
    BetNotPending,
}

impl LedgerError {
    /// Maps each variant onto its failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyAccountName
            | Self::InvalidAmount
            | Self::InvalidStake
            | Self::InvalidOdds
            | Self::InvalidStatus
            | Self::EmptyEvent
            | Self::EmptyMarket
            | Self::InvalidGoal
            | Self::SameAccount => ErrorKind::Validation,
            Self::AccountNotFound | Self::BetNotFound => ErrorKind::NotFound,
            Self::InsufficientFunds => ErrorKind::InsufficientFunds,
            Self::AccountHasBets | Self::BetNotPending => ErrorKind::Conflict,
        }
    }
}
