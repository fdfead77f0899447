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

//! Bet engine public API integration tests: the lifecycle state machine and
//! its ledger effects.

use bankroll_ledger_rs::{
    AccountId, AccountLedger, BetDraft, BetEngine, BetPatch, BetStatus, EntryKind, LedgerError,
    MemoryStore,
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn setup() -> (AccountLedger, BetEngine) {
    let store = Arc::new(MemoryStore::new());
    let accounts = AccountLedger::new(Arc::clone(&store));
    let bets = BetEngine::new(store);
    (accounts, bets)
}

fn draft(account_id: AccountId, stake: Decimal, odds: Decimal) -> BetDraft {
    BetDraft {
        account_id,
        event_date: Utc::now(),
        event: "Arsenal v Spurs".to_string(),
        market: "1X2".to_string(),
        stake,
        odds,
    }
}

fn balance(accounts: &AccountLedger, id: AccountId) -> Decimal {
    accounts.get(id).unwrap().balance
}

#[test]
fn placing_a_bet_reserves_the_stake() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(500.00)).unwrap();

    let id = bets.place(draft(house, dec!(50.00), dec!(2.0))).unwrap();

    assert_eq!(balance(&accounts, house), dec!(450.00));

    let bet = bets.get(id).unwrap();
    assert_eq!(bet.status, BetStatus::Pending);
    assert_eq!(bet.potential_return, dec!(100.00));

    let statement = accounts.statement(house);
    assert_eq!(statement.len(), 1);
    assert_eq!(statement[0].kind, EntryKind::BetReserved);
    assert_eq!(statement[0].amount, dec!(-50.00));
    assert_eq!(statement[0].description, "Bet placed: Arsenal v Spurs - 1X2");
}

#[test]
fn place_validates_required_fields() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(100.00)).unwrap();

    let mut no_event = draft(house, dec!(10.00), dec!(2.0));
    no_event.event = "  ".to_string();
    assert_eq!(bets.place(no_event), Err(LedgerError::EmptyEvent));

    let mut no_market = draft(house, dec!(10.00), dec!(2.0));
    no_market.market = String::new();
    assert_eq!(bets.place(no_market), Err(LedgerError::EmptyMarket));

    assert_eq!(
        bets.place(draft(house, Decimal::ZERO, dec!(2.0))),
        Err(LedgerError::InvalidStake)
    );
    assert_eq!(
        bets.place(draft(house, dec!(10.00), dec!(1.0))),
        Err(LedgerError::InvalidOdds)
    );
    assert_eq!(
        bets.place(draft(AccountId(99), dec!(10.00), dec!(2.0))),
        Err(LedgerError::AccountNotFound)
    );

    // nothing was reserved
    assert_eq!(balance(&accounts, house), dec!(100.00));
    assert!(accounts.statement(house).is_empty());
}

#[test]
fn place_with_insufficient_balance_fails() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(20.00)).unwrap();

    assert_eq!(
        bets.place(draft(house, dec!(50.00), dec!(2.0))),
        Err(LedgerError::InsufficientFunds)
    );
    assert_eq!(balance(&accounts, house), dec!(20.00));
}

#[test]
fn winning_credits_the_gross_return() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(500.00)).unwrap();
    let id = bets.place(draft(house, dec!(50.00), dec!(2.0))).unwrap();

    bets.update_status(id, BetStatus::Won).unwrap();

    assert_eq!(balance(&accounts, house), dec!(550.00));
    let returns: Vec<_> = accounts
        .statement(house)
        .into_iter()
        .filter(|e| e.kind == EntryKind::BetReturn)
        .collect();
    assert_eq!(returns.len(), 1);
    assert_eq!(returns[0].amount, dec!(100.00));
}

#[test]
fn losing_leaves_the_balance_untouched() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(500.00)).unwrap();
    let id = bets.place(draft(house, dec!(50.00), dec!(2.0))).unwrap();

    bets.update_status(id, BetStatus::Lost).unwrap();

    // stake stays reserved; the loss is audit-only
    assert_eq!(balance(&accounts, house), dec!(450.00));
    let losses: Vec<_> = accounts
        .statement(house)
        .into_iter()
        .filter(|e| e.kind == EntryKind::BetLost)
        .collect();
    assert_eq!(losses.len(), 1);
    assert_eq!(losses[0].amount, Decimal::ZERO);
}

#[test]
fn lifecycle_walkthrough_scenario() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(500.00)).unwrap();

    let id = bets.place(draft(house, dec!(50.00), dec!(2.0))).unwrap();
    assert_eq!(balance(&accounts, house), dec!(450.00));
    assert_eq!(bets.get(id).unwrap().potential_return, dec!(100.00));

    bets.update_status(id, BetStatus::Won).unwrap();
    assert_eq!(balance(&accounts, house), dec!(550.00));

    bets.update_status(id, BetStatus::Pending).unwrap();
    assert_eq!(balance(&accounts, house), dec!(450.00));

    bets.update_status(id, BetStatus::Lost).unwrap();
    assert_eq!(balance(&accounts, house), dec!(450.00));
}

#[test]
fn reopening_a_won_bet_reverses_the_return() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(100.00)).unwrap();
    let id = bets.place(draft(house, dec!(10.00), dec!(3.0))).unwrap();

    bets.update_status(id, BetStatus::Won).unwrap();
    bets.update_status(id, BetStatus::Pending).unwrap();

    assert_eq!(balance(&accounts, house), dec!(90.00));
    let reversals: Vec<_> = accounts
        .statement(house)
        .into_iter()
        .filter(|e| e.kind == EntryKind::ReturnReversal)
        .collect();
    assert_eq!(reversals.len(), 1);
    assert_eq!(reversals[0].amount, dec!(-30.00));
}

#[test]
fn reopening_a_lost_bet_is_audit_only() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(100.00)).unwrap();
    let id = bets.place(draft(house, dec!(10.00), dec!(3.0))).unwrap();

    bets.update_status(id, BetStatus::Lost).unwrap();
    bets.update_status(id, BetStatus::Pending).unwrap();

    assert_eq!(balance(&accounts, house), dec!(90.00));
    let reopened: Vec<_> = accounts
        .statement(house)
        .into_iter()
        .filter(|e| e.kind == EntryKind::BetPending)
        .collect();
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened[0].amount, Decimal::ZERO);
}

#[test]
fn flipping_won_to_lost_takes_the_return_back() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(100.00)).unwrap();
    let id = bets.place(draft(house, dec!(20.00), dec!(1.5))).unwrap();

    bets.update_status(id, BetStatus::Won).unwrap();
    assert_eq!(balance(&accounts, house), dec!(110.00));

    bets.update_status(id, BetStatus::Lost).unwrap();
    assert_eq!(balance(&accounts, house), dec!(80.00));
}

#[test]
fn flipping_lost_to_won_credits_the_return() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(100.00)).unwrap();
    let id = bets.place(draft(house, dec!(20.00), dec!(1.5))).unwrap();

    bets.update_status(id, BetStatus::Lost).unwrap();
    assert_eq!(balance(&accounts, house), dec!(80.00));

    bets.update_status(id, BetStatus::Won).unwrap();
    assert_eq!(balance(&accounts, house), dec!(110.00));
}

#[test]
fn setting_the_current_status_is_a_noop() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(100.00)).unwrap();
    let id = bets.place(draft(house, dec!(10.00), dec!(2.0))).unwrap();
    let entries_before = accounts.statement(house).len();

    bets.update_status(id, BetStatus::Pending).unwrap();

    assert_eq!(balance(&accounts, house), dec!(90.00));
    assert_eq!(accounts.statement(house).len(), entries_before);
}

#[test]
fn update_status_on_missing_bet_fails() {
    let (_, bets) = setup();
    assert_eq!(
        bets.update_status(bankroll_ledger_rs::BetId(9), BetStatus::Won),
        Err(LedgerError::BetNotFound)
    );
}

#[test]
fn undo_refunds_the_stake_and_deletes_the_bet() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(100.00)).unwrap();
    let id = bets.place(draft(house, dec!(25.00), dec!(2.0))).unwrap();

    bets.undo(id).unwrap();

    assert_eq!(balance(&accounts, house), dec!(100.00));
    assert!(bets.get(id).is_none());

    let refunds: Vec<_> = accounts
        .statement(house)
        .into_iter()
        .filter(|e| e.kind == EntryKind::BetRefund)
        .collect();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0].amount, dec!(25.00));
    assert_eq!(accounts.get(house).unwrap().bet_count, 0);
}

#[test]
fn undo_on_a_settled_bet_fails() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(100.00)).unwrap();
    let id = bets.place(draft(house, dec!(25.00), dec!(2.0))).unwrap();
    bets.update_status(id, BetStatus::Won).unwrap();

    assert_eq!(bets.undo(id), Err(LedgerError::BetNotPending));
    assert!(bets.get(id).is_some());
    assert_eq!(balance(&accounts, house), dec!(125.00));
}

#[test]
fn delete_does_not_refund_the_reservation() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(100.00)).unwrap();
    let id = bets.place(draft(house, dec!(25.00), dec!(2.0))).unwrap();

    bets.delete(id).unwrap();

    // deliberate asymmetry with undo: the stake stays gone
    assert_eq!(balance(&accounts, house), dec!(75.00));
    assert!(bets.get(id).is_none());
    assert_eq!(accounts.get(house).unwrap().bet_count, 0);
}

#[test]
fn delete_missing_bet_fails() {
    let (_, bets) = setup();
    assert_eq!(
        bets.delete(bankroll_ledger_rs::BetId(3)),
        Err(LedgerError::BetNotFound)
    );
}

#[test]
fn edit_recomputes_potential_return_from_partial_fields() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(100.00)).unwrap();
    let id = bets.place(draft(house, dec!(10.00), dec!(2.0))).unwrap();

    // stake only: new stake x stored odds
    bets.edit(
        id,
        BetPatch {
            stake: Some(dec!(15.00)),
            ..BetPatch::default()
        },
    )
    .unwrap();
    assert_eq!(bets.get(id).unwrap().potential_return, dec!(30.00));

    // odds only: stored stake x new odds
    bets.edit(
        id,
        BetPatch {
            odds: Some(dec!(3.0)),
            ..BetPatch::default()
        },
    )
    .unwrap();
    assert_eq!(bets.get(id).unwrap().potential_return, dec!(45.00));

    // both
    bets.edit(
        id,
        BetPatch {
            stake: Some(dec!(20.00)),
            odds: Some(dec!(1.5)),
            ..BetPatch::default()
        },
    )
    .unwrap();
    assert_eq!(bets.get(id).unwrap().potential_return, dec!(30.00));
}

#[test]
fn edit_never_adjusts_the_balance() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(100.00)).unwrap();
    let id = bets.place(draft(house, dec!(10.00), dec!(2.0))).unwrap();

    bets.edit(
        id,
        BetPatch {
            stake: Some(dec!(90.00)),
            ..BetPatch::default()
        },
    )
    .unwrap();

    // the original 10.00 reservation stands even though the stake changed
    assert_eq!(balance(&accounts, house), dec!(90.00));
    assert_eq!(accounts.statement(house).len(), 1);
}

#[test]
fn edit_moving_a_bet_refreshes_both_accounts_statistics() {
    let (accounts, bets) = setup();
    let a = accounts.create("A", dec!(100.00)).unwrap();
    let b = accounts.create("B", dec!(100.00)).unwrap();
    let id = bets.place(draft(a, dec!(10.00), dec!(2.0))).unwrap();
    assert_eq!(accounts.get(a).unwrap().bet_count, 1);

    bets.edit(
        id,
        BetPatch {
            account_id: Some(b),
            ..BetPatch::default()
        },
    )
    .unwrap();

    assert_eq!(accounts.get(a).unwrap().bet_count, 0);
    assert_eq!(accounts.get(b).unwrap().bet_count, 1);
}

#[test]
fn edit_validates_provided_fields() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(100.00)).unwrap();
    let id = bets.place(draft(house, dec!(10.00), dec!(2.0))).unwrap();

    assert_eq!(
        bets.edit(
            id,
            BetPatch {
                odds: Some(dec!(0.9)),
                ..BetPatch::default()
            }
        ),
        Err(LedgerError::InvalidOdds)
    );
    assert_eq!(
        bets.edit(
            id,
            BetPatch {
                stake: Some(Decimal::ZERO),
                ..BetPatch::default()
            }
        ),
        Err(LedgerError::InvalidStake)
    );
    assert_eq!(
        bets.edit(
            id,
            BetPatch {
                account_id: Some(AccountId(77)),
                ..BetPatch::default()
            }
        ),
        Err(LedgerError::AccountNotFound)
    );
}

#[test]
fn statistics_track_the_lifecycle() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(500.00)).unwrap();

    let first = bets.place(draft(house, dec!(100.00), dec!(2.0))).unwrap();
    let second = bets.place(draft(house, dec!(100.00), dec!(3.0))).unwrap();
    bets.update_status(first, BetStatus::Won).unwrap();
    bets.update_status(second, BetStatus::Lost).unwrap();

    let account = accounts.get(house).unwrap();
    assert_eq!(account.bet_count, 2);
    // investment 200, returns 200 -> roi 0
    assert_eq!(account.roi, dec!(0));
    assert_eq!(account.hit_rate, dec!(50.00));
}

#[test]
fn aggregates_over_all_bets() {
    let (accounts, bets) = setup();
    let a = accounts.create("A", dec!(500.00)).unwrap();
    let b = accounts.create("B", dec!(500.00)).unwrap();

    let won = bets.place(draft(a, dec!(50.00), dec!(2.0))).unwrap();
    let lost = bets.place(draft(b, dec!(30.00), dec!(4.0))).unwrap();
    bets.place(draft(b, dec!(20.00), dec!(2.5))).unwrap();
    bets.update_status(won, BetStatus::Won).unwrap();
    bets.update_status(lost, BetStatus::Lost).unwrap();

    // won: +50, lost: -30
    assert_eq!(bets.total_profit(), dec!(20.00));
    // investment 80, returns 100 -> 25%
    assert_eq!(bets.overall_roi(), dec!(25.00));
    assert_eq!(bets.total_pending_value(), dec!(20.00));
}

#[test]
fn overall_roi_with_no_settled_bets_is_zero() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(100.00)).unwrap();
    bets.place(draft(house, dec!(10.00), dec!(2.0))).unwrap();

    assert_eq!(bets.overall_roi(), Decimal::ZERO);
    assert_eq!(bets.total_profit(), Decimal::ZERO);
}

#[test]
fn queries_filter_by_account_and_status() {
    let (accounts, bets) = setup();
    let a = accounts.create("A", dec!(100.00)).unwrap();
    let b = accounts.create("B", dec!(100.00)).unwrap();

    let on_a = bets.place(draft(a, dec!(10.00), dec!(2.0))).unwrap();
    bets.place(draft(b, dec!(10.00), dec!(2.0))).unwrap();
    bets.update_status(on_a, BetStatus::Won).unwrap();

    assert_eq!(bets.by_account(a).len(), 1);
    assert_eq!(bets.by_status(BetStatus::Won).len(), 1);
    assert_eq!(bets.by_status(BetStatus::Pending).len(), 1);
    assert_eq!(bets.list().len(), 2);
}

#[test]
fn account_with_bets_cannot_be_removed() {
    let (accounts, bets) = setup();
    let house = accounts.create("A", dec!(100.00)).unwrap();
    bets.place(draft(house, dec!(10.00), dec!(2.0))).unwrap();

    assert_eq!(accounts.remove(house), Err(LedgerError::AccountHasBets));
}
