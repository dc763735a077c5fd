//! Integration tests for fees, spend tracking and the treasury.

use msgboard_contracts::config::{MAX_FEE, MIN_FEE, PIN_24H_BLOCKS, PIN_72H_BLOCKS};
use msgboard_contracts::{BoardError, BoardEvent, FeeKind, MessageBoard};

const OWNER: &str = "deployer";

// ---------------------------------------------------------------------------
// Fee schedule
// ---------------------------------------------------------------------------

#[test]
fn default_fees_are_charged() {
    let mut board = MessageBoard::new(OWNER);
    board.post_message("alice", 100, "a").unwrap(); // 10_000
    board.reply_to_message("bob", 100, 0, "b").unwrap(); // 10_000
    board.pin_message("alice", 100, 0, PIN_24H_BLOCKS).unwrap(); // 50_000
    board.pin_message("bob", 100, 1, PIN_72H_BLOCKS).unwrap(); // 100_000
    board.react_to_message("carol", 100, 0).unwrap(); // 5_000

    assert_eq!(board.get_total_fees_collected(), 175_000);
    assert_eq!(board.get_contract_balance(), 175_000);
    assert_eq!(board.get_user_stats("alice").unwrap().total_spent, 60_000);
    assert_eq!(board.get_user_stats("bob").unwrap().total_spent, 110_000);
    assert_eq!(board.get_user_stats("carol").unwrap().total_spent, 5_000);
}

#[test]
fn edits_and_deletes_are_free() {
    let mut board = MessageBoard::new(OWNER);
    board.post_message("alice", 100, "a").unwrap();
    board.edit_message("alice", 100, 0, "b").unwrap();
    board.delete_message("alice", 100, 0).unwrap();
    assert_eq!(board.get_total_fees_collected(), 10_000);
    assert_eq!(board.get_user_stats("alice").unwrap().total_spent, 10_000);
}

#[test]
fn fee_changes_apply_to_next_action_only() {
    let mut board = MessageBoard::new(OWNER);
    board.post_message("alice", 100, "old price").unwrap();

    board.set_fee_post_message(OWNER, 25_000).unwrap();
    board.set_fee_pin_24h(OWNER, 60_000).unwrap();
    board.set_fee_pin_72h(OWNER, 90_000).unwrap();
    board.set_fee_reaction(OWNER, 1_000).unwrap();

    assert_eq!(board.get_user_stats("alice").unwrap().total_spent, 10_000);

    board.post_message("bob", 100, "new price").unwrap();
    board.pin_message("bob", 100, 1, PIN_24H_BLOCKS).unwrap();
    board.pin_message("bob", 101, 1, PIN_72H_BLOCKS).unwrap();
    board.react_to_message("bob", 101, 0).unwrap();
    assert_eq!(board.get_user_stats("bob").unwrap().total_spent, 176_000);
}

#[test]
fn fee_bounds_and_ownership() {
    let mut board = MessageBoard::new(OWNER);
    for kind in [FeeKind::Post, FeeKind::Pin24h, FeeKind::Pin72h, FeeKind::Reaction] {
        assert_eq!(board.set_fee("alice", kind, 5_000), Err(BoardError::OwnerOnly));
        assert_eq!(board.set_fee(OWNER, kind, MIN_FEE - 1), Err(BoardError::InvalidInput));
        assert_eq!(board.set_fee(OWNER, kind, MAX_FEE + 1), Err(BoardError::InvalidInput));
        board.set_fee(OWNER, kind, MIN_FEE).unwrap();
        board.set_fee(OWNER, kind, MAX_FEE).unwrap();
        assert_eq!(board.fee(kind), MAX_FEE);
    }
    // Owner check comes before the bounds check.
    assert_eq!(board.set_fee("alice", FeeKind::Post, 0), Err(BoardError::OwnerOnly));
}

#[test]
fn fee_update_event_reports_old_and_new() {
    let mut board = MessageBoard::new(OWNER);
    board.set_fee_pin_72h(OWNER, 150_000).unwrap();
    assert_eq!(
        board.take_events(),
        vec![BoardEvent::FeeUpdated {
            kind: FeeKind::Pin72h,
            old_value: 100_000,
            new_value: 150_000,
        }]
    );
}

// ---------------------------------------------------------------------------
// Treasury
// ---------------------------------------------------------------------------

#[test]
fn partial_withdrawals_to_any_recipient() {
    let mut board = MessageBoard::new(OWNER);
    board.post_message("alice", 100, "a").unwrap();
    board.post_message("bob", 100, "b").unwrap();

    board.withdraw_fees(OWNER, 110, 4_000, "treasury").unwrap();
    board.withdraw_fees(OWNER, 120, 6_000, "alice").unwrap();
    assert_eq!(board.get_contract_balance(), 10_000);

    let log = board.get_withdrawals();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].recipient, "alice");
    assert_eq!(log[1].height, 120);

    let stats = board.get_contract_stats();
    assert_eq!(stats.total_withdrawn, 10_000);
    assert_eq!(stats.total_fees_collected, 20_000);
}

#[test]
fn overdraft_leaves_balance_unchanged() {
    let mut board = MessageBoard::new(OWNER);
    board.post_message("alice", 100, "a").unwrap();

    assert_eq!(
        board.withdraw_fees(OWNER, 100, 10_001, OWNER),
        Err(BoardError::InsufficientBalance)
    );
    assert_eq!(board.withdraw_fees(OWNER, 100, 0, OWNER), Err(BoardError::InvalidInput));
    assert_eq!(
        board.withdraw_fees("alice", 100, 1, "alice"),
        Err(BoardError::OwnerOnly)
    );
    assert_eq!(board.get_contract_balance(), 10_000);
    assert!(board.get_withdrawals().is_empty());

    board.withdraw_fees(OWNER, 100, 10_000, OWNER).unwrap();
    assert_eq!(board.get_contract_balance(), 0);
    assert_eq!(
        board.withdraw_fees(OWNER, 100, 1, OWNER),
        Err(BoardError::InsufficientBalance)
    );
}

#[test]
fn withdrawal_event_reports_remaining_balance() {
    let mut board = MessageBoard::new(OWNER);
    board.post_message("alice", 100, "a").unwrap();
    board.take_events();
    board.withdraw_fees(OWNER, 100, 2_500, "treasury").unwrap();
    assert_eq!(
        board.take_events(),
        vec![BoardEvent::FeesWithdrawn {
            amount: 2_500,
            recipient: "treasury".into(),
            remaining_balance: 7_500,
        }]
    );
}
