//! Integration tests for board governance: pausing, two-step ownership
//! transfer, and which operations stay available while paused.

use msgboard_contracts::config::PIN_24H_BLOCKS;
use msgboard_contracts::{BoardError, BoardEvent, MessageBoard};

const OWNER: &str = "deployer";

fn seeded_board() -> MessageBoard {
    let mut board = MessageBoard::new(OWNER);
    board.post_message("alice", 100, "before pause").unwrap();
    board.take_events();
    board
}

// ---------------------------------------------------------------------------
// Pause
// ---------------------------------------------------------------------------

#[test]
fn pause_blocks_every_content_mutation() {
    let mut board = seeded_board();
    board.pause(OWNER).unwrap();
    assert!(board.is_paused());

    assert_eq!(board.post_message("bob", 200, "hi"), Err(BoardError::Paused));
    assert_eq!(board.reply_to_message("bob", 200, 0, "hi"), Err(BoardError::Paused));
    assert_eq!(board.edit_message("alice", 200, 0, "hi"), Err(BoardError::Paused));
    assert_eq!(
        board.pin_message("alice", 200, 0, PIN_24H_BLOCKS),
        Err(BoardError::Paused)
    );
    assert_eq!(board.react_to_message("bob", 200, 0), Err(BoardError::Paused));
    assert_eq!(board.react_to_message_typed("bob", 200, 0, 3), Err(BoardError::Paused));
    assert_eq!(board.delete_message("alice", 200, 0), Err(BoardError::Paused));
}

#[test]
fn pause_is_reported_before_input_errors() {
    let mut board = seeded_board();
    board.pause(OWNER).unwrap();
    assert_eq!(board.post_message("bob", 200, ""), Err(BoardError::Paused));
    assert_eq!(board.pin_message("alice", 200, 99, 1), Err(BoardError::Paused));
    assert_eq!(board.react_to_message_typed("bob", 200, 99, 9), Err(BoardError::Paused));
}

#[test]
fn admin_and_reads_work_while_paused() {
    let mut board = seeded_board();
    board.pause(OWNER).unwrap();

    assert!(board.get_message(0).is_some());
    assert!(board.get_active_message(0, 100).is_some());
    assert!(board.get_contract_stats().paused);

    board.withdraw_fees(OWNER, 200, 1_000, "treasury").unwrap();
    board.set_fee_post_message(OWNER, 20_000).unwrap();
    board.propose_ownership_transfer(OWNER, "heir").unwrap();
    board.accept_ownership("heir").unwrap();
    board.unpause("heir").unwrap();

    assert_eq!(board.post_message("bob", 200, "back"), Ok(1));
    assert_eq!(board.get_user_stats("bob").unwrap().total_spent, 20_000);
}

#[test]
fn non_owner_cannot_pause() {
    let mut board = seeded_board();
    assert_eq!(board.pause("alice"), Err(BoardError::OwnerOnly));
    assert_eq!(board.unpause("alice"), Err(BoardError::OwnerOnly));
    assert!(!board.is_paused());
    assert!(board.take_events().is_empty());
}

// ---------------------------------------------------------------------------
// Ownership transfer
// ---------------------------------------------------------------------------

#[test]
fn two_step_transfer() {
    let mut board = seeded_board();
    assert_eq!(board.accept_ownership("heir"), Err(BoardError::NoPendingProposal));
    assert_eq!(
        board.propose_ownership_transfer("alice", "alice"),
        Err(BoardError::OwnerOnly)
    );

    board.propose_ownership_transfer(OWNER, "heir").unwrap();
    assert_eq!(board.get_proposed_owner(), Some("heir"));
    assert_eq!(board.get_owner(), OWNER);
    assert_eq!(board.accept_ownership("alice"), Err(BoardError::NotProposedOwner));

    board.accept_ownership("heir").unwrap();
    assert_eq!(board.get_owner(), "heir");
    assert_eq!(board.get_proposed_owner(), None);
    assert_eq!(board.pause(OWNER), Err(BoardError::OwnerOnly));
    board.pause("heir").unwrap();
}

#[test]
fn newer_proposal_invalidates_older_candidate() {
    let mut board = seeded_board();
    board.propose_ownership_transfer(OWNER, "first").unwrap();
    board.propose_ownership_transfer(OWNER, "second").unwrap();

    assert_eq!(board.accept_ownership("first"), Err(BoardError::NotProposedOwner));
    board.accept_ownership("second").unwrap();
    assert_eq!(board.get_owner(), "second");
}

#[test]
fn cancel_clears_the_candidate() {
    let mut board = seeded_board();
    board.propose_ownership_transfer(OWNER, "heir").unwrap();
    assert_eq!(board.cancel_ownership_transfer("heir"), Err(BoardError::OwnerOnly));
    board.cancel_ownership_transfer(OWNER).unwrap();

    assert_eq!(board.accept_ownership("heir"), Err(BoardError::NoPendingProposal));

    let events = board.take_events();
    assert_eq!(
        events.last(),
        Some(&BoardEvent::OwnershipTransferCancelled {
            owner: OWNER.into(),
            candidate: Some("heir".into()),
        })
    );

    // Nothing pending: still succeeds and says so.
    board.cancel_ownership_transfer(OWNER).unwrap();
    assert_eq!(
        board.take_events(),
        vec![BoardEvent::OwnershipTransferCancelled {
            owner: OWNER.into(),
            candidate: None,
        }]
    );
}

#[test]
fn governance_events() {
    let mut board = seeded_board();
    board.pause(OWNER).unwrap();
    board.unpause(OWNER).unwrap();
    board.propose_ownership_transfer(OWNER, "heir").unwrap();
    board.accept_ownership("heir").unwrap();

    assert_eq!(
        board.take_events(),
        vec![
            BoardEvent::ContractPaused { by: OWNER.into() },
            BoardEvent::ContractUnpaused { by: OWNER.into() },
            BoardEvent::OwnershipProposed {
                owner: OWNER.into(),
                candidate: "heir".into(),
            },
            BoardEvent::OwnershipAccepted {
                previous_owner: OWNER.into(),
                new_owner: "heir".into(),
            },
        ]
    );
}
