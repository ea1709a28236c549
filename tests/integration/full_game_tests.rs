//! End-to-end games between two sessions sharing one ledger

use broadside::ledger::TransactionKind;
use broadside::{Cell, GameEvent, PlacementValidity, Stage, Turn};

use super::{next_event, started_game, wait_for_stage, Table, ALICE, BOB};
use crate::mocks::MockLedger;

#[tokio::test(start_paused = true)]
async fn test_first_player_sinks_every_ship() -> anyhow::Result<()> {
    let ledger = MockLedger::new(3);
    let Table {
        mut alice,
        mut bob,
        mut alice_events,
        mut bob_events,
    } = started_game(&ledger, &[0, 4], &[1, 4]).await;

    assert_eq!(next_event(&mut alice_events).await, GameEvent::GuessNeeded);
    assert_eq!(alice.guess_cell(1, 1).await?, 4);

    assert_eq!(
        next_event(&mut bob_events).await,
        GameEvent::OpponentGuess {
            index: 4,
            was_hit: true,
            game_over: false,
        }
    );
    assert_eq!(
        next_event(&mut alice_events).await,
        GameEvent::GuessResult {
            index: 4,
            revealed: Cell::Revealed(true),
            game_over: false,
        }
    );

    // A hit keeps the turn
    assert_eq!(next_event(&mut alice_events).await, GameEvent::GuessNeeded);
    assert_eq!(alice.guess_cell(1, 0).await?, 1);

    assert_eq!(
        next_event(&mut bob_events).await,
        GameEvent::OpponentGuess {
            index: 1,
            was_hit: true,
            game_over: true,
        }
    );
    assert_eq!(
        next_event(&mut alice_events).await,
        GameEvent::GuessResult {
            index: 1,
            revealed: Cell::Revealed(true),
            game_over: true,
        }
    );

    assert_eq!(
        next_event(&mut alice_events).await,
        GameEvent::Finish {
            did_win: true,
            local_grid_valid: PlacementValidity::Valid,
            opponent_grid_valid: PlacementValidity::Valid,
        }
    );
    assert_eq!(
        next_event(&mut bob_events).await,
        GameEvent::Finish {
            did_win: false,
            local_grid_valid: PlacementValidity::Valid,
            opponent_grid_valid: PlacementValidity::Valid,
        }
    );

    let global = alice.global_state().unwrap();
    assert_eq!(global.stage, Stage::Finished);
    assert_eq!(global.winner, Some(Turn::Player1));
    assert_eq!(global.winner_address(), Some(ALICE));

    // Post-reveal opened every remaining cell on both boards
    let bob_board = alice.opponent_state().unwrap();
    assert!(bob_board.cells.iter().all(|cell| matches!(cell, Cell::Revealed(_))));
    assert_eq!(bob_board.cells[1], Cell::Revealed(true));
    assert_eq!(bob_board.cells[4], Cell::Revealed(true));
    assert_eq!(bob_board.cells[0], Cell::Revealed(false));
    assert_eq!(bob_board.ships_left, 0);

    let alice_board = alice.local_state().unwrap();
    assert_eq!(alice_board.cells[0], Cell::Revealed(true));
    assert_eq!(alice_board.placement_valid, PlacementValidity::Valid);

    let layout = alice.my_cells().await;
    assert_eq!(layout, vec![true, false, false, false, true, false, false, false, false]);

    let id = alice.session_id().unwrap();

    bob.reset().await?;
    alice.reset().await?;

    for side in [&alice, &bob] {
        assert_eq!(side.session_id(), None);
        assert_eq!(side.opponent(), None);
        assert!(side.global_state().is_none());
        assert!(side.local_state().is_none());
        assert!(side.my_cells().await.is_empty());
    }

    assert!(!ledger.app_exists(id));
    let bob_txns = ledger.confirmed_from(BOB);
    assert_eq!(bob_txns.last().map(|txn| txn.kind.clone()), Some(TransactionKind::CloseOut));
    assert!(bob_txns.iter().all(|txn| txn.kind != TransactionKind::Delete));

    let alice_tail: Vec<TransactionKind> = ledger
        .confirmed_from(ALICE)
        .iter()
        .rev()
        .take(2)
        .map(|txn| txn.kind.clone())
        .collect();
    assert_eq!(alice_tail, vec![TransactionKind::Delete, TransactionKind::CloseOut]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_miss_passes_the_turn() {
    let ledger = MockLedger::new(3);
    let Table {
        alice,
        bob,
        mut alice_events,
        mut bob_events,
    } = started_game(&ledger, &[0, 4], &[1, 4]).await;

    assert_eq!(next_event(&mut alice_events).await, GameEvent::GuessNeeded);
    assert_eq!(alice.guess_cell(2, 2).await.unwrap(), 8);

    assert_eq!(
        next_event(&mut bob_events).await,
        GameEvent::OpponentGuess {
            index: 8,
            was_hit: false,
            game_over: false,
        }
    );
    assert_eq!(
        next_event(&mut alice_events).await,
        GameEvent::GuessResult {
            index: 8,
            revealed: Cell::Revealed(false),
            game_over: false,
        }
    );
    assert_eq!(next_event(&mut bob_events).await, GameEvent::GuessNeeded);
    assert_eq!(bob.global_state().unwrap().turn, Turn::Player2);

    assert_eq!(bob.guess_cell(0, 0).await.unwrap(), 0);
    assert_eq!(
        next_event(&mut alice_events).await,
        GameEvent::OpponentGuess {
            index: 0,
            was_hit: true,
            game_over: false,
        }
    );
    assert_eq!(
        next_event(&mut bob_events).await,
        GameEvent::GuessResult {
            index: 0,
            revealed: Cell::Revealed(true),
            game_over: false,
        }
    );
    assert_eq!(next_event(&mut bob_events).await, GameEvent::GuessNeeded);

    wait_for_stage(&alice, Stage::Guess).await;
    let alice_board = alice.local_state().unwrap();
    assert_eq!(alice_board.ships_left, 1);
    assert_eq!(alice_board.cells[0], Cell::Revealed(true));
    assert!(matches!(alice_board.cells[4], Cell::Committed(_)));
}

#[tokio::test(start_paused = true)]
async fn test_reset_clears_local_view() {
    let ledger = MockLedger::new(3);
    let Table {
        mut alice,
        bob,
        mut alice_events,
        ..
    } = started_game(&ledger, &[2], &[6]).await;

    assert_eq!(next_event(&mut alice_events).await, GameEvent::GuessNeeded);
    let id = alice.session_id().unwrap();

    alice.reset().await.unwrap();

    assert_eq!(alice.session_id(), None);
    assert_eq!(alice.opponent(), None);
    assert!(alice.global_state().is_none());
    assert!(alice.grid().is_none());
    assert!(alice.my_cells().await.is_empty());
    assert!(!alice.is_polling());
    assert!(alice_events.recv().await.is_none());
    assert!(!ledger.app_exists(id));

    // The other side is untouched until it resets
    assert_eq!(bob.session_id(), Some(id));
}
