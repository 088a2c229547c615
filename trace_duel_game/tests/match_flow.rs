// End-to-end match flow through the public `GameArea` API.
//
// Uses the built-in `OutlineCatalog`, so these tests also check that the
// catalog's outlines fit the default canvas well enough to be traced and
// scored. The area is driven exactly the way the relay drives it: commands
// for each player, then clock ticks, reading results back through a
// subscription.

use std::sync::Arc;

use trace_duel_game::{
    AreaCommand, AreaId, AreaUpdate, CommandResponse, Difficulty, GameArea, GameConfig, GameError,
    GameId, GameStatus, OutlineCatalog, Pixel, PixelMove, PlayerId, PlayerSlot,
};

fn new_area(seed: u64) -> GameArea {
    GameArea::new(
        AreaId::new("plaza"),
        GameConfig::default(),
        Arc::new(OutlineCatalog),
        seed,
    )
}

fn join(area: &mut GameArea, player: &PlayerId) -> GameId {
    match area.handle_command(player, AreaCommand::JoinGame).unwrap() {
        CommandResponse::GameJoined { game_id } => game_id,
        other => panic!("expected GameJoined, got {other:?}"),
    }
}

fn trace(
    area: &mut GameArea,
    player: &PlayerId,
    game_id: GameId,
    slot: PlayerSlot,
    pixels: Vec<Pixel>,
) {
    area.handle_command(
        player,
        AreaCommand::GameMove {
            game_id,
            game_move: PixelMove {
                player_slot: slot,
                pixels,
            },
        },
    )
    .unwrap();
}

#[test]
fn exact_trace_beats_partial_trace() {
    let alice = PlayerId::new("p-alice");
    let bob = PlayerId::new("p-bob");
    let mut area = new_area(2024);
    area.add_occupant(alice.clone(), "Alice");
    area.add_occupant(bob.clone(), "Bob");
    let updates = area.subscribe();

    let game_id = join(&mut area, &alice);
    assert_eq!(join(&mut area, &bob), game_id);
    assert_eq!(area.game().unwrap().status(), GameStatus::InProgress);

    area.handle_command(
        &bob,
        AreaCommand::PickDifficulty {
            game_id,
            game_difficulty: Difficulty::Medium,
        },
    )
    .unwrap();
    let shape = area.game().unwrap().trace_shape().unwrap().clone();
    assert!(Difficulty::Medium.candidates().contains(&shape.title()));

    area.handle_command(&alice, AreaCommand::StartGame { game_id })
        .unwrap();
    assert_eq!(area.game().unwrap().status(), GameStatus::GameStarted);

    // Clients resend the whole trace; only the latest counts.
    let reference = shape.pixels().to_vec();
    trace(&mut area, &alice, game_id, PlayerSlot::One, reference[..10].to_vec());
    trace(&mut area, &alice, game_id, PlayerSlot::One, reference.clone());
    let quarter = reference.len() / 4;
    trace(&mut area, &bob, game_id, PlayerSlot::Two, reference[..quarter].to_vec());

    // Run the clock down a second at a time.
    let mut ticks = 0;
    while area.tick(1.0) {
        ticks += 1;
        assert!(ticks <= 60, "round never ended");
    }
    assert_eq!(ticks, 60);

    let game = area.game().unwrap();
    assert_eq!(game.status(), GameStatus::Over);
    assert_eq!(game.timer(), 0.0);
    assert_eq!(game.winner(), Some(&alice));
    assert_eq!(game.accuracy(PlayerSlot::One), Some(1.0));
    let bob_accuracy = game.accuracy(PlayerSlot::Two).unwrap();
    assert!(bob_accuracy > 0.0 && bob_accuracy < 1.0);

    assert_eq!(area.history().len(), 1);
    let result = &area.history()[0];
    assert_eq!(result.game_id, game_id);
    assert_eq!(result.scores.get("Alice"), Some(&1));
    assert_eq!(result.scores.get("Bob"), Some(&0));

    // The final notification carries the finished game and the new entry.
    let last: AreaUpdate = updates.try_iter().last().unwrap();
    let snapshot = last.game.unwrap();
    assert_eq!(snapshot.status, GameStatus::Over);
    assert_eq!(snapshot.winner, Some(alice.clone()));
    assert_eq!(last.history.len(), 1);

    // Moves after the round are rejected.
    let err = area
        .handle_command(
            &alice,
            AreaCommand::GameMove {
                game_id,
                game_move: PixelMove {
                    player_slot: PlayerSlot::One,
                    pixels: reference,
                },
            },
        )
        .unwrap_err();
    assert!(matches!(err, GameError::InvalidMove(_)));
    assert_eq!(area.history().len(), 1);
}

#[test]
fn leaving_mid_round_forfeits_and_next_join_starts_fresh() {
    let alice = PlayerId::new("p-alice");
    let bob = PlayerId::new("p-bob");
    let mut area = new_area(7);

    let first = join(&mut area, &alice);
    join(&mut area, &bob);
    area.handle_command(
        &alice,
        AreaCommand::PickDifficulty {
            game_id: first,
            game_difficulty: Difficulty::Hard,
        },
    )
    .unwrap();
    area.handle_command(&alice, AreaCommand::StartGame { game_id: first })
        .unwrap();
    area.tick(10.0);

    area.handle_command(&alice, AreaCommand::LeaveGame { game_id: first })
        .unwrap();
    let game = area.game().unwrap();
    assert_eq!(game.status(), GameStatus::Over);
    assert_eq!(game.winner(), Some(&bob));

    // Nobody was in the roster, so history falls back to raw ids.
    let scores = &area.history()[0].scores;
    assert_eq!(scores.get("p-bob"), Some(&1));
    assert_eq!(scores.get("p-alice"), Some(&0));

    // Ticks no longer do anything.
    assert!(!area.tick(5.0));

    let second = join(&mut area, &bob);
    assert_ne!(second, first);
    assert_eq!(area.game().unwrap().status(), GameStatus::WaitingToStart);
    assert_eq!(area.history().len(), 1);

    // The stale id is now a mismatch.
    let err = area
        .handle_command(&alice, AreaCommand::LeaveGame { game_id: first })
        .unwrap_err();
    assert_eq!(err, GameError::GameIdMismatch);
}

#[test]
fn repicking_difficulty_before_start_replaces_the_shape() {
    let alice = PlayerId::new("a");
    let bob = PlayerId::new("b");
    let mut area = new_area(99);
    let game_id = join(&mut area, &alice);
    join(&mut area, &bob);

    for difficulty in [Difficulty::Easy, Difficulty::Hard] {
        area.handle_command(
            &alice,
            AreaCommand::PickDifficulty {
                game_id,
                game_difficulty: difficulty,
            },
        )
        .unwrap();
        let game = area.game().unwrap();
        assert_eq!(game.difficulty(), difficulty);
        let shape = game.trace_shape().unwrap();
        assert!(difficulty.candidates().contains(&shape.title()));
    }

    // An unrecognized tier is accepted but changes nothing.
    let before = area.game().unwrap().snapshot();
    area.handle_command(
        &alice,
        AreaCommand::PickDifficulty {
            game_id,
            game_difficulty: Difficulty::Unknown,
        },
    )
    .unwrap();
    assert_eq!(area.game().unwrap().snapshot(), before);
}
