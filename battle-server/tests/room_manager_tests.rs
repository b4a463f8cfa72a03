
use battle_types::{GameError, RoomPhase, ServerMessage};
use std::time::Duration;
use test_helpers::*;

#[tokio::test]
async fn test_create_room_generates_valid_code() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(3, 60, 100)).await;

    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    assert_eq!(setup.room_manager.active_room_count(), 1);
}

#[tokio::test]
async fn test_join_unknown_room_fails() {
    let setup = TestServerSetup::new().await;
    let (conn, _rx) = setup.connect().await;

    let err = setup
        .room_manager
        .join_room(conn, "ZZZZ99", "Alice")
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::RoomNotFound { .. }));

    let err = setup
        .room_manager
        .join_room(conn, "not-a-code", "Alice")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), battle_types::ErrorKind::Validation);
}

#[tokio::test]
async fn test_join_duplicate_name_fails() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(3, 60, 100)).await;
    let _alice = setup.join(&code, "Alice").await;

    let (conn, _rx) = setup.connect().await;
    let err = setup
        .room_manager
        .join_room(conn, &code, "ALICE")
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::NameTaken { .. }));
}

#[tokio::test]
async fn test_room_fills_at_eight_players() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(3, 60, 100)).await;

    let mut connections = Vec::new();
    for i in 0..8 {
        connections.push(setup.join(&code, &format!("Player{i}")).await);
    }

    let (conn, _rx) = setup.connect().await;
    let err = setup
        .room_manager
        .join_room(conn, &code, "Ninth")
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::RoomFull { .. }));
}

#[tokio::test]
async fn test_join_broadcasts_roster_update() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(3, 60, 100)).await;

    let (_conn_a, mut rx_a, _alice) = setup.join(&code, "Alice").await;
    // Alice sees her own join...
    assert!(matches!(next_message(&mut rx_a).await, ServerMessage::PlayerJoined { .. }));
    assert!(matches!(next_message(&mut rx_a).await, ServerMessage::JoinedRoom { .. }));

    // ...and Bob's.
    let _bob = setup.join(&code, "Bob").await;
    match next_message(&mut rx_a).await {
        ServerMessage::PlayerJoined { player, players } => {
            assert_eq!(player.name, "Bob");
            assert_eq!(players.len(), 2);
        }
        other => panic!("expected PlayerJoined, got {other:?}"),
    }
}

#[tokio::test]
async fn test_start_game_requires_host() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(1, 60, 100)).await;
    let _alice = setup.join(&code, "Alice").await;
    let (conn_b, _rx_b, _bob) = setup.join(&code, "Bob").await;

    let err = setup
        .room_manager
        .clone()
        .start_game(conn_b, &code, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::NotHost { .. }));
}

#[tokio::test]
async fn test_start_game_requires_two_players() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(1, 60, 100)).await;
    let (conn_a, _rx_a, _alice) = setup.join(&code, "Alice").await;

    let err = setup
        .room_manager
        .clone()
        .start_game(conn_a, &code, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), battle_types::ErrorKind::Validation);
}

// End-to-end scenario A: both players submit before the timeout and the
// round ends immediately with both results present.
#[tokio::test]
async fn test_round_ends_early_when_everyone_submits() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(1, 60, 100)).await;
    let (conn_a, mut rx_a, _alice) = setup.join(&code, "Alice").await;
    let (conn_b, _rx_b, _bob) = setup.join(&code, "Bob").await;

    setup
        .room_manager
        .clone()
        .start_game(conn_a, &code, None)
        .await
        .unwrap();
    let round_id = wait_for_round_started(&mut rx_a).await;

    setup
        .room_manager
        .submit_prompt(conn_a, &round_id, TEST_TARGET)
        .await
        .unwrap();
    setup
        .room_manager
        .submit_prompt(conn_b, &round_id, "a blue boat")
        .await
        .unwrap();

    // The 60 second timer has not fired; the all-submitted trigger
    // closes the round right away.
    let (results, _scores, is_last) = wait_for_round_ended(&mut rx_a).await;
    assert_eq!(results.len(), 2);
    assert!(is_last);

    let snapshot = setup.room_manager.room_snapshot(&code).await.unwrap();
    assert_eq!(snapshot.phase, RoomPhase::Finished);
}

// End-to-end scenario B: only one of two players submits; the timeout
// closes the round and the silent player is scored against empty text.
#[tokio::test]
async fn test_timeout_ends_round_with_zero_score_for_silent_player() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(1, 1, 100)).await;
    let (conn_a, mut rx_a, _alice) = setup.join(&code, "Alice").await;
    let (_conn_b, _rx_b, _bob) = setup.join(&code, "Bob").await;

    setup
        .room_manager
        .clone()
        .start_game(conn_a, &code, None)
        .await
        .unwrap();
    let round_id = wait_for_round_started(&mut rx_a).await;

    setup
        .room_manager
        .submit_prompt(conn_a, &round_id, TEST_TARGET)
        .await
        .unwrap();

    // No second submission arrives; the one second timer closes the
    // round on its own.
    let (results, scores, _is_last) = wait_for_round_ended(&mut rx_a).await;
    assert_eq!(results.len(), 2);

    let bob = results.iter().find(|r| r.player_name == "Bob").unwrap();
    assert_eq!(bob.accuracy_score, 0);
    assert_eq!(bob.leaderboard_points, 0);
    assert!(bob.submitted_at.is_none());
    assert_eq!(bob.missed_words, vec!["a", "red", "car", "on", "road"]);

    let alice_score = scores.iter().find(|(name, _)| name == "Alice").unwrap().1;
    assert!(alice_score > 0);
}

// End-to-end scenario C: an exact match scores 100 accuracy and the
// leaderboard points follow the documented bonus and multiplier rules.
#[tokio::test]
async fn test_exact_match_round_scores() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(1, 60, 400)).await;
    let (conn_a, mut rx_a, _alice) = setup.join(&code, "Alice").await;
    let (conn_b, _rx_b, _bob) = setup.join(&code, "Bob").await;

    setup
        .room_manager
        .clone()
        .start_game(conn_a, &code, None)
        .await
        .unwrap();
    let round_id = wait_for_round_started(&mut rx_a).await;

    setup
        .room_manager
        .submit_prompt(conn_a, &round_id, TEST_TARGET)
        .await
        .unwrap();
    setup
        .room_manager
        .submit_prompt(conn_b, &round_id, "xyz unrelated text here now")
        .await
        .unwrap();

    let (results, _scores, _) = wait_for_round_ended(&mut rx_a).await;
    let alice = results.iter().find(|r| r.player_name == "Alice").unwrap();
    assert_eq!(alice.accuracy_score, 100);
    // Easy tier: accuracy plus the perfect-match bonus, multiplier 1.0.
    let bonus_total: i32 = alice.bonuses.iter().map(|b| b.points).sum();
    assert_eq!(alice.leaderboard_points, 100 + bonus_total);

    // Scenario D: the no-overlap attempt lands materially low.
    let bob = results.iter().find(|r| r.player_name == "Bob").unwrap();
    assert!(bob.accuracy_score < 20);

    // Results are ordered by points.
    assert_eq!(results[0].player_name, "Alice");
}

// The central safety property: one round close, no matter how many
// triggers race for it.
#[tokio::test]
async fn test_round_closes_exactly_once_under_racing_triggers() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(1, 60, 100)).await;
    let (conn_a, mut rx_a, _alice) = setup.join(&code, "Alice").await;
    let (conn_b, _rx_b, _bob) = setup.join(&code, "Bob").await;

    setup
        .room_manager
        .clone()
        .start_game(conn_a, &code, None)
        .await
        .unwrap();
    let round_id = wait_for_round_started(&mut rx_a).await;

    setup
        .room_manager
        .submit_prompt(conn_a, &round_id, TEST_TARGET)
        .await
        .unwrap();

    // Race the final submission against a burst of simulated timer
    // expiries for the same round.
    let mut tasks = Vec::new();
    for _ in 0..10 {
        let manager = setup.room_manager.clone();
        let code = code.clone();
        let round_id = round_id.clone();
        tasks.push(tokio::spawn(async move {
            manager.end_round(&code, &round_id).await;
        }));
    }
    {
        let manager = setup.room_manager.clone();
        let round_id = round_id.clone();
        tasks.push(tokio::spawn(async move {
            let _ = manager.submit_prompt(conn_b, &round_id, "a red boat").await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // Give the broadcast fan-out a moment to settle, then count.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let ended_events = drain_round_ended_count(&mut rx_a);
    assert_eq!(ended_events, 1, "round must close exactly once");

    // Cumulative scores were applied exactly once: Alice's exact match
    // is worth 110 on the Easy tier (100 accuracy + 10 perfect match).
    let snapshot = setup.room_manager.room_snapshot(&code).await.unwrap();
    let alice_score = snapshot
        .cumulative_scores
        .iter()
        .find(|(name, _)| name == "Alice")
        .unwrap()
        .1;
    assert_eq!(alice_score, 110);
}

#[tokio::test]
async fn test_resubmit_overwrites_and_unsubmit_reopens() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(1, 60, 100)).await;
    let (conn_a, mut rx_a, _alice) = setup.join(&code, "Alice").await;
    let (conn_b, _rx_b, _bob) = setup.join(&code, "Bob").await;

    setup
        .room_manager
        .clone()
        .start_game(conn_a, &code, None)
        .await
        .unwrap();
    let round_id = wait_for_round_started(&mut rx_a).await;

    setup
        .room_manager
        .submit_prompt(conn_a, &round_id, "first draft")
        .await
        .unwrap();
    setup
        .room_manager
        .unsubmit_prompt(conn_a, &round_id)
        .await
        .unwrap();
    setup
        .room_manager
        .submit_prompt(conn_a, &round_id, TEST_TARGET)
        .await
        .unwrap();

    // Bob completes the roster; Alice's final text is the scored one.
    setup
        .room_manager
        .submit_prompt(conn_b, &round_id, "a car")
        .await
        .unwrap();

    let (results, _, _) = wait_for_round_ended(&mut rx_a).await;
    let alice = results.iter().find(|r| r.player_name == "Alice").unwrap();
    assert_eq!(alice.text, TEST_TARGET);
    assert_eq!(alice.accuracy_score, 100);
}

#[tokio::test]
async fn test_submission_validation_rejects_out_of_bounds_text() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(1, 60, 20)).await;
    let (conn_a, mut rx_a, _alice) = setup.join(&code, "Alice").await;
    let (_conn_b, _rx_b, _bob) = setup.join(&code, "Bob").await;

    setup
        .room_manager
        .clone()
        .start_game(conn_a, &code, None)
        .await
        .unwrap();
    let round_id = wait_for_round_started(&mut rx_a).await;

    let err = setup
        .room_manager
        .submit_prompt(conn_a, &round_id, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::InvalidSubmission { .. }));

    let err = setup
        .room_manager
        .submit_prompt(conn_a, &round_id, "well over the twenty character limit")
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::InvalidSubmission { .. }));

    // Stale round ids are rejected too.
    let err = setup
        .room_manager
        .submit_prompt(conn_a, "round_0_deadbeef", "a red car")
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::RoundNotFound { .. }));
}

#[tokio::test]
async fn test_departing_non_submitter_completes_the_round() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(1, 60, 100)).await;
    let (conn_a, mut rx_a, _alice) = setup.join(&code, "Alice").await;
    let (conn_b, _rx_b, _bob) = setup.join(&code, "Bob").await;
    let (conn_c, _rx_c, _cara) = setup.join(&code, "Cara").await;

    setup
        .room_manager
        .clone()
        .start_game(conn_a, &code, None)
        .await
        .unwrap();
    let round_id = wait_for_round_started(&mut rx_a).await;

    setup
        .room_manager
        .submit_prompt(conn_a, &round_id, TEST_TARGET)
        .await
        .unwrap();
    setup
        .room_manager
        .submit_prompt(conn_b, &round_id, "a car")
        .await
        .unwrap();

    // Cara never submitted; her departure leaves everyone remaining
    // submitted and the round closes without waiting for the timer.
    setup.room_manager.leave_room(conn_c).await.unwrap();

    let (results, _, _) = wait_for_round_ended(&mut rx_a).await;
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.player_name != "Cara"));
}

#[tokio::test]
async fn test_room_discarded_when_last_player_leaves() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(1, 60, 100)).await;
    let (conn_a, _rx_a, _alice) = setup.join(&code, "Alice").await;
    let (conn_b, _rx_b, _bob) = setup.join(&code, "Bob").await;

    setup.room_manager.leave_room(conn_a).await.unwrap();
    assert_eq!(setup.room_manager.active_room_count(), 1);

    setup.room_manager.leave_room(conn_b).await.unwrap();
    assert_eq!(setup.room_manager.active_room_count(), 0);
    assert!(setup.room_manager.room_snapshot(&code).await.is_none());
}

// Final rankings across a multi-round game: cumulative points descending
// with ties broken by name.
#[tokio::test]
async fn test_final_rankings_after_two_rounds() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(2, 60, 100)).await;
    let (conn_a, mut rx_a, _alice) = setup.join(&code, "Alice").await;
    let (conn_b, _rx_b, _bob) = setup.join(&code, "Bob").await;

    setup
        .room_manager
        .clone()
        .start_game(conn_a, &code, None)
        .await
        .unwrap();

    for round_number in 1..=2u32 {
        let round_id = wait_for_round_started(&mut rx_a).await;
        setup
            .room_manager
            .submit_prompt(conn_a, &round_id, TEST_TARGET)
            .await
            .unwrap();
        setup
            .room_manager
            .submit_prompt(conn_b, &round_id, "xyz unrelated words here")
            .await
            .unwrap();
        let (_, _, is_last) = wait_for_round_ended(&mut rx_a).await;
        assert_eq!(is_last, round_number == 2);

        if !is_last {
            setup
                .room_manager
                .clone()
                .next_round(conn_a, &code)
                .await
                .unwrap();
        }
    }

    // Two exact matches at 110 points each on the Easy tier.
    let completed = loop {
        match next_message(&mut rx_a).await {
            ServerMessage::GameCompleted { final_rankings } => break final_rankings,
            _ => continue,
        }
    };
    assert_eq!(completed[0].player_name, "Alice");
    assert_eq!(completed[0].rank, 1);
    assert_eq!(completed[0].score, 220);
    assert_eq!(completed[1].player_name, "Bob");

    let snapshot = setup.room_manager.room_snapshot(&code).await.unwrap();
    assert_eq!(snapshot.phase, RoomPhase::Finished);
    assert_eq!(snapshot.rounds_played, 2);
}

#[tokio::test]
async fn test_next_round_is_host_only_and_needs_waiting_phase() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(2, 60, 100)).await;
    let (conn_a, mut rx_a, _alice) = setup.join(&code, "Alice").await;
    let (conn_b, _rx_b, _bob) = setup.join(&code, "Bob").await;

    setup
        .room_manager
        .clone()
        .start_game(conn_a, &code, None)
        .await
        .unwrap();
    let _round_id = wait_for_round_started(&mut rx_a).await;

    // Not host.
    let err = setup
        .room_manager
        .clone()
        .next_round(conn_b, &code)
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::NotHost { .. }));

    // Host, but a round is already live.
    let err = setup
        .room_manager
        .clone()
        .next_round(conn_a, &code)
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::WrongPhase { .. }));
}

// A new game resets standings; a stale live round is force-ended through
// the same close path first.
#[tokio::test]
async fn test_start_game_resets_scores_and_force_ends_stale_round() {
    let setup = TestServerSetup::new().await;
    let code = setup.create_room(settings(3, 60, 100)).await;
    let (conn_a, mut rx_a, _alice) = setup.join(&code, "Alice").await;
    let (conn_b, _rx_b, _bob) = setup.join(&code, "Bob").await;

    setup
        .room_manager
        .clone()
        .start_game(conn_a, &code, None)
        .await
        .unwrap();
    let round_id = wait_for_round_started(&mut rx_a).await;
    setup
        .room_manager
        .submit_prompt(conn_a, &round_id, TEST_TARGET)
        .await
        .unwrap();

    // Restart mid-round: the stale round is closed (one round-ended
    // event) and a fresh game begins with zeroed standings.
    setup
        .room_manager
        .clone()
        .start_game(conn_a, &code, None)
        .await
        .unwrap();

    let (results, _, _) = wait_for_round_ended(&mut rx_a).await;
    assert_eq!(results.len(), 2);

    let new_round_id = wait_for_round_started(&mut rx_a).await;
    assert_ne!(new_round_id, round_id);

    let snapshot = setup.room_manager.room_snapshot(&code).await.unwrap();
    assert_eq!(snapshot.rounds_played, 1);
    assert!(snapshot.cumulative_scores.iter().all(|(_, score)| *score == 0));

    // Submissions against the force-ended round are rejected.
    let err = setup
        .room_manager
        .submit_prompt(conn_b, &round_id, "late entry")
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::RoundNotFound { .. }));
}
