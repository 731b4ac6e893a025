//! Boundary-surface tests: every operation answers with a reply envelope
//! the transport can serialize verbatim, and failures are values.

use auxclash::{AuxClash, Phase};

#[tokio::test(start_paused = true)]
async fn test_create_join_start_happy_path() {
    let mut service = AuxClash::with_builtin_prompts();

    let created = service.create_room("Alice", "pass1", "sock-a".into()).await;
    assert!(created.success);
    let settings = created.data.expect("settings payload");
    assert_eq!(settings.max_players, 8);

    for (name, sock) in [("Bobby", "sock-b"), ("Cara", "sock-c")] {
        let joined = service
            .join_room("Alice", name, "pass1", sock.into())
            .await;
        assert!(joined.success, "{name} failed to join: {:?}", joined.message);
    }

    let started = service.start_game("sock-a".into()).await;
    assert!(started.success);

    let state = service.room_state("sock-a".into()).await;
    assert!(state.success);
    let status = state.data.expect("status payload");
    assert_eq!(status.phase, Phase::Message);
    assert_eq!(status.contestants.len(), 3);
    assert!(status.is_host);
}

#[tokio::test(start_paused = true)]
async fn test_failures_are_reply_values() {
    let mut service = AuxClash::with_builtin_prompts();
    service
        .create_room("Alice", "pass1", "sock-a".into())
        .await;

    // Duplicate username, differing only in case.
    let duplicate = service
        .create_room("alice", "pass2", "sock-x".into())
        .await;
    assert!(!duplicate.success);
    let message = duplicate.message.expect("failure message");
    assert!(message.contains("already taken"), "{message:?}");
    assert!(duplicate.data.is_none());

    // Identity in no room.
    let lost = service.room_state("sock-nobody".into()).await;
    assert!(!lost.success);
    assert!(lost.message.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_failure_reply_wire_shape() {
    let mut service = AuxClash::with_builtin_prompts();
    let reply = service.start_game("sock-nobody".into()).await;

    let json: serde_json::Value = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["message"].is_string());
    assert!(json.get("data").is_none(), "no data key on failure");
}

#[tokio::test(start_paused = true)]
async fn test_lobby_listing_and_prompt_packs() {
    let mut service = AuxClash::with_builtin_prompts();
    service
        .create_room("Alice", "pass1", "sock-a".into())
        .await;

    let hosts = service.room_hosts().await;
    assert!(hosts.success);
    let entries = hosts.data.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].host, "Alice");

    let packs = service.prompt_packs();
    assert!(packs.success);
    assert!(!packs.data.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_reconnect_round_trip() {
    let mut service = AuxClash::with_builtin_prompts();
    service
        .create_room("Alice", "pass1", "sock-a".into())
        .await;
    for (name, sock) in [("Bobby", "sock-b"), ("Cara", "sock-c")] {
        service.join_room("Alice", name, "pass1", sock.into()).await;
    }
    service.start_game("sock-a".into()).await;

    let dropped = service.disconnect("sock-c".into()).await;
    assert!(dropped.success);

    let rejoined = service.reconnect("sock-c".into()).await;
    assert!(rejoined.success);
    let status = rejoined.data.unwrap();
    assert!(status.disconnected.is_empty());
}
