mod support;

use serde_json::json;
use std::time::Duration;
use support::{TestClient, spawn_server};
use tokio_tungstenite::tungstenite::Message;

const QUIET: Duration = Duration::from_millis(200);

#[tokio::test]
async fn when_client_connects_then_identity_arrives_first_and_player_stays_hidden() {
    let base_url = spawn_server().await;
    let mut watcher = TestClient::join(&base_url, "Watcher").await;
    watcher.recv_type("playerCountUpdate").await;

    let anon = TestClient::connect(&base_url).await;

    assert!(anon.id.parse::<u64>().is_ok());
    watcher.expect_none("playerUpdate", QUIET).await;
}

#[tokio::test]
async fn when_username_is_set_then_snapshot_is_unicast_and_others_see_the_join() {
    let base_url = spawn_server().await;
    let mut first = TestClient::join(&base_url, "First").await;
    assert_eq!(first.recv_type("playerCountUpdate").await["data"], 1);

    let mut second = TestClient::connect(&base_url).await;
    second
        .send(json!({"type": "setUsername", "data": "AVeryLongPilotNameIndeed"}))
        .await;

    let snapshot = second.recv_type("gameState").await;
    let players = snapshot["data"]["players"]
        .as_object()
        .expect("players keyed by id");
    assert_eq!(players.len(), 2);
    assert_eq!(snapshot["data"]["playerCount"], 2);
    assert_eq!(players[&second.id]["name"], "AVeryLongPilotN");
    assert_eq!(players[&second.id]["health"], 100);
    assert_eq!(players[&second.id]["direction"], 1);

    let joined = first.recv_type("playerUpdate").await;
    assert_eq!(joined["data"]["id"], second.id.as_str());
    assert_eq!(first.recv_type("playerCountUpdate").await["data"], 2);
    assert_eq!(second.recv_type("playerCountUpdate").await["data"], 2);

    // The snapshot goes to the joiner only.
    first.expect_none("gameState", QUIET).await;
}

#[tokio::test]
async fn when_player_moves_then_update_reaches_others_but_not_the_sender() {
    let base_url = spawn_server().await;
    let mut mover = TestClient::join(&base_url, "Mover").await;
    let mut observer = TestClient::join(&base_url, "Observer").await;
    mover.recv_type("playerUpdate").await;

    mover
        .send(json!({"type": "move", "data": {"x": 640.0, "y": 480.0, "direction": -1, "weaponAngle": 1.25}}))
        .await;

    let update = observer.recv_type("playerUpdate").await;
    assert_eq!(update["data"]["id"], mover.id.as_str());
    assert_eq!(update["data"]["x"], 640.0);
    assert_eq!(update["data"]["y"], 480.0);
    assert_eq!(update["data"]["direction"], -1);
    assert_eq!(update["data"]["weaponAngle"], 1.25);
    mover.expect_none("playerUpdate", QUIET).await;
}

#[tokio::test]
async fn when_attack_lands_then_everyone_sees_the_hit() {
    let base_url = spawn_server().await;
    let mut victim = TestClient::join(&base_url, "Victim").await;
    let mut attacker = TestClient::join(&base_url, "Attacker").await;
    victim.recv_type("playerUpdate").await;

    victim
        .send(json!({"type": "move", "data": {"x": 1000.0, "y": 1000.0, "direction": 1, "weaponAngle": 0.0}}))
        .await;
    // Wait until the world has applied the victim's position.
    attacker.recv_type("playerUpdate").await;
    attacker
        .send(json!({"type": "move", "data": {"x": 1100.0, "y": 1000.0, "direction": 1, "weaponAngle": 0.0}}))
        .await;
    victim.recv_type("playerUpdate").await;

    // Right-facing attacks land on victims with a smaller x.
    attacker
        .send(json!({"type": "areaAttack", "data": {"direction": 1, "weaponAngle": 0.0}}))
        .await;

    let victim_id = victim.id.clone();
    for client in [&mut victim, &mut attacker] {
        let hit = client.recv_type("playerHit").await;
        assert_eq!(hit["data"]["playerId"], victim_id.as_str());
        assert_eq!(hit["data"]["health"], 80);
        assert_eq!(hit["data"]["x"], 1000.0);
    }
}

#[tokio::test]
async fn when_attack_faces_away_or_is_out_of_range_then_nothing_happens() {
    let base_url = spawn_server().await;
    let mut victim = TestClient::join(&base_url, "Victim").await;
    let mut attacker = TestClient::join(&base_url, "Attacker").await;
    victim.recv_type("playerUpdate").await;

    victim
        .send(json!({"type": "move", "data": {"x": 2000.0, "y": 2000.0, "direction": 1, "weaponAngle": 0.0}}))
        .await;
    attacker.recv_type("playerUpdate").await;
    attacker
        .send(json!({"type": "move", "data": {"x": 2100.0, "y": 2000.0, "direction": -1, "weaponAngle": 0.0}}))
        .await;
    victim.recv_type("playerUpdate").await;

    // In range, but the victim sits on the other side.
    attacker
        .send(json!({"type": "mobileCollisionAttack", "data": {"direction": -1, "weaponAngle": 0.0}}))
        .await;

    // Facing the victim, but exactly at range.
    attacker
        .send(json!({"type": "move", "data": {"x": 2150.0, "y": 2000.0, "direction": 1, "weaponAngle": 0.0}}))
        .await;
    victim.recv_type("playerUpdate").await;
    attacker
        .send(json!({"type": "areaAttack", "data": {"direction": 1, "weaponAngle": 0.0}}))
        .await;

    victim.expect_none("playerHit", QUIET).await;
}

#[tokio::test]
async fn when_five_hits_land_then_victim_is_killed_and_can_respawn() {
    let base_url = spawn_server().await;
    let mut victim = TestClient::join(&base_url, "Victim").await;
    let mut attacker = TestClient::join(&base_url, "Slayer").await;
    victim.recv_type("playerUpdate").await;

    victim
        .send(json!({"type": "move", "data": {"x": 3000.0, "y": 500.0, "direction": 1, "weaponAngle": 0.0}}))
        .await;
    attacker.recv_type("playerUpdate").await;
    attacker
        .send(json!({"type": "move", "data": {"x": 2900.0, "y": 500.0, "direction": -1, "weaponAngle": 0.0}}))
        .await;
    victim.recv_type("playerUpdate").await;

    for expected in [80, 60, 40, 20, 0] {
        attacker
            .send(json!({"type": "areaAttack", "data": {"direction": -1, "weaponAngle": 0.0}}))
            .await;
        let hit = victim.recv_type("playerHit").await;
        assert_eq!(hit["data"]["health"], expected);
    }

    let killed = victim.recv_type("playerKilled").await;
    assert_eq!(killed["data"]["killer"]["id"], attacker.id.as_str());
    assert_eq!(killed["data"]["killer"]["name"], "Slayer");
    assert_eq!(killed["data"]["killer"]["kills"], 1);
    assert_eq!(killed["data"]["victim"]["id"], victim.id.as_str());
    assert_eq!(killed["data"]["victim"]["name"], "Victim");
    let killer_update = victim.recv_type("playerUpdate").await;
    assert_eq!(killer_update["data"]["kills"], 1);

    // A dead player cannot be hit again.
    attacker
        .send(json!({"type": "areaAttack", "data": {"direction": -1, "weaponAngle": 0.0}}))
        .await;
    victim.expect_none("playerHit", QUIET).await;

    victim.send(json!({"type": "respawn"})).await;
    let victim_id = victim.id.clone();
    for client in [&mut victim, &mut attacker] {
        let respawned = client.recv_type("playerRespawned").await;
        assert_eq!(respawned["data"]["id"], victim_id.as_str());
        assert_eq!(respawned["data"]["health"], 100);
        assert_eq!(respawned["data"]["kills"], 0);
    }
}

#[tokio::test]
async fn when_animation_is_relayed_then_payload_is_unchanged_and_sender_excluded() {
    let base_url = spawn_server().await;
    let mut sender = TestClient::join(&base_url, "Swinger").await;
    let mut viewer = TestClient::join(&base_url, "Viewer").await;
    sender.recv_type("playerUpdate").await;

    let payload = json!({"playerId": sender.id, "frame": 3, "nested": {"arc": [0.1, 0.2]}});
    sender
        .send(json!({"type": "attackAnimation", "data": payload}))
        .await;

    let relayed = viewer.recv_type("attackAnimation").await;
    assert_eq!(relayed["data"], payload);
    sender.expect_none("attackAnimation", QUIET).await;
}

#[tokio::test]
async fn when_client_disconnects_then_others_see_it_leave() {
    let base_url = spawn_server().await;
    let mut stayer = TestClient::join(&base_url, "Stayer").await;
    let leaver = TestClient::join(&base_url, "Leaver").await;
    assert_eq!(stayer.recv_type("playerCountUpdate").await["data"], 1);
    assert_eq!(stayer.recv_type("playerCountUpdate").await["data"], 2);

    let leaver_id = leaver.id.clone();
    leaver.close().await;

    let left = stayer.recv_type("playerLeft").await;
    assert_eq!(left["data"], leaver_id.as_str());
    assert_eq!(stayer.recv_type("playerCountUpdate").await["data"], 1);
}

#[tokio::test]
async fn when_client_keeps_sending_garbage_then_server_closes_with_policy_code() {
    let base_url = spawn_server().await;
    let mut client = TestClient::connect(&base_url).await;

    for _ in 0..11 {
        client.send_raw(Message::text("not json")).await;
    }

    assert_eq!(client.recv_close_code().await, Some(1008));
}

#[tokio::test]
async fn when_valid_messages_break_up_garbage_then_the_socket_stays_open() {
    let base_url = spawn_server().await;
    let mut client = TestClient::connect(&base_url).await;

    for _ in 0..6 {
        client.send_raw(Message::text("not json")).await;
    }
    client
        .send(json!({"type": "setUsername", "data": "Sloppy"}))
        .await;
    client.recv_type("gameState").await;
    for _ in 0..6 {
        client.send_raw(Message::text("still not json")).await;
    }

    // Still connected: a newcomer's join reaches this client.
    let newcomer = TestClient::join(&base_url, "Newcomer").await;
    let joined = client.recv_type("playerUpdate").await;
    assert_eq!(joined["data"]["id"], newcomer.id.as_str());
}

#[tokio::test]
async fn when_client_sends_binary_then_server_closes_as_unsupported() {
    let base_url = spawn_server().await;
    let mut client = TestClient::connect(&base_url).await;

    client.send_raw(Message::binary(vec![1, 2, 3])).await;

    assert_eq!(client.recv_close_code().await, Some(1003));
}
