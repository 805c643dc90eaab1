// Wire protocol DTOs and conversions for the arena WebSocket.
// Every frame is JSON shaped as {"type": <event>, "data": <payload>}.

use crate::domain::systems::combat::{Hit, Kill};
use crate::domain::{Facing, Movement, Player, PlayerId, Position};
use crate::use_cases::ServerEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    // Connection identity, sent once right after the upgrade.
    Identity { player_id: String },
    // Full snapshot, unicast to a newly activated connection.
    GameState(GameStateDto),
    PlayerUpdate(PlayerDto),
    PlayerCountUpdate(usize),
    // Opaque client payload, relayed unmodified.
    AttackAnimation(Value),
    PlayerHit(PlayerHitDto),
    PlayerKilled(PlayerKilledDto),
    PlayerRespawned(PlayerDto),
    PlayerLeft(String),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    SetUsername(String),
    Move(MoveDto),
    AreaAttack(AttackDto),
    MobileCollisionAttack(AttackDto),
    AttackAnimation(Value),
    Respawn,
}

/// Client-reported position and orientation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveDto {
    pub x: f64,
    pub y: f64,
    pub direction: i8,
    pub weapon_angle: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttackDto {
    pub direction: i8,
}

/// Maps the wire direction (-1 left, 1 right) to a facing; anything else is rejected.
pub fn facing_from_wire(direction: i8) -> Option<Facing> {
    match direction {
        -1 => Some(Facing::Left),
        1 => Some(Facing::Right),
        _ => None,
    }
}

pub fn facing_to_wire(facing: Facing) -> i8 {
    match facing {
        Facing::Left => -1,
        Facing::Right => 1,
    }
}

impl MoveDto {
    pub fn into_movement(self) -> Option<Movement> {
        Some(Movement {
            position: Position::new(self.x, self.y),
            facing: facing_from_wire(self.direction)?,
            weapon_angle: self.weapon_angle,
        })
    }
}

pub fn wire_id(id: PlayerId) -> String {
    id.to_string()
}

/// Flattened player state for wire transmission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub health: i32,
    pub max_health: i32,
    pub direction: i8,
    pub weapon_angle: f64,
    pub kills: u32,
    pub name: String,
}

impl From<&Player> for PlayerDto {
    fn from(player: &Player) -> Self {
        Self {
            id: wire_id(player.id),
            x: player.position.x,
            y: player.position.y,
            health: player.health,
            max_health: player.max_health,
            direction: facing_to_wire(player.facing),
            weapon_angle: player.weapon_angle,
            kills: player.kills,
            name: player.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateDto {
    pub players: BTreeMap<String, PlayerDto>,
    pub player_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerHitDto {
    pub player_id: String,
    pub health: i32,
    pub x: f64,
    pub y: f64,
}

impl From<Hit> for PlayerHitDto {
    fn from(hit: Hit) -> Self {
        Self {
            player_id: wire_id(hit.victim_id),
            health: hit.victim_health,
            x: hit.victim_position.x,
            y: hit.victim_position.y,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KillerDto {
    pub id: String,
    pub name: String,
    pub kills: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct VictimDto {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerKilledDto {
    pub killer: KillerDto,
    pub victim: VictimDto,
}

impl From<Kill> for PlayerKilledDto {
    fn from(kill: Kill) -> Self {
        Self {
            killer: KillerDto {
                id: wire_id(kill.killer.id),
                name: kill.killer.name,
                kills: kill.killer.kills,
            },
            victim: VictimDto {
                id: wire_id(kill.victim_id),
                name: kill.victim_name,
            },
        }
    }
}

impl From<ServerEvent> for ServerMessage {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::GameState {
                players,
                player_count,
            } => ServerMessage::GameState(GameStateDto {
                players: players
                    .iter()
                    .map(|p| (wire_id(p.id), PlayerDto::from(p)))
                    .collect(),
                player_count,
            }),
            ServerEvent::PlayerUpdate(player) => ServerMessage::PlayerUpdate((&player).into()),
            ServerEvent::PlayerCountUpdate(count) => ServerMessage::PlayerCountUpdate(count),
            ServerEvent::AttackAnimation(payload) => ServerMessage::AttackAnimation(payload),
            ServerEvent::PlayerHit(hit) => ServerMessage::PlayerHit(hit.into()),
            ServerEvent::PlayerKilled(kill) => ServerMessage::PlayerKilled(kill.into()),
            ServerEvent::PlayerRespawned(player) => {
                ServerMessage::PlayerRespawned((&player).into())
            }
            ServerEvent::PlayerLeft(id) => ServerMessage::PlayerLeft(wire_id(id)),
        }
    }
}
