// Use-case level inputs/outputs for the world task.

use crate::domain::systems::combat::{Hit, Kill};
use crate::domain::{Facing, Movement, Player, PlayerId};
use axum::extract::ws::Utf8Bytes;
use serde_json::Value;

/// Inbound events, one per transport notification or client message.
#[derive(Debug, Clone)]
pub enum GameEvent {
    Connect { player_id: PlayerId },
    SetUsername { player_id: PlayerId, name: String },
    Move { player_id: PlayerId, movement: Movement },
    // Desktop area attacks and mobile collision attacks resolve identically.
    Attack { player_id: PlayerId, facing: Facing },
    AttackAnimation { player_id: PlayerId, payload: Value },
    Respawn { player_id: PlayerId },
    Disconnect { player_id: PlayerId },
    // A connection fell behind the outbound buffer and needs a fresh snapshot.
    Resync { player_id: PlayerId },
    // Outbound events were lost before fan-out, so every connection missed them.
    ResyncAll,
}

/// Which connections an outbound event is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipients {
    Only(PlayerId),
    AllExcept(PlayerId),
    All,
}

impl Recipients {
    pub fn includes(self, player_id: PlayerId) -> bool {
        match self {
            Recipients::Only(id) => id == player_id,
            Recipients::AllExcept(id) => id != player_id,
            Recipients::All => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    GameState {
        players: Vec<Player>,
        player_count: usize,
    },
    PlayerUpdate(Player),
    PlayerCountUpdate(usize),
    AttackAnimation(Value),
    PlayerHit(Hit),
    PlayerKilled(Kill),
    PlayerRespawned(Player),
    PlayerLeft(PlayerId),
}

/// An event produced by the world task together with its broadcast set.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub recipients: Recipients,
    pub event: ServerEvent,
}

impl Outbound {
    pub fn new(recipients: Recipients, event: ServerEvent) -> Self {
        Self { recipients, event }
    }
}

/// Outbound event serialized once and shared across every connection task.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub recipients: Recipients,
    pub bytes: Utf8Bytes,
}
