// Arena orchestration: channel wiring around the single world task.

use crate::domain::{ArenaTuning, Registry};
use crate::use_cases::game::world_task;
use crate::use_cases::{Dispatch, GameEvent, Outbound};
use tokio::sync::{broadcast, mpsc, watch};

/// Configuration for spawning the arena world.
#[derive(Debug, Clone)]
pub struct ArenaSettings {
    /// Capacity for inbound player events.
    pub input_channel_capacity: usize,
    /// Capacity for broadcast outbound events.
    pub outbound_broadcast_capacity: usize,
    /// Gameplay constants for the registry and combat.
    pub tuning: ArenaTuning,
}

/// Channels connecting transports to the arena world task.
#[derive(Clone)]
pub struct ArenaHandle {
    /// Sender for game events into the world task.
    pub input_tx: mpsc::Sender<GameEvent>,
    /// Broadcast sender for raw outbound events.
    pub outbound_tx: broadcast::Sender<Outbound>,
    /// Broadcast sender for serialized outbound events.
    pub dispatch_tx: broadcast::Sender<Dispatch>,
    /// Watch sender holding the current number of registered players.
    pub player_count_tx: watch::Sender<usize>,
}

impl ArenaHandle {
    /// Wires the channels and spawns the authoritative world task.
    pub fn spawn(settings: ArenaSettings) -> Self {
        let (input_tx, input_rx) = mpsc::channel::<GameEvent>(settings.input_channel_capacity);
        let (outbound_tx, _outbound_rx) =
            broadcast::channel::<Outbound>(settings.outbound_broadcast_capacity);
        let (dispatch_tx, _dispatch_rx) =
            broadcast::channel::<Dispatch>(settings.outbound_broadcast_capacity);
        let (player_count_tx, _player_count_rx) = watch::channel::<usize>(0);

        tokio::spawn(world_task(
            input_rx,
            outbound_tx.clone(),
            player_count_tx.clone(),
            Registry::new(settings.tuning),
        ));

        Self {
            input_tx,
            outbound_tx,
            dispatch_tx,
            player_count_tx,
        }
    }

    /// Number of players currently registered, including ones not yet named.
    pub fn player_count(&self) -> usize {
        *self.player_count_tx.borrow()
    }
}
