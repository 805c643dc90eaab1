use super::types::{GameEvent, Outbound, Recipients, ServerEvent};
use crate::domain::systems::combat;
use crate::domain::{Facing, Movement, PlayerId, Registry, RegistryError};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

/// Event router over the authoritative registry.
///
/// Each call to [`GameSession::handle`] runs one inbound event to completion and returns
/// the outbound events it produced, in emission order.
pub struct GameSession {
    registry: Registry,
}

impl GameSession {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn player_count(&self) -> usize {
        self.registry.len()
    }

    pub fn handle(&mut self, event: GameEvent) -> Vec<Outbound> {
        match event {
            GameEvent::Connect { player_id } => self.on_connect(player_id),
            GameEvent::SetUsername { player_id, name } => self.on_set_username(player_id, &name),
            GameEvent::Move {
                player_id,
                movement,
            } => self.on_move(player_id, movement),
            GameEvent::Attack { player_id, facing } => self.on_attack(player_id, facing),
            GameEvent::AttackAnimation { player_id, payload } => {
                self.on_attack_animation(player_id, payload)
            }
            GameEvent::Respawn { player_id } => self.on_respawn(player_id),
            GameEvent::Disconnect { player_id } => self.on_disconnect(player_id),
            GameEvent::Resync { player_id } => self.on_resync(player_id),
            GameEvent::ResyncAll => self.on_resync_all(),
        }
    }

    fn on_connect(&mut self, player_id: PlayerId) -> Vec<Outbound> {
        match self.registry.create(player_id) {
            Ok(player) => {
                debug!(player_id, x = player.position.x, y = player.position.y, "player created");
            }
            Err(e) => {
                // Connection ids are unique, so this points at a transport bug.
                warn!(player_id, error = ?e, "duplicate connect ignored");
            }
        }
        Vec::new()
    }

    fn on_set_username(&mut self, player_id: PlayerId, name: &str) -> Vec<Outbound> {
        let player = match self.registry.activate(player_id, name) {
            Ok(player) => player.clone(),
            Err(e) => return dropped(player_id, "setUsername", e),
        };
        info!(player_id, name = %player.name, "player joined");

        let player_count = self.registry.len();
        vec![
            Outbound::new(
                Recipients::Only(player_id),
                ServerEvent::GameState {
                    players: self.registry.snapshot(),
                    player_count,
                },
            ),
            Outbound::new(
                Recipients::AllExcept(player_id),
                ServerEvent::PlayerUpdate(player),
            ),
            Outbound::new(Recipients::All, ServerEvent::PlayerCountUpdate(player_count)),
        ]
    }

    fn on_move(&mut self, player_id: PlayerId, movement: Movement) -> Vec<Outbound> {
        match self.registry.apply_movement(player_id, movement) {
            Ok(player) => vec![Outbound::new(
                Recipients::AllExcept(player_id),
                ServerEvent::PlayerUpdate(player.clone()),
            )],
            Err(e) => dropped(player_id, "move", e),
        }
    }

    fn on_attack(&mut self, player_id: PlayerId, facing: Facing) -> Vec<Outbound> {
        let Some(outcome) = combat::resolve_attack(&mut self.registry, player_id, facing) else {
            return Vec::new();
        };

        let mut out = vec![Outbound::new(
            Recipients::All,
            ServerEvent::PlayerHit(outcome.hit),
        )];
        if let Some(kill) = outcome.kill {
            // The attacker update is its own broadcast so clients refresh the kill count.
            let killer = kill.killer.clone();
            out.push(Outbound::new(Recipients::All, ServerEvent::PlayerKilled(kill)));
            out.push(Outbound::new(Recipients::All, ServerEvent::PlayerUpdate(killer)));
        }
        out
    }

    fn on_attack_animation(&mut self, player_id: PlayerId, payload: Value) -> Vec<Outbound> {
        if !self.registry.contains(player_id) {
            return dropped(player_id, "attackAnimation", RegistryError::NotFound);
        }
        vec![Outbound::new(
            Recipients::AllExcept(player_id),
            ServerEvent::AttackAnimation(payload),
        )]
    }

    fn on_respawn(&mut self, player_id: PlayerId) -> Vec<Outbound> {
        match self.registry.respawn(player_id) {
            Ok(player) => {
                debug!(player_id, "player respawned");
                vec![Outbound::new(
                    Recipients::All,
                    ServerEvent::PlayerRespawned(player.clone()),
                )]
            }
            Err(e) => dropped(player_id, "respawn", e),
        }
    }

    fn on_disconnect(&mut self, player_id: PlayerId) -> Vec<Outbound> {
        if !self.registry.remove(player_id) {
            return dropped(player_id, "disconnect", RegistryError::NotFound);
        }
        info!(player_id, "player left");

        vec![
            Outbound::new(Recipients::All, ServerEvent::PlayerLeft(player_id)),
            Outbound::new(
                Recipients::All,
                ServerEvent::PlayerCountUpdate(self.registry.len()),
            ),
        ]
    }

    fn on_resync(&mut self, player_id: PlayerId) -> Vec<Outbound> {
        match self.registry.get(player_id) {
            // Inactive players have not been shown a snapshot yet; nothing to recover.
            Ok(player) if player.active => vec![Outbound::new(
                Recipients::Only(player_id),
                ServerEvent::GameState {
                    players: self.registry.snapshot(),
                    player_count: self.registry.len(),
                },
            )],
            Ok(_) => Vec::new(),
            Err(e) => dropped(player_id, "resync", e),
        }
    }

    fn on_resync_all(&mut self) -> Vec<Outbound> {
        let players = self.registry.snapshot();
        let player_count = players.len();
        let active: Vec<PlayerId> = players.iter().filter(|p| p.active).map(|p| p.id).collect();
        warn!(recipients = active.len(), "resyncing every active player");

        active
            .into_iter()
            .map(|player_id| {
                Outbound::new(
                    Recipients::Only(player_id),
                    ServerEvent::GameState {
                        players: players.clone(),
                        player_count,
                    },
                )
            })
            .collect()
    }
}

// Registry races are benign; the event is simply dropped.
fn dropped(player_id: PlayerId, event: &'static str, error: RegistryError) -> Vec<Outbound> {
    debug!(player_id, event, error = ?error, "event dropped");
    Vec::new()
}

/// Single world task owning the registry.
///
/// Events are handled strictly one at a time in inbox order, which serializes every
/// registry read and write. Outbound events are fire-and-forget.
pub async fn world_task(
    mut input_rx: mpsc::Receiver<GameEvent>,
    outbound_tx: broadcast::Sender<Outbound>,
    player_count_tx: watch::Sender<usize>,
    registry: Registry,
) {
    let mut session = GameSession::new(registry);

    while let Some(event) = input_rx.recv().await {
        for out in session.handle(event) {
            // No subscribers simply means nobody is listening yet.
            let _ = outbound_tx.send(out);
        }
        player_count_tx.send_if_modified(|count| {
            let next = session.player_count();
            let changed = *count != next;
            *count = next;
            changed
        });
    }

    info!("input channel closed; world task exiting");
}
