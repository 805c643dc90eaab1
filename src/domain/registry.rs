// Authoritative store of every player entity, keyed by connection id.

use crate::domain::errors::RegistryError;
use crate::domain::state::{Facing, Movement, Player, PlayerId, Position};
use crate::domain::tuning::ArenaTuning;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// World State Registry.
///
/// Players are kept in insertion order, which is also the enumeration order used by
/// combat resolution to break ties between equally valid victims. The registry is not
/// synchronized itself; the owning world task is the single serialization point.
pub struct Registry {
    tuning: ArenaTuning,
    players: Vec<Player>,
    rng: StdRng,
}

impl Registry {
    /// Creates an empty registry with an entropy-seeded spawn generator.
    pub fn new(tuning: ArenaTuning) -> Self {
        Self::with_rng(tuning, StdRng::from_entropy())
    }

    /// Creates an empty registry with a fixed seed, for reproducible spawn points.
    pub fn with_seed(tuning: ArenaTuning, seed: u64) -> Self {
        Self::with_rng(tuning, StdRng::seed_from_u64(seed))
    }

    fn with_rng(tuning: ArenaTuning, rng: StdRng) -> Self {
        Self {
            tuning,
            players: Vec::new(),
            rng,
        }
    }

    pub fn tuning(&self) -> &ArenaTuning {
        &self.tuning
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.index_of(id).is_some()
    }

    /// Inserts an uninitialized player at a random spawn point.
    pub fn create(&mut self, id: PlayerId) -> Result<&Player, RegistryError> {
        if self.contains(id) {
            return Err(RegistryError::AlreadyExists);
        }

        let position = self.spawn_point();
        self.players.push(Player {
            id,
            position,
            health: self.tuning.max_health,
            max_health: self.tuning.max_health,
            kills: 0,
            facing: Facing::Right,
            weapon_angle: 0.0,
            name: self.tuning.default_name.clone(),
            active: false,
        });

        let idx = self.players.len() - 1;
        Ok(&self.players[idx])
    }

    /// Sets the display name once and marks the player visible to others.
    pub fn activate(&mut self, id: PlayerId, name: &str) -> Result<&Player, RegistryError> {
        let max_len = self.tuning.max_name_len;
        let player = self.get_mut(id)?;
        if player.active {
            return Err(RegistryError::IllegalState);
        }

        player.name = name.chars().take(max_len).collect();
        player.active = true;
        Ok(&*player)
    }

    /// Overwrites position, facing and weapon angle. Client values are trusted as-is.
    pub fn apply_movement(
        &mut self,
        id: PlayerId,
        movement: Movement,
    ) -> Result<&Player, RegistryError> {
        let player = self.get_mut(id)?;
        player.position = movement.position;
        player.facing = movement.facing;
        player.weapon_angle = movement.weapon_angle;
        Ok(&*player)
    }

    /// Copies every player, in enumeration order.
    pub fn snapshot(&self) -> Vec<Player> {
        self.players.clone()
    }

    pub fn get(&self, id: PlayerId) -> Result<&Player, RegistryError> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .ok_or(RegistryError::NotFound)
    }

    pub(crate) fn get_mut(&mut self, id: PlayerId) -> Result<&mut Player, RegistryError> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RegistryError::NotFound)
    }

    /// Removes the player if present. Returns whether anything was removed.
    pub fn remove(&mut self, id: PlayerId) -> bool {
        match self.index_of(id) {
            Some(idx) => {
                // `remove` rather than `swap_remove` keeps enumeration order stable.
                self.players.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Restores a dead player to full health at a fresh spawn point.
    pub fn respawn(&mut self, id: PlayerId) -> Result<&Player, RegistryError> {
        let idx = self.index_of(id).ok_or(RegistryError::NotFound)?;
        if self.players[idx].is_alive() {
            return Err(RegistryError::IllegalState);
        }

        let position = self.spawn_point();
        let player = &mut self.players[idx];
        player.health = player.max_health;
        player.position = position;
        Ok(&*player)
    }

    pub(crate) fn players(&self) -> &[Player] {
        &self.players
    }

    pub(crate) fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    fn index_of(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    // Uniform over the world rectangle inset by the spawn margin.
    fn spawn_point(&mut self) -> Position {
        let t = &self.tuning;
        let x = self.rng.gen_range(t.spawn_margin..t.world_width - t.spawn_margin);
        let y = self.rng.gen_range(t.spawn_margin..t.world_height - t.spawn_margin);
        Position::new(x, y)
    }
}
