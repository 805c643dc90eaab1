/// Gameplay tuning for the arena.
///
/// Keep this separate from runtime/server configuration (ports, buffer sizes, etc.).
#[derive(Debug, Clone)]
pub struct ArenaTuning {
    /// World width in world units.
    pub world_width: f64,

    /// World height in world units.
    pub world_height: f64,

    /// Distance kept from every world edge when picking spawn points.
    pub spawn_margin: f64,

    /// Health a player spawns and respawns with.
    pub max_health: i32,

    /// Attacks land only on victims strictly closer than this.
    pub attack_range: f64,

    /// Health removed from a victim per landed attack.
    pub attack_damage: i32,

    /// Display names are truncated to this many characters.
    pub max_name_len: usize,

    /// Name a player carries until it submits its own.
    pub default_name: String,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            world_width: 4800.0,
            world_height: 3600.0,
            spawn_margin: 100.0,
            max_health: 100,
            attack_range: 150.0,
            attack_damage: 20,
            max_name_len: 15,
            default_name: "BONKER".to_string(),
        }
    }
}
