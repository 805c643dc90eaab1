// Domain-level player entity and movement types.

/// Connection identity assigned by the transport, stable for the connection's lifetime.
pub type PlayerId = u64;

/// Side of the attacker an attack projects toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Client-reported movement, applied verbatim by the registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Movement {
    pub position: Position,
    pub facing: Facing,
    pub weapon_angle: f64,
}

/// Server-authoritative record of one connected player.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub position: Position,

    // Combat state. Health is not clamped after damage.
    pub health: i32,
    pub max_health: i32,
    pub kills: u32,

    pub facing: Facing,
    // Cosmetic only; carried through for rendering.
    pub weapon_angle: f64,

    pub name: String,
    // False until the owning connection submits its display name.
    pub active: bool,
}

impl Player {
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}
