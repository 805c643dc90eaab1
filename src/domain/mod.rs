// Domain layer: player entities, the authoritative registry, and combat rules.

pub mod errors;
pub mod registry;
pub mod state;
pub mod systems;
pub mod tuning;

pub use errors::RegistryError;
pub use registry::Registry;
pub use state::{Facing, Movement, Player, PlayerId, Position};
pub use tuning::ArenaTuning;
