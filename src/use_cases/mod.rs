// Use cases layer: event routing and world orchestration for the arena.

pub mod arena;
pub mod game;
pub mod types;

pub use arena::{ArenaHandle, ArenaSettings};
pub use types::{Dispatch, GameEvent, Outbound, Recipients, ServerEvent};
