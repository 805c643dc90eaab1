// Network adapter for the client-facing WebSocket.

pub mod client;

pub use client::{spawn_arena_serializer, ws_handler};
