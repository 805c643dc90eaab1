use crate::domain::PlayerId;
use std::sync::{
    OnceLock,
    atomic::{AtomicU64, Ordering},
};

/// Returns a process-unique identifier for a new connection.
///
/// The sequence starts at a random offset so ids are not predictable across restarts, then
/// increases monotonically so two connections can never share an id within a process.
pub fn next_connection_id() -> PlayerId {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| AtomicU64::new(u64::from(rand::random::<u32>()) << 16));
    counter.fetch_add(1, Ordering::Relaxed)
}
