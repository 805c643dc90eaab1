use std::{env, net::IpAddr};

// Runtime/server constants (not gameplay tuning; see domain::tuning).

pub fn http_port() -> u16 {
    env::var("ARENA_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

pub fn bind_addr() -> IpAddr {
    env::var("ARENA_BIND_ADDR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
// Outbound events are discrete, so the buffer must absorb attack bursts from every player.
pub const OUTBOUND_BROADCAST_CAPACITY: usize = 256;
