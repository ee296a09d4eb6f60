//! C15: Admin/metrics response shapes (§6). The routes themselves are wired in the
//! `relay-server` binary, which is the only place with access to every mode's room
//! count; this module only owns the wire shape, mirroring the teacher's
//! `enlist_handler`/`reload_handler` string responses but as typed JSON.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: u64,
    pub connections: usize,
    pub rooms: usize,
}

impl HealthResponse {
    pub fn new(connections: usize, rooms: usize) -> Self {
        HealthResponse {
            status: "ok",
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
            connections,
            rooms,
        }
    }
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub connections: usize,
    pub rooms: usize,
    pub uptime_seconds: u64,
    /// Resident memory in bytes, best-effort (platform-dependent; 0 if unavailable).
    pub memory: u64,
}

impl StatsResponse {
    pub fn new(connections: usize, rooms: usize, uptime_seconds: u64, memory: u64) -> Self {
        StatsResponse { connections, rooms, uptime_seconds, memory }
    }
}
