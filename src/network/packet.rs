use super::QueueItem;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PacketId(u64);

impl PacketId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub id: PacketId,
    pub size: u32,
    /// Simulated arrival time at the queue.
    pub created_at: Duration,
}

impl Packet {
    pub fn new(id: PacketId, size: u32, created_at: Duration) -> Self {
        Self {
            id,
            size,
            created_at,
        }
    }

    // Sojourn time = time spent waiting in the queue before leaving it
    pub fn sojourn_time(&self, now: Duration) -> Duration {
        now.saturating_sub(self.created_at)
    }
}

impl QueueItem for Packet {
    fn size_bytes(&self) -> u32 {
        self.size
    }
}
