use super::{Backlog, QueueItem};
use std::collections::VecDeque;

/// Bounded FIFO with optional packet and byte limits.
#[derive(Debug, Clone)]
pub struct DropTailFifo<P> {
    items: VecDeque<P>,
    bytes: u64,
    max_packets: Option<usize>,
    max_bytes: Option<u64>,
}

impl<P> DropTailFifo<P> {
    pub fn unbounded() -> Self {
        Self {
            items: VecDeque::new(),
            bytes: 0,
            max_packets: None,
            max_bytes: None,
        }
    }

    pub fn with_max_packets(mut self, max: usize) -> Self {
        self.max_packets = Some(max);
        self
    }

    pub fn with_max_bytes(mut self, max: u64) -> Self {
        self.max_bytes = Some(max);
        self
    }
}

impl<P> Default for DropTailFifo<P> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<P: QueueItem> Backlog<P> for DropTailFifo<P> {
    fn push(&mut self, item: P) -> Result<(), P> {
        let size = item.size_bytes() as u64;
        if self.max_packets.is_some_and(|max| self.items.len() >= max)
            || self.max_bytes.is_some_and(|max| self.bytes + size > max)
        {
            return Err(item);
        }
        self.bytes += size;
        self.items.push_back(item);
        Ok(())
    }

    fn pop(&mut self) -> Option<P> {
        let item = self.items.pop_front()?;
        self.bytes -= item.size_bytes() as u64;
        Some(item)
    }

    fn peek(&self) -> Option<&P> {
        self.items.front()
    }

    fn bytes(&self) -> u64 {
        self.bytes
    }

    fn packets(&self) -> usize {
        self.items.len()
    }
}
