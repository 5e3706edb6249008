pub mod fifo;
pub mod packet;

pub use fifo::DropTailFifo;
pub use packet::{Packet, PacketId};

/// Anything a queue disc can hold.
pub trait QueueItem {
    fn size_bytes(&self) -> u32;
}

/// The FIFO storage a queue disc admits into. Owned by the host, never by the disc logic.
pub trait Backlog<P> {
    /// Stores `item`, or hands it back if the storage itself is full.
    fn push(&mut self, item: P) -> Result<(), P>;
    fn pop(&mut self) -> Option<P>;
    fn peek(&self) -> Option<&P>;
    fn bytes(&self) -> u64;
    fn packets(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.packets() == 0
    }
}
