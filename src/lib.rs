pub mod config;
pub mod engine;
pub mod error;
pub mod fuzzy;
pub mod host;
pub mod metrics;
pub mod network;
pub mod simulation;
pub mod strategies;

pub use config::{Cautious, QueueMode, RedConfig};
pub use engine::{RedQueueDisc, Verdict};
pub use error::{ConfigError, ConfigResult};
pub use simulation::{SimConfig, Simulation};
pub use strategies::{DropCurve, StrategyRegistry};

pub mod prelude {
    pub use crate::config::{QueueMode, RedConfig};
    pub use crate::engine::{RedQueueDisc, Verdict};
    pub use crate::host::{Clock, FixedSequence, ManualClock, RngSource, UniformSource};
    pub use crate::metrics::{Stats, StatsSummary};
    pub use crate::network::{Backlog, DropTailFifo, Packet, PacketId, QueueItem};
    pub use crate::simulation::{SimConfig, Simulation, TrafficPattern};
    pub use crate::strategies::{DropCurve, StrategyRegistry};
}
