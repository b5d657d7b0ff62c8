pub mod aggregate;
pub mod channel;
pub mod codec;
pub mod constants;
pub mod coordinator;
pub mod error;
pub mod filter;
pub mod loader;
pub mod models;
pub mod partition;
mod parser;
pub mod report;
pub mod topology;
pub(crate) mod utils;
pub mod worker;

pub use crate::aggregate::{AggregateTable, RankingMode, SensorTotal};
pub use crate::channel::{Channel, LocalChannel, Share, TcpChannel};
pub use crate::coordinator::{Coordinator, CoordinatorConfig};
pub use crate::error::Error;
pub use crate::filter::Window;
pub use crate::models::{Reading, SensorId, Timestamp, VehicleCount};
pub use crate::report::Report;
pub use crate::topology::{Role, Topology};
pub use crate::worker::{Worker, WorkerConfig};

/// Capacity of the fixed timestamp buffer, terminator included.
pub const TIMESTAMP_CAPACITY: usize = 20;
/// Size of one reading on the wire: timestamp buffer plus two 32-bit integers.
pub const RECORD_SIZE: usize = TIMESTAMP_CAPACITY + 4 + 4;

pub(crate) const MESSAGE_TYPE_SHARE_SIZE: u8 = 0x10;
pub(crate) const MESSAGE_TYPE_SHARE_RECORDS: u8 = 0x20;
pub(crate) const MESSAGE_TYPE_HELLO: u8 = 0x80;

pub type Rank = u32;
