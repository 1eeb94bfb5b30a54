pub mod config;
pub mod error;
pub mod file;
pub mod packet;
pub mod reference;
pub mod time;

pub use config::{Algorithm, ConfigOverride, ReplayConfig};
pub use error::{InvalidInterval, ParseError, TraceError, UnknownAlgorithm};
pub use file::TraceFile;
pub use packet::{
    Address, EventKind, Flags, FlowId, Node, PacketEvent, PacketId, PacketKind, PacketSize,
    SequenceNumber,
};
pub use reference::{CwndRecord, RtoRecord};
pub use time::{Time, TimeInterval};
