use thiserror::Error;

use tcp_replay_trace::{InvalidInterval, Node, PacketKind, SequenceNumber, Time};

/// Everything that can abort a replay run. No variant is recoverable: each
/// one means the trace or the configuration contradicts the model, and the
/// run yields no partial metrics.
#[derive(Debug, Error)]
pub enum ReplayError {
    // Domain construction.
    #[error("window of {bytes} bytes is below the minimum for a {mss}-byte segment size")]
    WindowUnderflow { bytes: u64, mss: u64 },
    #[error("maximum segment size must be positive")]
    ZeroMss,
    #[error(transparent)]
    Interval(#[from] InvalidInterval),

    // Trace consistency.
    #[error("node {node} carries {kind:?} traffic at {time}; expected only tcp and ack")]
    ForeignTraffic {
        node: Node,
        kind: PacketKind,
        time: Time,
    },
    #[error("node {node} enqueued {enqueued} packets but dequeued {dequeued}")]
    QueueMismatch {
        node: Node,
        enqueued: usize,
        dequeued: usize,
    },
    #[error("event at {current} arrives after one at {previous}")]
    TimeRegression { previous: Time, current: Time },
    #[error("segment {seq} cannot replace timed segment {tracked}; only fresh data may be timed")]
    StaleTimedSegment {
        seq: SequenceNumber,
        tracked: SequenceNumber,
    },
}
