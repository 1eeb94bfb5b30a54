use tcp_replay_trace::{PacketEvent, SequenceNumber};

/// Sliding-window bookkeeping for the monitored sender. Immutable: every
/// transition returns a new value and the agent overwrites its copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TcpState {
    last_recv_ack: Option<SequenceNumber>,
    highest_sent: Option<SequenceNumber>,
}

impl TcpState {
    pub fn new() -> Self {
        TcpState::default()
    }

    pub fn last_recv_ack(&self) -> Option<SequenceNumber> {
        self.last_recv_ack
    }

    pub fn highest_sent(&self) -> Option<SequenceNumber> {
        self.highest_sent
    }

    pub fn with_highest_sent(self, seq: SequenceNumber) -> Self {
        TcpState {
            highest_sent: Some(seq),
            ..self
        }
    }

    pub fn with_last_recv_ack(self, seq: SequenceNumber) -> Self {
        TcpState {
            last_recv_ack: Some(seq),
            ..self
        }
    }

    /// The very first ack counts as new.
    pub fn is_new_ack(&self, event: &PacketEvent) -> bool {
        self.last_recv_ack
            .is_none_or(|last| event.sequence_number > last)
    }

    pub fn is_dup_ack(&self, event: &PacketEvent) -> bool {
        self.last_recv_ack == Some(event.sequence_number)
    }

    /// The very first segment counts as new.
    pub fn is_new_segment(&self, event: &PacketEvent) -> bool {
        self.highest_sent
            .is_none_or(|highest| event.sequence_number > highest)
    }

    /// An ack below the highest sequence sent acknowledges a retransmission.
    /// With nothing sent yet, nothing can be a retransmission.
    pub fn is_retransmit(&self, event: &PacketEvent) -> bool {
        self.highest_sent
            .is_some_and(|highest| event.sequence_number < highest)
    }

    pub fn everything_acknowledged(&self) -> bool {
        self.last_recv_ack == self.highest_sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcp_replay_trace::PacketEvent;

    fn ack(seq: u64) -> PacketEvent {
        PacketEvent::from_line(&format!(
            "r 1.0 2 1 ack 40 ------- 1 3.0 1.0 {seq} 7"
        ))
        .unwrap()
    }

    #[test]
    fn first_packet_classifies_as_new() {
        let state = TcpState::new();
        assert!(state.is_new_ack(&ack(0)));
        assert!(state.is_new_segment(&ack(0)));
        assert!(!state.is_dup_ack(&ack(0)));
        assert!(!state.is_retransmit(&ack(0)));
        assert!(state.everything_acknowledged());
    }

    #[test]
    fn classification_tracks_the_last_ack() {
        let state = TcpState::new().with_last_recv_ack(SequenceNumber(5));
        assert!(state.is_new_ack(&ack(6)));
        assert!(!state.is_new_ack(&ack(5)));
        assert!(state.is_dup_ack(&ack(5)));
        assert!(!state.is_dup_ack(&ack(4)));
        assert!(!state.is_new_ack(&ack(4)));
    }

    #[test]
    fn retransmits_sit_below_the_highest_sent() {
        let state = TcpState::new().with_highest_sent(SequenceNumber(9));
        assert!(state.is_retransmit(&ack(8)));
        assert!(!state.is_retransmit(&ack(9)));
        assert!(!state.is_retransmit(&ack(10)));
        assert!(state.is_new_segment(&ack(10)));
        assert!(!state.is_new_segment(&ack(9)));
    }

    #[test]
    fn everything_acknowledged_needs_matching_marks() {
        let state = TcpState::new()
            .with_highest_sent(SequenceNumber(3))
            .with_last_recv_ack(SequenceNumber(3));
        assert!(state.everything_acknowledged());
        assert!(!state.with_highest_sent(SequenceNumber(4)).everything_acknowledged());
    }
}
