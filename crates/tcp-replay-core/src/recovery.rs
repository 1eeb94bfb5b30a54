use tcp_replay_trace::SequenceNumber;

/// Reno duplicate-ack bookkeeping: a consecutive-dup-ack counter and the
/// recovery mark set when fast retransmit starts. Immutable value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastRetransmitState {
    threshold: u32,
    duplicated_acks: u32,
    recover: Option<SequenceNumber>,
}

impl FastRetransmitState {
    pub fn new(threshold: u32) -> Self {
        FastRetransmitState {
            threshold,
            duplicated_acks: 0,
            recover: None,
        }
    }

    pub fn duplicate_ack(self) -> Self {
        FastRetransmitState {
            duplicated_acks: self.duplicated_acks + 1,
            ..self
        }
    }

    /// Any new ack (or a timeout) ends the dup-ack run.
    pub fn ack(self) -> Self {
        FastRetransmitState {
            duplicated_acks: 0,
            ..self
        }
    }

    /// Edge-triggered: true exactly on the duplicate that reaches the
    /// threshold, never on later duplicates of the same run.
    pub fn should_start_fast_retransmit(&self) -> bool {
        self.duplicated_acks == self.threshold
    }

    /// Record the highest sequence in flight when fast retransmit starts.
    pub fn set_recover(self, seq: Option<SequenceNumber>) -> Self {
        FastRetransmitState {
            recover: seq,
            ..self
        }
    }

    /// The prior loss episode is fully acknowledged once the cumulative ack
    /// passes the recovery mark (or no mark was ever set).
    pub fn we_recovered(&self, ack: SequenceNumber) -> bool {
        self.recover.is_none_or(|recover| ack > recover)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_crossing_is_edge_triggered() {
        let mut state = FastRetransmitState::new(3);
        state = state.duplicate_ack();
        assert!(!state.should_start_fast_retransmit());
        state = state.duplicate_ack();
        assert!(!state.should_start_fast_retransmit());
        state = state.duplicate_ack();
        assert!(state.should_start_fast_retransmit());
        // A fourth duplicate does not re-trigger.
        state = state.duplicate_ack();
        assert!(!state.should_start_fast_retransmit());
    }

    #[test]
    fn new_ack_resets_the_run() {
        let mut state = FastRetransmitState::new(2);
        state = state.duplicate_ack().duplicate_ack();
        assert!(state.should_start_fast_retransmit());
        state = state.ack();
        assert!(!state.should_start_fast_retransmit());
        state = state.duplicate_ack().duplicate_ack();
        assert!(state.should_start_fast_retransmit());
    }

    #[test]
    fn recovery_mark_gates_re_entry() {
        let state = FastRetransmitState::new(3);
        assert!(state.we_recovered(SequenceNumber(0)));
        let state = state.set_recover(Some(SequenceNumber(10)));
        assert!(!state.we_recovered(SequenceNumber(10)));
        assert!(!state.we_recovered(SequenceNumber(7)));
        assert!(state.we_recovered(SequenceNumber(11)));
    }
}
