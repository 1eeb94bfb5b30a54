use tracing::debug;

use tcp_replay_trace::{PacketEvent, SequenceNumber, Time, TimeInterval};

use crate::error::ReplayError;
use crate::estimator::JacobsonKarels;
use crate::scheduler::AlarmScheduler;

/// Binds the estimator to the single retransmission alarm and decides which
/// segments may contribute RTT samples (Karn's rule).
///
/// At most one segment is timed at a time: `tracked_seq` plus `sent_at` name
/// it, `sampling` says whether its measurement is still open.
#[derive(Debug, Clone)]
pub struct RetransmitTimer {
    estimator: JacobsonKarels,
    scheduler: AlarmScheduler,
    tracked_seq: Option<SequenceNumber>,
    sent_at: Time,
    sampling: bool,
}

impl RetransmitTimer {
    pub fn new(initial_timeout: Time) -> Self {
        RetransmitTimer {
            estimator: JacobsonKarels::new(initial_timeout),
            scheduler: AlarmScheduler::new(),
            tracked_seq: None,
            sent_at: Time::ZERO,
            sampling: false,
        }
    }

    /// Current retransmission timeout value.
    pub fn timeout(&self) -> Time {
        self.estimator.timeout()
    }

    /// Start timing `event`'s segment unless a measurement is already open.
    /// Under Karn's rule only fresh data may be timed, so a segment no newer
    /// than the last tracked one is a consistency failure.
    pub fn track_new_segment(&mut self, event: &PacketEvent) -> Result<(), ReplayError> {
        if self.sampling {
            return Ok(());
        }
        if let Some(tracked) = self.tracked_seq
            && event.sequence_number <= tracked
        {
            return Err(ReplayError::StaleTimedSegment {
                seq: event.sequence_number,
                tracked,
            });
        }
        self.force_track_segment(event);
        Ok(())
    }

    /// Restart timing on `event` unconditionally. With Karn's rule disabled
    /// this trades correctness under retransmission for a fresh sample.
    pub fn force_track_segment(&mut self, event: &PacketEvent) {
        self.sampling = true;
        self.tracked_seq = Some(event.sequence_number);
        self.sent_at = event.time;
        debug!(seq = %event.sequence_number, at = %event.time, "timing segment");
    }

    /// Close the open measurement if `event` acknowledges the tracked
    /// segment, feeding the elapsed interval to the estimator.
    pub fn received_ack(&mut self, event: &PacketEvent) -> Result<(), ReplayError> {
        let covers_tracked = self
            .tracked_seq
            .is_none_or(|tracked| event.sequence_number >= tracked);
        if self.sampling && covers_tracked {
            self.sampling = false;
            let sample = TimeInterval::new(self.sent_at, event.time)?;
            self.estimator.observe(sample);
        }
        Ok(())
    }

    /// Arm the retransmission alarm at `now` plus the current timeout.
    pub fn set_timer(&mut self, now: Time) {
        let deadline = now + self.estimator.timeout();
        debug!(from = %now, until = %deadline, "arming retransmission alarm");
        self.scheduler.arm(deadline);
    }

    /// Re-arm after a fire or a fast retransmit, abandoning any open RTT
    /// measurement: the pending sample would be ambiguous.
    pub fn reset_timer(&mut self, now: Time) {
        self.set_timer(now);
        self.sampling = false;
    }

    pub fn inactivate(&mut self) {
        self.scheduler.disarm();
    }

    /// No alarm pending at the event's time.
    pub fn is_idle_at(&self, event: &PacketEvent) -> bool {
        !self.scheduler.is_pending(event.time)
    }

    pub fn take_due_alarm(&mut self, now: Time) -> Option<Time> {
        self.scheduler.take_due(now)
    }

    /// Reno-style exponential backoff after a timeout fires.
    pub fn multiply_timeout_by(&mut self, factor: u32) {
        self.estimator.scale_timeout(factor);
    }
}
