use rust_decimal_macros::dec;
use tracing::debug;

use tcp_replay_trace::{Algorithm, PacketEvent, ReplayConfig, SequenceNumber, Time};

use crate::congestion::{BasicWindow, CongestionControl, SlowStart};
use crate::error::ReplayError;
use crate::metrics::{TcpMetrics, TimeoutUnit};
use crate::recovery::FastRetransmitState;
use crate::state::TcpState;
use crate::timeout::RetransmitTimer;

/// Sampling latency of the measurement tool the replayed series are compared
/// against; every metric sample lands this long after its triggering event.
const SAMPLE_DELAY: Time = Time::new(dec!(0.02));

/// RFC 793 sender control plane: retransmission timer plus a pluggable
/// window policy. No fast retransmit and no timeout backoff.
pub struct Rfc793Agent {
    state: TcpState,
    timer: RetransmitTimer,
    window: CongestionControl,
    karn_rtt: bool,
    metrics: TcpMetrics,
}

impl Rfc793Agent {
    pub fn new(window: CongestionControl, initial_timeout: Time, karn_rtt: bool) -> Self {
        Rfc793Agent {
            state: TcpState::new(),
            timer: RetransmitTimer::new(initial_timeout),
            window,
            karn_rtt,
            metrics: TcpMetrics::new(TimeoutUnit::Milliseconds),
        }
    }

    fn on_send(&mut self, event: &PacketEvent) -> Result<(), ReplayError> {
        self.fire_due_alarm(event.time)?;
        let force_timer = self.state.everything_acknowledged();
        if self.state.is_new_segment(event) {
            debug!(seq = %event.sequence_number, at = %event.time, "new highest segment sent");
            self.state = self.state.with_highest_sent(event.sequence_number);
            self.timer.track_new_segment(event)?;
        } else if !self.karn_rtt {
            debug!("karn rtt disabled, restarting measurement on a retransmission");
            self.timer.force_track_segment(event);
        }
        if self.timer.is_idle_at(event) || force_timer {
            self.timer.set_timer(event.time);
        }
        self.record(event.time);
        Ok(())
    }

    fn on_recv(&mut self, event: &PacketEvent) -> Result<(), ReplayError> {
        self.fire_due_alarm(event.time)?;
        if self.state.is_new_ack(event) {
            self.rearm_for(event);
            self.window.recv_ack();
            self.state = self.state.with_last_recv_ack(event.sequence_number);
            self.timer.received_ack(event)?;
        }
        self.record(event.time);
        Ok(())
    }

    /// An ack covering a retransmitted segment keeps the alarm running; an
    /// ack for fresh data clears it.
    fn rearm_for(&mut self, event: &PacketEvent) {
        if self.state.is_retransmit(event) {
            self.timer.set_timer(event.time);
        } else {
            self.timer.inactivate();
        }
    }

    fn on_timeout(&mut self, fired_at: Time) -> Result<(), ReplayError> {
        debug!(at = %fired_at, "retransmission timeout");
        // Sample the window before the reset so the drop is visible.
        self.metrics
            .window
            .push(fired_at + SAMPLE_DELAY, self.window.window());
        self.window.has_timed_out()?;
        self.timer.reset_timer(fired_at);
        self.record(fired_at);
        Ok(())
    }

    fn fire_due_alarm(&mut self, now: Time) -> Result<bool, ReplayError> {
        match self.timer.take_due_alarm(now) {
            Some(fired_at) => {
                self.on_timeout(fired_at)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn record(&mut self, time: Time) {
        let rto = (self.timer.timeout() + SAMPLE_DELAY) * 100;
        self.metrics.timeout.push(time + SAMPLE_DELAY, rto);
        self.metrics
            .window
            .push(time + SAMPLE_DELAY, self.window.window());
    }
}

/// Reno sender control plane: slow start / congestion avoidance with fast
/// retransmit, fast recovery and exponential timeout backoff.
pub struct RenoAgent {
    state: TcpState,
    timer: RetransmitTimer,
    window: SlowStart,
    fast_retransmit: FastRetransmitState,
    metrics: TcpMetrics,
}

impl RenoAgent {
    pub fn new(window: SlowStart, initial_timeout: Time, fast_retransmit_threshold: u32) -> Self {
        RenoAgent {
            state: TcpState::new(),
            timer: RetransmitTimer::new(initial_timeout),
            window,
            fast_retransmit: FastRetransmitState::new(fast_retransmit_threshold),
            metrics: TcpMetrics::new(TimeoutUnit::Seconds),
        }
    }

    fn on_send(&mut self, event: &PacketEvent) -> Result<(), ReplayError> {
        self.fire_due_alarm(event.time)?;
        let force_timer = self.state.everything_acknowledged();
        if self.state.is_new_segment(event) {
            self.state = self.state.with_highest_sent(event.sequence_number);
            self.timer.track_new_segment(event)?;
        }
        if self.timer.is_idle_at(event) || force_timer {
            self.timer.set_timer(event.time);
        }
        self.record(event.time);
        Ok(())
    }

    fn on_recv(&mut self, event: &PacketEvent) -> Result<(), ReplayError> {
        self.fire_due_alarm(event.time)?;
        if self.state.is_new_ack(event) {
            self.rearm_for(event);
            self.window.recv_ack();
            self.fast_retransmit = self.fast_retransmit.ack();
            self.state = self.state.with_last_recv_ack(event.sequence_number);
            self.timer.received_ack(event)?;
        } else if self.state.is_dup_ack(event) {
            self.fast_retransmit = self.fast_retransmit.duplicate_ack();
            if self.fast_retransmit.should_start_fast_retransmit()
                && self.may_enter_fast_retransmit(event.sequence_number)
            {
                self.enter_fast_retransmit(event)?;
            }
        }
        self.record(event.time);
        Ok(())
    }

    fn rearm_for(&mut self, event: &PacketEvent) {
        if self.state.is_retransmit(event) {
            self.timer.set_timer(event.time);
        } else {
            self.timer.inactivate();
        }
    }

    /// Re-entry is blocked while an earlier loss episode is still draining,
    /// unless the window policy still reports the dup-ack phase.
    fn may_enter_fast_retransmit(&self, ack: SequenceNumber) -> bool {
        self.fast_retransmit.we_recovered(ack) || self.window.in_dup_ack_recovery()
    }

    fn enter_fast_retransmit(&mut self, event: &PacketEvent) -> Result<(), ReplayError> {
        debug!(at = %event.time, ack = %event.sequence_number, "fast retransmit");
        self.fast_retransmit = self.fast_retransmit.set_recover(self.state.highest_sent());
        self.window.slowdown()?;
        self.timer.reset_timer(event.time);
        Ok(())
    }

    fn on_timeout(&mut self, fired_at: Time) -> Result<(), ReplayError> {
        debug!(at = %fired_at, "retransmission timeout");
        // Sample the window before the reset so the drop is visible.
        self.metrics
            .window
            .push(fired_at + SAMPLE_DELAY, self.window.window());
        self.fast_retransmit = self.fast_retransmit.ack();
        self.window.has_timed_out()?;
        self.timer.reset_timer(fired_at);
        self.timer.multiply_timeout_by(2);
        self.record(fired_at);
        Ok(())
    }

    fn fire_due_alarm(&mut self, now: Time) -> Result<bool, ReplayError> {
        match self.timer.take_due_alarm(now) {
            Some(fired_at) => {
                self.on_timeout(fired_at)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn record(&mut self, time: Time) {
        self.metrics
            .timeout
            .push(time + SAMPLE_DELAY, self.timer.timeout() + SAMPLE_DELAY);
        self.metrics
            .window
            .push(time + SAMPLE_DELAY, self.window.window());
    }
}

/// The closed set of replayable sender control planes.
pub enum TcpAgent {
    Rfc793(Rfc793Agent),
    Reno(RenoAgent),
}

impl TcpAgent {
    /// Build the agent a configuration asks for.
    pub fn from_config(config: &ReplayConfig) -> Result<Self, ReplayError> {
        match config.algorithm {
            Algorithm::Rfc793Basic => {
                let window = CongestionControl::Basic(BasicWindow::new(
                    config.initial_window,
                    config.max_window,
                    config.mss,
                )?);
                Ok(TcpAgent::Rfc793(Rfc793Agent::new(
                    window,
                    config.initial_timeout,
                    config.karn_rtt,
                )))
            }
            Algorithm::Rfc793SlowStart => {
                let window = CongestionControl::SlowStart(SlowStart::new(
                    config.initial_window,
                    config.ssthresh,
                    config.mss,
                )?);
                Ok(TcpAgent::Rfc793(Rfc793Agent::new(
                    window,
                    config.initial_timeout,
                    config.karn_rtt,
                )))
            }
            Algorithm::Reno => {
                let window = SlowStart::new(config.initial_window, config.ssthresh, config.mss)?;
                Ok(TcpAgent::Reno(RenoAgent::new(
                    window,
                    config.initial_timeout,
                    config.fast_retransmit_threshold,
                )))
            }
        }
    }

    /// Handle a segment the node put on the wire.
    pub fn on_send(&mut self, event: &PacketEvent) -> Result<(), ReplayError> {
        match self {
            TcpAgent::Rfc793(agent) => agent.on_send(event),
            TcpAgent::Reno(agent) => agent.on_send(event),
        }
    }

    /// Handle an acknowledgment the node received.
    pub fn on_recv(&mut self, event: &PacketEvent) -> Result<(), ReplayError> {
        match self {
            TcpAgent::Rfc793(agent) => agent.on_recv(event),
            TcpAgent::Reno(agent) => agent.on_recv(event),
        }
    }

    /// Fire the pending retransmission alarm if it is due at `now`. Reports
    /// whether an alarm fired.
    pub fn fire_due_alarm(&mut self, now: Time) -> Result<bool, ReplayError> {
        match self {
            TcpAgent::Rfc793(agent) => agent.fire_due_alarm(now),
            TcpAgent::Reno(agent) => agent.fire_due_alarm(now),
        }
    }

    pub fn metrics(&self) -> &TcpMetrics {
        match self {
            TcpAgent::Rfc793(agent) => &agent.metrics,
            TcpAgent::Reno(agent) => &agent.metrics,
        }
    }

    pub fn reset_metrics(&mut self) {
        match self {
            TcpAgent::Rfc793(agent) => agent.metrics.clear(),
            TcpAgent::Reno(agent) => agent.metrics.clear(),
        }
    }
}
