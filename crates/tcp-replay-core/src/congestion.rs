use crate::error::ReplayError;
use crate::window::CongestionWindow;

/// Where a slow-start window stands relative to a dup-ack recovery episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPhase {
    /// Fast retransmit cut the window and recovery is in progress.
    DupAck,
    /// A new ack arrived after the cut; the episode has ended.
    Exited,
}

/// The binary RFC 793 window policy: any ack opens the window to its ceiling,
/// any timeout drops it back to the initial value.
#[derive(Debug, Clone)]
pub struct BasicWindow {
    initial: CongestionWindow,
    window: CongestionWindow,
    max: CongestionWindow,
}

impl BasicWindow {
    pub fn new(initial_segments: u32, max_segments: u32, mss: u32) -> Result<Self, ReplayError> {
        let initial = CongestionWindow::from_segments(initial_segments, mss)?;
        Ok(BasicWindow {
            initial,
            window: initial,
            max: CongestionWindow::from_segments(max_segments, mss)?,
        })
    }

    pub fn recv_ack(&mut self) {
        self.window = self.max;
    }

    pub fn has_timed_out(&mut self) {
        self.window = self.initial;
    }

    pub fn window(&self) -> f64 {
        self.window.value()
    }
}

/// Slow start below the threshold, additive increase above it, with the
/// dup-ack `slowdown` cut that Reno's fast retransmit invokes.
#[derive(Debug, Clone)]
pub struct SlowStart {
    initial: CongestionWindow,
    window: CongestionWindow,
    ssthresh: CongestionWindow,
    window_max: CongestionWindow,
    phase: Option<RecoveryPhase>,
}

impl SlowStart {
    pub fn new(initial_segments: u32, ssthresh_segments: u32, mss: u32) -> Result<Self, ReplayError> {
        let initial = CongestionWindow::from_segments(initial_segments, mss)?;
        let ssthresh = CongestionWindow::from_segments(ssthresh_segments, mss)?;
        Ok(SlowStart {
            initial,
            window: initial,
            ssthresh,
            window_max: ssthresh,
            phase: None,
        })
    }

    pub fn recv_ack(&mut self) {
        if self.phase == Some(RecoveryPhase::DupAck) {
            self.phase = Some(RecoveryPhase::Exited);
        }
        if self.window >= self.ssthresh {
            self.window = self.window.linear_increase();
            self.ssthresh = self.window_max.min(self.window);
        } else {
            self.window = self.window.exponential_increase();
        }
    }

    pub fn has_timed_out(&mut self) -> Result<(), ReplayError> {
        self.window = self.initial;
        self.ssthresh = self.initial.max(self.ssthresh.make_half()?);
        Ok(())
    }

    /// Fast retransmit / fast recovery: halve the threshold (floored at the
    /// initial window) and cut the window.
    pub fn slowdown(&mut self) -> Result<(), ReplayError> {
        self.phase = Some(RecoveryPhase::DupAck);
        self.ssthresh = self.initial.max(self.ssthresh.make_half()?);
        self.window = self.window.make_half()?.min(self.window_max.make_half()?);
        Ok(())
    }

    pub fn in_dup_ack_recovery(&self) -> bool {
        self.phase == Some(RecoveryPhase::DupAck)
    }

    pub fn window(&self) -> f64 {
        self.window.value()
    }
}

/// The window policies an RFC 793 agent can be configured with. The variant
/// set is closed; dispatch is a match, not a vtable.
#[derive(Debug, Clone)]
pub enum CongestionControl {
    Basic(BasicWindow),
    SlowStart(SlowStart),
}

impl CongestionControl {
    pub fn recv_ack(&mut self) {
        match self {
            CongestionControl::Basic(window) => window.recv_ack(),
            CongestionControl::SlowStart(window) => window.recv_ack(),
        }
    }

    pub fn has_timed_out(&mut self) -> Result<(), ReplayError> {
        match self {
            CongestionControl::Basic(window) => {
                window.has_timed_out();
                Ok(())
            }
            CongestionControl::SlowStart(window) => window.has_timed_out(),
        }
    }

    pub fn window(&self) -> f64 {
        match self {
            CongestionControl::Basic(window) => window.window(),
            CongestionControl::SlowStart(window) => window.window(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_policy_is_binary() {
        let mut window = BasicWindow::new(1, 20, 1000).unwrap();
        assert_eq!(window.window(), 1.0);
        window.recv_ack();
        assert_eq!(window.window(), 20.0);
        window.recv_ack();
        assert_eq!(window.window(), 20.0);
        window.has_timed_out();
        assert_eq!(window.window(), 1.0);
    }

    #[test]
    fn slow_start_doubles_then_crawls() {
        let mut window = SlowStart::new(1, 4, 1000).unwrap();
        // Exponential up to the threshold: 1, 2, 3, 4 segments.
        window.recv_ack();
        window.recv_ack();
        window.recv_ack();
        assert_eq!(window.window(), 4.0);
        // At the threshold the growth turns linear.
        window.recv_ack();
        assert_eq!(window.window(), 4.25);
        window.recv_ack();
        assert!(window.window() < 4.5);
    }

    #[test]
    fn timeout_halves_the_threshold_and_resets_the_window() {
        let mut window = SlowStart::new(1, 8, 1000).unwrap();
        for _ in 0..8 {
            window.recv_ack();
        }
        window.has_timed_out().unwrap();
        assert_eq!(window.window(), 1.0);
        // ssthresh floors at the initial window, never below.
        let mut floor = SlowStart::new(1, 1, 1000).unwrap();
        floor.has_timed_out().unwrap();
        assert_eq!(floor.window(), 1.0);
    }

    #[test]
    fn slowdown_enters_and_acks_exit_recovery() {
        let mut window = SlowStart::new(1, 8, 1000).unwrap();
        for _ in 0..4 {
            window.recv_ack();
        }
        assert_eq!(window.window(), 5.0);
        window.slowdown().unwrap();
        assert!(window.in_dup_ack_recovery());
        // min(5/2, 8/2) segments.
        assert_eq!(window.window(), 2.5);
        window.recv_ack();
        assert!(!window.in_dup_ack_recovery());
    }
}
