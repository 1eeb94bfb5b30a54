use tcp_replay_trace::Time;

/// The single retransmission alarm an agent can have armed.
///
/// Firing disarms: `take_due` removes the alarm it returns, so a fired alarm
/// can never fire twice without a fresh `arm` in between.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlarmScheduler {
    armed_at: Option<Time>,
}

impl AlarmScheduler {
    pub fn new() -> Self {
        AlarmScheduler::default()
    }

    /// Arm (or re-arm) the alarm; there is only ever one.
    pub fn arm(&mut self, at: Time) {
        self.armed_at = Some(at);
    }

    pub fn disarm(&mut self) {
        self.armed_at = None;
    }

    /// Remove and return the alarm if it is due at `now`.
    pub fn take_due(&mut self, now: Time) -> Option<Time> {
        match self.armed_at {
            Some(at) if at <= now => self.armed_at.take(),
            _ => None,
        }
    }

    /// Whether an alarm is armed strictly in the future of `now`.
    pub fn is_pending(&self, now: Time) -> bool {
        self.armed_at.is_some_and(|at| at > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Time {
        s.parse().unwrap()
    }

    #[test]
    fn fires_at_or_after_the_armed_time() {
        let mut scheduler = AlarmScheduler::new();
        scheduler.arm(t("3.0"));
        assert_eq!(scheduler.take_due(t("2.9")), None);
        assert_eq!(scheduler.take_due(t("3.0")), Some(t("3.0")));
    }

    #[test]
    fn firing_disarms() {
        let mut scheduler = AlarmScheduler::new();
        scheduler.arm(t("3.0"));
        assert_eq!(scheduler.take_due(t("10.0")), Some(t("3.0")));
        assert_eq!(scheduler.take_due(t("10.0")), None);
    }

    #[test]
    fn disarm_cancels_the_alarm() {
        let mut scheduler = AlarmScheduler::new();
        scheduler.arm(t("3.0"));
        scheduler.disarm();
        assert_eq!(scheduler.take_due(t("10.0")), None);
    }

    #[test]
    fn pending_means_strictly_in_the_future() {
        let mut scheduler = AlarmScheduler::new();
        assert!(!scheduler.is_pending(t("0.0")));
        scheduler.arm(t("3.0"));
        assert!(scheduler.is_pending(t("2.9")));
        assert!(!scheduler.is_pending(t("3.0")));
    }

    #[test]
    fn rearming_overwrites() {
        let mut scheduler = AlarmScheduler::new();
        scheduler.arm(t("3.0"));
        scheduler.arm(t("5.0"));
        assert_eq!(scheduler.take_due(t("4.0")), None);
        assert_eq!(scheduler.take_due(t("5.0")), Some(t("5.0")));
    }
}
