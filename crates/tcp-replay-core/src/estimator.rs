use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use tcp_replay_trace::{Time, TimeInterval};

// Gains fixed by the algorithm: 1/8 on the smoothed RTT, 1/4 on the mean
// deviation, and a 4x deviation margin on the timeout.
const ALPHA: Decimal = dec!(0.125);
const BETA: Decimal = dec!(0.25);
const DEVIATION_WEIGHT: u32 = 4;

/// Jacobson/Karels retransmission-timeout estimator.
///
/// Until the first sample arrives the timeout is the configured seed value;
/// the smoothed estimate and deviation stay undefined.
#[derive(Debug, Clone)]
pub struct JacobsonKarels {
    estimated_rtt: Option<Time>,
    deviation: Option<Time>,
    timeout: Time,
}

impl JacobsonKarels {
    pub fn new(initial_timeout: Time) -> Self {
        JacobsonKarels {
            estimated_rtt: None,
            deviation: None,
            timeout: initial_timeout,
        }
    }

    pub fn timeout(&self) -> Time {
        self.timeout
    }

    pub fn estimated_rtt(&self) -> Option<Time> {
        self.estimated_rtt
    }

    pub fn deviation(&self) -> Option<Time> {
        self.deviation
    }

    /// Fold one RTT sample into the smoothed estimate and recompute the
    /// timeout as `srtt + 4 * deviation`.
    pub fn observe(&mut self, sample: TimeInterval) {
        let rtt = sample.duration();
        let (estimated, deviation) = match (self.estimated_rtt, self.deviation) {
            (Some(estimated), Some(deviation)) => {
                let diff = rtt - estimated;
                (
                    estimated + diff * ALPHA,
                    deviation + (diff.abs() - deviation) * BETA,
                )
            }
            _ => (rtt, rtt.half()),
        };
        self.estimated_rtt = Some(estimated);
        self.deviation = Some(deviation);
        self.timeout = estimated + deviation * DEVIATION_WEIGHT;
    }

    /// Exponential-backoff hook: scale the current timeout without touching
    /// the smoothed estimate.
    pub fn scale_timeout(&mut self, factor: u32) {
        self.timeout = self.timeout * factor;
    }
}
