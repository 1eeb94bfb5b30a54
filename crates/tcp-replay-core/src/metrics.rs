use rust_decimal::Decimal;
use serde::Serialize;

use tcp_replay_trace::Time;

/// Unit the timeout series is reported in. The RFC 793 runs scale to
/// hundredths to match the simulator's recorded rto trace; Reno reports
/// plain seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutUnit {
    Milliseconds,
    Seconds,
}

/// Ordered (time, retransmission-timeout) samples. Append-only during a run.
#[derive(Debug, Clone, Serialize)]
pub struct TimeoutSeries {
    pub unit: TimeoutUnit,
    samples: Vec<(Time, Decimal)>,
}

impl TimeoutSeries {
    pub fn new(unit: TimeoutUnit) -> Self {
        TimeoutSeries {
            unit,
            samples: Vec::new(),
        }
    }

    pub fn push(&mut self, time: Time, value: Time) {
        self.samples.push((time, value.value()));
    }

    pub fn samples(&self) -> &[(Time, Decimal)] {
        &self.samples
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Ordered (time, window-in-segments) samples. Append-only during a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WindowSeries {
    samples: Vec<(Time, f64)>,
}

impl WindowSeries {
    pub fn push(&mut self, time: Time, segments: f64) {
        self.samples.push((time, segments));
    }

    pub fn samples(&self) -> &[(Time, f64)] {
        &self.samples
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// The pair of series one replay run produces.
#[derive(Debug, Clone, Serialize)]
pub struct TcpMetrics {
    pub timeout: TimeoutSeries,
    pub window: WindowSeries,
}

impl TcpMetrics {
    pub fn new(unit: TimeoutUnit) -> Self {
        TcpMetrics {
            timeout: TimeoutSeries::new(unit),
            window: WindowSeries::default(),
        }
    }

    pub fn clear(&mut self) {
        self.timeout.clear();
        self.window.clear();
    }
}
