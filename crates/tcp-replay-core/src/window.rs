use std::cmp::Ordering;

use crate::error::ReplayError;

/// The sender's congestion window, denominated in bytes so that sub-segment
/// growth in congestion avoidance is representable. `value()` gives the
/// segment-count view the metrics report.
#[derive(Debug, Clone, Copy)]
pub struct CongestionWindow {
    bytes: u64,
    mss: u64,
}

impl CongestionWindow {
    pub fn from_segments(segments: u32, mss: u32) -> Result<Self, ReplayError> {
        if mss == 0 {
            return Err(ReplayError::ZeroMss);
        }
        if segments == 0 {
            return Err(ReplayError::WindowUnderflow {
                bytes: 0,
                mss: u64::from(mss),
            });
        }
        Ok(CongestionWindow {
            bytes: u64::from(segments) * u64::from(mss),
            mss: u64::from(mss),
        })
    }

    pub fn from_bytes(bytes: u64, mss: u64) -> Result<Self, ReplayError> {
        if mss == 0 {
            return Err(ReplayError::ZeroMss);
        }
        if bytes == 0 {
            return Err(ReplayError::WindowUnderflow { bytes, mss });
        }
        Ok(CongestionWindow { bytes, mss })
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn mss(&self) -> u64 {
        self.mss
    }

    /// Window size in segments.
    pub fn value(&self) -> f64 {
        self.bytes as f64 / self.mss as f64
    }

    /// Grow by one segment. Applied once per acked segment during slow start,
    /// which is what doubles the window each round trip.
    pub fn exponential_increase(self) -> Self {
        CongestionWindow {
            bytes: self.bytes + self.mss,
            ..self
        }
    }

    /// Grow by `mss * mss / bytes` bytes, approximating one extra segment per
    /// round trip in congestion avoidance.
    pub fn linear_increase(self) -> Self {
        CongestionWindow {
            bytes: self.bytes + self.mss * self.mss / self.bytes,
            ..self
        }
    }

    pub fn make_half(self) -> Result<Self, ReplayError> {
        Self::from_bytes(self.bytes / 2, self.mss)
    }

    pub fn make_third(self) -> Result<Self, ReplayError> {
        Self::from_bytes(self.bytes / 3, self.mss)
    }
}

// Windows compare by segment count; cross-multiplying keeps the comparison
// exact for differing segment sizes.
impl PartialEq for CongestionWindow {
    fn eq(&self, other: &Self) -> bool {
        u128::from(self.bytes) * u128::from(other.mss)
            == u128::from(other.bytes) * u128::from(self.mss)
    }
}

impl Eq for CongestionWindow {}

impl PartialOrd for CongestionWindow {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CongestionWindow {
    fn cmp(&self, other: &Self) -> Ordering {
        (u128::from(self.bytes) * u128::from(other.mss))
            .cmp(&(u128::from(other.bytes) * u128::from(self.mss)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(n: u32) -> CongestionWindow {
        CongestionWindow::from_segments(n, 1000).unwrap()
    }

    #[test]
    fn construction_guards_the_domain() {
        assert!(matches!(
            CongestionWindow::from_segments(0, 1000),
            Err(ReplayError::WindowUnderflow { .. })
        ));
        assert!(matches!(
            CongestionWindow::from_segments(1, 0),
            Err(ReplayError::ZeroMss)
        ));
        assert!(matches!(
            CongestionWindow::from_bytes(0, 1000),
            Err(ReplayError::WindowUnderflow { .. })
        ));
        assert_eq!(CongestionWindow::from_bytes(500, 1000).unwrap().value(), 0.5);
    }

    #[test]
    fn exponential_increase_adds_exactly_one_segment() {
        let grown = segments(1).exponential_increase();
        assert_eq!(grown.value(), 2.0);
        assert_eq!(grown.exponential_increase().value(), 3.0);
    }

    #[test]
    fn linear_increase_is_sub_segment() {
        let grown = segments(4).linear_increase();
        assert_eq!(grown.bytes(), 4250);
        assert_eq!(grown.value(), 4.25);
    }

    #[test]
    fn halving_and_thirding_floor_on_bytes() {
        assert_eq!(segments(5).make_half().unwrap().bytes(), 2500);
        assert_eq!(segments(5).make_third().unwrap().bytes(), 1666);
        // Shrinking all the way to zero bytes is out of domain.
        let sliver = CongestionWindow::from_bytes(1, 1000).unwrap();
        assert!(sliver.make_half().is_err());
    }

    #[test]
    fn ordering_follows_segment_count() {
        assert!(segments(2) < segments(3));
        assert_eq!(segments(2).min(segments(3)), segments(2));
        // Same segment count expressed with a different mss compares equal.
        let a = CongestionWindow::from_bytes(2000, 1000).unwrap();
        let b = CongestionWindow::from_bytes(1000, 500).unwrap();
        assert_eq!(a, b);
    }
}
