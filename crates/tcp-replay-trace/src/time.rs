use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidInterval, ParseError};

/// A simulation timestamp in the trace's time unit (seconds).
///
/// Backed by an exact decimal so that the estimator recurrences reproduce the
/// simulator's arithmetic digit for digit; `f64` drifts on values like 0.15.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Time(Decimal);

impl Time {
    pub const ZERO: Time = Time(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Time(value)
    }

    pub fn value(self) -> Decimal {
        self.0
    }

    pub fn half(self) -> Time {
        Time(self.0 / Decimal::TWO)
    }

    pub fn abs(self) -> Time {
        Time(self.0.abs())
    }
}

impl FromStr for Time {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Decimal>()
            .map(Time)
            .map_err(|_| ParseError::Time(s.to_string()))
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Add for Time {
    type Output = Time;

    fn add(self, rhs: Time) -> Time {
        Time(self.0 + rhs.0)
    }
}

impl Sub for Time {
    type Output = Time;

    fn sub(self, rhs: Time) -> Time {
        Time(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Time {
    type Output = Time;

    fn mul(self, rhs: Decimal) -> Time {
        Time(self.0 * rhs)
    }
}

impl Mul<u32> for Time {
    type Output = Time;

    fn mul(self, rhs: u32) -> Time {
        Time(self.0 * Decimal::from(rhs))
    }
}

/// A closed `[begin, end]` span used to take an RTT sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    begin: Time,
    end: Time,
}

impl TimeInterval {
    pub fn new(begin: Time, end: Time) -> Result<Self, InvalidInterval> {
        if begin > end {
            return Err(InvalidInterval { begin, end });
        }
        Ok(TimeInterval { begin, end })
    }

    pub fn begin(&self) -> Time {
        self.begin
    }

    pub fn end(&self) -> Time {
        self.end
    }

    pub fn contains(&self, time: Time) -> bool {
        self.begin <= time && time <= self.end
    }

    pub fn duration(&self) -> Time {
        self.end - self.begin
    }
}
