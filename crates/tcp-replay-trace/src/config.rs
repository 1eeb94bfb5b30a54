use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::UnknownAlgorithm;
use crate::packet::Node;
use crate::time::Time;

/// The closed set of TCP control-plane variants a replay can model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// RFC 793 agent with the binary max-or-initial window policy.
    Rfc793Basic,
    /// RFC 793 agent driving a slow-start/congestion-avoidance window.
    Rfc793SlowStart,
    /// Reno: slow start plus fast retransmit / fast recovery.
    Reno,
}

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rfc793-basic" => Ok(Algorithm::Rfc793Basic),
            "rfc793" | "rfc793-slow-start" => Ok(Algorithm::Rfc793SlowStart),
            "reno" => Ok(Algorithm::Reno),
            other => Err(UnknownAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Rfc793Basic => "rfc793-basic",
            Algorithm::Rfc793SlowStart => "rfc793-slow-start",
            Algorithm::Reno => "reno",
        };
        f.write_str(name)
    }
}

/// Everything a replay run needs besides the trace itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    pub algorithm: Algorithm,
    /// Node identifier of the monitored TCP sender.
    pub node: Node,
    /// Seed value of the retransmission timeout, in seconds.
    pub initial_timeout: Time,
    /// Initial congestion window, in segments.
    pub initial_window: u32,
    /// Maximum segment size, in bytes.
    pub mss: u32,
    /// Slow-start threshold, in segments.
    pub ssthresh: u32,
    /// Consecutive duplicate acks that trigger fast retransmit (Reno).
    pub fast_retransmit_threshold: u32,
    /// Window ceiling for the basic RFC 793 policy, in segments.
    pub max_window: u32,
    /// Refuse RTT samples from retransmitted segments.
    pub karn_rtt: bool,
    /// Model the send instant with the dequeue (`-`) event instead of the
    /// enqueue (`+`) event.
    pub sends_at_dequeue: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            algorithm: Algorithm::Rfc793SlowStart,
            node: Node(1),
            initial_timeout: Time::new(Decimal::new(3, 0)),
            initial_window: 1,
            mss: 1000,
            ssthresh: 10,
            fast_retransmit_threshold: 3,
            max_window: 10,
            karn_rtt: true,
            sends_at_dequeue: false,
        }
    }
}

/// Partial configuration loaded from a TOML file; unset fields keep whatever
/// the command line produced.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverride {
    pub algorithm: Option<Algorithm>,
    pub node: Option<Node>,
    pub initial_timeout: Option<Time>,
    pub initial_window: Option<u32>,
    pub mss: Option<u32>,
    pub ssthresh: Option<u32>,
    pub fast_retransmit_threshold: Option<u32>,
    pub max_window: Option<u32>,
    pub karn_rtt: Option<bool>,
    pub sends_at_dequeue: Option<bool>,
}

impl ConfigOverride {
    pub fn apply_to(&self, config: &mut ReplayConfig) {
        if let Some(v) = self.algorithm {
            config.algorithm = v;
        }
        if let Some(v) = self.node {
            config.node = v;
        }
        if let Some(v) = self.initial_timeout {
            config.initial_timeout = v;
        }
        if let Some(v) = self.initial_window {
            config.initial_window = v;
        }
        if let Some(v) = self.mss {
            config.mss = v;
        }
        if let Some(v) = self.ssthresh {
            config.ssthresh = v;
        }
        if let Some(v) = self.fast_retransmit_threshold {
            config.fast_retransmit_threshold = v;
        }
        if let Some(v) = self.max_window {
            config.max_window = v;
        }
        if let Some(v) = self.karn_rtt {
            config.karn_rtt = v;
        }
        if let Some(v) = self.sends_at_dequeue {
            config.sends_at_dequeue = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_names_round_trip() {
        assert_eq!("rfc793-basic".parse::<Algorithm>(), Ok(Algorithm::Rfc793Basic));
        assert_eq!("rfc793".parse::<Algorithm>(), Ok(Algorithm::Rfc793SlowStart));
        assert_eq!("reno".parse::<Algorithm>(), Ok(Algorithm::Reno));
        assert!("tahoe".parse::<Algorithm>().is_err());
        assert_eq!(Algorithm::Reno.to_string().parse::<Algorithm>(), Ok(Algorithm::Reno));
    }

    #[test]
    fn overrides_touch_only_set_fields() {
        let mut config = ReplayConfig::default();
        let overrides = ConfigOverride {
            algorithm: Some(Algorithm::Reno),
            ssthresh: Some(20),
            ..Default::default()
        };
        overrides.apply_to(&mut config);
        assert_eq!(config.algorithm, Algorithm::Reno);
        assert_eq!(config.ssthresh, 20);
        assert_eq!(config.mss, 1000);
        assert_eq!(config.node, Node(1));
        assert!(config.karn_rtt);
    }
}
