use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{Level, info};

use tcp_replay_core::{ReplayDriver, TcpAgent, TcpMetrics};
use tcp_replay_trace::reference::{self, CwndRecord, RtoRecord};
use tcp_replay_trace::{Algorithm, ConfigOverride, Node, ReplayConfig, Time, TraceFile};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Replay an ns-2 packet trace through a TCP sender's control plane \
             and reconstruct its congestion-window and timeout trajectories"
)]
struct Args {
    /// ns-2 packet trace to replay.
    #[arg(short, long)]
    file: PathBuf,

    /// Node identifier of the monitored TCP sender.
    #[arg(long, default_value_t = 1)]
    node: u32,

    /// TCP implementation: rfc793-basic, rfc793-slow-start or reno.
    #[arg(short, long, default_value = "rfc793-slow-start")]
    implementation: Algorithm,

    /// Initial retransmission timeout, in seconds.
    #[arg(long, default_value = "3.0")]
    initial_timeout: Time,

    /// Initial congestion window, in segments.
    #[arg(long, default_value_t = 1)]
    initial_cw: u32,

    /// Slow start threshold, in segments.
    #[arg(long, default_value_t = 10)]
    ssthresh: u32,

    /// Duplicate acks needed to trigger fast retransmit (reno).
    #[arg(long, default_value_t = 3)]
    fr_threshold: u32,

    /// Maximum segment size, in bytes.
    #[arg(long, default_value_t = 1000)]
    mss: u32,

    /// Maximum congestion window, in segments (rfc793-basic).
    #[arg(long, default_value_t = 10)]
    max_cw: u32,

    /// Sample RTTs only from segments that were never retransmitted.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    karn_rtt: bool,

    /// Take the dequeue event, not the enqueue, as a packet's send instant.
    #[arg(long, default_value_t = false)]
    dequeue_send_time: bool,

    /// Apply overrides from a TOML file on top of the flags.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulator rto trace to embed in the report for comparison.
    #[arg(long)]
    timeout_reference: Option<PathBuf>,

    /// Simulator congestion-window trace to embed in the report.
    #[arg(long)]
    cwnd_reference: Option<PathBuf>,

    /// Write the report to this file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Log verbosity: error, warn, info, debug or trace.
    #[arg(long, default_value = "info")]
    log_level: Level,
}

/// Everything one run produces, ready for the plotting side.
#[derive(Debug, Serialize)]
struct ReplayReport {
    config: ReplayConfig,
    metrics: TcpMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<ReferenceMetrics>,
}

/// The simulator's own recordings, passed through untouched.
#[derive(Debug, Serialize)]
struct ReferenceMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<Vec<RtoRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    congestion_window: Option<Vec<CwndRecord>>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let config = args.replay_config()?;
    info!(algorithm = %config.algorithm, node = %config.node, "starting replay");

    let trace = TraceFile::open(&args.file)?.load()?;
    info!(events = trace.len(), file = %args.file.display(), "trace loaded");

    let mut agent = TcpAgent::from_config(&config)?;
    let metrics = ReplayDriver::from_config(&config).run(&mut agent, &trace)?;
    info!(
        window_samples = metrics.window.samples().len(),
        timeout_samples = metrics.timeout.samples().len(),
        "replay finished"
    );

    let report = ReplayReport {
        reference: args.load_reference()?,
        config,
        metrics,
    };
    match &args.out {
        Some(path) => write_report(path, &report)?,
        None => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize replay report")?
        ),
    }
    Ok(())
}

impl Args {
    fn replay_config(&self) -> Result<ReplayConfig> {
        let mut config = ReplayConfig {
            algorithm: self.implementation,
            node: Node(self.node),
            initial_timeout: self.initial_timeout,
            initial_window: self.initial_cw,
            mss: self.mss,
            ssthresh: self.ssthresh,
            fast_retransmit_threshold: self.fr_threshold,
            max_window: self.max_cw,
            karn_rtt: self.karn_rtt,
            sends_at_dequeue: self.dequeue_send_time,
        };
        if let Some(path) = &self.config {
            load_overrides(path)?.apply_to(&mut config);
        }
        Ok(config)
    }

    fn load_reference(&self) -> Result<Option<ReferenceMetrics>> {
        if self.timeout_reference.is_none() && self.cwnd_reference.is_none() {
            return Ok(None);
        }
        let timeout = self
            .timeout_reference
            .as_ref()
            .map(|path| reference::load_rto_reference(path))
            .transpose()?;
        let congestion_window = self
            .cwnd_reference
            .as_ref()
            .map(|path| reference::load_cwnd_reference(path))
            .transpose()?;
        Ok(Some(ReferenceMetrics {
            timeout,
            congestion_window,
        }))
    }
}

fn load_overrides(path: &Path) -> Result<ConfigOverride> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&content).context("Failed to parse config file")
}

fn write_report(path: &Path, report: &ReplayReport) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).context("Failed to serialize replay report")?;
    fs::write(path, &data)
        .with_context(|| format!("Failed to write report file {}", path.display()))?;
    info!(path = %path.display(), "report written");
    Ok(())
}
