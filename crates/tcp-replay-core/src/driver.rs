use tracing::{debug, info};

use tcp_replay_trace::{EventKind, Node, PacketEvent, PacketKind, ReplayConfig, Time};

use crate::agent::TcpAgent;
use crate::error::ReplayError;
use crate::metrics::TcpMetrics;

/// Replays the monitored node's slice of a trace through an agent.
///
/// Selection and consistency checks run before the first event is
/// dispatched, so a malformed trace never yields partial metrics.
#[derive(Debug, Clone, Copy)]
pub struct ReplayDriver {
    node: Node,
    send_event: EventKind,
}

impl ReplayDriver {
    pub fn new(node: Node, sends_at_dequeue: bool) -> Self {
        let send_event = if sends_at_dequeue {
            EventKind::Dequeue
        } else {
            EventKind::Enqueue
        };
        ReplayDriver { node, send_event }
    }

    pub fn from_config(config: &ReplayConfig) -> Self {
        ReplayDriver::new(config.node, config.sends_at_dequeue)
    }

    /// Run one replay over a full trace and return the accumulated series.
    pub fn run(&self, agent: &mut TcpAgent, trace: &[PacketEvent]) -> Result<TcpMetrics, ReplayError> {
        agent.reset_metrics();
        let selected = self.select(trace)?;
        info!(node = %self.node, events = selected.len(), "replaying trace");
        for event in selected {
            if event.received_by(self.node) {
                debug!(at = %event.time, seq = %event.sequence_number, "ack received");
                agent.on_recv(event)?;
            } else {
                debug!(at = %event.time, seq = %event.sequence_number, "segment sent");
                agent.on_send(event)?;
            }
        }
        Ok(agent.metrics().clone())
    }

    /// Restrict the trace to the node's sends (through the configured queue
    /// event) and receptions. Consistency checks: only tcp/ack traffic at
    /// the node, matching enqueue/dequeue counts, ordered timestamps.
    fn select<'a>(&self, trace: &'a [PacketEvent]) -> Result<Vec<&'a PacketEvent>, ReplayError> {
        let mut enqueued = 0usize;
        let mut dequeued = 0usize;
        let mut last_time: Option<Time> = None;
        let mut selected = Vec::new();

        for event in trace {
            if event.source == self.node {
                match event.kind {
                    EventKind::Enqueue => enqueued += 1,
                    EventKind::Dequeue => dequeued += 1,
                    EventKind::Receive | EventKind::Drop => {}
                }
            }
            if !(event.sent_by(self.node, self.send_event) || event.received_by(self.node)) {
                continue;
            }
            if !matches!(event.packet, PacketKind::Tcp | PacketKind::Ack) {
                return Err(ReplayError::ForeignTraffic {
                    node: self.node,
                    kind: event.packet,
                    time: event.time,
                });
            }
            if let Some(previous) = last_time
                && event.time < previous
            {
                return Err(ReplayError::TimeRegression {
                    previous,
                    current: event.time,
                });
            }
            last_time = Some(event.time);
            selected.push(event);
        }

        if enqueued != dequeued {
            return Err(ReplayError::QueueMismatch {
                node: self.node,
                enqueued,
                dequeued,
            });
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcp_replay_trace::ReplayConfig;

    fn event(line: &str) -> PacketEvent {
        PacketEvent::from_line(line).unwrap()
    }

    fn agent() -> TcpAgent {
        TcpAgent::from_config(&ReplayConfig::default()).unwrap()
    }

    #[test]
    fn selects_sends_and_receptions_in_order() {
        let trace = vec![
            event("+ 0.1 1 2 tcp 1000 ------- 1 1.0 3.0 0 1"),
            event("- 0.11 1 2 tcp 1000 ------- 1 1.0 3.0 0 1"),
            // Another node's traffic is invisible to the replay.
            event("+ 0.2 2 3 cbr 210 ------- 2 2.0 3.1 0 2"),
            event("r 0.4 3 1 ack 40 ------- 1 3.0 1.0 0 3"),
        ];
        let metrics = ReplayDriver::new(Node(1), false)
            .run(&mut agent(), &trace)
            .unwrap();
        // One send and one reception, one sample pair each.
        assert_eq!(metrics.window.samples().len(), 2);
        assert_eq!(metrics.timeout.samples().len(), 2);
    }

    #[test]
    fn dequeue_option_flips_the_send_instant() {
        let trace = vec![
            event("+ 0.1 1 2 tcp 1000 ------- 1 1.0 3.0 0 1"),
            event("- 0.25 1 2 tcp 1000 ------- 1 1.0 3.0 0 1"),
        ];
        let metrics = ReplayDriver::new(Node(1), true)
            .run(&mut agent(), &trace)
            .unwrap();
        let (time, _) = metrics.window.samples()[0];
        // 0.25 (dequeue) + 0.02 sample delay, not 0.12.
        assert_eq!(time, "0.27".parse().unwrap());
    }

    #[test]
    fn foreign_traffic_at_the_node_is_fatal() {
        let trace = vec![
            event("+ 0.1 1 2 cbr 210 ------- 2 1.0 3.1 0 1"),
            event("- 0.11 1 2 cbr 210 ------- 2 1.0 3.1 0 1"),
        ];
        let err = ReplayDriver::new(Node(1), false)
            .run(&mut agent(), &trace)
            .unwrap_err();
        assert!(matches!(err, ReplayError::ForeignTraffic { .. }));
    }

    #[test]
    fn queue_counts_must_balance() {
        let trace = vec![event("+ 0.1 1 2 tcp 1000 ------- 1 1.0 3.0 0 1")];
        let err = ReplayDriver::new(Node(1), false)
            .run(&mut agent(), &trace)
            .unwrap_err();
        assert!(matches!(
            err,
            ReplayError::QueueMismatch { enqueued: 1, dequeued: 0, .. }
        ));
    }

    #[test]
    fn time_must_not_regress() {
        let trace = vec![
            event("+ 0.5 1 2 tcp 1000 ------- 1 1.0 3.0 0 1"),
            event("- 0.5 1 2 tcp 1000 ------- 1 1.0 3.0 0 1"),
            event("+ 0.4 1 2 tcp 1000 ------- 1 1.0 3.0 1 2"),
            event("- 0.4 1 2 tcp 1000 ------- 1 1.0 3.0 1 2"),
        ];
        let err = ReplayDriver::new(Node(1), false)
            .run(&mut agent(), &trace)
            .unwrap_err();
        assert!(matches!(err, ReplayError::TimeRegression { .. }));
    }

    #[test]
    fn validation_failure_leaves_no_partial_metrics() {
        let mut agent = agent();
        let trace = vec![
            event("+ 0.1 1 2 tcp 1000 ------- 1 1.0 3.0 0 1"),
            // Unbalanced queue counts: the run must fail.
        ];
        assert!(ReplayDriver::new(Node(1), false).run(&mut agent, &trace).is_err());
        assert!(agent.metrics().window.samples().is_empty());
        assert!(agent.metrics().timeout.samples().is_empty());
    }
}
