use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::time::Time;

/// What happened to the packet at the traced link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// `+`: the packet entered a queue.
    Enqueue,
    /// `-`: the packet left a queue onto the wire.
    Dequeue,
    /// `r`: the packet arrived at its destination node.
    Receive,
    /// `d`: the packet was dropped.
    Drop,
}

impl EventKind {
    fn from_tag(tag: &str) -> Result<Self, ParseError> {
        match tag {
            "+" => Ok(EventKind::Enqueue),
            "-" => Ok(EventKind::Dequeue),
            "r" => Ok(EventKind::Receive),
            "d" => Ok(EventKind::Drop),
            other => Err(ParseError::EventKind(other.to_string())),
        }
    }
}

/// The traffic class of a traced packet. `cbr` and `exp` sources both show up
/// as plain UDP background traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketKind {
    Tcp,
    Ack,
    Udp,
}

impl PacketKind {
    fn from_tag(tag: &str) -> Result<Self, ParseError> {
        match tag {
            "tcp" => Ok(PacketKind::Tcp),
            "ack" => Ok(PacketKind::Ack),
            "cbr" | "exp" => Ok(PacketKind::Udp),
            other => Err(ParseError::PacketKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Node(pub u32);

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PacketSize(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PacketId(pub u64);

/// TCP byte/segment sequence counter. Parsing rejects signs and non-digits,
/// so a held value is always in domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceNumber(pub u64);

impl Add<u64> for SequenceNumber {
    type Output = SequenceNumber;

    fn add(self, rhs: u64) -> SequenceNumber {
        SequenceNumber(self.0 + rhs)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The raw ns-2 flag column (`-------` in the traces we consume).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flags(pub String);

/// A `node.port` endpoint as written in the trace's address columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub node: Node,
    pub port: Port,
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (node, port) = s
            .split_once('.')
            .ok_or_else(|| ParseError::Address(s.to_string()))?;
        Ok(Address {
            node: Node(parse_number("address node", node)?),
            port: Port(parse_number("address port", port)?),
        })
    }
}

fn parse_number<T: FromStr>(field: &'static str, text: &str) -> Result<T, ParseError> {
    text.parse::<T>().map_err(|_| ParseError::number(field, text))
}

/// One observed ns-2 trace event:
/// `event time src dst kind size flags flow src_addr dst_addr seq packet_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketEvent {
    pub kind: EventKind,
    pub time: Time,
    pub source: Node,
    pub destination: Node,
    pub packet: PacketKind,
    pub size: PacketSize,
    pub flags: Flags,
    pub flow: FlowId,
    pub source_addr: Address,
    pub destination_addr: Address,
    pub sequence_number: SequenceNumber,
    pub packet_id: PacketId,
}

impl PacketEvent {
    pub fn from_line(line: &str) -> Result<Self, ParseError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 12 {
            return Err(ParseError::FieldCount {
                expected: "12",
                got: fields.len(),
            });
        }
        Ok(PacketEvent {
            kind: EventKind::from_tag(fields[0])?,
            time: fields[1]
                .parse()
                .map_err(|_| ParseError::Time(fields[1].to_string()))?,
            source: Node(parse_number("source node", fields[2])?),
            destination: Node(parse_number("destination node", fields[3])?),
            packet: PacketKind::from_tag(fields[4])?,
            size: PacketSize(parse_number("packet size", fields[5])?),
            flags: Flags(fields[6].to_string()),
            flow: FlowId(parse_number("flow id", fields[7])?),
            source_addr: fields[8].parse()?,
            destination_addr: fields[9].parse()?,
            sequence_number: SequenceNumber(parse_number("sequence number", fields[10])?),
            packet_id: PacketId(parse_number("packet id", fields[11])?),
        })
    }

    /// The event models a transmission by `node` when it carries the node's
    /// traffic through the queue event chosen to stand for the send instant.
    pub fn sent_by(&self, node: Node, send_event: EventKind) -> bool {
        self.source == node && self.kind == send_event
    }

    pub fn received_by(&self, node: Node) -> bool {
        self.destination == node && self.kind == EventKind::Receive
    }
}
