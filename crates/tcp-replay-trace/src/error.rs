use std::path::PathBuf;

use thiserror::Error;

use crate::time::Time;

/// A single malformed field or line in any of the supported trace formats.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {expected} fields, got {got}")]
    FieldCount { expected: &'static str, got: usize },
    #[error("invalid event kind `{0}`")]
    EventKind(String),
    #[error("invalid packet kind `{0}`")]
    PacketKind(String),
    #[error("invalid {field} `{text}`")]
    Number { field: &'static str, text: String },
    #[error("invalid time `{0}`")]
    Time(String),
    #[error("invalid address `{0}`, expected `node.port`")]
    Address(String),
}

impl ParseError {
    pub(crate) fn number(field: &'static str, text: &str) -> Self {
        ParseError::Number {
            field,
            text: text.to_string(),
        }
    }
}

/// Failure to read or parse a trace file, carrying the offending location.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("{path}: not a file")]
    NotAFile { path: PathBuf },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: ParseError,
    },
}

/// An RTT sampling interval whose begin lies after its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("interval begins at {begin} after it ends at {end}")]
pub struct InvalidInterval {
    pub begin: Time,
    pub end: Time,
}

/// A requested TCP implementation name outside the closed variant set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown TCP implementation `{0}`, expected rfc793-basic, rfc793-slow-start or reno")]
pub struct UnknownAlgorithm(pub String);
