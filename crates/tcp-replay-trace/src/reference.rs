//! Readers for the metric traces the simulator itself records, used to put
//! ground truth next to the replayed series in the final report.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{ParseError, TraceError};
use crate::time::Time;

/// One line of the simulator's rto trace: `time rto [rtt srtt rttvar]`.
/// Older captures carry only the first two columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RtoRecord {
    pub time: Time,
    pub rto: Time,
    pub rtt: Option<Time>,
    pub srtt: Option<Time>,
    pub rttvar: Option<Time>,
}

impl RtoRecord {
    fn from_line(line: &str) -> Result<Self, ParseError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let time_field =
            |text: &str| text.parse::<Time>().map_err(|_| ParseError::Time(text.to_string()));
        match fields.as_slice() {
            [time, rto] => Ok(RtoRecord {
                time: time_field(time)?,
                rto: time_field(rto)?,
                rtt: None,
                srtt: None,
                rttvar: None,
            }),
            [time, rto, rtt, srtt, rttvar] => Ok(RtoRecord {
                time: time_field(time)?,
                rto: time_field(rto)?,
                rtt: Some(time_field(rtt)?),
                srtt: Some(time_field(srtt)?),
                rttvar: Some(time_field(rttvar)?),
            }),
            other => Err(ParseError::FieldCount {
                expected: "2 or 5",
                got: other.len(),
            }),
        }
    }
}

/// One line of the simulator's congestion-window trace: `time cwnd cwmax`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CwndRecord {
    pub time: Time,
    pub cwnd: Decimal,
    pub cwnd_max: Decimal,
}

impl CwndRecord {
    fn from_line(line: &str) -> Result<Self, ParseError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [time, cwnd, cwnd_max] = fields.as_slice() else {
            return Err(ParseError::FieldCount {
                expected: "3",
                got: fields.len(),
            });
        };
        Ok(CwndRecord {
            time: time
                .parse()
                .map_err(|_| ParseError::Time((*time).to_string()))?,
            cwnd: cwnd
                .parse()
                .map_err(|_| ParseError::number("cwnd", cwnd))?,
            cwnd_max: cwnd_max
                .parse()
                .map_err(|_| ParseError::number("cwnd max", cwnd_max))?,
        })
    }
}

pub fn load_rto_reference(path: impl Into<PathBuf>) -> Result<Vec<RtoRecord>, TraceError> {
    load_lines(path.into(), RtoRecord::from_line)
}

pub fn load_cwnd_reference(path: impl Into<PathBuf>) -> Result<Vec<CwndRecord>, TraceError> {
    load_lines(path.into(), CwndRecord::from_line)
}

fn load_lines<T>(
    path: PathBuf,
    parse: impl Fn(&str) -> Result<T, ParseError>,
) -> Result<Vec<T>, TraceError> {
    let io_err = |path: &Path, source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(&path).map_err(|e| io_err(&path, e))?;
    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| io_err(&path, e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = parse(line).map_err(|source| TraceError::Parse {
            path: path.clone(),
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rto_record_accepts_both_layouts() {
        let short = RtoRecord::from_line("1.5 3.0").unwrap();
        assert_eq!(short.rto, "3.0".parse().unwrap());
        assert_eq!(short.rtt, None);

        let full = RtoRecord::from_line("1.5 0.42 0.14 0.14 0.07").unwrap();
        assert_eq!(full.srtt, Some("0.14".parse().unwrap()));

        assert!(matches!(
            RtoRecord::from_line("1.5 3.0 0.1"),
            Err(ParseError::FieldCount { got: 3, .. })
        ));
    }

    #[test]
    fn cwnd_record_needs_three_columns() {
        let record = CwndRecord::from_line("1.5 2.5 20").unwrap();
        assert_eq!(record.cwnd, "2.5".parse().unwrap());
        assert!(CwndRecord::from_line("1.5 2.5").is_err());
        assert!(CwndRecord::from_line("1.5 two 20").is_err());
    }
}
