use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::TraceError;
use crate::packet::PacketEvent;

/// An ns-2 packet trace on disk (one `PacketEvent` per line).
#[derive(Debug, Clone)]
pub struct TraceFile {
    path: PathBuf,
}

impl TraceFile {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TraceError> {
        let path = path.into();
        if !path.is_file() {
            return Err(TraceError::NotAFile { path });
        }
        Ok(TraceFile { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every event in file order. Blank lines are skipped; the first
    /// malformed line aborts the load with its line number.
    pub fn load(&self) -> Result<Vec<PacketEvent>, TraceError> {
        let file = File::open(&self.path).map_err(|source| TraceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let mut events = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| TraceError::Io {
                path: self.path.clone(),
                source,
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let event = PacketEvent::from_line(line).map_err(|source| TraceError::Parse {
                path: self.path.clone(),
                line: index + 1,
                source,
            })?;
            events.push(event);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_events_and_skips_blank_lines() {
        let path = write_temp(
            "tcp-replay-trace-load.res",
            "+ 0.1 1 2 tcp 1000 ------- 1 1.0 3.0 0 1\n\
             \n\
             r 0.2 2 1 ack 40 ------- 1 3.0 1.0 0 2\n",
        );
        let events = TraceFile::open(&path).unwrap().load().unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn reports_the_offending_line() {
        let path = write_temp(
            "tcp-replay-trace-bad.res",
            "+ 0.1 1 2 tcp 1000 ------- 1 1.0 3.0 0 1\n\
             + nonsense\n",
        );
        let err = TraceFile::open(&path).unwrap().load().unwrap_err();
        match err {
            TraceError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_rejected_up_front() {
        assert!(matches!(
            TraceFile::open("/definitely/not/here.res"),
            Err(TraceError::NotAFile { .. })
        ));
    }
}
