//! File-based data source.
//!
//! Tails a captured event log, e.g. the output of
//! `drbdsetup events2 --timestamps --statistics > events.log`.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{parse_line, DataSource, Record};

/// A data source that reads newly appended lines from a file.
///
/// The source remembers how far it has read. Each poll that finds its
/// buffer empty reads every complete line appended since; a trailing partial
/// line is left for the next read. If the file shrinks (rotated or
/// truncated) reading restarts from the beginning.
///
/// A source made with [`FileSource::replay`] reads a finished log instead, so
/// a last line without a newline is taken as complete.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    offset: u64,
    pending: VecDeque<Record>,
    finished: bool,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            offset: 0,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Create a source for a log that is no longer being written.
    pub fn replay<P: AsRef<Path>>(path: P) -> Self {
        Self {
            finished: true,
            ..Self::new(path)
        }
    }

    /// Returns the path being monitored.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset up to which the file has been consumed.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read complete lines appended since the last read.
    fn read_appended(&mut self) -> std::io::Result<()> {
        let mut file = File::open(&self.path)?;
        let len = file.metadata()?.len();
        if len < self.offset {
            debug!(path = %self.path.display(), "Event log shrank, reading from start");
            self.offset = 0;
        }
        if len == self.offset {
            return Ok(());
        }

        file.seek(SeekFrom::Start(self.offset))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let end = if self.finished {
            buf.len()
        } else {
            match buf.iter().rposition(|&b| b == b'\n') {
                Some(newline) => newline + 1,
                None => return Ok(()),
            }
        };
        let complete = &buf[..end];
        self.offset += complete.len() as u64;

        for line in String::from_utf8_lossy(complete).lines() {
            match parse_line(line) {
                Ok(Some(record)) => self.pending.push_back(record),
                Ok(None) => {}
                Err(e) => {
                    debug!(error = %e, line, "Skipping event line");
                    self.last_error = Some(format!("Parse error: {}", e));
                }
            }
        }
        Ok(())
    }
}

impl DataSource for FileSource {
    fn poll(&mut self) -> Option<Record> {
        if self.pending.is_empty() {
            match self.read_appended() {
                Ok(()) => {}
                Err(e) => self.last_error = Some(format!("Read error: {}", e)),
            }
        }
        self.pending.pop_front()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn drain(source: &mut FileSource) -> Vec<Record> {
        std::iter::from_fn(|| source.poll()).collect()
    }

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/events.log");
        assert_eq!(source.path(), Path::new("/tmp/events.log"));
        assert_eq!(source.description(), "file: /tmp/events.log");
        assert!(source.error().is_none());
    }

    #[test]
    fn test_file_source_reads_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "exists resource name:r0 role:Primary").unwrap();
        writeln!(file, "exists device name:r0 volume:0 disk:UpToDate").unwrap();
        writeln!(file, "exists -").unwrap();

        let mut source = FileSource::new(file.path());
        let records = drain(&mut source);
        assert_eq!(records.len(), 2);

        // Nothing new appended
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_file_source_tails_appended_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "exists resource name:r0 role:Primary").unwrap();

        let mut source = FileSource::new(file.path());
        assert_eq!(drain(&mut source).len(), 1);

        writeln!(file, "change resource name:r0 role:Secondary").unwrap();
        file.flush().unwrap();

        let records = drain(&mut source);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event.fields()["role"], "Secondary");
    }

    #[test]
    fn test_file_source_waits_for_complete_line() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "change resource name:r0 ro").unwrap();
        file.flush().unwrap();

        let mut source = FileSource::new(file.path());
        assert!(source.poll().is_none());
        assert_eq!(source.offset(), 0);

        writeln!(file, "le:Primary").unwrap();
        file.flush().unwrap();

        let record = source.poll().unwrap();
        assert_eq!(record.event.fields()["role"], "Primary");
    }

    #[test]
    fn test_replay_takes_unterminated_last_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "exists resource name:r0 role:Secondary").unwrap();
        write!(file, "change resource name:r0 role:Primary").unwrap();
        file.flush().unwrap();

        let mut tail = FileSource::new(file.path());
        assert_eq!(drain(&mut tail).len(), 1);

        let mut replay = FileSource::replay(file.path());
        let records = drain(&mut replay);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].event.fields()["role"], "Primary");
        assert_eq!(replay.offset(), std::fs::metadata(file.path()).unwrap().len());
    }

    #[test]
    fn test_file_source_restarts_after_truncation() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "exists resource name:r0 role:Primary suspended:no").unwrap();

        let mut source = FileSource::new(file.path());
        assert_eq!(drain(&mut source).len(), 1);

        file.as_file().set_len(0).unwrap();
        let mut fresh = std::fs::OpenOptions::new()
            .write(true)
            .open(file.path())
            .unwrap();
        writeln!(fresh, "exists resource name:r9").unwrap();

        let records = drain(&mut source);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event.fields()["name"], "r9");
    }

    #[test]
    fn test_file_source_missing_file() {
        let mut source = FileSource::new("/nonexistent/path/events.log");

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Read error"));
    }

    #[test]
    fn test_file_source_skips_bad_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not an event").unwrap();
        writeln!(file, "exists resource name:r0").unwrap();

        let mut source = FileSource::new(file.path());
        assert_eq!(drain(&mut source).len(), 1);
        assert!(source.error().unwrap().contains("Parse error"));
    }
}
