//! Child-process data source.
//!
//! Runs the storage subsystem's event command and streams its stdout. The
//! live stream only reports state changes, so statistics counters go quiet
//! while nothing changes; a second "dump everything now" command is re-run on
//! an interval to keep rates flowing.

use std::io;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::stream::{read_lines, ErrorSlot, StreamSource};
use super::{parse_line, DataSource, Record};

/// A data source backed by a long-running child process.
///
/// Must be created from within a tokio runtime. The child is killed and the
/// poller stopped when the source is dropped.
#[derive(Debug)]
pub struct CommandSource {
    inner: StreamSource,
    tasks: Vec<JoinHandle<()>>,
}

impl CommandSource {
    /// Spawn `command` and, if given, re-run `poll_command` every `interval`.
    ///
    /// Commands are split on whitespace; no shell is involved.
    pub fn spawn(command: &str, poll_command: Option<&str>, interval: Duration) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel(1024);
        let last_error: ErrorSlot = Arc::new(Mutex::new(None));

        let mut child = build(command)?
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("child stdout not captured"))?;
        info!(command, "Spawned event command");

        let mut tasks = Vec::new();

        let stream_tx = tx.clone();
        let stream_error = last_error.clone();
        tasks.push(tokio::spawn(async move {
            read_lines(stdout, stream_tx, stream_error.clone()).await;
            match child.wait().await {
                Ok(status) => {
                    warn!(%status, "Event command exited");
                    *stream_error.lock() = Some(format!("Command exited: {}", status));
                }
                Err(e) => *stream_error.lock() = Some(format!("Command failed: {}", e)),
            }
        }));

        if let Some(poll_command) = poll_command {
            build(poll_command)?;
            tasks.push(tokio::spawn(poll_loop(
                poll_command.to_string(),
                interval,
                tx,
                last_error.clone(),
            )));
        }

        Ok(Self {
            inner: StreamSource::from_parts(rx, format!("command: {}", command), last_error),
            tasks,
        })
    }
}

fn build(command: &str) -> io::Result<Command> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;
    let mut cmd = Command::new(program);
    cmd.args(parts);
    Ok(cmd)
}

async fn poll_loop(
    command: String,
    interval: Duration,
    tx: mpsc::Sender<Record>,
    last_error: ErrorSlot,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;

        let output = match build(&command) {
            Ok(mut cmd) => cmd.stderr(Stdio::null()).output().await,
            Err(e) => Err(e),
        };
        let output = match output {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, command, "Statistics poll failed");
                *last_error.lock() = Some(format!("Poll failed: {}", e));
                continue;
            }
        };

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            match parse_line(line) {
                Ok(Some(record)) => {
                    if tx.send(record).await.is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => debug!(error = %e, line, "Skipping polled line"),
            }
        }
    }
}

impl Drop for CommandSource {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl DataSource for CommandSource {
    fn poll(&mut self) -> Option<Record> {
        self.inner.poll()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn error(&self) -> Option<String> {
        self.inner.error()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::data::Target;

    #[tokio::test]
    async fn test_command_source_streams_stdout() {
        let mut source = CommandSource::spawn(
            "echo exists resource name:r0 role:Primary",
            None,
            Duration::from_secs(1),
        )
        .unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;

        let record = source.poll().unwrap();
        assert_eq!(record.event.target(), &Target::Resource);
        assert_eq!(record.event.fields()["role"], "Primary");
        assert_eq!(
            source.description(),
            "command: echo exists resource name:r0 role:Primary"
        );
    }

    #[tokio::test]
    async fn test_command_source_runs_poll_command() {
        let mut source = CommandSource::spawn(
            "sleep 5",
            Some("echo exists device name:r0 volume:0 read:10"),
            Duration::from_millis(50),
        )
        .unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;

        let mut polled = 0;
        while let Some(record) = source.poll() {
            assert_eq!(record.event.target(), &Target::Device);
            polled += 1;
        }
        assert!(polled >= 2);
    }

    #[tokio::test]
    async fn test_command_source_reports_exit() {
        let mut source = CommandSource::spawn("true", None, Duration::from_secs(1)).unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("exited"));
    }

    #[tokio::test]
    async fn test_command_source_rejects_empty_command() {
        assert!(CommandSource::spawn("  ", None, Duration::from_secs(1)).is_err());
    }
}
