//! Stream-based data source.
//!
//! Reads newline-delimited event lines from an async byte stream, such as a
//! TCP connection or a child process's stdout.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{parse_line, DataSource, Record};

/// Last error seen by a background reader task.
pub(crate) type ErrorSlot = Arc<Mutex<Option<String>>>;

/// A data source that tokenizes lines from an async stream.
///
/// A background task reads the stream and forwards records; `poll()` picks
/// them up without blocking. Lines that fail to tokenize are skipped and
/// recorded as the source's last error.
///
/// # Example with a byte stream
///
/// ```
/// use std::io::Cursor;
/// use blockwatch::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = b"exists resource name:r0 role:Primary\n";
/// let stream = Cursor::new(data.to_vec());
/// let source = StreamSource::spawn(stream, "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<Record>,
    description: String,
    last_error: ErrorSlot,
}

impl StreamSource {
    /// Spawn a background task that reads from the given async reader.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1024);
        let last_error: ErrorSlot = Arc::new(Mutex::new(None));

        tokio::spawn(read_lines(reader, tx, last_error.clone()));

        Self::from_parts(rx, format!("stream: {}", description), last_error)
    }

    pub(crate) fn from_parts(
        receiver: mpsc::Receiver<Record>,
        description: String,
        last_error: ErrorSlot,
    ) -> Self {
        Self {
            receiver,
            description,
            last_error,
        }
    }
}

/// Read lines until EOF, forwarding every record that tokenizes.
pub(crate) async fn read_lines<R>(reader: R, tx: mpsc::Sender<Record>, last_error: ErrorSlot)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("Event stream reached EOF");
                *last_error.lock() = Some("Connection closed".to_string());
                break;
            }
            Ok(_) => match parse_line(&line) {
                Ok(Some(record)) => {
                    if tx.send(record).await.is_err() {
                        // Receiver dropped
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(error = %e, line = line.trim_end(), "Skipping event line");
                    *last_error.lock() = Some(format!("Parse error: {}", e));
                }
            },
            Err(e) => {
                warn!(error = %e, "Event stream read failed");
                *last_error.lock() = Some(format!("Read error: {}", e));
                break;
            }
        }
    }
}

impl DataSource for StreamSource {
    fn poll(&mut self) -> Option<Record> {
        match self.receiver.try_recv() {
            Ok(record) => Some(record),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                let mut slot = self.last_error.lock();
                if slot.is_none() {
                    *slot = Some("Stream disconnected".to_string());
                }
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}
