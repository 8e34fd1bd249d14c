//! Channel-based data source.
//!
//! Receives already tokenized records through a tokio mpsc channel. Useful
//! when embedding the engine behind another producer, and in tests.

use tokio::sync::mpsc;

use super::{DataSource, Record};

/// A data source fed by the sending half of a channel.
///
/// # Example
///
/// ```
/// use blockwatch::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("embedded");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::UnboundedReceiver<Record>,
    description: String,
    disconnected: bool,
}

impl ChannelSource {
    /// Create a new channel source.
    pub fn new(receiver: mpsc::UnboundedReceiver<Record>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            disconnected: false,
        }
    }

    /// Create a channel pair: the sender pushes records, the source hands
    /// them to the dashboard.
    pub fn create(source_description: &str) -> (mpsc::UnboundedSender<Record>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx, source_description))
    }
}

impl DataSource for ChannelSource {
    fn poll(&mut self) -> Option<Record> {
        match self.receiver.try_recv() {
            Ok(record) => Some(record),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.disconnected = true;
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.disconnected.then(|| "Channel closed".to_string())
    }
}
