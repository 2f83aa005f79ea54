//! Transport abstractions for the bridge
//!
//! The transport is a fire-and-forget string channel (postMessage style).
//! Outbound strings go through the synchronous [`Transport`] trait; inbound
//! strings arrive through an [`AsyncReader`].

use async_trait::async_trait;
use quill_bridge_core::{BridgeError, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Outbound half of the transport
pub trait Transport {
    /// Hand one message to the platform. Does not wait for delivery.
    fn post_message(&mut self, message: &str) -> Result<()>;
}

/// Inbound half of the transport
#[async_trait]
pub trait AsyncReader: Send {
    /// Next incoming string, or `None` once the transport is closed
    async fn read_message(&mut self) -> Result<Option<String>>;
}

/// Transport backed by an unbounded channel
pub struct ChannelTransport(pub mpsc::UnboundedSender<String>);

impl Transport for ChannelTransport {
    fn post_message(&mut self, message: &str) -> Result<()> {
        self.0
            .send(message.to_string())
            .map_err(|_| BridgeError::Transport("Host channel closed".into()))
    }
}

/// Reader backed by an unbounded channel
pub struct ChannelReader(pub mpsc::UnboundedReceiver<String>);

#[async_trait]
impl AsyncReader for ChannelReader {
    async fn read_message(&mut self) -> Result<Option<String>> {
        Ok(self.0.recv().await)
    }
}

/// Reader yielding one message per line of a buffered stream.
///
/// Lines that are not valid UTF-8 are logged and skipped, as are blank lines.
pub struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> AsyncReader for LineReader<R> {
    async fn read_message(&mut self) -> Result<Option<String>> {
        loop {
            self.buf.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut self.buf)
                .await
                .map_err(|e| BridgeError::Transport(format!("Read failed: {}", e)))?;
            if read == 0 {
                return Ok(None);
            }

            let mut bytes = self.buf.as_slice();
            if let Some(stripped) = bytes.strip_suffix(b"\n") {
                bytes = stripped;
            }
            if let Some(stripped) = bytes.strip_suffix(b"\r") {
                bytes = stripped;
            }

            match std::str::from_utf8(bytes) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => return Ok(Some(line.to_string())),
                Err(e) => {
                    warn!("Dropping input line that is not valid UTF-8: {}", e);
                    continue;
                }
            }
        }
    }
}

/// Writes every message from `rx` as one line to `out`, flushing after each.
///
/// Ends when all senders are dropped.
pub async fn writer_task<W: AsyncWrite + Unpin>(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut out: W,
) -> Result<()> {
    while let Some(message) = rx.recv().await {
        out.write_all(message.as_bytes())
            .await
            .map_err(|e| BridgeError::Transport(format!("Write failed: {}", e)))?;
        out.write_all(b"\n")
            .await
            .map_err(|e| BridgeError::Transport(format!("Write newline failed: {}", e)))?;
        out.flush()
            .await
            .map_err(|e| BridgeError::Transport(format!("Flush failed: {}", e)))?;
    }
    debug!("Outbound channel closed, writer task exiting");
    Ok(())
}

/// Transport that keeps every message it is handed.
///
/// Can be switched to refuse messages to exercise send failures.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: Vec<String>,
    pub fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sent messages parsed back into JSON
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent
            .iter()
            .filter_map(|s| serde_json::from_str(s).ok())
            .collect()
    }

    /// `type` field of every sent message, in send order
    pub fn sent_types(&self) -> Vec<String> {
        self.sent_json()
            .iter()
            .filter_map(|v| v["type"].as_str().map(str::to_string))
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn post_message(&mut self, message: &str) -> Result<()> {
        if self.fail {
            return Err(BridgeError::Transport("postMessage unavailable".into()));
        }
        self.sent.push(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_line_reader_skips_blank_lines() {
        let input: &[u8] = b"first\n\n   \nsecond\n";
        let mut reader = LineReader::new(BufReader::new(input));

        assert_eq!(reader.read_message().await.unwrap().as_deref(), Some("first"));
        assert_eq!(reader.read_message().await.unwrap().as_deref(), Some("second"));
        assert_eq!(reader.read_message().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_line_reader_skips_invalid_utf8() {
        let input: &[u8] = b"\xff\xfe\n{\"type\":\"LOAD_EDITOR\"}\r\nlast";
        let mut reader = LineReader::new(BufReader::new(input));

        assert_eq!(
            reader.read_message().await.unwrap().as_deref(),
            Some(r#"{"type":"LOAD_EDITOR"}"#)
        );
        assert_eq!(reader.read_message().await.unwrap().as_deref(), Some("last"));
        assert_eq!(reader.read_message().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_writer_task_writes_lines() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut transport = ChannelTransport(tx);
        transport.post_message("one").unwrap();
        transport.post_message("two").unwrap();
        drop(transport);

        let mut out = Vec::new();
        assert_ok!(writer_task(rx, &mut out).await);
        assert_eq!(out, b"one\ntwo\n");
    }

    #[test]
    fn test_channel_transport_closed() {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        drop(rx);
        let mut transport = ChannelTransport(tx);

        match transport.post_message("lost") {
            Err(BridgeError::Transport(_)) => {}
            other => panic!("Expected transport error, got {:?}", other),
        }
    }

    #[test]
    fn test_recording_transport_failure() {
        let mut transport = RecordingTransport {
            fail: true,
            ..Default::default()
        };
        assert_err!(transport.post_message("x"));
        assert!(transport.sent.is_empty());
    }
}
