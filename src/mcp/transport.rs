//! Line-delimited transport for the MCP server.
//!
//! The stdio transport as specified by MCP:
//!
//! - Messages are UTF-8 encoded JSON-RPC
//! - Messages are delimited by newlines
//! - Messages must not contain embedded newlines
//! - stdin: receives messages from client
//! - stdout: sends messages to client
//! - stderr: may be used for logging (not MCP messages)
//!
//! Reading happens on the server loop. Writing goes through a single writer
//! task fed by a channel, so tool calls running concurrently can each send
//! their response without interleaving partial lines.

use std::io;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::mcp::protocol::{JsonRpcError, JsonRpcResponse};

/// Reads newline-delimited messages.
///
/// Bytes of an unfinished line are kept between calls, so
/// [`LineReader::read_line`] can be used as a `select!` branch.
pub struct LineReader<R> {
    reader: R,
    pending: Vec<u8>,
}

impl LineReader<BufReader<tokio::io::Stdin>> {
    /// Creates a reader over the process stdin.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    /// Wraps a buffered reader.
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            pending: Vec::new(),
        }
    }

    /// Reads the next message line.
    ///
    /// Returns `None` at end of input. Cancel safe.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the line is not UTF-8.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let bytes_read = self.reader.read_until(b'\n', &mut self.pending).await?;

        if bytes_read == 0 && self.pending.is_empty() {
            return Ok(None);
        }

        let mut line = String::from_utf8(std::mem::take(&mut self.pending))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }

        Ok(Some(line))
    }
}

/// Cloneable handle for queueing outgoing messages.
#[derive(Debug, Clone)]
pub struct MessageSink {
    tx: mpsc::UnboundedSender<String>,
}

impl MessageSink {
    /// Queues a JSON-RPC response.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails or the writer has stopped.
    pub fn write_response(&self, response: &JsonRpcResponse) -> io::Result<()> {
        self.write_message(response)
    }

    /// Queues a JSON-RPC error.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails or the writer has stopped.
    pub fn write_error(&self, error: &JsonRpcError) -> io::Result<()> {
        self.write_message(error)
    }

    fn write_message<T: Serialize>(&self, message: &T) -> io::Result<()> {
        let json = serde_json::to_string(message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        // Stdio framing: messages must not contain embedded newlines
        debug_assert!(
            !json.contains('\n'),
            "JSON message must not contain embedded newlines"
        );

        self.tx
            .send(json)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "transport writer has stopped"))
    }
}

/// Spawns the writer task.
///
/// The task ends once every [`MessageSink`] clone is dropped and the queue
/// is drained, or on the first write error.
pub fn spawn_writer<W>(mut writer: W) -> (MessageSink, JoinHandle<io::Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let handle = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        writer.shutdown().await
    });

    (MessageSink { tx }, handle)
}
