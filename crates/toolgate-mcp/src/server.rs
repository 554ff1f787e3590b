//! Duplex stream transport: newline-delimited JSON-RPC
//!
//! One inbound line is one message; every response is written as a single
//! line. With `max_in_flight == 1` requests are handled one at a time and
//! responses come out in request order. Larger values let requests overlap;
//! responses are then written as they complete and the caller correlates them
//! by `id`.
//!
//! Frames that are not UTF-8, or longer than `max_line_bytes`, are answered
//! with a JSON-RPC error and the session carries on.

use crate::error::McpResult;
use crate::handler::McpHandler;
use crate::protocol::{JsonRpcError, JsonRpcResponse};
use serde_json::Value;
use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use toolgate_core::Dispatcher;
use tracing::{debug, error, info, warn};

/// Capacity of the queue between request tasks and the writer.
const OUTBOUND_QUEUE_SIZE: usize = 64;

/// Default cap on a single inbound line, newline excluded.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdioConfig {
    /// Maximum number of requests processed concurrently (at least 1)
    pub max_in_flight: usize,
    /// Longest accepted line in bytes; longer lines are rejected with -32600
    pub max_line_bytes: usize,
}

impl Default for StdioConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 1,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

/// One newline-terminated unit read from the channel
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    Line(String),
    NotUtf8,
    TooLong(usize),
}

/// Read the next frame, or `None` at EOF.
///
/// Bytes past `max_len` are discarded as they arrive, so an unterminated line
/// never grows the buffer beyond the cap.
async fn read_frame<R>(reader: &mut R, max_len: usize) -> io::Result<Option<Frame>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut total = 0usize;
    let mut overflow = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            if total == 0 {
                return Ok(None);
            }
            break;
        }

        let (consumed, content, done) = match available.iter().position(|&b| b == b'\n') {
            Some(i) => (i + 1, &available[..i], true),
            None => (available.len(), available, false),
        };
        total += content.len();
        if !overflow {
            if buf.len() + content.len() > max_len {
                overflow = true;
                buf = Vec::new();
            } else {
                buf.extend_from_slice(content);
            }
        }
        reader.consume(consumed);

        if done {
            break;
        }
    }

    if overflow {
        return Ok(Some(Frame::TooLong(total)));
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(Some(match String::from_utf8(buf) {
        Ok(line) => Frame::Line(line),
        Err(_) => Frame::NotUtf8,
    }))
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer closed its side of the channel
    Eof,
    /// The shutdown future resolved
    Shutdown,
    /// The output side was closed or failed
    OutputClosed,
}

pub struct McpServer {
    handler: Arc<McpHandler>,
    config: StdioConfig,
}

impl McpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::from_handler(McpHandler::new(dispatcher))
    }

    pub fn from_handler(handler: McpHandler) -> Self {
        Self {
            handler: Arc::new(handler),
            config: StdioConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: StdioConfig) -> Self {
        self.config = StdioConfig {
            max_in_flight: config.max_in_flight.max(1),
            max_line_bytes: config.max_line_bytes.max(1),
        };
        self
    }

    pub fn handler(&self) -> &McpHandler {
        &self.handler
    }

    /// Serve on the process's stdin and stdout until EOF or `shutdown`.
    pub async fn serve_stdio<S>(&self, shutdown: S) -> McpResult<SessionEnd>
    where
        S: Future<Output = ()>,
    {
        info!(
            server = %self.handler.server_info().name,
            tools = self.handler.dispatcher().list_tools().len(),
            max_in_flight = self.config.max_in_flight,
            "Serving JSON-RPC over stdio"
        );
        self.serve(tokio::io::stdin(), tokio::io::stdout(), shutdown)
            .await
    }

    /// Serve one session over an arbitrary reader/writer pair.
    ///
    /// On EOF, requests still in flight are completed and their responses
    /// written before returning. On shutdown, in-flight tool executions are
    /// left to finish in the background but their responses are dropped.
    pub async fn serve<R, W, S>(&self, reader: R, writer: W, shutdown: S) -> McpResult<SessionEnd>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
        S: Future<Output = ()>,
    {
        let (tx, rx) = mpsc::channel::<JsonRpcResponse>(OUTBOUND_QUEUE_SIZE);
        let writer_task = tokio::spawn(write_responses(writer, rx));

        let permits = Arc::new(Semaphore::new(self.config.max_in_flight));
        let mut in_flight = JoinSet::new();
        let mut reader = BufReader::new(reader);
        let max_line_bytes = self.config.max_line_bytes;
        tokio::pin!(shutdown);

        let end = loop {
            reap(&mut in_flight);

            if tx.is_closed() {
                break SessionEnd::OutputClosed;
            }

            let permit = tokio::select! {
                _ = &mut shutdown => break SessionEnd::Shutdown,
                permit = Arc::clone(&permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break SessionEnd::OutputClosed,
                },
            };

            let line = tokio::select! {
                _ = &mut shutdown => break SessionEnd::Shutdown,
                frame = read_frame(&mut reader, max_line_bytes) => frame,
            };

            let line = match line {
                Ok(Some(Frame::Line(line))) => line,
                Ok(Some(Frame::NotUtf8)) => {
                    warn!("Discarding message that is not valid UTF-8");
                    reject(&tx, JsonRpcError::parse_error("message is not valid UTF-8")).await;
                    continue;
                }
                Ok(Some(Frame::TooLong(len))) => {
                    warn!(len, limit = max_line_bytes, "Discarding oversized message");
                    let error = JsonRpcError::invalid_request(format!(
                        "message of {len} bytes exceeds the {max_line_bytes} byte limit"
                    ));
                    reject(&tx, error).await;
                    continue;
                }
                Ok(None) => break SessionEnd::Eof,
                Err(err) => {
                    error!(error = %err, "Failed to read from transport");
                    in_flight.detach_all();
                    writer_task.abort();
                    return Err(err.into());
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            let handler = Arc::clone(&self.handler);
            let tx = tx.clone();
            in_flight.spawn(async move {
                if let Some(response) = handler.handle_line(&line).await {
                    if tx.send(response).await.is_err() {
                        debug!("Response dropped, output closed");
                    }
                }
                drop(permit);
            });
        };

        drop(tx);
        match end {
            SessionEnd::Eof => {
                while let Some(joined) = in_flight.join_next().await {
                    if let Err(err) = joined {
                        error!(error = %err, "Request task failed");
                    }
                }
                writer_task.await??;
            }
            SessionEnd::Shutdown => {
                info!(
                    in_flight = in_flight.len(),
                    "Shutdown requested, abandoning pending responses"
                );
                in_flight.detach_all();
                writer_task.abort();
            }
            SessionEnd::OutputClosed => {
                in_flight.detach_all();
                writer_task.await??;
            }
        }

        info!(end = ?end, "JSON-RPC session ended");
        Ok(end)
    }
}

/// Answer a frame that never became a request. Its id is unknown.
async fn reject(tx: &mpsc::Sender<JsonRpcResponse>, error: JsonRpcError) {
    if tx.send(JsonRpcResponse::error(Value::Null, error)).await.is_err() {
        debug!("Rejection dropped, output closed");
    }
}

fn reap(in_flight: &mut JoinSet<()>) {
    while let Some(joined) = in_flight.try_join_next() {
        if let Err(err) = joined {
            error!(error = %err, "Request task failed");
        }
    }
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::Receiver<JsonRpcResponse>) -> McpResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = match serde_json::to_vec(&response) {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, id = %response.id, "Failed to serialize response");
                continue;
            }
        };
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn frames(input: &[u8], max_len: usize) -> Vec<Frame> {
        let mut reader = BufReader::with_capacity(4, input);
        let mut frames = Vec::new();
        while let Some(frame) = read_frame(&mut reader, max_len).await.unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[tokio::test]
    async fn test_frames_split_on_newline() {
        let frames = frames(b"one\r\ntwo\nlast", 64).await;
        assert_eq!(
            frames,
            [
                Frame::Line("one".into()),
                Frame::Line("two".into()),
                Frame::Line("last".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_its_own_frame() {
        let frames = frames(b"ok\n\xff\xfe\nafter\n", 64).await;
        assert_eq!(
            frames,
            [
                Frame::Line("ok".into()),
                Frame::NotUtf8,
                Frame::Line("after".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_oversized_line_is_skipped_to_newline() {
        let frames = frames(b"0123456789abcdef\nshort\n", 8).await;
        assert_eq!(frames, [Frame::TooLong(16), Frame::Line("short".into())]);
    }
}
