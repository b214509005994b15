//! Line framing over a byte stream.
//!
//! - [`FrameReader`] splits the inbound stream on `\n`. It keeps its partial
//!   line in `self`, so `read_frame` is cancel-safe and can sit in a
//!   `tokio::select!` next to the shutdown token. Lines longer than the
//!   frame limit are skipped up to the next newline and reported as
//!   [`Frame::Oversized`].
//! - [`write_frames`] is the single writer: it drains the response channel,
//!   writes one JSON object per line, and shuts the stream down once every
//!   sender is gone.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::error::TransportError;
use super::protocol::JsonRpcResponse;

/// Default upper bound on a single inbound line.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// One line, without its terminator
    Line(Vec<u8>),
    /// A line that exceeded the limit and was discarded
    Oversized { len: usize },
}

pub struct FrameReader<R> {
    inner: BufReader<R>,
    state: LineState,
}

struct LineState {
    buf: Vec<u8>,
    max_frame_bytes: usize,
    /// Bytes skipped so far in an oversized line, if in one
    discarding: Option<usize>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: BufReader<R>, max_frame_bytes: usize) -> Self {
        Self {
            inner,
            state: LineState {
                buf: Vec::new(),
                max_frame_bytes,
                discarding: None,
            },
        }
    }

    /// Next frame, or `None` at end of stream.
    pub async fn read_frame(&mut self) -> std::io::Result<Option<Frame>> {
        loop {
            let available = self.inner.fill_buf().await?;
            if available.is_empty() {
                return Ok(self.state.finish());
            }

            let (consumed, frame) = self.state.scan(available);
            self.inner.consume(consumed);
            if frame.is_some() {
                return Ok(frame);
            }
        }
    }

    /// Next complete line already sitting in the read buffer, without
    /// touching the underlying stream.
    pub fn take_buffered(&mut self) -> Option<Frame> {
        loop {
            let available = self.inner.buffer();
            let newline = available.iter().position(|&b| b == b'\n')?;
            let (consumed, frame) = self.state.scan(&available[..=newline]);
            self.inner.consume(consumed);
            if frame.is_some() {
                return frame;
            }
        }
    }
}

impl LineState {
    /// Absorb `available`; returns bytes consumed and a frame if one ended.
    fn scan(&mut self, available: &[u8]) -> (usize, Option<Frame>) {
        match available.iter().position(|&b| b == b'\n') {
            Some(newline) => {
                let chunk = &available[..newline];
                let frame = match self.discarding.take() {
                    Some(skipped) => Frame::Oversized {
                        len: skipped + chunk.len(),
                    },
                    None if self.buf.len() + chunk.len() > self.max_frame_bytes => {
                        let len = self.buf.len() + chunk.len();
                        self.buf.clear();
                        Frame::Oversized { len }
                    }
                    None => {
                        self.buf.extend_from_slice(chunk);
                        Frame::Line(self.take_line())
                    }
                };
                (newline + 1, Some(frame))
            }
            None => {
                match self.discarding.as_mut() {
                    Some(skipped) => *skipped += available.len(),
                    None => {
                        self.buf.extend_from_slice(available);
                        if self.buf.len() > self.max_frame_bytes {
                            debug!(bytes = self.buf.len(), "Frame exceeds limit, discarding to newline");
                            self.discarding = Some(self.buf.len());
                            self.buf.clear();
                        }
                    }
                }
                (available.len(), None)
            }
        }
    }

    fn take_line(&mut self) -> Vec<u8> {
        let mut line = std::mem::take(&mut self.buf);
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        line
    }

    /// Flush whatever is pending at end of stream.
    fn finish(&mut self) -> Option<Frame> {
        if let Some(skipped) = self.discarding.take() {
            return Some(Frame::Oversized { len: skipped });
        }
        if self.buf.is_empty() {
            None
        } else {
            Some(Frame::Line(self.take_line()))
        }
    }
}

/// Single writer task body.
pub async fn write_frames<W>(
    mut writer: W,
    mut responses: mpsc::Receiver<JsonRpcResponse>,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = responses.recv().await {
        let mut line = serde_json::to_vec(&response)?;
        trace!("Sending: {}", String::from_utf8_lossy(&line));
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    writer.shutdown().await?;
    debug!("Response writer closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonrpc::protocol::RequestId;
    use serde_json::json;
    use tokio::io::AsyncReadExt;

    fn reader(input: &'static [u8], max: usize) -> FrameReader<&'static [u8]> {
        FrameReader::new(BufReader::new(input), max)
    }

    #[tokio::test]
    async fn test_splits_lines() {
        let mut frames = reader(b"one\ntwo\r\nthree", 64);
        assert_eq!(frames.read_frame().await.unwrap(), Some(Frame::Line(b"one".to_vec())));
        assert_eq!(frames.read_frame().await.unwrap(), Some(Frame::Line(b"two".to_vec())));
        assert_eq!(frames.read_frame().await.unwrap(), Some(Frame::Line(b"three".to_vec())));
        assert_eq!(frames.read_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_oversized_line_resyncs() {
        let mut frames = reader(b"0123456789abcdef\nok\n", 8);
        assert_eq!(
            frames.read_frame().await.unwrap(),
            Some(Frame::Oversized { len: 16 })
        );
        assert_eq!(frames.read_frame().await.unwrap(), Some(Frame::Line(b"ok".to_vec())));
    }

    #[tokio::test]
    async fn test_oversized_across_reads() {
        let input: &'static [u8] = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\nnext\n";
        let mut frames = FrameReader::new(BufReader::with_capacity(4, input), 10);
        assert_eq!(
            frames.read_frame().await.unwrap(),
            Some(Frame::Oversized { len: 40 })
        );
        assert_eq!(frames.read_frame().await.unwrap(), Some(Frame::Line(b"next".to_vec())));
        assert_eq!(frames.read_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_take_buffered_does_not_read() {
        let mut frames = reader(b"first\nsecond\nthird", 64);
        assert_eq!(frames.read_frame().await.unwrap(), Some(Frame::Line(b"first".to_vec())));
        assert_eq!(frames.take_buffered(), Some(Frame::Line(b"second".to_vec())));
        // unterminated tail is not a complete frame
        assert_eq!(frames.take_buffered(), None);
    }

    #[tokio::test]
    async fn test_writer_frames_and_closes() {
        let (client, server) = tokio::io::duplex(1024);
        let (tx, rx) = mpsc::channel(4);
        let writer = tokio::spawn(write_frames(server, rx));

        tx.send(JsonRpcResponse::success(RequestId::from(1), json!({})))
            .await
            .unwrap();
        tx.send(JsonRpcResponse::success(RequestId::from(2), json!({})))
            .await
            .unwrap();
        drop(tx);
        writer.await.unwrap().unwrap();

        let mut output = String::new();
        let mut client = client;
        client.read_to_string(&mut output).await.unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"id\":1"));
        assert!(output.ends_with('\n'));
    }
}
