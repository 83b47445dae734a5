//! Streamed chat delivery.
//!
//! A worker thread pushes frames into an unbounded channel; the transport
//! drains them through [`ChatStream`]. Exactly one terminal frame (`done` or
//! `error`) ends every stream and nothing follows it.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde::Serialize;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::engine::{ChatMetrics, ChatResponse, TokenUsage};
use crate::errors::CoordinatorError;

/// Code reported when a worker goes away without producing a terminal frame.
const WORKER_ABORTED_CODE: &str = "APP-UPSTREAM-001";

// ─── Frames ──────────────────────────────────────────────────────────────────

/// One event on a chat stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    Token {
        content: String,
    },
    Done {
        text: String,
        usage: TokenUsage,
        metrics: ChatMetrics,
    },
    Error {
        code: String,
        message: String,
    },
}

impl StreamFrame {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamFrame::Token { .. })
    }

    fn from_error(err: &CoordinatorError) -> Self {
        StreamFrame::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<ChatResponse> for StreamFrame {
    fn from(response: ChatResponse) -> Self {
        StreamFrame::Done {
            text: response.text,
            usage: response.usage,
            metrics: response.metrics,
        }
    }
}

// ─── Producer ────────────────────────────────────────────────────────────────

/// Worker-side end of a stream.
///
/// `done` and `fail` consume the sender, so a second terminal frame cannot be
/// written. Dropping it unfinished (worker panic, early return) emits an
/// error frame on the worker's behalf.
pub(crate) struct FrameSender {
    tx: UnboundedSender<StreamFrame>,
    finished: bool,
    tokens_sent: usize,
}

impl FrameSender {
    pub(crate) fn new(tx: UnboundedSender<StreamFrame>) -> Self {
        Self {
            tx,
            finished: false,
            tokens_sent: 0,
        }
    }

    /// Send one token. A closed receiver is ignored: the worker keeps going
    /// so the engine finishes its turn.
    pub(crate) fn token(&mut self, content: &str) {
        self.tokens_sent += 1;
        let _ = self.tx.send(StreamFrame::Token {
            content: content.to_string(),
        });
    }

    pub(crate) fn tokens_sent(&self) -> usize {
        self.tokens_sent
    }

    pub(crate) fn done(mut self, response: ChatResponse) {
        self.finished = true;
        let _ = self.tx.send(StreamFrame::from(response));
    }

    pub(crate) fn fail(mut self, err: &CoordinatorError) {
        self.finished = true;
        let _ = self.tx.send(StreamFrame::from_error(err));
    }
}

impl Drop for FrameSender {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.tx.send(StreamFrame::Error {
                code: WORKER_ABORTED_CODE.to_string(),
                message: "stream worker exited before completing".to_string(),
            });
        }
    }
}

// ─── Consumer ────────────────────────────────────────────────────────────────

/// Transport-side end of a stream.
///
/// Usable as a `futures::Stream` from async code, or through
/// [`ChatStream::blocking_next`] from a plain thread. Yields `None` after the
/// terminal frame.
pub struct ChatStream {
    model_id: String,
    rx: UnboundedReceiver<StreamFrame>,
    finished: bool,
}

impl ChatStream {
    pub(crate) fn new(model_id: String, rx: UnboundedReceiver<StreamFrame>) -> Self {
        Self {
            model_id,
            rx,
            finished: false,
        }
    }

    /// Model that was active when the stream was requested.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    fn observe(&mut self, frame: Option<StreamFrame>) -> Option<StreamFrame> {
        match frame {
            Some(frame) => {
                if frame.is_terminal() {
                    self.finished = true;
                    self.rx.close();
                }
                Some(frame)
            }
            None => {
                self.finished = true;
                None
            }
        }
    }

    /// Wait for the next frame on the current thread.
    ///
    /// Must not be called from inside an async runtime.
    pub fn blocking_next(&mut self) -> Option<StreamFrame> {
        if self.finished {
            return None;
        }
        let frame = self.rx.blocking_recv();
        self.observe(frame)
    }

    /// Wait for the next frame.
    pub async fn next_frame(&mut self) -> Option<StreamFrame> {
        if self.finished {
            return None;
        }
        let frame = self.rx.recv().await;
        self.observe(frame)
    }

    /// Drain every remaining frame on the current thread.
    pub fn collect_blocking(mut self) -> Vec<StreamFrame> {
        let mut frames = Vec::new();
        while let Some(frame) = self.blocking_next() {
            frames.push(frame);
        }
        frames
    }
}

impl Stream for ChatStream {
    type Item = StreamFrame;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        match this.rx.poll_recv(cx) {
            Poll::Ready(frame) => Poll::Ready(this.observe(frame)),
            Poll::Pending => Poll::Pending,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
