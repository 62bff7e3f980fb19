//! Message-passing substrate.
//!
//! The node speaks newline-delimited JSON on stdin/stdout under the
//! workbench harness: the first message is an `init` handshake assigning
//! this node its identity and the roster, after which every line is either
//! a fresh request (dispatched to the [`Handler`]) or a reply to an RPC
//! this node issued (matched by `in_reply_to` against the pending table).
//!
//! # Structure
//!
//! - [`MaelstromNode`]: the shared transport half. Owns the outbound
//!   writer channel, the `msg_id` counter, and the pending-RPC table. It
//!   is cheap to share behind an [`Arc`] and implements [`Transport`].
//! - [`NodeRunner`]: the serve loop half. Owns the inbound line reader and
//!   drives dispatch, one spawned task per inbound request.
//!
//! Splitting the two keeps the transport usable from request-handler tasks
//! (which need to issue their own RPCs) while the serve loop retains
//! exclusive ownership of stdin.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use linlog::node::MaelstromNode;
//! use linlog::log::{KvLogHandler, LinKv, LogConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LogConfig::from_env()?;
//!     let (node, runner) = MaelstromNode::start().await?;
//!     let kv = Arc::new(LinKv::new(node.clone(), &config));
//!     let handler = Arc::new(KvLogHandler::new(node, kv, config));
//!     runner.serve(handler).await?;
//!     Ok(())
//! }
//! ```

mod handler;

pub use handler::{dispatch, Handler};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{Body, Message, Payload};
use crate::types::NodeId;

/// Directly-addressed delivery plus synchronous request/response.
///
/// This is the seam between the log handlers and the outside world: the
/// production implementation is [`MaelstromNode`]; tests substitute an
/// in-memory router.
#[async_trait]
pub trait Transport: Send + Sync {
    /// This node's identity.
    fn node_id(&self) -> &str;

    /// The fixed, sorted roster of participating nodes, this one included.
    fn roster(&self) -> &[NodeId];

    /// Fire-and-forget delivery.
    async fn send(&self, dest: &str, payload: Payload) -> Result<()>;

    /// Issue a request and await its reply within `timeout`.
    ///
    /// Returns the reply payload as-is, including `error` bodies: the
    /// caller decides how a remote failure maps into its own domain.
    async fn rpc(&self, dest: &str, payload: Payload, timeout: Duration) -> Result<Payload>;
}

/// The transport half of a workbench node.
///
/// Created by [`MaelstromNode::start`], which consumes the `init`
/// handshake. All outbound traffic funnels through an unbounded channel to
/// a single writer task, so concurrent request tasks never interleave
/// partial lines on stdout.
pub struct MaelstromNode {
    node_id: NodeId,
    roster: Vec<NodeId>,
    next_msg_id: AtomicU64,
    pending: DashMap<u64, oneshot::Sender<Body>>,
    outbound: mpsc::UnboundedSender<Message>,
}

/// The serve-loop half of a workbench node; see [`MaelstromNode`].
pub struct NodeRunner<R> {
    lines: Lines<BufReader<R>>,
    node: Arc<MaelstromNode>,
}

impl MaelstromNode {
    /// Bind to stdin/stdout and perform the `init` handshake.
    pub async fn start() -> Result<(Arc<Self>, NodeRunner<tokio::io::Stdin>)> {
        Self::start_with_io(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Bind to arbitrary byte streams; used by tests to drive a node over
    /// an in-memory duplex pipe.
    pub async fn start_with_io<R, W>(reader: R, writer: W) -> Result<(Arc<Self>, NodeRunner<R>)>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        tokio::spawn(write_loop(writer, out_rx));

        let mut lines = BufReader::new(reader).lines();
        loop {
            let line = lines
                .next_line()
                .await
                .map_err(|e| Error::Transport(e.to_string()))?
                .ok_or_else(|| Error::Transport("input closed before init".to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let msg: Message = match serde_json::from_str(&line) {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(error = %e, "discarding unparseable pre-init line");
                    continue;
                }
            };
            match msg.body.payload {
                Payload::Init { node_id, node_ids } => {
                    // Sort so every node indexes the roster identically,
                    // independent of the order the workbench listed it.
                    let mut roster = node_ids;
                    roster.sort();

                    let node = Arc::new(MaelstromNode {
                        node_id,
                        roster,
                        next_msg_id: AtomicU64::new(1),
                        pending: DashMap::new(),
                        outbound: out_tx,
                    });
                    if let Some(init_id) = msg.body.msg_id {
                        node.reply(&msg.src, init_id, Payload::InitOk)?;
                    }
                    info!(
                        node_id = %node.node_id,
                        roster = ?node.roster,
                        "node initialized"
                    );
                    let runner = NodeRunner {
                        lines,
                        node: Arc::clone(&node),
                    };
                    return Ok((node, runner));
                }
                other => {
                    warn!(kind = other.kind(), "ignoring message before init");
                }
            }
        }
    }

    fn next_msg_id(&self) -> u64 {
        self.next_msg_id.fetch_add(1, Ordering::Relaxed)
    }

    fn enqueue(&self, msg: Message) -> Result<()> {
        self.outbound
            .send(msg)
            .map_err(|_| Error::Transport("writer task gone".to_string()))
    }

    /// Reply to an inbound request.
    pub fn reply(&self, dest: &str, in_reply_to: u64, payload: Payload) -> Result<()> {
        self.enqueue(Message {
            src: self.node_id.clone(),
            dest: dest.to_string(),
            body: Body::reply(self.next_msg_id(), in_reply_to, payload),
        })
    }

    /// Complete a pending RPC with the reply body, if anyone still waits.
    fn complete(&self, in_reply_to: u64, body: Body) {
        if let Some((_, tx)) = self.pending.remove(&in_reply_to) {
            let _ = tx.send(body);
        } else {
            // The requester timed out and abandoned the slot.
            trace!(in_reply_to, "dropping reply with no pending request");
        }
    }
}

#[async_trait]
impl Transport for MaelstromNode {
    fn node_id(&self) -> &str {
        &self.node_id
    }

    fn roster(&self) -> &[NodeId] {
        &self.roster
    }

    async fn send(&self, dest: &str, payload: Payload) -> Result<()> {
        self.enqueue(Message {
            src: self.node_id.clone(),
            dest: dest.to_string(),
            body: Body::request(self.next_msg_id(), payload),
        })
    }

    async fn rpc(&self, dest: &str, payload: Payload, timeout: Duration) -> Result<Payload> {
        let msg_id = self.next_msg_id();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(msg_id, tx);

        if let Err(e) = self.enqueue(Message {
            src: self.node_id.clone(),
            dest: dest.to_string(),
            body: Body::request(msg_id, payload),
        }) {
            self.pending.remove(&msg_id);
            return Err(e);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(body)) => Ok(body.payload),
            Ok(Err(_)) => {
                self.pending.remove(&msg_id);
                Err(Error::Transport("reply channel closed".to_string()))
            }
            Err(_) => {
                self.pending.remove(&msg_id);
                debug!(dest, msg_id, ?timeout, "rpc timed out");
                Err(Error::Timeout {
                    dest: dest.to_string(),
                    timeout,
                })
            }
        }
    }
}

impl<R> NodeRunner<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Drive the node until the input stream closes.
    ///
    /// Replies are matched against the pending-RPC table; every other
    /// message is dispatched to `handler` on its own task, and the
    /// handler's result (or error) becomes the reply.
    pub async fn serve<H: Handler + 'static>(mut self, handler: Arc<H>) -> Result<()> {
        while let Some(line) = self
            .lines
            .next_line()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?
        {
            if line.trim().is_empty() {
                continue;
            }
            let msg: Message = match serde_json::from_str(&line) {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(error = %e, "discarding unparseable message");
                    continue;
                }
            };

            let body = msg.body;
            if let Some(in_reply_to) = body.in_reply_to {
                self.node.complete(in_reply_to, body);
                continue;
            }

            let node = Arc::clone(&self.node);
            let handler = Arc::clone(&handler);
            let src = msg.src;
            tokio::spawn(async move {
                let kind = body.payload.kind();
                let reply = match dispatch(handler.as_ref(), body.payload).await {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(kind, src = %src, error = %e, "request failed");
                        Payload::Error {
                            code: e.code() as i64,
                            text: e.to_string(),
                        }
                    }
                };
                if let Some(msg_id) = body.msg_id {
                    if let Err(e) = node.reply(&src, msg_id, reply) {
                        error!(error = %e, "failed to enqueue reply");
                    }
                }
            });
        }
        info!("input closed, shutting down");
        Ok(())
    }
}

async fn write_loop<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Message>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(msg) = rx.recv().await {
        let mut line = match serde_json::to_string(&msg) {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "failed to serialize outbound message");
                continue;
            }
        };
        line.push('\n');
        if writer.write_all(line.as_bytes()).await.is_err() || writer.flush().await.is_err() {
            error!("output stream closed, writer task exiting");
            return;
        }
    }
}
