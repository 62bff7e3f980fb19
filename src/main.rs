//! Log node binary.
//!
//! Reads the workbench handshake from stdin, wires the handler stack to
//! the `lin-kv` service, and serves until stdin closes. All diagnostics go
//! to stderr; stdout carries the wire protocol.

use std::sync::Arc;

use tracing::info;

use linlog::log::{KvLogHandler, LinKv, LogConfig};
use linlog::node::MaelstromNode;
use linlog::telemetry::{init_logging, LogFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_logging(LogFormat::from_env())?;

    let config = LogConfig::from_env()?;
    let (node, runner) = MaelstromNode::start().await?;
    info!(kv_service = %config.kv_service, "starting log node");

    let kv = Arc::new(LinKv::new(node.clone(), &config));
    let handler = Arc::new(KvLogHandler::new(node, kv, config));
    runner.serve(handler).await?;
    Ok(())
}
