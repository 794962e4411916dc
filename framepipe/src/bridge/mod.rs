//! Request/response bridge into a running engine.
//!
//! Callers submit frames through a [`RequestBridge`]; the engine reads them
//! through a [`RequestReader`] and each caller receives its own finished
//! record. Many callers may submit concurrently while the engine still
//! processes one record at a time.
//!
//! ```rust,ignore
//! let (bridge, reader) = bridge::channel(BridgeConfig::default());
//! let shutdown = reader.shutdown_handle();
//! let engine = tokio::spawn(async move {
//!     TransformEngine::new(TransformContext::new("online"), reader).run().await
//! });
//! let response = bridge.submit(frame).await?;
//! shutdown.shutdown();
//! ```

mod client;
mod reader;

pub use client::{channel, BridgeConfig, BridgeResponse, RequestBridge};
pub use reader::{RequestReader, ShutdownHandle};
