//! Capability server integration
//!
//! Discovers the tools a local capability server exposes and dispatches
//! agent-requested tool calls to its invoke endpoint.

use thiserror::Error;

pub mod client;
pub mod dispatch;
pub mod index;

pub use client::{CapabilityClient, InvokeReply};
pub use dispatch::{CallDefaults, ToolDispatcher, INVOKE_FAILURE_TEXT};
pub use index::{callable_name, CapabilityTool, ToolIndex, ToolParam};

/// Errors talking to the capability server
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("capability server error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, CapabilityError>;
