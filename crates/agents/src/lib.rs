//! Conversational-agent back-end client
//!
//! Typed operations against an assistants-style REST API: knowledge stores,
//! file uploads, agents, threads, runs, and messages. The `AgentsApi` trait
//! is the seam the orchestrator talks through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

pub mod assistants;

pub use assistants::AssistantsClient;

/// Errors talking to the back end
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Api(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BackendError>;

/// A server-side knowledge store holding uploaded documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStore {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_at: i64,
}

/// An uploaded file
#[derive(Debug, Clone, Deserialize)]
pub struct StoredFile {
    pub id: String,
    #[serde(default)]
    pub filename: String,
}

/// A configured agent persona
#[derive(Debug, Clone, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Everything needed to create an agent
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub model: String,
    pub name: String,
    pub instructions: String,
    pub vector_store_id: String,
}

/// A conversation thread
#[derive(Debug, Clone, Deserialize)]
pub struct Thread {
    pub id: String,
}

/// Text payload of a message content item
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextValue {
    pub value: String,
}

/// Image-file reference of a message content item
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageFileRef {
    pub file_id: String,
}

/// One content item within a thread message
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextValue },
    ImageFile { image_file: ImageFileRef },
}

/// A message in a thread
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

/// Run lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

impl RunStatus {
    /// Terminal statuses end the polling loop
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
        };
        write!(f, "{}", name)
    }
}

/// A function call the run is waiting on
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionCall {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// One required action emitted by a run
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub function: Option<FunctionCall>,
}

impl ToolCallRequest {
    pub fn is_function(&self) -> bool {
        self.kind == "function" && self.function.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitToolOutputs {
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequiredAction {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub submit_tool_outputs: SubmitToolOutputs,
}

/// One execution of an agent against a thread
#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
}

impl Run {
    /// Tool calls the run is waiting on, empty outside RequiresAction
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        self.required_action
            .as_ref()
            .map(|ra| ra.submit_tool_outputs.tool_calls.as_slice())
            .unwrap_or(&[])
    }
}

/// Result text resolved for one tool call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

/// Parameters for starting a run
#[derive(Debug, Clone)]
pub struct RunParams {
    pub agent_id: String,
    pub additional_instructions: String,
    pub temperature: f32,
    pub top_p: f32,
}

/// Operations the orchestrator needs from the back end
#[async_trait]
pub trait AgentsApi: Send + Sync {
    async fn list_vector_stores(&self) -> Result<Vec<VectorStore>>;
    async fn create_vector_store(&self, name: &str, file_ids: Vec<String>) -> Result<VectorStore>;
    async fn delete_vector_store(&self, store_id: &str) -> Result<()>;

    async fn upload_file(&self, path: &Path) -> Result<StoredFile>;

    async fn list_agents(&self) -> Result<Vec<Agent>>;
    async fn create_agent(&self, spec: AgentSpec) -> Result<Agent>;
    async fn delete_agent(&self, agent_id: &str) -> Result<()>;

    async fn create_thread(&self) -> Result<Thread>;
    async fn add_user_message(&self, thread_id: &str, text: &str) -> Result<()>;

    async fn create_run(&self, thread_id: &str, params: RunParams) -> Result<Run>;
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run>;

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;
}
