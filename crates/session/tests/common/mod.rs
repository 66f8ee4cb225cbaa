//! Common test fixtures for session integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use finsight_agents::{
    Agent, AgentSpec, AgentsApi, FunctionCall, MessageContent, RequiredAction, Result, Run,
    RunParams, RunStatus, StoredFile, SubmitToolOutputs, TextValue, Thread, ThreadMessage,
    ToolCallRequest, ToolOutput, VectorStore,
};
use finsight_capability::{callable_name, CapabilityTool, ToolIndex, ToolParam};
use mockall::mock;
use std::path::Path;

mock! {
    pub Api {}

    #[async_trait]
    impl AgentsApi for Api {
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
}

pub fn store(id: &str, name: &str) -> VectorStore {
    VectorStore {
        id: id.to_string(),
        name: name.to_string(),
        created_at: 0,
    }
}

pub fn run_with_status(id: &str, status: RunStatus) -> Run {
    Run {
        id: id.to_string(),
        status,
        required_action: None,
    }
}

pub fn requires_action_run(id: &str, tool_calls: Vec<ToolCallRequest>) -> Run {
    Run {
        id: id.to_string(),
        status: RunStatus::RequiresAction,
        required_action: Some(RequiredAction {
            kind: "submit_tool_outputs".to_string(),
            submit_tool_outputs: SubmitToolOutputs { tool_calls },
        }),
    }
}

pub fn function_call(call_id: &str, name: &str, arguments: &str) -> ToolCallRequest {
    ToolCallRequest {
        id: call_id.to_string(),
        kind: "function".to_string(),
        function: Some(FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        }),
    }
}

pub fn text_message(id: &str, role: &str, created_at: i64, text: &str) -> ThreadMessage {
    ThreadMessage {
        id: id.to_string(),
        role: role.to_string(),
        created_at,
        content: vec![MessageContent::Text {
            text: TextValue {
                value: text.to_string(),
            },
        }],
    }
}

/// Index holding the stock-price tool the way discovery would build it
pub fn yahoo_index() -> ToolIndex {
    let mut index = ToolIndex::new();
    index.insert(CapabilityTool {
        parent_name: "FinanceTools".to_string(),
        subtool_name: "YahooStockPrice".to_string(),
        callable_name: callable_name("YahooStockPrice"),
        description: "Fetch historical stock prices".to_string(),
        parameters: vec![ToolParam {
            name: "ticker".to_string(),
            kind: "string".to_string(),
            required: true,
            description: "Stock symbol".to_string(),
        }],
    });
    index
}
