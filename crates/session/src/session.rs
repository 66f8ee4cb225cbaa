//! Run lifecycle for one filing conversation

use crate::filing::FilingMeta;
use crate::instructions;
use crate::{Result, SessionError};
use finsight_agents::{
    AgentsApi, MessageContent, RunParams, RunStatus, ToolCallRequest, ToolOutput,
};
use finsight_capability::ToolDispatcher;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Bounds on driving a run to a terminal status
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_polls: 240,
        }
    }
}

/// A question/answer session against one provisioned filing agent.
///
/// Every accepted question gets a fresh thread and run; tool calls the
/// run asks for are dispatched through the capability server.
pub struct FilingSession {
    api: Arc<dyn AgentsApi>,
    dispatcher: ToolDispatcher,
    agent_id: String,
    instructions: String,
    temperature: f32,
    top_p: f32,
    run: RunConfig,
    cancel: CancellationToken,
}

impl FilingSession {
    pub fn new(
        api: Arc<dyn AgentsApi>,
        dispatcher: ToolDispatcher,
        agent_id: impl Into<String>,
        meta: &FilingMeta,
        capability_url: &str,
    ) -> Self {
        Self {
            api,
            dispatcher,
            agent_id: agent_id.into(),
            instructions: instructions::question_instructions(meta, capability_url),
            temperature: 0.5,
            top_p: 0.9,
            run: RunConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_sampling(mut self, temperature: f32, top_p: f32) -> Self {
        self.temperature = temperature;
        self.top_p = top_p;
        self
    }

    pub fn with_run_config(mut self, run: RunConfig) -> Self {
        self.run = run;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Answer one question and return the latest agent message's content
    /// items, empty when the agent did not reply.
    pub async fn ask(&self, question: &str) -> Result<Vec<MessageContent>> {
        if question.trim().is_empty() {
            return Err(SessionError::EmptyQuestion);
        }

        let thread = self.api.create_thread().await?;
        debug!("◆ thread {} created", thread.id);

        self.api.add_user_message(&thread.id, question).await?;

        let params = RunParams {
            agent_id: self.agent_id.clone(),
            additional_instructions: self.instructions.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
        };
        let mut run = self.api.create_run(&thread.id, params).await?;
        info!("◆ run {} started on thread {}", run.id, thread.id);

        let mut polls = 0;
        loop {
            if polls >= self.run.max_polls {
                warn!("◆ run {} still {} after {} polls", run.id, run.status, polls);
                return Err(SessionError::PollBudgetExhausted);
            }
            polls += 1;

            tokio::select! {
                _ = self.cancel.cancelled() => return Err(SessionError::Cancelled),
                _ = tokio::time::sleep(self.run.poll_interval) => {}
            }

            run = self.api.get_run(&thread.id, &run.id).await?;
            debug!("◆ run {} status: {}", run.id, run.status);

            if run.status == RunStatus::RequiresAction {
                let outputs = self.answer_tool_calls(run.tool_calls()).await;
                if !outputs.is_empty() {
                    run = self
                        .api
                        .submit_tool_outputs(&thread.id, &run.id, outputs)
                        .await?;
                }
                continue;
            }
            if run.status.is_terminal() {
                break;
            }
        }

        if run.status != RunStatus::Completed {
            return Err(SessionError::RunFailed { status: run.status });
        }
        info!("◆ run {} completed", run.id);

        let messages = self.api.list_messages(&thread.id).await?;
        let answer = messages
            .into_iter()
            .filter(|m| m.role.eq_ignore_ascii_case("assistant"))
            .max_by_key(|m| m.created_at);

        Ok(answer.map(|m| m.content).unwrap_or_default())
    }

    /// Resolve every required action to exactly one output. Anything that
    /// is not a function call is answered with error text so the run can
    /// resume.
    async fn answer_tool_calls(&self, calls: &[ToolCallRequest]) -> Vec<ToolOutput> {
        let mut outputs = Vec::with_capacity(calls.len());
        for call in calls {
            let output = match &call.function {
                Some(function) if call.is_function() => {
                    info!("◆ tool call detected: {}", function.name);
                    self.dispatcher
                        .dispatch(&function.name, &function.arguments)
                        .await
                }
                _ => {
                    warn!("◆ action {} is not a function tool call", call.id);
                    "Error: unsupported tool call".to_string()
                }
            };
            outputs.push(ToolOutput {
                tool_call_id: call.id.clone(),
                output,
            });
        }
        outputs
    }
}
