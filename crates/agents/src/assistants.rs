//! Assistants-style REST implementation of the back end

use crate::*;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

/// List envelope used by the collection endpoints
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

// Serialized directly so f32 sampling params keep their shortest form
#[derive(Serialize)]
struct CreateRunBody<'a> {
    assistant_id: &'a str,
    additional_instructions: &'a str,
    temperature: f32,
    top_p: f32,
}

/// HTTP client for an assistants-v2 compatible back end
pub struct AssistantsClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl AssistantsClient {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.api_base, path);
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::Api(format!("{}: {}", status, text)));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn expect_success(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            return Err(BackendError::Api(format!("{}: {}", status, text)));
        }
        Ok(())
    }
}

#[async_trait]
impl AgentsApi for AssistantsClient {
    async fn list_vector_stores(&self) -> Result<Vec<VectorStore>> {
        let response = self
            .request(Method::GET, "/vector_stores?limit=100")
            .send()
            .await?;
        let list: ListResponse<VectorStore> = Self::parse(response).await?;
        Ok(list.data)
    }

    async fn create_vector_store(&self, name: &str, file_ids: Vec<String>) -> Result<VectorStore> {
        debug!("◆ creating vector store {}", name);
        let response = self
            .request(Method::POST, "/vector_stores")
            .json(&json!({ "name": name, "file_ids": file_ids }))
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn delete_vector_store(&self, store_id: &str) -> Result<()> {
        debug!("◆ deleting vector store {}", store_id);
        let response = self
            .request(Method::DELETE, &format!("/vector_stores/{}", store_id))
            .send()
            .await?;
        Self::expect_success(response).await
    }

    async fn upload_file(&self, path: &Path) -> Result<StoredFile> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        debug!("◆ uploading {}", filename);

        let bytes = tokio::fs::read(path).await?;
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
        let form = reqwest::multipart::Form::new()
            .text("purpose", "assistants")
            .part("file", part);

        let response = self
            .request(Method::POST, "/files")
            .multipart(form)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn list_agents(&self) -> Result<Vec<Agent>> {
        let response = self
            .request(Method::GET, "/assistants?limit=100")
            .send()
            .await?;
        let list: ListResponse<Agent> = Self::parse(response).await?;
        Ok(list.data)
    }

    async fn create_agent(&self, spec: AgentSpec) -> Result<Agent> {
        debug!("◆ creating agent {}", spec.name);
        let body = json!({
            "model": spec.model,
            "name": spec.name,
            "instructions": spec.instructions,
            "tools": [{ "type": "file_search" }],
            "tool_resources": {
                "file_search": { "vector_store_ids": [spec.vector_store_id] }
            }
        });
        let response = self
            .request(Method::POST, "/assistants")
            .json(&body)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<()> {
        debug!("◆ deleting agent {}", agent_id);
        let response = self
            .request(Method::DELETE, &format!("/assistants/{}", agent_id))
            .send()
            .await?;
        Self::expect_success(response).await
    }

    async fn create_thread(&self) -> Result<Thread> {
        let response = self
            .request(Method::POST, "/threads")
            .json(&json!({}))
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn add_user_message(&self, thread_id: &str, text: &str) -> Result<()> {
        let response = self
            .request(Method::POST, &format!("/threads/{}/messages", thread_id))
            .json(&json!({ "role": "user", "content": text }))
            .send()
            .await?;
        let _: serde_json::Value = Self::parse(response).await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, params: RunParams) -> Result<Run> {
        debug!("◆ starting run on thread {}", thread_id);
        let body = CreateRunBody {
            assistant_id: &params.agent_id,
            additional_instructions: &params.additional_instructions,
            temperature: params.temperature,
            top_p: params.top_p,
        };
        let response = self
            .request(Method::POST, &format!("/threads/{}/runs", thread_id))
            .json(&body)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let response = self
            .request(
                Method::GET,
                &format!("/threads/{}/runs/{}", thread_id, run_id),
            )
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run> {
        debug!("◆ submitting {} tool outputs to {}", outputs.len(), run_id);
        let response = self
            .request(
                Method::POST,
                &format!("/threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id),
            )
            .json(&json!({ "tool_outputs": outputs }))
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let response = self
            .request(
                Method::GET,
                &format!("/threads/{}/messages?limit=100", thread_id),
            )
            .send()
            .await?;
        let list: ListResponse<ThreadMessage> = Self::parse(response).await?;
        Ok(list.data)
    }
}
