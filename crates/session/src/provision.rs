//! Idempotent provisioning of the store and agent for one filing
//!
//! Stores are reused by name. Agents are replaced on every start so the
//! new agent always binds the store that matches the document.

use crate::filing::{self, FilingMeta};
use crate::instructions;
use crate::{Result, SessionError};
use finsight_agents::{Agent, AgentSpec, AgentsApi, VectorStore};
use finsight_capability::ToolIndex;
use finsight_docintel::{to_markdown, DocIntelClient};
use std::path::Path;
use tracing::{info, warn};

/// Find the store for this filing, or upload the document and create it.
///
/// An existing store with the same name is used as is, even when the
/// document content has changed since it was built. Listing failures are
/// soft; upload and creation failures propagate.
pub async fn ensure_store(
    api: &dyn AgentsApi,
    docintel: Option<&DocIntelClient>,
    document: &Path,
    meta: &FilingMeta,
) -> Result<VectorStore> {
    let name = meta.store_name();
    match api.list_vector_stores().await {
        Ok(stores) => {
            if let Some(existing) = stores.into_iter().find(|s| s.name == name) {
                info!(
                    "◆ store '{}' already exists with id {}, using it as is",
                    name, existing.id
                );
                return Ok(existing);
            }
            info!("◆ store '{}' does not exist, creating it", name);
        }
        Err(e) => warn!("◆ could not list stores, proceeding with creation: {}", e),
    }

    let upload_path = if filing::needs_extraction(document) {
        let client = docintel.ok_or(SessionError::MissingDocIntel)?;
        let markdown = to_markdown(&client.analyze(document).await?);
        let artifact = filing::processed_path(document);
        tokio::fs::write(&artifact, &markdown).await?;
        info!("◆ extracted markdown saved to {}", artifact.display());
        artifact
    } else {
        document.to_path_buf()
    };

    let file = api.upload_file(&upload_path).await?;
    info!("◆ uploaded {} as {}", upload_path.display(), file.id);

    let store = api.create_vector_store(&name, vec![file.id]).await?;
    info!("◆ store '{}' created with id {}", name, store.id);
    Ok(store)
}

/// Create the filing agent bound to `store`, deleting any agent that
/// already carries the name first. Listing and deletion failures are
/// soft; creation failures propagate.
pub async fn ensure_agent(
    api: &dyn AgentsApi,
    index: &ToolIndex,
    store: &VectorStore,
    meta: &FilingMeta,
    model: &str,
    user_prefix: &str,
    capability_url: &str,
) -> Result<Agent> {
    let name = meta.agent_name(user_prefix);
    match api.list_agents().await {
        Ok(agents) => {
            if let Some(existing) = agents.iter().find(|a| a.name == name) {
                info!(
                    "◆ agent '{}' exists with id {}, deleting it to rebind store '{}'",
                    name, existing.id, store.name
                );
                if let Err(e) = api.delete_agent(&existing.id).await {
                    warn!(
                        "◆ could not delete agent {}, proceeding with creation: {}",
                        existing.id, e
                    );
                }
            }
        }
        Err(e) => warn!("◆ could not list agents, proceeding with creation: {}", e),
    }

    let spec = AgentSpec {
        model: model.to_string(),
        name,
        instructions: instructions::agent_instructions(meta, &index.schema_text(), capability_url),
        vector_store_id: store.id.clone(),
    };
    let agent = api.create_agent(spec).await?;
    info!("◆ agent '{}' created with id {}", agent.name, agent.id);
    Ok(agent)
}
