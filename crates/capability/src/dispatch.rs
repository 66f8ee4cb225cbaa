//! Dispatch of agent tool calls to the capability server
//!
//! Every dispatch resolves to result text, so the caller can always submit
//! exactly one output for the originating call id.

use crate::client::CapabilityClient;
use crate::index::{CapabilityTool, ToolIndex};
use serde_json::{json, Map, Value};
use tracing::warn;

/// Result text submitted when the capability server cannot be reached or
/// rejects an invocation
pub const INVOKE_FAILURE_TEXT: &str = "Error: Unable to fetch data";

/// Per-document context injected into known tool calls
#[derive(Debug, Clone, Default)]
pub struct CallDefaults {
    pub ticker: String,
}

/// Resolves agent tool calls against the index and invokes the capability
/// server
pub struct ToolDispatcher {
    client: CapabilityClient,
    index: ToolIndex,
    defaults: CallDefaults,
}

impl ToolDispatcher {
    pub fn new(client: CapabilityClient, index: ToolIndex, defaults: CallDefaults) -> Self {
        Self {
            client,
            index,
            defaults,
        }
    }

    pub fn index(&self) -> &ToolIndex {
        &self.index
    }

    /// Resolve and invoke one tool call, folding every failure into result
    /// text
    pub async fn dispatch(&self, callable: &str, arguments_json: &str) -> String {
        let Some(tool) = self.index.get(callable) else {
            warn!("◆ agent requested unknown tool {}", callable);
            return format!("Error: tool '{}' not found", callable);
        };

        let payload = self.build_payload(tool, arguments_json);
        match self.client.invoke(&payload).await {
            Ok(reply) if reply.success => extract_result(&reply.body),
            Ok(reply) => {
                warn!("◆ capability server rejected {}: {}", callable, reply.body);
                INVOKE_FAILURE_TEXT.to_string()
            }
            Err(e) => {
                warn!("◆ capability invoke failed for {}: {}", callable, e);
                INVOKE_FAILURE_TEXT.to_string()
            }
        }
    }

    fn build_payload(&self, tool: &CapabilityTool, arguments_json: &str) -> Value {
        let mut parameters = Map::new();
        parameters.insert(
            "operation".to_string(),
            Value::String(tool.subtool_name.clone()),
        );
        for (key, value) in parse_arguments(arguments_json) {
            parameters.insert(key, value);
        }

        if tool.callable_name == "yahoo_stock_price" {
            ensure_param(&mut parameters, "ticker", &self.defaults.ticker);
            ensure_param(&mut parameters, "interval", "1d");
            ensure_param(&mut parameters, "period", "1d");
        }

        json!({ "tool": tool.parent_name, "parameters": parameters })
    }
}

/// Parse the agent's argument payload as flat string pairs. Anything else
/// degrades to no arguments.
fn parse_arguments(raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Map<String, Value>>(raw) {
        Ok(map) if map.values().all(Value::is_string) => map,
        Ok(_) => {
            warn!("◆ tool arguments are not flat strings, ignoring");
            Map::new()
        }
        Err(e) => {
            warn!("◆ malformed tool arguments, ignoring: {}", e);
            Map::new()
        }
    }
}

fn ensure_param(parameters: &mut Map<String, Value>, key: &str, value: &str) {
    if !parameters.contains_key(key) {
        parameters.insert(key.to_string(), Value::String(value.to_string()));
    }
}

/// Pull the `result` field out of an invoke response body, falling back to
/// the raw body when the shape is unexpected
fn extract_result(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("result") {
            Some(Value::String(s)) => s.clone(),
            _ => body.to_string(),
        },
        _ => body.to_string(),
    }
}
