//! Tool index built from capability-server discovery

use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::warn;

/// One parameter of a discovered subtool, kept in discovery order
#[derive(Debug, Clone, PartialEq)]
pub struct ToolParam {
    pub name: String,
    pub kind: String,
    pub required: bool,
    pub description: String,
}

/// A callable tool: a subtool addressed through its parent tool
#[derive(Debug, Clone)]
pub struct CapabilityTool {
    pub parent_name: String,
    pub subtool_name: String,
    pub callable_name: String,
    pub description: String,
    pub parameters: Vec<ToolParam>,
}

/// Wire shape of GET /tools
#[derive(Debug, Deserialize)]
pub(crate) struct DiscoveryResponse {
    #[serde(default)]
    pub tools: Vec<DiscoveredTool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DiscoveredTool {
    pub name: String,
    #[serde(default)]
    pub subtools: Vec<DiscoveredSubtool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DiscoveredSubtool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: serde_json::Map<String, Value>,
}

/// Map a discovered subtool name onto the name agents call it by
pub fn callable_name(subtool: &str) -> String {
    match subtool {
        "BraveSearch" => "brave_web_search".to_string(),
        "YahooStockPrice" => "yahoo_stock_price".to_string(),
        _ => subtool.to_lowercase().replace(' ', "_"),
    }
}

/// Lookup table from callable name to its capability tool
#[derive(Debug, Clone, Default)]
pub struct ToolIndex {
    tools: HashMap<String, CapabilityTool>,
}

impl ToolIndex {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub(crate) fn from_discovery(response: DiscoveryResponse) -> Self {
        let mut index = Self::new();
        for tool in response.tools {
            for subtool in tool.subtools {
                let parameters = subtool
                    .parameters
                    .iter()
                    .map(|(name, spec)| ToolParam {
                        name: name.clone(),
                        kind: spec
                            .get("type")
                            .and_then(Value::as_str)
                            .unwrap_or("string")
                            .to_string(),
                        required: spec
                            .get("required")
                            .and_then(Value::as_bool)
                            .unwrap_or(false),
                        description: spec
                            .get("description")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    })
                    .collect();

                index.insert(CapabilityTool {
                    parent_name: tool.name.clone(),
                    callable_name: callable_name(&subtool.name),
                    subtool_name: subtool.name,
                    description: subtool.description,
                    parameters,
                });
            }
        }
        index
    }

    /// Insert a tool keyed by callable name. Later entries win on collision.
    pub fn insert(&mut self, tool: CapabilityTool) {
        let name = tool.callable_name.clone();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!("◆ duplicate callable name {}, keeping latest", name);
        }
    }

    pub fn get(&self, callable: &str) -> Option<&CapabilityTool> {
        self.tools.get(callable)
    }

    pub fn has(&self, callable: &str) -> bool {
        self.tools.contains_key(callable)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Callable names, sorted for stable output
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Render every tool as a function-schema block for agent instructions.
    /// Blocks are ordered by callable name.
    pub fn schema_text(&self) -> String {
        let mut blocks = Vec::new();
        for name in self.names() {
            let tool = &self.tools[&name];
            let mut properties = serde_json::Map::new();
            let mut required = Vec::new();
            for param in &tool.parameters {
                properties.insert(
                    param.name.clone(),
                    json!({ "type": param.kind, "description": param.description }),
                );
                if param.required {
                    required.push(param.name.clone());
                }
            }
            let block = json!({
                "type": "function",
                "function": {
                    "name": tool.callable_name,
                    "description": tool.description,
                    "parameters": {
                        "type": "object",
                        "properties": properties,
                        "required": required,
                    }
                }
            });
            blocks.push(serde_json::to_string_pretty(&block).unwrap_or_default());
        }
        blocks.join("\n")
    }
}
