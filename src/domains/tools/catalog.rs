//! Tool Catalog - derives tool definitions from the contract registry.
//!
//! Every operation whose metadata sets `expose_as_tool` becomes one tool.
//! Discovery is a pure function of the registry: the same registry always
//! yields the same catalog, in declaration order.

use rmcp::model::{JsonObject, Tool};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::ToolError;
use crate::contracts::{ContractRegistry, FieldSchema, OperationDescriptor, OperationKey};

// ============================================================================
// Naming
// ============================================================================

/// Tool name for a path: segments joined with `_`, every uppercase letter
/// prefixed with `_`, then lowercased.
///
/// `["tasks", "listTasks"]` becomes `tasks_list_tasks`.
pub fn tool_name(segments: &[&str]) -> String {
    let joined = segments.join("_");
    let mut name = String::with_capacity(joined.len() + 4);
    for c in joined.chars() {
        if c.is_ascii_uppercase() {
            name.push('_');
            name.push(c.to_ascii_lowercase());
        } else {
            name.extend(c.to_lowercase());
        }
    }
    name
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ============================================================================
// Tool Definition
// ============================================================================

/// One callable tool, derived from a single exposed operation.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub guidance: Option<&'static str>,
    /// Merged path, body and query fields.
    pub input_fields: Vec<FieldSchema>,
    pub origin: OperationKey,
    pub descriptor: Arc<OperationDescriptor>,
}

impl PartialEq for ToolDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.guidance == other.guidance
            && self.input_fields == other.input_fields
            && self.origin == other.origin
            && Arc::ptr_eq(&self.descriptor, &other.descriptor)
    }
}

impl ToolDefinition {
    /// Build the definition for one operation, rejecting malformed metadata.
    pub fn compile(
        origin: OperationKey,
        descriptor: &Arc<OperationDescriptor>,
    ) -> Result<Self, ToolError> {
        for segment in origin.segments() {
            if !is_identifier(segment) {
                return Err(ToolError::malformed(
                    origin,
                    format!("'{segment}' is not a valid name segment"),
                ));
            }
        }

        let guidance = descriptor.tool.as_ref().and_then(|t| t.guidance);
        if guidance.is_some_and(|g| g.trim().is_empty()) {
            return Err(ToolError::malformed(origin, "guidance text is empty"));
        }

        let input_fields = merge_fields(descriptor);
        if let Some(field) = input_fields
            .iter()
            .find(|f| f.name.is_empty() || f.name.contains(char::is_whitespace))
        {
            return Err(ToolError::malformed(
                origin,
                format!("invalid field name '{}'", field.name),
            ));
        }

        let description = descriptor
            .summary
            .or(descriptor.description)
            .map(str::to_string)
            .unwrap_or_else(|| origin.to_string());

        Ok(Self {
            name: tool_name(&origin.segments()),
            description,
            guidance,
            input_fields,
            origin,
            descriptor: Arc::clone(descriptor),
        })
    }

    /// Input schema as a JSON-Schema object.
    pub fn input_schema(&self) -> JsonObject {
        let properties: JsonObject = self
            .input_fields
            .iter()
            .map(|f| (f.name.to_string(), f.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .input_fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();

        let mut schema = JsonObject::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), json!(required));
        }
        schema
    }

    /// The rmcp model advertised to clients.
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.clone().into(),
            description: Some(self.description.clone().into()),
            input_schema: Arc::new(self.input_schema()),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }
}

/// Path, then body, then query. A later field replaces an earlier one of the
/// same name in place.
fn merge_fields(descriptor: &OperationDescriptor) -> Vec<FieldSchema> {
    let mut merged: Vec<FieldSchema> = Vec::new();
    for field in descriptor
        .path_params
        .iter()
        .chain(&descriptor.body)
        .chain(&descriptor.query)
    {
        match merged.iter_mut().find(|f| f.name == field.name) {
            Some(slot) => *slot = field.clone(),
            None => merged.push(field.clone()),
        }
    }
    merged
}

// ============================================================================
// Tool Catalog
// ============================================================================

/// Ordered set of tool definitions discovered from a contract registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCatalog {
    tools: Vec<ToolDefinition>,
}

impl ToolCatalog {
    /// Walk the registry and collect every exposed operation.
    ///
    /// Malformed operations and duplicate tool names are logged and skipped.
    pub fn discover(contracts: &ContractRegistry) -> Self {
        info!("Discovering MCP tools from contracts...");
        let mut tools: Vec<ToolDefinition> = Vec::new();

        for (key, descriptor) in contracts.iter() {
            if !descriptor.is_tool_exposed() {
                debug!("Operation {} is not exposed as a tool", key);
                continue;
            }

            match ToolDefinition::compile(key, descriptor) {
                Ok(definition) => {
                    if let Some(existing) = tools.iter().find(|t| t.name == definition.name) {
                        warn!(
                            "Skipping {}: tool name {} already taken by {}",
                            key, definition.name, existing.origin
                        );
                        continue;
                    }
                    info!("Cached MCP tool: {} ({})", definition.name, key);
                    tools.push(definition);
                }
                Err(e) => warn!("Skipping {}: {}", key, e),
            }
        }

        info!("Discovered {} MCP tools", tools.len());
        Self { tools }
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Server instructions listing each tool with its guidance text.
    pub fn instructions(&self, header: &str) -> String {
        let mut text = header.to_string();
        for tool in &self.tools {
            text.push_str(&format!("\n\n- {}: {}", tool.name, tool.description));
            if let Some(guidance) = tool.guidance {
                text.push_str(&format!("\n  {}", guidance));
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{ContractGroup, HttpMethod, ToolMetadata, default_contracts};

    #[test]
    fn test_tool_name() {
        assert_eq!(tool_name(&["tasks", "listTasks"]), "tasks_list_tasks");
        assert_eq!(tool_name(&["tasks", "getTask"]), "tasks_get_task");
        assert_eq!(tool_name(&["a", "b"]), "a_b");
        assert_eq!(tool_name(&["Tasks", "list"]), "_tasks_list");
    }

    #[test]
    fn test_discovers_task_tools() {
        let catalog = ToolCatalog::discover(&default_contracts());
        assert_eq!(
            catalog.names(),
            vec![
                "tasks_list_tasks",
                "tasks_get_task",
                "tasks_create_task",
                "tasks_update_task",
                "tasks_delete_task",
                "tasks_search_tasks",
            ]
        );
        assert!(catalog.tools().iter().all(|t| t.guidance.is_some()));
    }

    #[test]
    fn test_discovery_is_idempotent() {
        let contracts = default_contracts();
        assert_eq!(ToolCatalog::discover(&contracts), ToolCatalog::discover(&contracts));
    }

    #[test]
    fn test_unexposed_operations_are_skipped() {
        let contracts = ContractRegistry::new().with_group(
            ContractGroup::new("things")
                .operation("hidden", OperationDescriptor::new(HttpMethod::Get, "/hidden"))
                .operation(
                    "off",
                    OperationDescriptor::new(HttpMethod::Get, "/off").tool(ToolMetadata::default()),
                )
                .operation(
                    "shown",
                    OperationDescriptor::new(HttpMethod::Get, "/shown")
                        .tool(ToolMetadata::exposed("Go")),
                ),
        );
        assert_eq!(ToolCatalog::discover(&contracts).names(), vec!["things_shown"]);
    }

    #[test]
    fn test_description_fallback() {
        let contracts = ContractRegistry::new().with_group(
            ContractGroup::new("things")
                .operation(
                    "a",
                    OperationDescriptor::new(HttpMethod::Get, "/a")
                        .summary("Summary A")
                        .description("Long A")
                        .tool(ToolMetadata::exposed("x")),
                )
                .operation(
                    "b",
                    OperationDescriptor::new(HttpMethod::Get, "/b")
                        .description("Long B")
                        .tool(ToolMetadata::exposed("x")),
                )
                .operation(
                    "c",
                    OperationDescriptor::new(HttpMethod::Get, "/c").tool(ToolMetadata::exposed("x")),
                ),
        );
        let catalog = ToolCatalog::discover(&contracts);
        assert_eq!(catalog.get("things_a").unwrap().description, "Summary A");
        assert_eq!(catalog.get("things_b").unwrap().description, "Long B");
        assert_eq!(catalog.get("things_c").unwrap().description, "things.c");
    }

    #[test]
    fn test_input_schema_merge_and_override() {
        let contracts = ContractRegistry::new().with_group(ContractGroup::new("things").operation(
            "edit",
            OperationDescriptor::new(HttpMethod::Patch, "/things/{id}")
                .path_params(vec![FieldSchema::uuid("id").required()])
                .body(vec![FieldSchema::string("title"), FieldSchema::string("mode")])
                .query(vec![FieldSchema::integer("mode").describe("from query")])
                .tool(ToolMetadata::exposed("x")),
        ));
        let catalog = ToolCatalog::discover(&contracts);
        let tool = catalog.get("things_edit").unwrap();

        let names: Vec<_> = tool.input_fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["id", "title", "mode"]);

        let schema = tool.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["mode"]["type"], "integer");
        assert_eq!(schema["properties"]["mode"]["description"], "from query");
        assert_eq!(schema["properties"]["id"]["format"], "uuid");
        assert_eq!(schema["required"], json!(["id"]));
    }

    #[test]
    fn test_malformed_metadata_is_skipped() {
        let contracts = ContractRegistry::new().with_group(
            ContractGroup::new("things")
                .operation(
                    "bad name",
                    OperationDescriptor::new(HttpMethod::Get, "/a").tool(ToolMetadata::exposed("x")),
                )
                .operation(
                    "quiet",
                    OperationDescriptor::new(HttpMethod::Get, "/b").tool(ToolMetadata::exposed("  ")),
                )
                .operation(
                    "good",
                    OperationDescriptor::new(HttpMethod::Get, "/c").tool(ToolMetadata::exposed("x")),
                ),
        );
        assert_eq!(ToolCatalog::discover(&contracts).names(), vec!["things_good"]);
    }

    #[test]
    fn test_duplicate_tool_names_keep_first() {
        let contracts = ContractRegistry::new().with_group(
            ContractGroup::new("things")
                .operation(
                    "getAll",
                    OperationDescriptor::new(HttpMethod::Get, "/a").tool(ToolMetadata::exposed("x")),
                )
                .operation(
                    "get_all",
                    OperationDescriptor::new(HttpMethod::Get, "/b").tool(ToolMetadata::exposed("x")),
                ),
        );
        let catalog = ToolCatalog::discover(&contracts);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.tools()[0].origin.operation, "getAll");
    }

    #[test]
    fn test_to_tool() {
        let catalog = ToolCatalog::discover(&default_contracts());
        let tool = catalog.get("tasks_create_task").unwrap().to_tool();
        assert_eq!(tool.name.as_ref(), "tasks_create_task");
        assert!(tool.input_schema.get("properties").is_some());
    }

    #[test]
    fn test_instructions_list_guidance() {
        let catalog = ToolCatalog::discover(&default_contracts());
        let text = catalog.instructions("Task tools.");
        assert!(text.starts_with("Task tools."));
        assert!(text.contains("- tasks_search_tasks:"));
    }
}
