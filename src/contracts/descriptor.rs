//! Operation descriptors - the static description of one callable operation.
//!
//! Parameter schemas are explicit field lists per location so that both the
//! tool catalog and the dispatcher can enumerate them without reflection.

use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Operation Key
// ============================================================================

/// Dotted path identifying an operation: `group.operation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationKey {
    pub group: &'static str,
    pub operation: &'static str,
}

impl OperationKey {
    pub const fn new(group: &'static str, operation: &'static str) -> Self {
        Self { group, operation }
    }

    /// Path segments in order, `[group, operation]`.
    pub fn segments(&self) -> [&'static str; 2] {
        [self.group, self.operation]
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.operation)
    }
}

// ============================================================================
// Parameter Schemas
// ============================================================================

/// HTTP-style method. Informational for the tool surface, routing for REST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter travels in a structured request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Body,
}

/// Value shape of a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String {
        format: Option<&'static str>,
        min_length: Option<u64>,
        max_length: Option<u64>,
    },
    Integer {
        minimum: Option<i64>,
        maximum: Option<i64>,
    },
    Boolean,
    Enum(&'static [&'static str]),
}

/// One named field of a parameter schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: Option<&'static str>,
    pub default: Option<Value>,
}

impl FieldSchema {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            description: None,
            default: None,
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(
            name,
            FieldKind::String {
                format: None,
                min_length: None,
                max_length: None,
            },
        )
    }

    pub fn uuid(name: &'static str) -> Self {
        Self::new(
            name,
            FieldKind::String {
                format: Some("uuid"),
                min_length: None,
                max_length: None,
            },
        )
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(
            name,
            FieldKind::Integer {
                minimum: None,
                maximum: None,
            },
        )
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn enumeration(name: &'static str, values: &'static [&'static str]) -> Self {
        Self::new(name, FieldKind::Enum(values))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Length bounds; ignored for non-string fields.
    pub fn length(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        if let FieldKind::String {
            min_length,
            max_length,
            ..
        } = &mut self.kind
        {
            *min_length = min;
            *max_length = max;
        }
        self
    }

    /// Numeric bounds; ignored for non-integer fields.
    pub fn range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        if let FieldKind::Integer { minimum, maximum } = &mut self.kind {
            *minimum = min;
            *maximum = max;
        }
        self
    }

    /// Render this field as a JSON-Schema property.
    pub fn to_json_schema(&self) -> Value {
        let mut schema = match &self.kind {
            FieldKind::String {
                format,
                min_length,
                max_length,
            } => {
                let mut s = json!({ "type": "string" });
                if let Some(format) = format {
                    s["format"] = json!(format);
                }
                if let Some(min) = min_length {
                    s["minLength"] = json!(min);
                }
                if let Some(max) = max_length {
                    s["maxLength"] = json!(max);
                }
                s
            }
            FieldKind::Integer { minimum, maximum } => {
                let mut s = json!({ "type": "integer" });
                if let Some(min) = minimum {
                    s["minimum"] = json!(min);
                }
                if let Some(max) = maximum {
                    s["maximum"] = json!(max);
                }
                s
            }
            FieldKind::Boolean => json!({ "type": "boolean" }),
            FieldKind::Enum(values) => json!({ "type": "string", "enum": values }),
        };

        if let Some(description) = self.description {
            schema["description"] = json!(description);
        }
        if let Some(default) = &self.default {
            schema["default"] = default.clone();
        }
        schema
    }
}

// ============================================================================
// Responses and Tool Metadata
// ============================================================================

/// JSON-Schema object for a response model.
pub fn object_schema<T: JsonSchema>() -> Arc<JsonObject> {
    let schema = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
    Arc::new(schema.as_object().cloned().unwrap_or_default())
}

/// Declared response for one status code.
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    pub description: &'static str,
    /// JSON-Schema of the body; `None` for empty responses.
    pub schema: Option<fn() -> Arc<JsonObject>>,
}

/// Tool-calling metadata attached to an operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolMetadata {
    pub expose_as_tool: bool,
    pub guidance: Option<&'static str>,
}

impl ToolMetadata {
    /// Metadata exposing the operation as a tool with the given guidance.
    pub fn exposed(guidance: &'static str) -> Self {
        Self {
            expose_as_tool: true,
            guidance: Some(guidance),
        }
    }
}

// ============================================================================
// Operation Descriptor
// ============================================================================

/// Static description of one operation. Immutable once registered.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    pub method: HttpMethod,
    /// Path template, parameters written as `{name}`.
    pub path: &'static str,
    pub path_params: Vec<FieldSchema>,
    pub query: Vec<FieldSchema>,
    pub body: Vec<FieldSchema>,
    pub responses: Vec<(u16, ResponseSchema)>,
    pub summary: Option<&'static str>,
    pub description: Option<&'static str>,
    pub tool: Option<ToolMetadata>,
}

impl OperationDescriptor {
    pub fn new(method: HttpMethod, path: &'static str) -> Self {
        Self {
            method,
            path,
            path_params: Vec::new(),
            query: Vec::new(),
            body: Vec::new(),
            responses: Vec::new(),
            summary: None,
            description: None,
            tool: None,
        }
    }

    pub fn path_params(mut self, fields: Vec<FieldSchema>) -> Self {
        self.path_params = fields;
        self
    }

    pub fn query(mut self, fields: Vec<FieldSchema>) -> Self {
        self.query = fields;
        self
    }

    pub fn body(mut self, fields: Vec<FieldSchema>) -> Self {
        self.body = fields;
        self
    }

    pub fn response(
        mut self,
        status: u16,
        description: &'static str,
        schema: fn() -> Arc<JsonObject>,
    ) -> Self {
        self.responses.push((
            status,
            ResponseSchema {
                description,
                schema: Some(schema),
            },
        ));
        self
    }

    /// Declare a status that carries no body.
    pub fn empty_response(mut self, status: u16, description: &'static str) -> Self {
        self.responses.push((
            status,
            ResponseSchema {
                description,
                schema: None,
            },
        ));
        self
    }

    pub fn summary(mut self, summary: &'static str) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn tool(mut self, metadata: ToolMetadata) -> Self {
        self.tool = Some(metadata);
        self
    }

    /// Whether the operation should be offered on the tool surface.
    pub fn is_tool_exposed(&self) -> bool {
        self.tool.as_ref().is_some_and(|t| t.expose_as_tool)
    }

    pub fn fields(&self, location: ParamLocation) -> &[FieldSchema] {
        match location {
            ParamLocation::Path => &self.path_params,
            ParamLocation::Query => &self.query,
            ParamLocation::Body => &self.body,
        }
    }

    pub fn field_names(&self, location: ParamLocation) -> impl Iterator<Item = &'static str> + '_ {
        self.fields(location).iter().map(|f| f.name)
    }

    /// First location declaring `name`, checked path, then query, then body.
    pub fn location_of(&self, name: &str) -> Option<ParamLocation> {
        [ParamLocation::Path, ParamLocation::Query, ParamLocation::Body]
            .into_iter()
            .find(|location| self.fields(*location).iter().any(|f| f.name == name))
    }

    pub fn declares_status(&self, status: u16) -> bool {
        self.responses.iter().any(|(s, _)| *s == status)
    }

    /// Field names declared in more than one location.
    pub fn parameter_collisions(&self) -> Vec<&'static str> {
        let mut seen: Vec<&'static str> = Vec::new();
        let mut collisions = Vec::new();
        for location in [ParamLocation::Path, ParamLocation::Query, ParamLocation::Body] {
            let mut local: Vec<&'static str> = self.field_names(location).collect();
            local.dedup();
            for name in local {
                if seen.contains(&name) {
                    if !collisions.contains(&name) {
                        collisions.push(name);
                    }
                } else {
                    seen.push(name);
                }
            }
        }
        collisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OperationDescriptor {
        OperationDescriptor::new(HttpMethod::Patch, "/things/{id}")
            .path_params(vec![FieldSchema::uuid("id").required()])
            .query(vec![FieldSchema::integer("limit")])
            .body(vec![FieldSchema::string("title"), FieldSchema::string("id")])
            .empty_response(200, "Updated")
    }

    #[test]
    fn test_operation_key_display() {
        let key = OperationKey::new("tasks", "listTasks");
        assert_eq!(key.to_string(), "tasks.listTasks");
        assert_eq!(key.segments(), ["tasks", "listTasks"]);
    }

    #[test]
    fn test_location_priority() {
        let descriptor = sample();
        assert_eq!(descriptor.location_of("id"), Some(ParamLocation::Path));
        assert_eq!(descriptor.location_of("limit"), Some(ParamLocation::Query));
        assert_eq!(descriptor.location_of("title"), Some(ParamLocation::Body));
        assert_eq!(descriptor.location_of("junk"), None);
    }

    #[test]
    fn test_parameter_collisions() {
        assert_eq!(sample().parameter_collisions(), vec!["id"]);
    }

    #[test]
    fn test_field_json_schema() {
        let field = FieldSchema::string("title")
            .length(Some(1), Some(200))
            .describe("Task title");
        let schema = field.to_json_schema();
        assert_eq!(schema["type"], "string");
        assert_eq!(schema["minLength"], 1);
        assert_eq!(schema["maxLength"], 200);
        assert_eq!(schema["description"], "Task title");

        let field = FieldSchema::enumeration("priority", &["low", "high"]).default_value(json!("low"));
        let schema = field.to_json_schema();
        assert_eq!(schema["enum"], json!(["low", "high"]));
        assert_eq!(schema["default"], "low");
    }

    #[test]
    fn test_tool_exposure() {
        assert!(!sample().is_tool_exposed());
        assert!(sample().tool(ToolMetadata::exposed("Use it")).is_tool_exposed());
        assert!(!sample().tool(ToolMetadata::default()).is_tool_exposed());
        assert!(sample().declares_status(200));
        assert!(!sample().declares_status(404));
    }
}
