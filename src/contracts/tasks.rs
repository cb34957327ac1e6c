//! Task contract: models and the six task operations.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::descriptor::{FieldSchema, HttpMethod, OperationDescriptor, ToolMetadata, object_schema};
use super::registry::ContractGroup;

/// Group name of the task operations.
pub const GROUP: &str = "tasks";

pub const STATUS_VALUES: &[&str] = &["pending", "in_progress", "completed"];
pub const PRIORITY_VALUES: &[&str] = &["low", "medium", "high"];

// ============================================================================
// Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    /// Sort rank, most urgent first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

/// A task as returned by every task operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// Response body of `listTasks`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskList {
    pub tasks: Vec<Task>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Response body of `searchTasks`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskSearchResult {
    pub tasks: Vec<Task>,
    pub query: String,
    pub count: usize,
}

/// Error body shared by every error status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

// ============================================================================
// Contract
// ============================================================================

fn task_id() -> FieldSchema {
    FieldSchema::uuid("id").required().describe("Task identifier")
}

fn title() -> FieldSchema {
    FieldSchema::string("title").length(Some(1), Some(200))
}

fn description() -> FieldSchema {
    FieldSchema::string("description").length(None, Some(1000))
}

fn assigned_to() -> FieldSchema {
    FieldSchema::string("assigned_to").describe("Username of the assignee")
}

/// The task operations, in declaration order.
pub fn contract() -> ContractGroup {
    ContractGroup::new(GROUP)
        .operation(
            "listTasks",
            OperationDescriptor::new(HttpMethod::Get, "/tasks")
                .query(vec![
                    FieldSchema::enumeration("status", STATUS_VALUES),
                    FieldSchema::enumeration("priority", PRIORITY_VALUES),
                    assigned_to(),
                    FieldSchema::integer("limit")
                        .range(Some(1), Some(100))
                        .default_value(json!(20)),
                    FieldSchema::integer("offset")
                        .range(Some(0), None)
                        .default_value(json!(0)),
                ])
                .response(200, "Tasks matching the filters", object_schema::<TaskList>)
                .response(400, "Invalid filters", object_schema::<ErrorBody>)
                .response(401, "Unauthorized", object_schema::<ErrorBody>)
                .summary("List all tasks with optional filtering")
                .tool(ToolMetadata::exposed(
                    "Use this to retrieve tasks. \
                     Filter by status when user asks for specific task states (pending, in progress, completed). \
                     Filter by priority when user asks for important/urgent tasks. \
                     Use pagination with limit and offset for large result sets.",
                )),
        )
        .operation(
            "getTask",
            OperationDescriptor::new(HttpMethod::Get, "/tasks/{id}")
                .path_params(vec![task_id()])
                .response(200, "The task", object_schema::<Task>)
                .response(401, "Unauthorized", object_schema::<ErrorBody>)
                .response(404, "Task not found", object_schema::<ErrorBody>)
                .summary("Get a specific task by ID")
                .tool(ToolMetadata::exposed(
                    "Use this to retrieve details about a specific task when the user references it by ID.",
                )),
        )
        .operation(
            "createTask",
            OperationDescriptor::new(HttpMethod::Post, "/tasks")
                .body(vec![
                    title().required(),
                    description(),
                    FieldSchema::enumeration("priority", PRIORITY_VALUES)
                        .default_value(json!("medium")),
                    assigned_to(),
                ])
                .response(201, "The created task", object_schema::<Task>)
                .response(400, "Invalid input", object_schema::<ErrorBody>)
                .response(401, "Unauthorized", object_schema::<ErrorBody>)
                .summary("Create a new task")
                .tool(ToolMetadata::exposed(
                    "Use this when the user wants to create a new task, reminder, or to-do item. \
                     Set priority based on urgency keywords: urgent/important = high, normal = medium, later = low. \
                     If the user mentions assigning to someone, set the assigned_to field to their username.",
                )),
        )
        .operation(
            "updateTask",
            OperationDescriptor::new(HttpMethod::Patch, "/tasks/{id}")
                .path_params(vec![task_id()])
                .body(vec![
                    title(),
                    description(),
                    FieldSchema::enumeration("status", STATUS_VALUES),
                    FieldSchema::enumeration("priority", PRIORITY_VALUES),
                    assigned_to(),
                ])
                .response(200, "The updated task", object_schema::<Task>)
                .response(400, "Invalid input", object_schema::<ErrorBody>)
                .response(401, "Unauthorized", object_schema::<ErrorBody>)
                .response(404, "Task not found", object_schema::<ErrorBody>)
                .summary("Update an existing task")
                .tool(ToolMetadata::exposed(
                    "Use this to update task properties like status, priority, description, or assignee. \
                     Common updates: marking as completed, changing priority, updating description, assigning to someone.",
                )),
        )
        .operation(
            "deleteTask",
            OperationDescriptor::new(HttpMethod::Delete, "/tasks/{id}")
                .path_params(vec![task_id()])
                .empty_response(204, "Task deleted")
                .response(401, "Unauthorized", object_schema::<ErrorBody>)
                .response(404, "Task not found", object_schema::<ErrorBody>)
                .summary("Delete a task")
                .tool(ToolMetadata::exposed(
                    "Use this when the user wants to remove or delete a task permanently. \
                     Confirm with user before deletion if the task contains important information.",
                )),
        )
        .operation(
            "searchTasks",
            OperationDescriptor::new(HttpMethod::Get, "/tasks/search")
                .query(vec![
                    FieldSchema::string("q")
                        .length(Some(1), None)
                        .required()
                        .describe("Search query to match against title and description"),
                    FieldSchema::integer("limit")
                        .range(Some(1), Some(100))
                        .default_value(json!(10)),
                ])
                .response(200, "Matching tasks", object_schema::<TaskSearchResult>)
                .response(400, "Invalid query", object_schema::<ErrorBody>)
                .response(401, "Unauthorized", object_schema::<ErrorBody>)
                .summary("Search tasks by text query")
                .tool(ToolMetadata::exposed(
                    "Use this when the user wants to find tasks by searching for keywords. \
                     Searches both title and description fields.",
                )),
        )
}
