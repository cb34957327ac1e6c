//! Task handlers, called by both the REST surface and the tool surface.
//!
//! Every handler checks authentication first so an unauthenticated call never
//! touches the store.

use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::error::RouteError;
use super::registry::{HandlerRegistry, RouteResult, handler_fn};
use super::request::{RouteRequest, RouteResponse, lenient};
use crate::contracts::OperationKey;
use crate::contracts::tasks::{GROUP, TaskList, TaskPriority, TaskSearchResult, TaskStatus};
use crate::domains::store::{NewTask, TaskFilter, TaskPatch, TaskStore};

const TITLE_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 1000;
const LIMIT_MAX: i64 = 100;

// ============================================================================
// Inputs
// ============================================================================

#[derive(Debug, Deserialize)]
struct TaskIdParams {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ListTasksQuery {
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
    assigned_to: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    limit: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SearchTasksQuery {
    q: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CreateTaskBody {
    title: String,
    description: Option<String>,
    priority: Option<TaskPriority>,
    assigned_to: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateTaskBody {
    title: Option<String>,
    description: Option<String>,
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
    assigned_to: Option<String>,
}

fn check_title(title: &str) -> Result<(), RouteError> {
    let len = title.chars().count();
    if len == 0 || len > TITLE_MAX {
        return Err(RouteError::validation(format!(
            "title must be between 1 and {TITLE_MAX} characters"
        )));
    }
    Ok(())
}

fn check_description(description: Option<&str>) -> Result<(), RouteError> {
    if description.is_some_and(|d| d.chars().count() > DESCRIPTION_MAX) {
        return Err(RouteError::validation(format!(
            "description must be at most {DESCRIPTION_MAX} characters"
        )));
    }
    Ok(())
}

fn check_limit(limit: Option<i64>, default: i64) -> Result<usize, RouteError> {
    match limit.unwrap_or(default) {
        n @ 1..=LIMIT_MAX => Ok(n as usize),
        n => Err(RouteError::validation(format!(
            "limit must be between 1 and {LIMIT_MAX}, got {n}"
        ))),
    }
}

/// Resolve the `id` path parameter. Ids that are not UUIDs cannot exist.
fn task_id(request: &RouteRequest) -> Result<Uuid, RouteError> {
    let params: TaskIdParams = request.parse_params()?;
    Uuid::parse_str(&params.id)
        .map_err(|_| RouteError::not_found(format!("Task {} not found", params.id)))
}

fn not_found(id: Uuid) -> RouteError {
    RouteError::not_found(format!("Task {id} not found"))
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_tasks(store: Arc<TaskStore>, request: RouteRequest) -> RouteResult {
    request.require_principal()?;
    let query: ListTasksQuery = request.parse_query()?;

    let limit = check_limit(query.limit, 20)?;
    let offset = query.offset.unwrap_or(0);
    let offset = usize::try_from(offset)
        .map_err(|_| RouteError::validation(format!("offset must be >= 0, got {offset}")))?;

    let filter = TaskFilter {
        status: query.status,
        priority: query.priority,
        assigned_to: query.assigned_to,
    };
    let matches = store.find_all(&filter).await;
    let total = matches.len();
    let tasks = matches.into_iter().skip(offset).take(limit).collect();

    RouteResponse::ok(&TaskList {
        tasks,
        total,
        limit,
        offset,
    })
}

pub async fn get_task(store: Arc<TaskStore>, request: RouteRequest) -> RouteResult {
    request.require_principal()?;
    let id = task_id(&request)?;

    match store.find(id).await {
        Some(task) => RouteResponse::ok(&task),
        None => Err(not_found(id)),
    }
}

pub async fn create_task(store: Arc<TaskStore>, request: RouteRequest) -> RouteResult {
    let principal = request.require_principal()?;
    let body: CreateTaskBody = request.parse_body()?;
    check_title(&body.title)?;
    check_description(body.description.as_deref())?;

    let task = store
        .create(NewTask {
            title: body.title,
            description: body.description,
            priority: body.priority.unwrap_or_default(),
            assigned_to: body.assigned_to,
        })
        .await;

    info!(task_id = %task.id, user = %principal.username, "Task created");
    RouteResponse::created(&task)
}

pub async fn update_task(store: Arc<TaskStore>, request: RouteRequest) -> RouteResult {
    request.require_principal()?;
    let id = task_id(&request)?;
    let body: UpdateTaskBody = request.parse_body()?;
    if let Some(title) = &body.title {
        check_title(title)?;
    }
    check_description(body.description.as_deref())?;

    let patch = TaskPatch {
        title: body.title,
        description: body.description,
        status: body.status,
        priority: body.priority,
        assigned_to: body.assigned_to,
    };
    match store.update(id, patch).await {
        Some(task) => RouteResponse::ok(&task),
        None => Err(not_found(id)),
    }
}

pub async fn delete_task(store: Arc<TaskStore>, request: RouteRequest) -> RouteResult {
    let principal = request.require_principal()?;
    let id = task_id(&request)?;

    if store.delete(id).await {
        info!(task_id = %id, user = %principal.username, "Task deleted");
        Ok(RouteResponse::no_content())
    } else {
        Err(not_found(id))
    }
}

/// Case-insensitive match on title and description.
pub async fn search_tasks(store: Arc<TaskStore>, request: RouteRequest) -> RouteResult {
    request.require_principal()?;
    let query: SearchTasksQuery = request.parse_query()?;
    if query.q.trim().is_empty() {
        return Err(RouteError::validation("q must not be empty"));
    }
    let limit = check_limit(query.limit, 10)?;

    let needle = query.q.to_lowercase();
    let tasks: Vec<_> = store
        .find_all(&TaskFilter::default())
        .await
        .into_iter()
        .filter(|t| {
            t.title.to_lowercase().contains(&needle)
                || t
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .take(limit)
        .collect();

    RouteResponse::ok(&TaskSearchResult {
        count: tasks.len(),
        tasks,
        query: query.q,
    })
}

// ============================================================================
// Registration
// ============================================================================

macro_rules! bind {
    ($registry:expr, $store:expr, $operation:literal, $handler:ident) => {{
        let store = $store.clone();
        $registry.register(
            OperationKey::new(GROUP, $operation),
            handler_fn(move |request| $handler(store.clone(), request)),
        );
    }};
}

/// Register every task handler against `store`.
pub fn register(registry: &mut HandlerRegistry, store: Arc<TaskStore>) {
    bind!(registry, store, "listTasks", list_tasks);
    bind!(registry, store, "getTask", get_task);
    bind!(registry, store, "createTask", create_task);
    bind!(registry, store, "updateTask", update_task);
    bind!(registry, store, "deleteTask", delete_task);
    bind!(registry, store, "searchTasks", search_tasks);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::default_contracts;
    use crate::core::auth::{AuthOutcome, CallContext, Principal};
    use serde_json::{Value, json};

    fn authed() -> RouteRequest {
        RouteRequest::new(
            &CallContext::new(),
            AuthOutcome::Authenticated(Principal {
                user_id: "user-123".into(),
                username: "demo".into(),
            }),
        )
    }

    fn body(value: Value) -> Option<rmcp::model::JsonObject> {
        value.as_object().cloned()
    }

    #[test]
    fn test_register_covers_contract() {
        let mut registry = HandlerRegistry::new();
        register(&mut registry, Arc::new(TaskStore::new()));
        assert!(registry.verify_against(&default_contracts()).is_ok());
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = Arc::new(TaskStore::new());
        let mut req = authed();
        req.body = body(json!({ "title": "Buy coffee", "priority": "high" }));
        let created = create_task(store.clone(), req).await.unwrap();
        assert_eq!(created.status, 201);
        let created = created.body.unwrap();
        assert_eq!(created["title"], "Buy coffee");
        assert_eq!(created["priority"], "high");
        assert_eq!(created["status"], "pending");

        let mut req = authed();
        req.params.insert("id".into(), created["id"].clone());
        let fetched = get_task(store, req).await.unwrap();
        assert_eq!(fetched.body.unwrap()["id"], created["id"]);
    }

    #[tokio::test]
    async fn test_create_defaults_priority_and_validates_title() {
        let store = Arc::new(TaskStore::new());
        let mut req = authed();
        req.body = body(json!({ "title": "Plain" }));
        let created = create_task(store.clone(), req).await.unwrap();
        assert_eq!(created.body.unwrap()["priority"], "medium");

        let mut req = authed();
        req.body = body(json!({ "title": "" }));
        let err = create_task(store.clone(), req).await.unwrap_err();
        assert_eq!(err.status, Some(400));

        let err = create_task(store, authed()).await.unwrap_err();
        assert_eq!(err.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unauthenticated_create_has_no_side_effect() {
        let store = Arc::new(TaskStore::new());
        let mut req = RouteRequest::new(&CallContext::new(), AuthOutcome::Missing);
        req.body = body(json!({ "title": "Sneaky" }));
        let err = create_task(store.clone(), req).await.unwrap_err();
        assert_eq!(err.status, Some(401));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_unknown_and_malformed_ids() {
        let store = Arc::new(TaskStore::seeded());
        let mut req = authed();
        req.params.insert("id".into(), json!(Uuid::new_v4().to_string()));
        assert_eq!(get_task(store.clone(), req).await.unwrap_err().status, Some(404));

        let mut req = authed();
        req.params.insert("id".into(), json!("not-a-uuid"));
        let err = get_task(store, req).await.unwrap_err();
        assert_eq!(err.status, Some(404));
        assert!(err.message.contains("not-a-uuid"));
    }

    #[tokio::test]
    async fn test_list_with_string_query_values() {
        let store = Arc::new(TaskStore::seeded());
        let mut req = authed();
        req.query.insert("limit".into(), json!("2"));
        req.query.insert("offset".into(), json!("1"));
        let response = list_tasks(store.clone(), req).await.unwrap().body.unwrap();
        assert_eq!(response["tasks"].as_array().unwrap().len(), 2);
        assert_eq!(response["total"], 5);
        assert_eq!(response["offset"], 1);

        let mut req = authed();
        req.query.insert("limit".into(), json!(500));
        assert_eq!(list_tasks(store, req).await.unwrap_err().status, Some(400));
    }

    #[tokio::test]
    async fn test_list_echoes_large_offset() {
        let store = Arc::new(TaskStore::seeded());
        let mut req = authed();
        req.query.insert("offset".into(), json!("4294967297"));
        let response = list_tasks(store.clone(), req).await.unwrap().body.unwrap();
        assert_eq!(response["offset"], 4_294_967_297u64);
        assert_eq!(response["total"], 5);
        assert!(response["tasks"].as_array().unwrap().is_empty());

        let mut req = authed();
        req.query.insert("offset".into(), json!(-1));
        let err = list_tasks(store, req).await.unwrap_err();
        assert_eq!(err.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = Arc::new(TaskStore::seeded());
        let first = store.find_all(&TaskFilter::default()).await.remove(0);

        let mut req = authed();
        req.params.insert("id".into(), json!(&first.id));
        req.body = body(json!({ "status": "completed" }));
        let updated = update_task(store.clone(), req).await.unwrap().body.unwrap();
        assert_eq!(updated["status"], "completed");
        assert!(updated.get("completed_at").is_some());

        let mut req = authed();
        req.params.insert("id".into(), json!(&first.id));
        let deleted = delete_task(store.clone(), req).await.unwrap();
        assert_eq!(deleted.status, 204);
        assert!(deleted.body.is_none());
        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn test_search() {
        let store = Arc::new(TaskStore::seeded());
        let mut req = authed();
        req.query.insert("q".into(), json!("SNACK"));
        let result = search_tasks(store.clone(), req).await.unwrap().body.unwrap();
        assert_eq!(result["count"], 1);
        assert_eq!(result["query"], "SNACK");

        let mut req = authed();
        req.query.insert("q".into(), json!("  "));
        assert_eq!(search_tasks(store, req).await.unwrap_err().status, Some(400));
    }
}
