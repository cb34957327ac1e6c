//! In-memory task store.
//!
//! Stands in for a real database. Provides its own consistency through a
//! single `RwLock`; callers never hold the lock across an await.

use chrono::{SecondsFormat, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::contracts::tasks::{Task, TaskPriority, TaskStatus};

/// Filters for [`TaskStore::find_all`].
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<String>,
}

/// Fields of a task being created.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub assigned_to: Option<String>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<String>,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Task storage keyed by id.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl TaskStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the sample tasks.
    pub fn seeded() -> Self {
        let samples = [
            ("Refill the kombucha kegerator", TaskStatus::Pending, TaskPriority::High, Some("alice")),
            ("Update API documentation", TaskStatus::InProgress, TaskPriority::Medium, Some("bob")),
            ("Stock the snack wall", TaskStatus::Pending, TaskPriority::High, Some("charlie")),
            ("Book the rooftop for all-hands", TaskStatus::Pending, TaskPriority::Low, None),
            ("Set up GitHub Actions", TaskStatus::InProgress, TaskPriority::High, Some("alice")),
        ];

        let tasks = samples
            .into_iter()
            .map(|(title, status, priority, assigned_to)| {
                let id = Uuid::new_v4();
                let timestamp = now();
                let task = Task {
                    id: id.to_string(),
                    title: title.to_string(),
                    description: None,
                    status,
                    priority,
                    assigned_to: assigned_to.map(str::to_string),
                    created_at: timestamp.clone(),
                    updated_at: timestamp,
                    completed_at: None,
                };
                (id, task)
            })
            .collect();

        Self {
            tasks: RwLock::new(tasks),
        }
    }

    /// Matching tasks, most urgent first, then newest first.
    pub async fn find_all(&self, filter: &TaskFilter) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        let mut matches: Vec<Task> = tasks
            .values()
            .filter(|t| filter.status.is_none_or(|s| t.status == s))
            .filter(|t| filter.priority.is_none_or(|p| t.priority == p))
            .filter(|t| {
                filter
                    .assigned_to
                    .as_deref()
                    .is_none_or(|a| t.assigned_to.as_deref() == Some(a))
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            a.priority
                .rank()
                .cmp(&b.priority.rank())
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.title.cmp(&b.title))
        });
        matches
    }

    pub async fn find(&self, id: Uuid) -> Option<Task> {
        self.tasks.read().await.get(&id).cloned()
    }

    pub async fn create(&self, new_task: NewTask) -> Task {
        let id = Uuid::new_v4();
        let timestamp = now();
        let task = Task {
            id: id.to_string(),
            title: new_task.title,
            description: new_task.description,
            status: TaskStatus::Pending,
            priority: new_task.priority,
            assigned_to: new_task.assigned_to,
            created_at: timestamp.clone(),
            updated_at: timestamp,
            completed_at: None,
        };
        self.tasks.write().await.insert(id, task.clone());
        task
    }

    /// Apply a patch. Returns `None` if the task does not exist.
    pub async fn update(&self, id: Uuid, patch: TaskPatch) -> Option<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id)?;

        if let Some(title) = patch.title {
            task.title = title;
        }
        if patch.description.is_some() {
            task.description = patch.description;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if patch.assigned_to.is_some() {
            task.assigned_to = patch.assigned_to;
        }
        let timestamp = now();
        if let Some(status) = patch.status {
            task.completed_at = match status {
                TaskStatus::Completed if task.status != TaskStatus::Completed => {
                    Some(timestamp.clone())
                }
                TaskStatus::Completed => task.completed_at.take(),
                _ => None,
            };
            task.status = status;
        }
        task.updated_at = timestamp;

        Some(task.clone())
    }

    pub async fn delete(&self, id: Uuid) -> bool {
        self.tasks.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_task(title: &str, priority: TaskPriority) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: None,
            priority,
            assigned_to: None,
        }
    }

    #[tokio::test]
    async fn test_seeded_store() {
        let store = TaskStore::seeded();
        assert_eq!(store.len().await, 5);

        let all = store.find_all(&TaskFilter::default()).await;
        assert_eq!(all.first().unwrap().priority, TaskPriority::High);
        assert_eq!(all.last().unwrap().priority, TaskPriority::Low);
    }

    #[tokio::test]
    async fn test_filters() {
        let store = TaskStore::seeded();
        let alice = store
            .find_all(&TaskFilter {
                assigned_to: Some("alice".into()),
                ..Default::default()
            })
            .await;
        assert_eq!(alice.len(), 2);

        let in_progress = store
            .find_all(&TaskFilter {
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            })
            .await;
        assert!(in_progress.iter().all(|t| t.status == TaskStatus::InProgress));
        assert_eq!(in_progress.len(), 2);
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let store = TaskStore::new();
        let task = store.create(new_task("Buy coffee", TaskPriority::High)).await;
        assert_eq!(task.status, TaskStatus::Pending);
        let id = Uuid::parse_str(&task.id).unwrap();

        let updated = store
            .update(
                id,
                TaskPatch {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
        assert!(updated.completed_at.is_some());
        assert_eq!(updated.title, "Buy coffee");

        let reopened = store
            .update(
                id,
                TaskPatch {
                    status: Some(TaskStatus::Pending),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(reopened.completed_at.is_none());

        assert!(store.delete(id).await);
        assert!(!store.delete(id).await);
        assert!(store.find(id).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_missing_task() {
        let store = TaskStore::new();
        assert!(store.update(Uuid::new_v4(), TaskPatch::default()).await.is_none());
    }
}
