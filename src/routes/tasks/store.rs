//! Persistence boundary for tasks.
//!
//! [`TaskStore`] is what the service talks to. [`InMemoryTaskStore`] backs
//! development runs without a database and the test suite; the postgres
//! implementation lives in `queries`.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use super::model::{Task, TaskPriority, TaskStatus};

pub const TITLE_MAX_CHARS: usize = 255;

/// Fully validated fields of a task that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: NaiveDate,
}

/// Fields to merge into an existing task. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid task row: {0}")]
    Invalid(String),

    #[error("task not found: {0}")]
    NotFound(Uuid),

    #[error("stored task is unreadable: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persists a new task, generating its id and both timestamps.
    async fn insert(&self, task: NewTask) -> StoreResult<Task>;

    /// Fails with [`StoreError::NotFound`] when no task has this id.
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Task>;

    /// Merges `changes` into the task and refreshes `updated_at`.
    async fn update(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Task>;

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<()>;

    /// Every task, in a stable order.
    async fn list_all(&self) -> StoreResult<Vec<Task>>;
}

/// Next `updated_at` for a mutation, strictly after the previous value even
/// when the clock has not moved.
pub fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn check_title(title: &str) -> StoreResult<()> {
    if title.is_empty() || title.chars().count() > TITLE_MAX_CHARS {
        return Err(StoreError::Invalid(format!(
            "title must be between 1 and {TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

/// Thread-safe task store kept in process memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<Vec<Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(err: E) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: NewTask) -> StoreResult<Task> {
        check_title(&task.title)?;

        let mut tasks = self.tasks.write().map_err(poisoned)?;
        let now = Utc::now();
        let mut id = Uuid::new_v4();
        while tasks.iter().any(|t| t.id == id) {
            id = Uuid::new_v4();
        }

        let created = Task {
            id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            created_at: now,
            updated_at: now,
        };
        tasks.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Task> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Task> {
        if let Some(title) = &changes.title {
            check_title(title)?;
        }

        let mut tasks = self.tasks.write().map_err(poisoned)?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;

        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        if let Some(priority) = changes.priority {
            task.priority = priority;
        }
        if let Some(due_date) = changes.due_date {
            task.due_date = due_date;
        }
        task.updated_at = next_updated_at(task.updated_at, Utc::now());

        Ok(task.clone())
    }

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<()> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        let position = tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        tasks.remove(position);
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<Task>> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        Ok(tasks.clone())
    }
}
