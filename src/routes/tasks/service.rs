//! Task rules: input validation, defaulting, and translating every storage
//! failure into a [`TaskError`].

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use super::dto::{CreateTask, UpdateTask};
use super::model::{InvalidChoice, Task, TaskPriority, TaskStatus};
use super::store::{NewTask, StoreError, TaskChanges, TaskStore, TITLE_MAX_CHARS};

pub const CREATE_FAILED: &str = "Failed to create task";
pub const RETRIEVE_FAILED: &str = "Failed to retrieve task";
pub const UPDATE_FAILED: &str = "Failed to update task";
pub const DELETE_FAILED: &str = "Failed to delete task";
pub const LIST_FAILED: &str = "Failed to list tasks";

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_MESSAGE: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field that failed validation in one request, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }

    fn check<T>(&mut self, field: &'static str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }

    fn required<T>(
        &mut self,
        field: &'static str,
        raw: Option<String>,
        parse: fn(String) -> Result<T, String>,
    ) -> Option<T> {
        match raw {
            Some(raw) => self.check(field, parse(raw)),
            None => {
                self.add(field, "This field is required.");
                None
            }
        }
    }

    fn optional<T>(
        &mut self,
        field: &'static str,
        raw: Option<String>,
        parse: fn(String) -> Result<T, String>,
    ) -> Option<Option<T>> {
        match raw {
            Some(raw) => self.check(field, parse(raw)).map(Some),
            None => Some(None),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&fields)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("invalid task data ({0})")]
    Validation(ValidationErrors),

    #[error("Task not found")]
    NotFound,

    /// The underlying cause has already been logged.
    #[error("{0}")]
    Service(&'static str),
}

pub type TaskResult<T> = Result<T, TaskError>;

const NUL_MESSAGE: &str = "Null characters are not allowed.";

fn parse_title(raw: String) -> Result<String, String> {
    let title = raw.trim();
    if title.contains('\0') {
        return Err(NUL_MESSAGE.into());
    }
    if title.is_empty() {
        return Err("This field may not be blank.".into());
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(format!(
            "Ensure this field has no more than {TITLE_MAX_CHARS} characters."
        ));
    }
    Ok(title.to_string())
}

fn parse_description(raw: String) -> Result<String, String> {
    if raw.contains('\0') {
        return Err(NUL_MESSAGE.into());
    }
    Ok(raw)
}

fn parse_status(raw: String) -> Result<TaskStatus, String> {
    raw.parse().map_err(|e: InvalidChoice| e.to_string())
}

fn parse_priority(raw: String) -> Result<TaskPriority, String> {
    raw.parse().map_err(|e: InvalidChoice| e.to_string())
}

// Exactly YYYY-MM-DD, zero padded, year 1 through 9999.
fn is_iso_date_shape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
        && &raw[..4] != "0000"
}

fn parse_due_date(raw: String) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    if !is_iso_date_shape(raw) {
        return Err(DATE_MESSAGE.into());
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| DATE_MESSAGE.into())
}

/// Checks a create request, defaulting `status` to To Do and `description`
/// to empty.
pub fn validate_new_task(input: CreateTask) -> Result<NewTask, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let title = errors.required("title", input.title, parse_title);
    let description = errors
        .optional("description", input.description, parse_description)
        .map(Option::unwrap_or_default);
    let status = errors
        .optional("status", input.status, parse_status)
        .map(Option::unwrap_or_default);
    let priority = errors.required("priority", input.priority, parse_priority);
    let due_date = errors.required("due_date", input.due_date, parse_due_date);

    match (title, description, status, priority, due_date) {
        (Some(title), Some(description), Some(status), Some(priority), Some(due_date))
            if errors.is_empty() =>
        {
            Ok(NewTask {
                title,
                description,
                status,
                priority,
                due_date,
            })
        }
        _ => Err(errors),
    }
}

/// Checks only the fields present in an update request.
pub fn validate_changes(input: UpdateTask) -> Result<TaskChanges, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let title = errors.optional("title", input.title, parse_title);
    let description = errors.optional("description", input.description, parse_description);
    let status = errors.optional("status", input.status, parse_status);
    let priority = errors.optional("priority", input.priority, parse_priority);
    let due_date = errors.optional("due_date", input.due_date, parse_due_date);

    match (title, description, status, priority, due_date) {
        (Some(title), Some(description), Some(status), Some(priority), Some(due_date))
            if errors.is_empty() =>
        {
            Ok(TaskChanges {
                title,
                description,
                status,
                priority,
                due_date,
            })
        }
        _ => Err(errors),
    }
}

// Ids that are not UUIDs can never have been issued, so they are simply absent.
fn parse_id(id: &str) -> TaskResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| {
        tracing::debug!(id, "task id is not a uuid");
        TaskError::NotFound
    })
}

fn service_failure(message: &'static str, err: StoreError) -> TaskError {
    tracing::error!(error = %err, "{message}");
    TaskError::Service(message)
}

fn lookup_failure(message: &'static str, err: StoreError) -> TaskError {
    match err {
        StoreError::NotFound(id) => {
            tracing::debug!(%id, "task not found");
            TaskError::NotFound
        }
        other => service_failure(message, other),
    }
}

fn invalid(errors: ValidationErrors) -> TaskError {
    tracing::warn!(fields = ?errors.fields(), "rejected task input");
    TaskError::Validation(errors)
}

/// Stateless front door to a shared [`TaskStore`].
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, input: CreateTask) -> TaskResult<Task> {
        let new_task = validate_new_task(input).map_err(invalid)?;

        let task = self
            .store
            .insert(new_task)
            .await
            .map_err(|e| service_failure(CREATE_FAILED, e))?;

        tracing::info!(id = %task.id, "task created");
        Ok(task)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_task(&self, id: &str) -> TaskResult<Task> {
        let id = parse_id(id)?;
        self.store
            .find_by_id(id)
            .await
            .map_err(|e| lookup_failure(RETRIEVE_FAILED, e))
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_task(&self, id: &str, input: UpdateTask) -> TaskResult<Task> {
        let id = parse_id(id)?;
        self.store
            .find_by_id(id)
            .await
            .map_err(|e| lookup_failure(UPDATE_FAILED, e))?;

        let changes = validate_changes(input).map_err(invalid)?;

        // A concurrent delete between the lookup and here still reads as not found.
        let task = self
            .store
            .update(id, changes)
            .await
            .map_err(|e| lookup_failure(UPDATE_FAILED, e))?;

        tracing::info!(id = %task.id, "task updated");
        Ok(task)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, id: &str) -> TaskResult<()> {
        let id = parse_id(id)?;
        self.store
            .delete_by_id(id)
            .await
            .map_err(|e| lookup_failure(DELETE_FAILED, e))?;

        tracing::info!(%id, "task deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_tasks(&self) -> TaskResult<Vec<Task>> {
        self.store
            .list_all()
            .await
            .map_err(|e| service_failure(LIST_FAILED, e))
    }
}
