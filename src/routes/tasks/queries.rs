use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::{Task, TaskRow};
use super::store::{NewTask, StoreError, StoreResult, TaskChanges, TaskStore};

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, due_date, created_at, updated_at";

/// [`TaskStore`] over the `tasks` table.
#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_task(row: TaskRow) -> StoreResult<Task> {
    Task::try_from(row).map_err(|e| StoreError::Corrupt(e.to_string()))
}

// Rejected row data: check_violation, not_null_violation,
// string_data_right_truncation, datetime_field_overflow, character_not_in_repertoire
const INVALID_ROW_CODES: [&str; 5] = ["23514", "23502", "22001", "22008", "22021"];

fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err
            .code()
            .is_some_and(|code| INVALID_ROW_CODES.contains(&code.as_ref()))
        {
            return StoreError::Invalid(db_err.message().to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn insert(&self, task: NewTask) -> StoreResult<Task> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks (id, title, description, status, priority, due_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        into_task(row)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Task> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_task).unwrap_or(Err(StoreError::NotFound(id)))
    }

    async fn update(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Task> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE tasks
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                due_date = COALESCE($6, due_date),
                updated_at = GREATEST(NOW(), updated_at + INTERVAL '1 microsecond')
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.priority.map(|p| p.as_str()))
        .bind(changes.due_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        row.map(into_task).unwrap_or(Err(StoreError::NotFound(id)))
    }

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(into_task).collect()
    }
}
