//! `tasks` table
//!
//! A task is `running` from creation until it is finished. Registration with
//! `check_running` is a single conditional insert, so two processes racing
//! for the same task type cannot both succeed.

use crate::error::Result;
use crate::timestamps::{from_stored, to_stored};
use chrono::{Local, NaiveDateTime};
use recsync_core::types::{TaskId, TaskOutcome, TaskRegistration};
use sqlx::SqlitePool;

/// Status of a task that has not finished
pub const STATUS_RUNNING: &str = "running";

/// A row of the `tasks` table
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub id: TaskId,
    pub task_type: String,
    pub status: String,
    pub completion_percentage: f64,
    pub created_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
}

/// Register a task of `task_type`
pub async fn create(
    pool: &SqlitePool,
    task_type: &str,
    check_running: bool,
) -> Result<TaskRegistration> {
    let now = to_stored(Local::now().naive_local());

    let result = if check_running {
        sqlx::query(
            "INSERT INTO tasks (task_type, status, completion_percentage, created_at)
             SELECT ?, ?, 0, ?
             WHERE NOT EXISTS (SELECT 1 FROM tasks WHERE task_type = ? AND status = ?)",
        )
        .bind(task_type)
        .bind(STATUS_RUNNING)
        .bind(now)
        .bind(task_type)
        .bind(STATUS_RUNNING)
        .execute(pool)
        .await?
    } else {
        sqlx::query(
            "INSERT INTO tasks (task_type, status, completion_percentage, created_at)
             VALUES (?, ?, 0, ?)",
        )
        .bind(task_type)
        .bind(STATUS_RUNNING)
        .bind(now)
        .execute(pool)
        .await?
    };

    if result.rows_affected() == 0 {
        return Ok(TaskRegistration::AlreadyRunning);
    }
    Ok(TaskRegistration::Created(result.last_insert_rowid()))
}

pub async fn update_percentage(pool: &SqlitePool, id: TaskId, percent: f64) -> Result<()> {
    sqlx::query("UPDATE tasks SET completion_percentage = ? WHERE id = ?")
        .bind(percent)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Close a task with its final status
pub async fn finish(pool: &SqlitePool, id: TaskId, outcome: TaskOutcome) -> Result<()> {
    let now = to_stored(Local::now().naive_local());
    let completed = matches!(outcome, TaskOutcome::Completed);

    sqlx::query(
        "UPDATE tasks SET status = ?, finished_at = ?,
            completion_percentage = CASE WHEN ? THEN 100 ELSE completion_percentage END
         WHERE id = ?",
    )
    .bind(outcome.as_str())
    .bind(now)
    .bind(completed)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_by_id(pool: &SqlitePool, id: TaskId) -> Result<Option<TaskRow>> {
    let row = sqlx::query_as::<_, (i64, String, String, f64, i64, Option<i64>)>(
        "SELECT id, task_type, status, completion_percentage, created_at, finished_at
         FROM tasks WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some((id, task_type, status, completion_percentage, created_at, finished_at)) = row else {
        return Ok(None);
    };

    Ok(Some(TaskRow {
        id,
        task_type,
        status,
        completion_percentage,
        created_at: from_stored("created_at", created_at)?,
        finished_at: finished_at
            .map(|secs| from_stored("finished_at", secs))
            .transpose()?,
    }))
}
