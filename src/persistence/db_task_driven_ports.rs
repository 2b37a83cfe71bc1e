use crate::domain;
use crate::domain::task::{NewTask, Task, TaskStatus};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;

#[derive(FromRow)]
struct TaskRow {
    id: i64,
    user_id: i64,
    title: String,
    description: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = anyhow::Error;

    fn try_from(value: TaskRow) -> Result<Self, Self::Error> {
        let status = TaskStatus::from_str(&value.status)
            .with_context(|| format!("reading the status of task {}", value.id))?;

        Ok(Task {
            id: value.id,
            owner_user_id: value.user_id,
            title: value.title,
            description: value.description,
            status,
            created_at: value.created_at,
        })
    }
}

pub struct DbTaskReader {}

impl domain::task::driven_ports::TaskReader for DbTaskReader {
    async fn tasks_for_user(
        &self,
        user_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Task>, anyhow::Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let tasks: Vec<Task> = sqlx::query_as::<_, TaskRow>(
            "SELECT t.id, t.user_id, t.title, t.description, t.status, t.created_at \
             FROM tasks t \
             WHERE t.user_id = ? \
             ORDER BY t.created_at DESC, t.id DESC",
        )
        .bind(user_id)
        .fetch_all(cxn_handle.borrow_connection())
        .await
        .context("Fetching tasks for a user")?
        .into_iter()
        .map(Task::try_from)
        .collect::<Result<_, _>>()?;

        Ok(tasks)
    }

    async fn task_by_id(
        &self,
        task_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, anyhow::Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let task_row = sqlx::query_as::<_, TaskRow>(
            "SELECT t.id, t.user_id, t.title, t.description, t.status, t.created_at \
             FROM tasks t \
             WHERE t.id = ?",
        )
        .bind(task_id)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching a task by ID")?;

        task_row.map(Task::try_from).transpose()
    }
}

pub struct DbTaskWriter {}

impl domain::task::driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task_for_user(
        &self,
        user_id: i64,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Task, anyhow::Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let created_row = sqlx::query_as::<_, TaskRow>(
            "INSERT INTO tasks (user_id, title, description) VALUES (?, ?, ?) \
             RETURNING id, user_id, title, description, status, created_at",
        )
        .bind(user_id)
        .bind(&new_task.title)
        .bind(new_task.description.as_deref())
        .fetch_one(cxn_handle.borrow_connection())
        .await
        .context("Inserting a new task")?;

        created_row.try_into()
    }

    async fn set_status(
        &self,
        task_id: i64,
        status: TaskStatus,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, anyhow::Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let updated_row = sqlx::query_as::<_, TaskRow>(
            "UPDATE tasks SET status = ? WHERE id = ? \
             RETURNING id, user_id, title, description, status, created_at",
        )
        .bind(status.as_str())
        .bind(task_id)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Updating a task's status")?;

        updated_row.map(Task::try_from).transpose()
    }
}
