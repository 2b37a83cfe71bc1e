use crate::domain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Wire representation of a task's completion state
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(test, derive(Debug))]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl From<domain::task::TaskStatus> for TaskStatus {
    fn from(value: domain::task::TaskStatus) -> Self {
        match value {
            domain::task::TaskStatus::Pending => TaskStatus::Pending,
            domain::task::TaskStatus::Completed => TaskStatus::Completed,
        }
    }
}

impl From<TaskStatus> for domain::task::TaskStatus {
    fn from(value: TaskStatus) -> Self {
        match value {
            TaskStatus::Pending => domain::task::TaskStatus::Pending,
            TaskStatus::Completed => domain::task::TaskStatus::Completed,
        }
    }
}

/// DTO for a returned task on the API. Completion appears both as the status enum
/// and as the boolean flag so clients built against either representation keep
/// working; the two always agree.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct Task {
    #[schema(example = 10)]
    pub id: i64,
    #[schema(example = 4)]
    pub user_id: i64,
    #[schema(example = "Buy milk")]
    pub title: String,
    #[schema(example = "Two bottles, whole")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<domain::task::Task> for Task {
    fn from(value: domain::task::Task) -> Self {
        Task {
            id: value.id,
            user_id: value.owner_user_id,
            title: value.title,
            description: value.description,
            status: value.status.into(),
            completed: value.status.is_completed(),
            created_at: value.created_at,
        }
    }
}

/// DTO for creating a new task via the API
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct NewTask {
    #[validate(length(min = 1))]
    #[schema(example = "Buy milk")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<NewTask> for domain::task::NewTask {
    fn from(value: NewTask) -> Self {
        domain::task::NewTask {
            title: value.title,
            description: value.description,
        }
    }
}

/// DTO for replacing a task's status via the API
#[derive(Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct SetTaskStatus {
    pub status: TaskStatus,
}

/// DTO reporting a task's status after a toggle or overwrite
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct TaskStatusResponse {
    pub status: TaskStatus,
}
