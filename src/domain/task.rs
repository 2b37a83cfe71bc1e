use crate::domain;
use crate::domain::task::driven_ports::{TaskReader, TaskWriter};
use crate::domain::task::driving_ports::TaskError;
use crate::external_connections::ExternalConnectivity;
use chrono::{DateTime, Utc};
use std::str::FromStr;
use thiserror::Error;
use tracing::error;

/// A task's two-state completion flag. Storage substrates model this differently
/// (a string enum in SQL, a boolean elsewhere), so adapters convert at their
/// boundary and everything inside the domain speaks this type.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn is_completed(self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    pub fn toggled(self) -> TaskStatus {
        match self {
            TaskStatus::Pending => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn from_completion_flag(completed: bool) -> TaskStatus {
        if completed {
            TaskStatus::Completed
        } else {
            TaskStatus::Pending
        }
    }
}

#[derive(Debug, Error)]
#[error("unrecognized task status: {0}")]
pub struct UnknownStatus(String);

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct Task {
    pub id: i64,
    pub owner_user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(test, derive(Clone))]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
}

pub mod driven_ports {
    use super::*;

    pub trait TaskReader {
        /// A user's tasks ordered by creation time, newest first
        async fn tasks_for_user(
            &self,
            user_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, anyhow::Error>;
        async fn task_by_id(
            &self,
            task_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;
    }

    pub trait TaskWriter {
        /// Persists a new pending task owned by [user_id]
        async fn create_task_for_user(
            &self,
            user_id: i64,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Task, anyhow::Error>;

        /// Overwrites a task's completion state, returning the updated task or
        /// None when no task has the given ID
        async fn set_status(
            &self,
            task_id: i64,
            status: TaskStatus,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    #[derive(Debug, Error)]
    pub enum TaskError {
        #[error("The specified user did not exist.")]
        UserDoesNotExist,
        #[error("The specified task did not exist.")]
        TaskDoesNotExist,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    impl From<domain::user::UserExistsErr> for TaskError {
        fn from(value: domain::user::UserExistsErr) -> Self {
            match value {
                domain::user::UserExistsErr::UserDoesNotExist(user_id) => {
                    error!("User {} didn't exist for a task operation.", user_id);
                    TaskError::UserDoesNotExist
                }
                domain::user::UserExistsErr::PortError(err) => {
                    TaskError::from(err.context("Checking a task's owner"))
                }
            }
        }
    }


    pub trait TaskPort {
        async fn tasks_for_user(
            &self,
            user_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<Task>, TaskError>;
        async fn create_task_for_user(
            &self,
            user_id: i64,
            task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            u_detect: &impl domain::user::driven_ports::DetectUser,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, TaskError>;
        async fn toggle_task(
            &self,
            task_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, TaskError>;
        async fn set_task_status(
            &self,
            task_id: i64,
            status: TaskStatus,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, TaskError>;
    }
}

pub struct TaskService {}

impl driving_ports::TaskPort for TaskService {
    async fn tasks_for_user(
        &self,
        user_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<Vec<Task>, TaskError> {
        let tasks = task_read.tasks_for_user(user_id, &mut *ext_cxn).await?;

        Ok(tasks)
    }

    async fn create_task_for_user(
        &self,
        user_id: i64,
        task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        u_detect: &impl domain::user::driven_ports::DetectUser,
        task_write: &impl TaskWriter,
    ) -> Result<Task, TaskError> {
        domain::user::verify_user_exists(user_id, &mut *ext_cxn, u_detect).await?;
        let created_task = task_write
            .create_task_for_user(user_id, task, &mut *ext_cxn)
            .await?;
        Ok(created_task)
    }

    async fn toggle_task(
        &self,
        task_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
        task_write: &impl TaskWriter,
    ) -> Result<Task, TaskError> {
        let Some(current_task) = task_read.task_by_id(task_id, &mut *ext_cxn).await? else {
            return Err(TaskError::TaskDoesNotExist);
        };

        // Read then write as two separate statements; a toggle racing this one
        // between them is lost (last write wins).
        let updated_task = task_write
            .set_status(task_id, current_task.status.toggled(), &mut *ext_cxn)
            .await?;

        updated_task.ok_or(TaskError::TaskDoesNotExist)
    }

    async fn set_task_status(
        &self,
        task_id: i64,
        status: TaskStatus,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<Task, TaskError> {
        let updated_task = task_write.set_status(task_id, status, &mut *ext_cxn).await?;

        updated_task.ok_or(TaskError::TaskDoesNotExist)
    }
}
