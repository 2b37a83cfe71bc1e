use crate::domain;
use crate::domain::task::{NewTask, Task, TaskStatus};
use crate::domain::user::{CreateUser, User, UserWithTaskCount};
use crate::external_connections::ExternalConnectivity;
use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Connection details for the hosted backend. The service speaks a PostgREST-style
/// dialect: each logical relation is a resource under `/rest/v1`, filters are query
/// parameters (`id=eq.4`), and writes only echo the affected rows back when asked
/// to via the `Prefer` header.
#[derive(Clone)]
pub struct HostedApiConfig {
    pub base_url: String,
    pub api_key: String,
}

impl HostedApiConfig {
    fn collection_url(&self, relation: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), relation)
    }

    fn authorize(
        &self,
        request: reqwest_middleware::RequestBuilder,
    ) -> reqwest_middleware::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

const RETURN_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

#[derive(Deserialize)]
struct ApiUser {
    id: i64,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<ApiUser> for User {
    fn from(value: ApiUser) -> Self {
        User {
            id: value.id,
            name: value.name,
            email: value.email,
            created_at: value.created_at,
        }
    }
}

#[derive(Deserialize)]
struct EmbeddedCount {
    count: i64,
}

/// A user row with the task count aggregation embedded by `select=*,tasks(count)`
#[derive(Deserialize)]
struct ApiUserWithCount {
    #[serde(flatten)]
    user: ApiUser,
    #[serde(default)]
    tasks: Vec<EmbeddedCount>,
}

#[derive(Deserialize)]
struct ApiRowId {
    #[allow(dead_code)]
    id: i64,
}

/// The hosted backend models completion as a boolean column, so tasks convert
/// to and from [TaskStatus] right here at the adapter boundary.
#[derive(Serialize, Deserialize)]
struct ApiTask {
    id: i64,
    user_id: i64,
    title: String,
    description: Option<String>,
    completed: bool,
    created_at: DateTime<Utc>,
}

impl From<ApiTask> for Task {
    fn from(value: ApiTask) -> Self {
        Task {
            id: value.id,
            owner_user_id: value.user_id,
            title: value.title,
            description: value.description,
            status: TaskStatus::from_completion_flag(value.completed),
            created_at: value.created_at,
        }
    }
}

pub struct HostedApiUsers<'cfg> {
    pub config: &'cfg HostedApiConfig,
}

impl domain::user::driven_ports::UserReader for HostedApiUsers<'_> {
    async fn all_with_task_counts(
        &self,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<UserWithTaskCount>, anyhow::Error> {
        let request = ext_cxn
            .http_client()
            .get(self.config.collection_url("users"))
            .query(&[("select", "*,tasks(count)"), ("order", "created_at.desc")]);

        let rows: Vec<ApiUserWithCount> = self
            .config
            .authorize(request)
            .send()
            .await
            .context("Requesting users with task counts from the hosted backend")?
            .error_for_status()
            .context("Hosted backend rejected the user list request")?
            .json()
            .await
            .context("Decoding the hosted backend's user list")?;

        Ok(rows
            .into_iter()
            .map(|row| UserWithTaskCount {
                task_count: row.tasks.first().map(|embedded| embedded.count).unwrap_or(0),
                user: row.user.into(),
            })
            .collect())
    }
}

impl domain::user::driven_ports::UserWriter for HostedApiUsers<'_> {
    async fn create_user(
        &self,
        user: &CreateUser,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<User, anyhow::Error> {
        let request = ext_cxn
            .http_client()
            .post(self.config.collection_url("users"))
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(&json!([{
                "name": user.name,
                "email": user.email,
            }]));

        let mut created: Vec<ApiUser> = self
            .config
            .authorize(request)
            .send()
            .await
            .context("Creating a user on the hosted backend")?
            .error_for_status()
            .context("Hosted backend rejected the user insert")?
            .json()
            .await
            .context("Decoding the created user")?;

        if created.is_empty() {
            return Err(anyhow!("hosted backend returned no representation of the created user"));
        }
        Ok(created.remove(0).into())
    }
}

impl domain::user::driven_ports::DetectUser for HostedApiUsers<'_> {
    async fn user_exists(
        &self,
        user_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, anyhow::Error> {
        let request = ext_cxn
            .http_client()
            .get(self.config.collection_url("users"))
            .query(&[
                ("select", "id".to_owned()),
                ("id", format!("eq.{user_id}")),
                ("limit", "1".to_owned()),
            ]);

        let matches: Vec<ApiRowId> = self
            .config
            .authorize(request)
            .send()
            .await
            .context("Looking up a user by ID on the hosted backend")?
            .error_for_status()
            .context("Hosted backend rejected the user lookup")?
            .json()
            .await
            .context("Decoding the user lookup result")?;

        Ok(!matches.is_empty())
    }

    async fn user_with_email_exists(
        &self,
        email: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, anyhow::Error> {
        let request = ext_cxn
            .http_client()
            .get(self.config.collection_url("users"))
            .query(&[
                ("select", "id".to_owned()),
                ("email", format!("eq.{email}")),
                ("limit", "1".to_owned()),
            ]);

        let matches: Vec<ApiRowId> = self
            .config
            .authorize(request)
            .send()
            .await
            .context("Looking up a user by email on the hosted backend")?
            .error_for_status()
            .context("Hosted backend rejected the email lookup")?
            .json()
            .await
            .context("Decoding the email lookup result")?;

        Ok(!matches.is_empty())
    }
}

pub struct HostedApiTasks<'cfg> {
    pub config: &'cfg HostedApiConfig,
}

impl domain::task::driven_ports::TaskReader for HostedApiTasks<'_> {
    async fn tasks_for_user(
        &self,
        user_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Task>, anyhow::Error> {
        let request = ext_cxn
            .http_client()
            .get(self.config.collection_url("tasks"))
            .query(&[
                ("select", "*".to_owned()),
                ("user_id", format!("eq.{user_id}")),
                ("order", "created_at.desc".to_owned()),
            ]);

        let rows: Vec<ApiTask> = self
            .config
            .authorize(request)
            .send()
            .await
            .context("Requesting a user's tasks from the hosted backend")?
            .error_for_status()
            .context("Hosted backend rejected the task list request")?
            .json()
            .await
            .context("Decoding the hosted backend's task list")?;

        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn task_by_id(
        &self,
        task_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, anyhow::Error> {
        let request = ext_cxn
            .http_client()
            .get(self.config.collection_url("tasks"))
            .query(&[
                ("select", "*".to_owned()),
                ("id", format!("eq.{task_id}")),
                ("limit", "1".to_owned()),
            ]);

        let mut rows: Vec<ApiTask> = self
            .config
            .authorize(request)
            .send()
            .await
            .context("Requesting a task by ID from the hosted backend")?
            .error_for_status()
            .context("Hosted backend rejected the task lookup")?
            .json()
            .await
            .context("Decoding the task lookup result")?;

        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0).into()))
        }
    }
}

impl domain::task::driven_ports::TaskWriter for HostedApiTasks<'_> {
    async fn create_task_for_user(
        &self,
        user_id: i64,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Task, anyhow::Error> {
        let request = ext_cxn
            .http_client()
            .post(self.config.collection_url("tasks"))
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(&json!([{
                "user_id": user_id,
                "title": new_task.title,
                "description": new_task.description,
            }]));

        let mut created: Vec<ApiTask> = self
            .config
            .authorize(request)
            .send()
            .await
            .context("Creating a task on the hosted backend")?
            .error_for_status()
            .context("Hosted backend rejected the task insert")?
            .json()
            .await
            .context("Decoding the created task")?;

        if created.is_empty() {
            return Err(anyhow!("hosted backend returned no representation of the created task"));
        }
        Ok(created.remove(0).into())
    }

    async fn set_status(
        &self,
        task_id: i64,
        status: TaskStatus,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, anyhow::Error> {
        let request = ext_cxn
            .http_client()
            .patch(self.config.collection_url("tasks"))
            .query(&[("id", format!("eq.{task_id}"))])
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(&json!({ "completed": status.is_completed() }));

        let mut updated: Vec<ApiTask> = self
            .config
            .authorize(request)
            .send()
            .await
            .context("Updating a task's completion on the hosted backend")?
            .error_for_status()
            .context("Hosted backend rejected the task update")?
            .json()
            .await
            .context("Decoding the updated task")?;

        if updated.is_empty() {
            Ok(None)
        } else {
            Ok(Some(updated.remove(0).into()))
        }
    }
}
