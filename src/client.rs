use crate::app_env;
use crate::domain;
use crate::domain::task::driving_ports::TaskPort;
use crate::domain::task::{NewTask, Task, TaskStatus};
use crate::domain::user::driving_ports::UserPort;
use crate::domain::user::{CreateUser, User, UserWithTaskCount};
use crate::persistence::blob_driven_ports::BlobStore;
use crate::persistence::db_task_driven_ports::{DbTaskReader, DbTaskWriter};
use crate::persistence::db_user_driven_ports::{DbDetectUser, DbReadUsers, DbWriteUsers};
use crate::persistence::rest_driven_ports::{HostedApiConfig, HostedApiTasks, HostedApiUsers};
use crate::{db, persistence};
use anyhow::{Context, anyhow};
use std::env;
use thiserror::Error;

/// Which storage substrate a [BackendClient] drives. Every variant provides the
/// same operations with the same semantics.
pub enum Backend {
    /// The local relational database
    Database(persistence::ExternalConnectivity),
    /// A hosted PostgREST-style service
    HostedApi {
        ext_cxn: persistence::ExternalConnectivity,
        config: HostedApiConfig,
    },
    /// An in-process store for demo use, nothing survives shutdown
    InMemory {
        ext_cxn: persistence::ExternalConnectivity,
        store: BlobStore,
    },
}

/// The error every façade operation fails with: the name of the operation that
/// failed plus whatever went wrong underneath. Callers that only want to log and
/// move on never need to look past this type.
#[derive(Debug, Error)]
#[error("{operation} failed: {source}")]
pub struct ClientError {
    pub operation: &'static str,
    #[source]
    pub source: anyhow::Error,
}

impl ClientError {
    fn during<E>(operation: &'static str) -> impl FnOnce(E) -> ClientError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        move |source| ClientError {
            operation,
            source: anyhow::Error::new(source),
        }
    }

    fn during_anyhow(operation: &'static str) -> impl FnOnce(anyhow::Error) -> ClientError {
        move |source| ClientError { operation, source }
    }
}

/// The single entry point a presentation layer is expected to call. Forwards every
/// operation to the configured backend adapter. Performs no retries and applies no
/// timeouts of its own.
pub struct BackendClient {
    backend: Backend,
}

impl BackendClient {
    pub fn new(backend: Backend) -> BackendClient {
        BackendClient { backend }
    }

    /// A client over the given database connectivity
    pub fn database(ext_cxn: persistence::ExternalConnectivity) -> BackendClient {
        BackendClient::new(Backend::Database(ext_cxn))
    }

    /// A client over a hosted PostgREST-style backend
    pub fn hosted_api(config: HostedApiConfig) -> BackendClient {
        BackendClient::new(Backend::HostedApi {
            ext_cxn: persistence::ExternalConnectivity::without_database(),
            config,
        })
    }

    /// A client over a fresh in-memory store, for demo use
    pub fn in_memory() -> BackendClient {
        BackendClient::new(Backend::InMemory {
            ext_cxn: persistence::ExternalConnectivity::without_database(),
            store: BlobStore::new(),
        })
    }

    /// Builds a client for whichever backend [app_env::TASK_BACKEND] selects,
    /// defaulting to the local database.
    pub async fn from_env() -> Result<BackendClient, anyhow::Error> {
        let selected_backend =
            env::var(app_env::TASK_BACKEND).unwrap_or_else(|_| "database".to_owned());

        match selected_backend.as_str() {
            "database" => {
                let db_url = env::var(app_env::DB_URL)
                    .with_context(|| format!("{} must be set to use the database backend", app_env::DB_URL))?;
                let pool = db::connect(&db_url).await?;
                db::init_schema(&pool).await?;

                Ok(BackendClient::database(persistence::ExternalConnectivity::new(pool)))
            }
            "hosted-api" => {
                let base_url = env::var(app_env::BACKEND_BASE_URL).with_context(|| {
                    format!("{} must be set to use the hosted backend", app_env::BACKEND_BASE_URL)
                })?;
                let api_key = env::var(app_env::BACKEND_API_KEY).with_context(|| {
                    format!("{} must be set to use the hosted backend", app_env::BACKEND_API_KEY)
                })?;

                Ok(BackendClient::hosted_api(HostedApiConfig { base_url, api_key }))
            }
            "memory" => Ok(BackendClient::in_memory()),
            other => Err(anyhow!("unrecognized backend \"{other}\"")),
        }
    }

    /// Releases whatever resources the backend holds
    pub async fn shutdown(self) {
        match self.backend {
            Backend::Database(ext_cxn) => ext_cxn.close().await,
            Backend::HostedApi { ext_cxn, .. } => ext_cxn.close().await,
            Backend::InMemory { ext_cxn, .. } => ext_cxn.close().await,
        }
    }

    /// Every user in the system with their task counts
    pub async fn users_with_task_counts(
        &mut self,
    ) -> Result<Vec<UserWithTaskCount>, ClientError> {
        const OPERATION: &str = "list users with task counts";
        let service = domain::user::UserService {};

        match self.backend {
            Backend::Database(ref mut ext_cxn) => service
                .users_with_task_counts(ext_cxn, &DbReadUsers {})
                .await
                .map_err(ClientError::during_anyhow(OPERATION)),
            Backend::HostedApi {
                ref mut ext_cxn,
                ref config,
            } => service
                .users_with_task_counts(ext_cxn, &HostedApiUsers { config })
                .await
                .map_err(ClientError::during_anyhow(OPERATION)),
            Backend::InMemory {
                ref mut ext_cxn,
                ref store,
            } => service
                .users_with_task_counts(ext_cxn, store)
                .await
                .map_err(ClientError::during_anyhow(OPERATION)),
        }
    }

    /// Creates a user, failing if their email is already registered
    pub async fn create_user(&mut self, new_user: &CreateUser) -> Result<User, ClientError> {
        const OPERATION: &str = "create user";
        let service = domain::user::UserService {};

        match self.backend {
            Backend::Database(ref mut ext_cxn) => service
                .create_user(new_user, ext_cxn, &DbWriteUsers {}, &DbDetectUser {})
                .await
                .map_err(ClientError::during(OPERATION)),
            Backend::HostedApi {
                ref mut ext_cxn,
                ref config,
            } => {
                let users = HostedApiUsers { config };
                service
                    .create_user(new_user, ext_cxn, &users, &users)
                    .await
                    .map_err(ClientError::during(OPERATION))
            }
            Backend::InMemory {
                ref mut ext_cxn,
                ref store,
            } => service
                .create_user(new_user, ext_cxn, store, store)
                .await
                .map_err(ClientError::during(OPERATION)),
        }
    }

    /// A single user's tasks, newest first
    pub async fn tasks_for_user(&mut self, user_id: i64) -> Result<Vec<Task>, ClientError> {
        const OPERATION: &str = "list a user's tasks";
        let service = domain::task::TaskService {};

        match self.backend {
            Backend::Database(ref mut ext_cxn) => service
                .tasks_for_user(user_id, ext_cxn, &DbTaskReader {})
                .await
                .map_err(ClientError::during(OPERATION)),
            Backend::HostedApi {
                ref mut ext_cxn,
                ref config,
            } => service
                .tasks_for_user(user_id, ext_cxn, &HostedApiTasks { config })
                .await
                .map_err(ClientError::during(OPERATION)),
            Backend::InMemory {
                ref mut ext_cxn,
                ref store,
            } => service
                .tasks_for_user(user_id, ext_cxn, store)
                .await
                .map_err(ClientError::during(OPERATION)),
        }
    }

    /// Creates a pending task owned by [user_id]
    pub async fn create_task(
        &mut self,
        user_id: i64,
        new_task: &NewTask,
    ) -> Result<Task, ClientError> {
        const OPERATION: &str = "create task";
        let service = domain::task::TaskService {};

        match self.backend {
            Backend::Database(ref mut ext_cxn) => service
                .create_task_for_user(user_id, new_task, ext_cxn, &DbDetectUser {}, &DbTaskWriter {})
                .await
                .map_err(ClientError::during(OPERATION)),
            Backend::HostedApi {
                ref mut ext_cxn,
                ref config,
            } => service
                .create_task_for_user(
                    user_id,
                    new_task,
                    ext_cxn,
                    &HostedApiUsers { config },
                    &HostedApiTasks { config },
                )
                .await
                .map_err(ClientError::during(OPERATION)),
            Backend::InMemory {
                ref mut ext_cxn,
                ref store,
            } => service
                .create_task_for_user(user_id, new_task, ext_cxn, store, store)
                .await
                .map_err(ClientError::during(OPERATION)),
        }
    }

    /// Flips a task's completion state
    pub async fn toggle_task(&mut self, task_id: i64) -> Result<Task, ClientError> {
        const OPERATION: &str = "toggle task completion";
        let service = domain::task::TaskService {};

        match self.backend {
            Backend::Database(ref mut ext_cxn) => service
                .toggle_task(task_id, ext_cxn, &DbTaskReader {}, &DbTaskWriter {})
                .await
                .map_err(ClientError::during(OPERATION)),
            Backend::HostedApi {
                ref mut ext_cxn,
                ref config,
            } => {
                let tasks = HostedApiTasks { config };
                service
                    .toggle_task(task_id, ext_cxn, &tasks, &tasks)
                    .await
                    .map_err(ClientError::during(OPERATION))
            }
            Backend::InMemory {
                ref mut ext_cxn,
                ref store,
            } => service
                .toggle_task(task_id, ext_cxn, store, store)
                .await
                .map_err(ClientError::during(OPERATION)),
        }
    }

    /// Overwrites a task's completion state
    pub async fn set_task_status(
        &mut self,
        task_id: i64,
        status: TaskStatus,
    ) -> Result<Task, ClientError> {
        const OPERATION: &str = "set task status";
        let service = domain::task::TaskService {};

        match self.backend {
            Backend::Database(ref mut ext_cxn) => service
                .set_task_status(task_id, status, ext_cxn, &DbTaskWriter {})
                .await
                .map_err(ClientError::during(OPERATION)),
            Backend::HostedApi {
                ref mut ext_cxn,
                ref config,
            } => service
                .set_task_status(task_id, status, ext_cxn, &HostedApiTasks { config })
                .await
                .map_err(ClientError::during(OPERATION)),
            Backend::InMemory {
                ref mut ext_cxn,
                ref store,
            } => service
                .set_task_status(task_id, status, ext_cxn, store)
                .await
                .map_err(ClientError::during(OPERATION)),
        }
    }
}
