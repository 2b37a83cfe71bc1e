use crate::domain;
use crate::domain::task::{NewTask, Task, TaskStatus};
use crate::domain::user::{CreateUser, User, UserWithTaskCount};
use crate::external_connections::ExternalConnectivity;
use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

const USERS_KEY: &str = "task_manager_users";
const TASKS_KEY: &str = "task_manager_tasks";

/// A demo-mode backend holding each collection as a single JSON document in a
/// key-value map. Every operation deserializes the whole collection, works on it
/// in memory, and writes the whole document back, so each call is O(n) in the
/// collection size and concurrent writers get no protection beyond the map lock.
pub struct BlobStore {
    blobs: RwLock<HashMap<String, String>>,
}

impl BlobStore {
    pub fn new() -> BlobStore {
        BlobStore {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    fn read_collection<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, anyhow::Error> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| anyhow!("blob store lock poisoned"))?;
        let Some(raw_collection) = blobs.get(key) else {
            return Ok(Vec::new());
        };

        serde_json::from_str(raw_collection)
            .with_context(|| format!("deserializing the \"{key}\" collection"))
    }

    fn write_collection<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), anyhow::Error> {
        let serialized = serde_json::to_string(items)
            .with_context(|| format!("serializing the \"{key}\" collection"))?;
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| anyhow!("blob store lock poisoned"))?;
        blobs.insert(key.to_owned(), serialized);

        Ok(())
    }
}

impl Default for BlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize)]
struct StoredUser {
    id: i64,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<StoredUser> for User {
    fn from(value: StoredUser) -> Self {
        User {
            id: value.id,
            name: value.name,
            email: value.email,
            created_at: value.created_at,
        }
    }
}

/// Stored tasks keep the boolean completion flag, so this adapter converts to and
/// from [TaskStatus] the same way the hosted backend does.
#[derive(Serialize, Deserialize)]
struct StoredTask {
    id: i64,
    user_id: i64,
    title: String,
    description: Option<String>,
    completed: bool,
    created_at: DateTime<Utc>,
}

impl From<StoredTask> for Task {
    fn from(value: StoredTask) -> Self {
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

fn next_id<T>(items: &[T], id_of: impl Fn(&T) -> i64) -> i64 {
    items.iter().map(id_of).max().unwrap_or(0) + 1
}

impl domain::user::driven_ports::UserReader for BlobStore {
    async fn all_with_task_counts(
        &self,
        _ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<UserWithTaskCount>, anyhow::Error> {
        let users: Vec<StoredUser> = self.read_collection(USERS_KEY)?;
        let tasks: Vec<StoredTask> = self.read_collection(TASKS_KEY)?;

        let mut users_with_counts: Vec<UserWithTaskCount> = users
            .into_iter()
            .map(|user| UserWithTaskCount {
                task_count: tasks.iter().filter(|task| task.user_id == user.id).count() as i64,
                user: user.into(),
            })
            .collect();
        users_with_counts.sort_by(|a, b| {
            b.user
                .created_at
                .cmp(&a.user.created_at)
                .then(b.user.id.cmp(&a.user.id))
        });

        Ok(users_with_counts)
    }
}

impl domain::user::driven_ports::UserWriter for BlobStore {
    async fn create_user(
        &self,
        user: &CreateUser,
        _ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<User, anyhow::Error> {
        let mut users: Vec<StoredUser> = self.read_collection(USERS_KEY)?;

        let new_user = StoredUser {
            id: next_id(&users, |existing| existing.id),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: Utc::now(),
        };
        let created = User {
            id: new_user.id,
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            created_at: new_user.created_at,
        };

        users.push(new_user);
        self.write_collection(USERS_KEY, &users)?;

        Ok(created)
    }
}

impl domain::user::driven_ports::DetectUser for BlobStore {
    async fn user_exists(
        &self,
        user_id: i64,
        _ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, anyhow::Error> {
        let users: Vec<StoredUser> = self.read_collection(USERS_KEY)?;

        Ok(users.iter().any(|user| user.id == user_id))
    }

    async fn user_with_email_exists(
        &self,
        email: &str,
        _ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, anyhow::Error> {
        let users: Vec<StoredUser> = self.read_collection(USERS_KEY)?;

        Ok(users.iter().any(|user| user.email == email))
    }
}

impl domain::task::driven_ports::TaskReader for BlobStore {
    async fn tasks_for_user(
        &self,
        user_id: i64,
        _ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Task>, anyhow::Error> {
        let tasks: Vec<StoredTask> = self.read_collection(TASKS_KEY)?;

        let mut matching_tasks: Vec<Task> = tasks
            .into_iter()
            .filter(|task| task.user_id == user_id)
            .map(Task::from)
            .collect();
        matching_tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(matching_tasks)
    }

    async fn task_by_id(
        &self,
        task_id: i64,
        _ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, anyhow::Error> {
        let tasks: Vec<StoredTask> = self.read_collection(TASKS_KEY)?;

        Ok(tasks
            .into_iter()
            .find(|task| task.id == task_id)
            .map(Task::from))
    }
}

impl domain::task::driven_ports::TaskWriter for BlobStore {
    async fn create_task_for_user(
        &self,
        user_id: i64,
        new_task: &NewTask,
        _ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Task, anyhow::Error> {
        let mut tasks: Vec<StoredTask> = self.read_collection(TASKS_KEY)?;

        let stored = StoredTask {
            id: next_id(&tasks, |existing| existing.id),
            user_id,
            title: new_task.title.clone(),
            description: new_task.description.clone(),
            completed: false,
            created_at: Utc::now(),
        };
        let created = Task {
            id: stored.id,
            owner_user_id: stored.user_id,
            title: stored.title.clone(),
            description: stored.description.clone(),
            status: TaskStatus::Pending,
            created_at: stored.created_at,
        };

        tasks.push(stored);
        self.write_collection(TASKS_KEY, &tasks)?;

        Ok(created)
    }

    async fn set_status(
        &self,
        task_id: i64,
        status: TaskStatus,
        _ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, anyhow::Error> {
        let mut tasks: Vec<StoredTask> = self.read_collection(TASKS_KEY)?;

        let Some(task_to_update) = tasks.iter_mut().find(|task| task.id == task_id) else {
            return Ok(None);
        };
        task_to_update.completed = status.is_completed();

        let updated = Task {
            id: task_to_update.id,
            owner_user_id: task_to_update.user_id,
            title: task_to_update.title.clone(),
            description: task_to_update.description.clone(),
            status,
            created_at: task_to_update.created_at,
        };
        self.write_collection(TASKS_KEY, &tasks)?;

        Ok(Some(updated))
    }
}
