use crate::domain;
use crate::domain::user::{CreateUser, User, UserWithTaskCount};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(value: UserRow) -> Self {
        User {
            id: value.id,
            name: value.name,
            email: value.email,
            created_at: value.created_at,
        }
    }
}

#[derive(FromRow)]
struct UserTaskCountRow {
    id: i64,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
    task_count: i64,
}

impl From<UserTaskCountRow> for UserWithTaskCount {
    fn from(value: UserTaskCountRow) -> Self {
        UserWithTaskCount {
            user: User {
                id: value.id,
                name: value.name,
                email: value.email,
                created_at: value.created_at,
            },
            task_count: value.task_count,
        }
    }
}

pub struct DbReadUsers {}

impl domain::user::driven_ports::UserReader for DbReadUsers {
    async fn all_with_task_counts(
        &self,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<UserWithTaskCount>, anyhow::Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let users: Vec<UserWithTaskCount> = sqlx::query_as::<_, UserTaskCountRow>(
            "SELECT u.id, u.name, u.email, u.created_at, count(t.id) AS task_count \
             FROM users u \
             LEFT JOIN tasks t ON t.user_id = u.id \
             GROUP BY u.id \
             ORDER BY u.created_at DESC, u.id DESC",
        )
        .fetch_all(cxn_handle.borrow_connection())
        .await
        .context("Fetching users with their task counts")?
        .into_iter()
        .map(UserWithTaskCount::from)
        .collect();

        Ok(users)
    }
}

pub struct DbWriteUsers {}

impl domain::user::driven_ports::UserWriter for DbWriteUsers {
    async fn create_user(
        &self,
        user: &CreateUser,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<User, anyhow::Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let created = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (name, email) VALUES (?, ?) \
             RETURNING id, name, email, created_at",
        )
        .bind(&user.name)
        .bind(&user.email)
        .fetch_one(cxn_handle.borrow_connection())
        .await
        .context("Inserting new user")?;

        Ok(created.into())
    }
}

pub struct DbDetectUser {}

impl domain::user::driven_ports::DetectUser for DbDetectUser {
    async fn user_exists(
        &self,
        user_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, anyhow::Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let user_with_id_count: i64 =
            sqlx::query_scalar("SELECT count(*) FROM users u WHERE u.id = ?")
                .bind(user_id)
                .fetch_one(cxn_handle.borrow_connection())
                .await
                .context("Detecting user with ID")?;

        Ok(user_with_id_count > 0)
    }

    async fn user_with_email_exists(
        &self,
        email: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, anyhow::Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let user_with_email_count: i64 =
            sqlx::query_scalar("SELECT count(*) FROM users u WHERE u.email = ?")
                .bind(email)
                .fetch_one(cxn_handle.borrow_connection())
                .await
                .context("Detecting user via email")?;

        Ok(user_with_email_count > 0)
    }
}
