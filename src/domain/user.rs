use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A user paired with the number of tasks they currently own
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct UserWithTaskCount {
    pub user: User,
    pub task_count: i64,
}

#[cfg_attr(test, derive(Clone))]
pub struct CreateUser {
    pub name: String,
    pub email: String,
}

pub mod driven_ports {
    use super::*;

    pub trait UserReader {
        /// Every user in the system alongside their task count, newest user first
        async fn all_with_task_counts(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<UserWithTaskCount>, anyhow::Error>;
    }

    pub trait UserWriter {
        async fn create_user(
            &self,
            user: &CreateUser,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<User, anyhow::Error>;
    }

    pub trait DetectUser {
        async fn user_exists(
            &self,
            user_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;

        async fn user_with_email_exists(
            &self,
            email: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    #[derive(Debug, Error)]
    pub enum CreateUserError {
        #[error("A user with the given email already exists.")]
        EmailInUse,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    #[cfg(test)]
    mod create_user_error_clone {
        use super::CreateUserError;
        use anyhow::anyhow;

        impl Clone for CreateUserError {
            fn clone(&self) -> Self {
                match self {
                    Self::EmailInUse => Self::EmailInUse,
                    Self::PortError(err) => Self::PortError(anyhow!(format!("{}", err))),
                }
            }
        }
    }

    pub trait UserPort {
        async fn users_with_task_counts(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
        ) -> Result<Vec<UserWithTaskCount>, anyhow::Error>;
        async fn create_user(
            &self,
            new_user: &CreateUser,
            ext_cxn: &mut impl ExternalConnectivity,
            u_writer: &impl driven_ports::UserWriter,
            u_detect: &impl driven_ports::DetectUser,
        ) -> Result<User, CreateUserError>;
    }
}

pub struct UserService {}

#[derive(Debug, Error)]
pub(super) enum UserExistsErr {
    #[error("user with ID {0} does not exist")]
    UserDoesNotExist(i64),

    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}

pub(super) async fn verify_user_exists(
    id: i64,
    ext_cxn: &mut impl ExternalConnectivity,
    user_detect: &impl driven_ports::DetectUser,
) -> Result<(), UserExistsErr> {
    let does_user_exist = user_detect.user_exists(id, ext_cxn).await?;

    if does_user_exist {
        Ok(())
    } else {
        Err(UserExistsErr::UserDoesNotExist(id))
    }
}

impl driving_ports::UserPort for UserService {
    async fn users_with_task_counts(
        &self,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
    ) -> Result<Vec<UserWithTaskCount>, anyhow::Error> {
        let all_users_result = u_reader.all_with_task_counts(ext_cxn).await;
        if let Err(ref port_err) = all_users_result {
            tracing::error!("User fetch failure: {port_err}");
        }

        all_users_result.context("Failed fetching users")
    }

    async fn create_user(
        &self,
        new_user: &CreateUser,
        ext_cxn: &mut impl ExternalConnectivity,
        u_writer: &impl driven_ports::UserWriter,
        u_detect: &impl driven_ports::DetectUser,
    ) -> Result<User, driving_ports::CreateUserError> {
        let email_taken = u_detect
            .user_with_email_exists(&new_user.email, &mut *ext_cxn)
            .await
            .context("Looking up user email during creation")?;
        if email_taken {
            return Err(driving_ports::CreateUserError::EmailInUse);
        }

        Ok(u_writer
            .create_user(new_user, &mut *ext_cxn)
            .await
            .context("Trying to create user at service level")?)
    }
}


#[cfg(test)]
mod user_service_tests {
    use super::*;
    use crate::domain::test_util::Connectivity;
    use crate::domain::user::driving_ports::{CreateUserError, UserPort};
    use crate::external_connections;
    use speculoos::prelude::*;
    use std::sync::RwLock;

    #[tokio::test]
    async fn users_with_task_counts_can_fetch_users() {
        let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();
        let mut user_data = test_util::InMemoryUserPersistence::new_with_users(&[
            CreateUser {
                name: "John Doe".to_owned(),
                email: "john@example.com".to_owned(),
            },
            CreateUser {
                name: "Jane Doe".to_owned(),
                email: "jane@example.com".to_owned(),
            },
        ]);
        user_data.task_counts.insert(1, 3);
        let locked_user_data = RwLock::new(user_data);
        let user_service = UserService {};

        let users_result = user_service
            .users_with_task_counts(&mut db_cxn, &locked_user_data)
            .await;
        let fetched_users = match users_result {
            Ok(users) => users,
            Err(error) => panic!("Should have fetched users but failed: {}", error),
        };

        assert_that!(fetched_users).matches(|users| {
            matches!(users.as_slice(), [
                UserWithTaskCount {
                    user: User { id: 2, .. },
                    task_count: 0,
                },
                UserWithTaskCount {
                    user: User { id: 1, name, .. },
                    task_count: 3,
                }
            ] if name == "John Doe")
        });
    }

    #[tokio::test]
    async fn users_with_task_counts_propagates_error() {
        let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();
        let mut user_data = test_util::InMemoryUserPersistence::new();
        user_data.connectivity = Connectivity::Disconnected;
        let locked_user_data = RwLock::new(user_data);
        let user_service = UserService {};

        let get_result = user_service
            .users_with_task_counts(&mut db_cxn, &locked_user_data)
            .await;
        assert_that!(get_result).is_err();
    }

    #[tokio::test]
    async fn create_user_happy_path() {
        let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();
        let user_data = test_util::InMemoryUserPersistence::new_locked();
        let user_service = UserService {};
        let new_user = test_util::user_create_default();

        let create_result = user_service
            .create_user(&new_user, &mut db_cxn, &user_data, &user_data)
            .await;
        let created = match create_result {
            Ok(user) => user,
            Err(error) => panic!("User creation should have succeeded: {}", error),
        };

        assert_eq!(created.id, 1);
        assert_eq!(created.email, new_user.email);
    }

    #[tokio::test]
    async fn create_user_fails_if_email_taken() {
        let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();
        let user_persistence = test_util::InMemoryUserPersistence::new_with_users(&[CreateUser {
            name: "Evan Rittenhouse".to_owned(),
            email: "evan@example.com".to_owned(),
        }]);
        let locked_user_data = RwLock::new(user_persistence);
        let user_service = UserService {};
        let new_user = CreateUser {
            name: "A Different Evan".to_owned(),
            email: "evan@example.com".to_owned(),
        };

        let create_result = user_service
            .create_user(&new_user, &mut db_cxn, &locked_user_data, &locked_user_data)
            .await;
        let returned_error = match create_result {
            Err(error) => error,
            Ok(user) => {
                panic!(
                    "Creating user should not have succeeded, got this user ID back: {}",
                    user.id
                )
            }
        };

        assert_that!(returned_error).matches(|err| matches!(err, CreateUserError::EmailInUse));
    }

    #[tokio::test]
    async fn create_user_propagates_port_error() {
        let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();
        let mut user_data = test_util::InMemoryUserPersistence::new();
        user_data.connectivity = Connectivity::Disconnected;
        let locked_user_data = RwLock::new(user_data);
        let user_service = UserService {};
        let new_user = test_util::user_create_default();

        let create_result = user_service
            .create_user(&new_user, &mut db_cxn, &locked_user_data, &locked_user_data)
            .await;
        assert_that!(create_result)
            .is_err()
            .matches(|err| matches!(err, CreateUserError::PortError(_)));
    }
}
