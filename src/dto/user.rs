use crate::domain;
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// DTO for a user returned by the API, including how many tasks they own
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct UserWithTaskCount {
    #[schema(example = 4)]
    pub id: i64,
    #[schema(example = "Ann Example")]
    pub name: String,
    #[schema(example = "ann@example.com")]
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[schema(example = 3)]
    pub task_count: i64,
}

impl From<domain::user::UserWithTaskCount> for UserWithTaskCount {
    fn from(value: domain::user::UserWithTaskCount) -> Self {
        UserWithTaskCount {
            id: value.user.id,
            name: value.user.name,
            email: value.user.email,
            created_at: value.user.created_at,
            task_count: value.task_count,
        }
    }
}

/// DTO for creating a new user via the API. Both fields just have to be present;
/// email formats beyond non-emptiness are deliberately not checked.
#[derive(Deserialize, Display, Validate, ToSchema)]
#[display("{name} <{email}>")]
#[cfg_attr(test, derive(Serialize))]
pub struct NewUser {
    #[validate(length(min = 1))]
    #[schema(example = "Ann Example")]
    pub name: String,
    #[validate(length(min = 1))]
    #[schema(example = "ann@example.com")]
    pub email: String,
}

impl From<NewUser> for domain::user::CreateUser {
    fn from(value: NewUser) -> Self {
        domain::user::CreateUser {
            name: value.name,
            email: value.email,
        }
    }
}

/// DTO containing the ID of a user that was created via the API.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct InsertedUser {
    #[schema(example = 10)]
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod new_user {
        use super::*;

        #[test]
        fn missing_fields_get_rejected() {
            let bad_user = NewUser {
                name: String::new(),
                email: String::new(),
            };
            let validation_result = bad_user.validate();
            assert!(validation_result.is_err());
            let validation_errors = validation_result.unwrap_err();
            let field_validations = validation_errors.field_errors();
            assert!(field_validations.contains_key("name"));
            assert!(field_validations.contains_key("email"));
        }

        #[test]
        fn odd_looking_emails_are_accepted() {
            let odd_user = NewUser {
                name: "Ann".to_owned(),
                email: "not-really-an-email".to_owned(),
            };
            assert!(odd_user.validate().is_ok());
        }
    }
}
