use super::test_util::test_pool;
use crate::client::BackendClient;
use crate::domain::task::{NewTask, TaskStatus};
use crate::domain::user::{CreateUser, UserWithTaskCount};
use crate::persistence;
use speculoos::prelude::*;

fn ann() -> CreateUser {
    CreateUser {
        name: "Ann".to_owned(),
        email: "a@x.com".to_owned(),
    }
}

fn buy_milk() -> NewTask {
    NewTask {
        title: "Buy milk".to_owned(),
        description: Some(String::new()),
    }
}

/// Walks a client through the full create-toggle-count flow and verifies the
/// backend keeps every promise of the access contract along the way.
async fn full_scenario(mut client: BackendClient) {
    let created_user = client
        .create_user(&ann())
        .await
        .expect("user creation should succeed");
    assert_eq!(created_user.id, 1);

    let created_task = client
        .create_task(created_user.id, &buy_milk())
        .await
        .expect("task creation should succeed");
    assert_eq!(created_task.id, 1);
    assert_eq!(created_task.owner_user_id, created_user.id);
    assert_eq!(created_task.status, TaskStatus::Pending);

    let toggled = client
        .toggle_task(created_task.id)
        .await
        .expect("toggle should succeed");
    assert_eq!(toggled.status, TaskStatus::Completed);

    let users = client
        .users_with_task_counts()
        .await
        .expect("user listing should succeed");
    assert_that!(users).matches(|listed| {
        matches!(listed.as_slice(), [UserWithTaskCount {
            task_count: 1,
            user,
        }] if user.id == 1 && user.name == "Ann")
    });

    let tasks = client
        .tasks_for_user(created_user.id)
        .await
        .expect("task listing should succeed");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, TaskStatus::Completed);

    client.shutdown().await;
}

#[tokio::test]
async fn database_backend_runs_the_full_scenario() {
    let client =
        BackendClient::database(persistence::ExternalConnectivity::new(test_pool().await));

    full_scenario(client).await;
}

#[tokio::test]
async fn in_memory_backend_runs_the_full_scenario() {
    full_scenario(BackendClient::in_memory()).await;
}

#[tokio::test]
async fn failures_name_the_operation_that_failed() {
    let mut client = BackendClient::in_memory();

    let create_result = client.create_task(999, &buy_milk()).await;
    let failure = match create_result {
        Err(client_err) => client_err,
        Ok(task) => panic!("Creating a task for a missing user should fail, got task {}", task.id),
    };

    assert_eq!(failure.operation, "create task");
    assert!(failure.to_string().contains("create task failed"));
}

#[tokio::test]
async fn duplicate_emails_fail_through_the_facade() {
    let mut client = BackendClient::in_memory();

    client
        .create_user(&ann())
        .await
        .expect("first creation should succeed");
    let second_result = client
        .create_user(&CreateUser {
            name: "Another Ann".to_owned(),
            email: "a@x.com".to_owned(),
        })
        .await;

    let failure = second_result.expect_err("duplicate email should be rejected");
    assert_eq!(failure.operation, "create user");
}
