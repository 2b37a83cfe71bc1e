use super::test_util::{get, request_with_json, test_router};
use crate::api::test_util::deserialize_body;
use crate::dto;
use axum::Router;
use axum::http::StatusCode;
use serde_json::{Value, json};
use speculoos::prelude::*;
use tower::ServiceExt;

/// Creates a user through the API, returning their ID
async fn create_user(app: &Router) -> i64 {
    let response = app
        .clone()
        .oneshot(request_with_json(
            "POST",
            "/api/users",
            &json!({ "name": "Ann", "email": "a@x.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(StatusCode::CREATED, response.status());

    let inserted: dto::user::InsertedUser = deserialize_body(response.into_body()).await;
    inserted.id
}

/// Creates a task owned by [user_id] through the API
async fn create_task(app: &Router, user_id: i64, title: &str) -> dto::task::Task {
    let response = app
        .clone()
        .oneshot(request_with_json(
            "POST",
            &format!("/api/users/{user_id}/tasks"),
            &json!({ "title": title, "description": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(StatusCode::CREATED, response.status());

    deserialize_body(response.into_body()).await
}

#[tokio::test]
async fn created_tasks_start_pending() {
    let app = test_router().await;
    let user_id = create_user(&app).await;

    let created = create_task(&app, user_id, "Buy milk").await;

    assert_eq!(created.user_id, user_id);
    assert_eq!(created.status, dto::task::TaskStatus::Pending);
    assert!(!created.completed);
}

#[tokio::test]
async fn tasks_for_unknown_users_cannot_be_created() {
    let app = test_router().await;

    let response = app
        .oneshot(request_with_json(
            "POST",
            "/api/users/999/tasks",
            &json!({ "title": "X" }),
        ))
        .await
        .unwrap();
    assert_eq!(StatusCode::NOT_FOUND, response.status());

    let body: Value = deserialize_body(response.into_body()).await;
    assert_eq!(body["error_code"], "not_found");
}

#[tokio::test]
async fn tasks_without_titles_are_rejected() {
    let app = test_router().await;
    let user_id = create_user(&app).await;

    let response = app
        .oneshot(request_with_json(
            "POST",
            &format!("/api/users/{user_id}/tasks"),
            &json!({ "title": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(StatusCode::BAD_REQUEST, response.status());
}

#[tokio::test]
async fn tasks_come_back_newest_first() {
    let app = test_router().await;
    let user_id = create_user(&app).await;

    for title in ["first", "second", "third"] {
        create_task(&app, user_id, title).await;
    }

    let list_response = app
        .oneshot(get(&format!("/api/users/{user_id}/tasks")))
        .await
        .unwrap();
    assert_eq!(StatusCode::OK, list_response.status());

    let tasks: Vec<dto::task::Task> = deserialize_body(list_response.into_body()).await;
    let ids: Vec<i64> = tasks.iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert!(
        tasks
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at)
    );
}

#[tokio::test]
async fn toggling_twice_restores_the_original_state() {
    let app = test_router().await;
    let user_id = create_user(&app).await;
    let task = create_task(&app, user_id, "Buy milk").await;

    let first_response = app
        .clone()
        .oneshot(request_with_json(
            "PUT",
            &format!("/api/tasks/{}/toggle", task.id),
            &json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(StatusCode::OK, first_response.status());
    let first_status: dto::task::TaskStatusResponse =
        deserialize_body(first_response.into_body()).await;
    assert_eq!(first_status.status, dto::task::TaskStatus::Completed);

    let second_response = app
        .clone()
        .oneshot(request_with_json(
            "PUT",
            &format!("/api/tasks/{}/toggle", task.id),
            &json!({}),
        ))
        .await
        .unwrap();
    let second_status: dto::task::TaskStatusResponse =
        deserialize_body(second_response.into_body()).await;
    assert_eq!(second_status.status, dto::task::TaskStatus::Pending);

    let list_response = app
        .oneshot(get(&format!("/api/users/{user_id}/tasks")))
        .await
        .unwrap();
    let tasks: Vec<dto::task::Task> = deserialize_body(list_response.into_body()).await;
    assert_that!(tasks).matches(|listed| {
        matches!(listed.as_slice(), [dto::task::Task { completed: false, .. }])
    });
}

#[tokio::test]
async fn toggling_a_missing_task_is_not_found() {
    let app = test_router().await;

    let response = app
        .oneshot(request_with_json("PUT", "/api/tasks/41/toggle", &json!({})))
        .await
        .unwrap();
    assert_eq!(StatusCode::NOT_FOUND, response.status());

    let body: Value = deserialize_body(response.into_body()).await;
    assert_eq!(body["error_code"], "not_found");
}

#[tokio::test]
async fn status_can_be_overwritten_directly() {
    let app = test_router().await;
    let user_id = create_user(&app).await;
    let task = create_task(&app, user_id, "Buy milk").await;

    let set_response = app
        .clone()
        .oneshot(request_with_json(
            "PUT",
            &format!("/api/tasks/{}/status", task.id),
            &json!({ "status": "completed" }),
        ))
        .await
        .unwrap();
    assert_eq!(StatusCode::OK, set_response.status());
    let applied: dto::task::TaskStatusResponse = deserialize_body(set_response.into_body()).await;
    assert_eq!(applied.status, dto::task::TaskStatus::Completed);

    let list_response = app
        .oneshot(get(&format!("/api/users/{user_id}/tasks")))
        .await
        .unwrap();
    let tasks: Vec<dto::task::Task> = deserialize_body(list_response.into_body()).await;
    assert_that!(tasks).matches(|listed| {
        matches!(listed.as_slice(), [dto::task::Task {
            completed: true,
            status: dto::task::TaskStatus::Completed,
            ..
        }])
    });
}

#[tokio::test]
async fn unrecognized_statuses_are_rejected() {
    let app = test_router().await;
    let user_id = create_user(&app).await;
    let task = create_task(&app, user_id, "Buy milk").await;

    let set_response = app
        .oneshot(request_with_json(
            "PUT",
            &format!("/api/tasks/{}/status", task.id),
            &json!({ "status": "done" }),
        ))
        .await
        .unwrap();
    assert_eq!(StatusCode::BAD_REQUEST, set_response.status());

    let body: Value = deserialize_body(set_response.into_body()).await;
    assert_eq!(body["error_code"], "invalid_json");
}

#[tokio::test]
async fn setting_status_on_a_missing_task_is_not_found() {
    let app = test_router().await;

    let response = app
        .oneshot(request_with_json(
            "PUT",
            "/api/tasks/41/status",
            &json!({ "status": "pending" }),
        ))
        .await
        .unwrap();
    assert_eq!(StatusCode::NOT_FOUND, response.status());
}
