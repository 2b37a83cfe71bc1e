use super::test_util::{get, request_with_json, test_router};
use crate::api::test_util::deserialize_body;
use crate::dto;
use axum::http::StatusCode;
use serde_json::{Value, json};
use speculoos::prelude::*;
use tower::ServiceExt;

#[tokio::test]
async fn created_user_shows_up_with_zero_tasks() {
    let app = test_router().await;

    let create_response = app
        .clone()
        .oneshot(request_with_json(
            "POST",
            "/api/users",
            &json!({ "name": "Ann", "email": "a@x.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(StatusCode::CREATED, create_response.status());

    let inserted: dto::user::InsertedUser = deserialize_body(create_response.into_body()).await;
    assert_eq!(1, inserted.id);

    let list_response = app.oneshot(get("/api/users")).await.unwrap();
    assert_eq!(StatusCode::OK, list_response.status());

    let users: Vec<dto::user::UserWithTaskCount> =
        deserialize_body(list_response.into_body()).await;
    assert_that!(users).matches(|listed| {
        matches!(listed.as_slice(), [dto::user::UserWithTaskCount {
            id: 1,
            task_count: 0,
            name,
            email,
            ..
        }] if name == "Ann" && email == "a@x.com")
    });
}

#[tokio::test]
async fn second_user_with_same_email_is_rejected() {
    let app = test_router().await;
    let ann = json!({ "name": "Ann", "email": "a@x.com" });

    let first_response = app
        .clone()
        .oneshot(request_with_json("POST", "/api/users", &ann))
        .await
        .unwrap();
    assert_eq!(StatusCode::CREATED, first_response.status());

    let second_response = app
        .oneshot(request_with_json(
            "POST",
            "/api/users",
            &json!({ "name": "Another Ann", "email": "a@x.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(StatusCode::CONFLICT, second_response.status());

    let body: Value = deserialize_body(second_response.into_body()).await;
    assert_eq!(body["error_code"], "conflict");
}

#[tokio::test]
async fn user_with_missing_fields_is_rejected() {
    let app = test_router().await;

    let create_response = app
        .oneshot(request_with_json(
            "POST",
            "/api/users",
            &json!({ "name": "", "email": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(StatusCode::BAD_REQUEST, create_response.status());

    let body: Value = deserialize_body(create_response.into_body()).await;
    assert_eq!(body["error_code"], "invalid_input");
}

#[tokio::test]
async fn task_count_tracks_created_tasks() {
    let app = test_router().await;

    let create_user_response = app
        .clone()
        .oneshot(request_with_json(
            "POST",
            "/api/users",
            &json!({ "name": "Ann", "email": "a@x.com" }),
        ))
        .await
        .unwrap();
    let inserted: dto::user::InsertedUser =
        deserialize_body(create_user_response.into_body()).await;

    for task_number in 1..=3 {
        let create_task_response = app
            .clone()
            .oneshot(request_with_json(
                "POST",
                &format!("/api/users/{}/tasks", inserted.id),
                &json!({ "title": format!("Task {task_number}") }),
            ))
            .await
            .unwrap();
        assert_eq!(StatusCode::CREATED, create_task_response.status());
    }

    let list_response = app.oneshot(get("/api/users")).await.unwrap();
    let users: Vec<dto::user::UserWithTaskCount> =
        deserialize_body(list_response.into_body()).await;
    assert_that!(users).matches(|listed| {
        matches!(listed.as_slice(), [dto::user::UserWithTaskCount { task_count: 3, .. }])
    });
}
