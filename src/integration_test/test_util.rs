use crate::{SharedData, db, persistence};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use serde::Serialize;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;

/// Creates a fresh in-memory database with the application schema applied. The pool
/// is capped at a single connection because every pooled connection to `:memory:`
/// would otherwise get its own empty database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("could not open an in-memory database");
    db::init_schema(&pool)
        .await
        .expect("could not apply the schema to the test database");

    pool
}

/// Builds the full application router over a fresh in-memory database
pub async fn test_router() -> Router {
    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(test_pool().await),
    });

    crate::router(shared_data)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("test request should build")
}

pub fn request_with_json<T: Serialize>(method: &str, uri: &str, body: &T) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(body).expect("test body should serialize"),
        ))
        .expect("test request should build")
}
