use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{BasicErrorResponse, GenericErrorResponse, Json, NotFoundResponse};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::{Path, State};
use axum::response::{ErrorResponse, IntoResponse, Response};
use axum::routing::put;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;

/// Builds a router for the routes operating on a single task
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/:task_id/toggle",
            put(
                |State(app_state): AppState, Path(task_id): Path<i64>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    toggle_task(task_id, &mut ext_cxn, &domain::task::TaskService {}).await
                },
            ),
        )
        .route(
            "/:task_id/status",
            put(
                |State(app_state): AppState,
                 Path(task_id): Path<i64>,
                 Json(new_status): Json<dto::task::SetTaskStatus>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    set_task_status(task_id, new_status, &mut ext_cxn, &domain::task::TaskService {})
                        .await
                },
            ),
        )
}

/// OpenAPI definitions for the routes in this module
#[derive(OpenApi)]
#[openapi(
    paths(toggle_task, set_task_status),
    components(responses(BasicErrorResponse))
)]
pub struct TasksApi;

/// Flips a task between pending and completed.
#[utoipa::path(
    put,
    path = "/api/tasks/{task_id}/toggle",
    tag = "tasks",
    params(
        ("task_id" = i64, Path, description = "ID of the task to toggle"),
    ),
    responses(
        (status = 200, description = "The task's new status", body = dto::task::TaskStatusResponse),
        (status = 404, response = BasicErrorResponse),
    ),
)]
async fn toggle_task(
    task_id: i64,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<Json<dto::task::TaskStatusResponse>, ErrorResponse> {
    info!("Toggling completion of task {task_id}");
    let task_reader = persistence::db_task_driven_ports::DbTaskReader {};
    let task_writer = persistence::db_task_driven_ports::DbTaskWriter {};

    let toggle_result = task_service
        .toggle_task(task_id, &mut *ext_cxn, &task_reader, &task_writer)
        .await;
    match toggle_result {
        Ok(task) => Ok(Json(dto::task::TaskStatusResponse {
            status: task.status.into(),
        })),
        Err(task_err) => {
            error!("Failed to toggle task {task_id}: {task_err}");
            Err(task_error_response(task_err).into())
        }
    }
}

/// Overwrites a task's status with the one in the request body.
#[utoipa::path(
    put,
    path = "/api/tasks/{task_id}/status",
    tag = "tasks",
    params(
        ("task_id" = i64, Path, description = "ID of the task to update"),
    ),
    request_body = dto::task::SetTaskStatus,
    responses(
        (status = 200, description = "The status that was applied", body = dto::task::TaskStatusResponse),
        (status = 404, response = BasicErrorResponse),
    ),
)]
async fn set_task_status(
    task_id: i64,
    new_status: dto::task::SetTaskStatus,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<Json<dto::task::TaskStatusResponse>, ErrorResponse> {
    info!("Setting status of task {task_id}");
    let task_writer = persistence::db_task_driven_ports::DbTaskWriter {};

    let update_result = task_service
        .set_task_status(task_id, new_status.status.into(), &mut *ext_cxn, &task_writer)
        .await;
    match update_result {
        Ok(task) => Ok(Json(dto::task::TaskStatusResponse {
            status: task.status.into(),
        })),
        Err(task_err) => {
            error!("Failed to set status of task {task_id}: {task_err}");
            Err(task_error_response(task_err).into())
        }
    }
}

/// Maps a task operation failure onto this module's error responses
fn task_error_response(task_err: domain::task::driving_ports::TaskError) -> Response {
    match task_err {
        domain::task::driving_ports::TaskError::TaskDoesNotExist
        | domain::task::driving_ports::TaskError::UserDoesNotExist => {
            NotFoundResponse("The requested task does not exist.".to_owned()).into_response()
        }
        domain::task::driving_ports::TaskError::PortError(port_err) => {
            GenericErrorResponse(port_err).into_response()
        }
    }
}
