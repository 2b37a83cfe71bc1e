use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{
    BasicErrorResponse, ConflictResponse, GenericErrorResponse, Json, NotFoundResponse,
    ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{get, post};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;
use validator::Validate;

/// Builds a router for all the user routes, including the task routes scoped
/// to a single user
pub fn user_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            get(|State(app_data): AppState| async move {
                let mut ext_cxn = app_data.ext_cxn.clone();

                get_users(&mut ext_cxn, &domain::user::UserService {}).await
            }),
        )
        .route(
            "/",
            post(
                |State(app_data): AppState, Json(new_user): Json<dto::user::NewUser>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();

                    create_user(new_user, &mut ext_cxn, &domain::user::UserService {}).await
                },
            ),
        )
        .route(
            "/:user_id/tasks",
            get(
                |State(app_data): AppState, Path(user_id): Path<i64>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();

                    get_tasks_for_user(user_id, &mut ext_cxn, &domain::task::TaskService {}).await
                },
            ),
        )
        .route(
            "/:user_id/tasks",
            post(
                |State(app_data): AppState,
                 Path(user_id): Path<i64>,
                 Json(new_task): Json<dto::task::NewTask>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();

                    add_task_for_user(user_id, new_task, &mut ext_cxn, &domain::task::TaskService {})
                        .await
                },
            ),
        )
}

/// OpenAPI definitions for the routes in this module
#[derive(OpenApi)]
#[openapi(
    paths(get_users, create_user, get_tasks_for_user, add_task_for_user),
    components(
        schemas(crate::routing_utils::ExtraInfo),
        responses(BasicErrorResponse)
    )
)]
pub struct UsersApi;

/// Retrieves every user in the system along with the number of tasks they own.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "Users with task counts", body = Vec<dto::user::UserWithTaskCount>),
        (status = 500, response = BasicErrorResponse),
    ),
)]
async fn get_users(
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl domain::user::driving_ports::UserPort,
) -> Result<Json<Vec<dto::user::UserWithTaskCount>>, ErrorResponse> {
    info!("Requested users");
    let user_reader = persistence::db_user_driven_ports::DbReadUsers {};

    let users_result = user_service
        .users_with_task_counts(&mut *ext_cxn, &user_reader)
        .await;
    let users = match users_result {
        Ok(users) => users,
        Err(fetch_err) => {
            error!("Could not retrieve users: {fetch_err}");
            return Err(GenericErrorResponse(fetch_err).into());
        }
    };

    Ok(Json(
        users.into_iter().map(dto::user::UserWithTaskCount::from).collect(),
    ))
}

/// Creates a user.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = dto::user::NewUser,
    responses(
        (status = 201, description = "ID of the created user", body = dto::user::InsertedUser),
        (status = 400, response = BasicErrorResponse),
        (status = 409, response = BasicErrorResponse),
    ),
)]
async fn create_user(
    user_to_create: dto::user::NewUser,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl domain::user::driving_ports::UserPort,
) -> Result<(StatusCode, Json<dto::user::InsertedUser>), ErrorResponse> {
    info!("Attempt to create user: {}", user_to_create);
    user_to_create
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let user_writer = persistence::db_user_driven_ports::DbWriteUsers {};
    let user_detect = persistence::db_user_driven_ports::DbDetectUser {};

    let creation_result = user_service
        .create_user(
            &user_to_create.into(),
            &mut *ext_cxn,
            &user_writer,
            &user_detect,
        )
        .await;
    let created_user = match creation_result {
        Ok(user) => user,
        Err(domain::user::driving_ports::CreateUserError::EmailInUse) => {
            return Err(
                ConflictResponse("A user with that email already exists.".to_owned()).into(),
            );
        }
        Err(domain::user::driving_ports::CreateUserError::PortError(port_err)) => {
            error!("User create failure: {port_err}");
            return Err(GenericErrorResponse(port_err).into());
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(dto::user::InsertedUser {
            id: created_user.id,
        }),
    ))
}

/// Retrieves the set of tasks owned by a user, newest first.
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/tasks",
    tag = "users",
    params(
        ("user_id" = i64, Path, description = "ID of the user whose tasks are fetched"),
    ),
    responses(
        (status = 200, description = "The user's tasks, newest first", body = Vec<dto::task::Task>),
        (status = 500, response = BasicErrorResponse),
    ),
)]
async fn get_tasks_for_user(
    user_id: i64,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<Json<Vec<dto::task::Task>>, ErrorResponse> {
    info!("Get tasks for user {user_id}");
    let task_reader = persistence::db_task_driven_ports::DbTaskReader {};

    let tasks_result = task_service
        .tasks_for_user(user_id, &mut *ext_cxn, &task_reader)
        .await;
    let tasks = match tasks_result {
        Ok(tasks) => tasks,
        Err(task_err) => {
            error!("Failed to get user {user_id}'s tasks: {task_err}");
            return Err(task_error_response(user_id, task_err).into());
        }
    };

    Ok(Json(tasks.into_iter().map(dto::task::Task::from).collect()))
}

/// Adds a new task for a user.
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/tasks",
    tag = "users",
    params(
        ("user_id" = i64, Path, description = "ID of the user who will own the task"),
    ),
    request_body = dto::task::NewTask,
    responses(
        (status = 201, description = "The created task", body = dto::task::Task),
        (status = 400, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
    ),
)]
async fn add_task_for_user(
    user_id: i64,
    task_data: dto::task::NewTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<(StatusCode, Json<dto::task::Task>), ErrorResponse> {
    info!("Adding task for user {user_id}");
    task_data
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let user_detect = persistence::db_user_driven_ports::DbDetectUser {};
    let task_writer = persistence::db_task_driven_ports::DbTaskWriter {};

    let creation_result = task_service
        .create_task_for_user(
            user_id,
            &task_data.into(),
            &mut *ext_cxn,
            &user_detect,
            &task_writer,
        )
        .await;
    let created_task = match creation_result {
        Ok(task) => task,
        Err(task_err) => {
            error!("Failed to add task for user {user_id}: {task_err}");
            return Err(task_error_response(user_id, task_err).into());
        }
    };

    Ok((StatusCode::CREATED, Json(created_task.into())))
}

/// Maps a task operation failure onto this module's error responses
fn task_error_response(
    user_id: i64,
    task_err: domain::task::driving_ports::TaskError,
) -> axum::response::Response {
    use axum::response::IntoResponse;

    match task_err {
        domain::task::driving_ports::TaskError::UserDoesNotExist => {
            NotFoundResponse(format!("User {user_id} does not exist.")).into_response()
        }
        domain::task::driving_ports::TaskError::TaskDoesNotExist => {
            NotFoundResponse("The requested task does not exist.".to_owned()).into_response()
        }
        domain::task::driving_ports::TaskError::PortError(port_err) => {
            GenericErrorResponse(port_err).into_response()
        }
    }
}
