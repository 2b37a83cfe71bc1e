use utoipa::OpenApi;

pub mod task;
pub mod user;

/// Gathers the OpenAPI schema definitions exported by the DTO modules so
/// [crate::api::swagger_main] can merge them into the served API document
#[derive(OpenApi)]
#[openapi(components(schemas(
    user::UserWithTaskCount,
    user::NewUser,
    user::InsertedUser,
    task::Task,
    task::TaskStatus,
    task::NewTask,
    task::SetTaskStatus,
    task::TaskStatusResponse,
)))]
pub struct OpenApiSchemas;
