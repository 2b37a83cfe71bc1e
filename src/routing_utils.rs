use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_macros::FromRequest;

use serde::Serialize;
use utoipa::openapi::{RefOr, Schema};
use utoipa::{ToResponse, ToSchema, openapi};

use validator::ValidationErrors;

/// The error body every failing route responds with. `error_code` is the
/// machine-readable discriminator; `error_description` is for humans reading logs
/// or the swagger UI.
#[derive(Serialize, Debug, ToResponse)]
#[response(examples(
    ("Not Found" = (
        summary = "The named user or task doesn't exist (404)",
        value = json!({
            "error_code": "not_found",
            "error_description": "User 999 does not exist.",
            "extra_info": null
        })
    )),

    ("Conflict" = (
        summary = "The request clashed with data that already exists (409)",
        value = json!({
            "error_code": "conflict",
            "error_description": "A user with that email already exists.",
            "extra_info": null
        })
    )),

    ("Internal Failure" = (
        summary = "The storage layer failed out from under the request (500)",
        value = json!({
            "error_code": "internal_error",
            "error_description": "The server could not complete the operation.",
            "extra_info": null
        })
    )),

    ("Invalid Input" = (
        summary = "A required field was missing or empty (400)",
        value = json!({
            "error_code": "invalid_input",
            "error_description": "One or more fields failed validation.",
            "extra_info": {
                "title": [
                    {
                        "code": "length",
                        "message": null,
                        "params": {
                            "value": "",
                            "min": 1
                        }
                    }
                ]
            }
        })
    )),

    ("Malformed JSON" = (
        summary = "The request body wasn't parseable JSON (400)",
        value = json!({
            "error_code": "invalid_json",
            "error_description": "The request body could not be parsed as JSON.",
            "extra_info": "Failed to parse the request body as JSON: EOF while parsing an object at line 4 column 0"
        })
    ))
))]
pub struct BasicErrorResponse {
    pub error_code: String,
    pub error_description: String,
    pub extra_info: Option<ExtraInfo>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(untagged)]
pub enum ExtraInfo {
    ValidationIssues(ValidationErrorSchema),
    Message(String),
}

/// Stand-in OpenAPI schema for [ValidationErrors], which can't describe itself;
/// documents as a free-form object
#[derive(Serialize, Debug)]
#[serde(transparent)]
pub struct ValidationErrorSchema(pub ValidationErrors);

impl<'schem> ToSchema<'schem> for ValidationErrorSchema {
    fn schema() -> (&'schem str, RefOr<Schema>) {
        (
            "ValidationErrorSchema",
            openapi::ObjectBuilder::new().into(),
        )
    }
}

/// 404 response carrying a message naming the entity that wasn't there
pub struct NotFoundResponse(pub String);

impl IntoResponse for NotFoundResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::NOT_FOUND,
            Json(BasicErrorResponse {
                error_code: "not_found".into(),
                error_description: self.0,
                extra_info: None,
            }),
        )
            .into_response()
    }
}

/// 409 response for requests that clash with data that already exists
pub struct ConflictResponse(pub String);

impl IntoResponse for ConflictResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::CONFLICT,
            Json(BasicErrorResponse {
                error_code: "conflict".into(),
                error_description: self.0,
                extra_info: None,
            }),
        )
            .into_response()
    }
}

/// 500 response hiding the underlying failure behind an opaque body. The wrapped
/// error is logged at the call site, never serialized to the client.
pub struct GenericErrorResponse(pub anyhow::Error);

impl IntoResponse for GenericErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(BasicErrorResponse {
                error_code: "internal_error".into(),
                error_description: "The server could not complete the operation.".into(),
                extra_info: None,
            }),
        )
            .into_response()
    }
}

/// 400 response spelling out which fields failed validation and why
pub struct ValidationErrorResponse(ValidationErrors);

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(BasicErrorResponse {
                error_code: "invalid_input".into(),
                error_description: "One or more fields failed validation.".to_owned(),
                extra_info: Some(ExtraInfo::ValidationIssues(ValidationErrorSchema(self.0))),
            }),
        )
            .into_response()
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(value: ValidationErrors) -> Self {
        Self(value)
    }
}

/// Wrapper for [axum::Json] whose rejection produces a [BasicErrorResponse]
/// instead of axum's plain-text default
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(JsonErrorResponse))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// 400 response for request bodies that never made it through the JSON parser
pub struct JsonErrorResponse {
    decode_failure: String,
}

impl From<JsonRejection> for JsonErrorResponse {
    fn from(value: JsonRejection) -> Self {
        JsonErrorResponse {
            decode_failure: value.body_text(),
        }
    }
}

impl IntoResponse for JsonErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            axum::Json(BasicErrorResponse {
                error_code: "invalid_json".into(),
                error_description: "The request body could not be parsed as JSON.".into(),
                extra_info: Some(ExtraInfo::Message(self.decode_failure)),
            }),
        )
            .into_response()
    }
}
