use axum::body;
use serde::de::DeserializeOwned;

/// Collects a response body and parses it as JSON into [T], panicking with the
/// offending bytes when the body isn't readable or doesn't match the shape tests
/// expect.
pub async fn deserialize_body<T: DeserializeOwned>(response_body: body::Body) -> T {
    let body_bytes = body::to_bytes(response_body, usize::MAX)
        .await
        .expect("response body was not readable");

    match serde_json::from_slice(&body_bytes) {
        Ok(parsed) => parsed,
        Err(parse_err) => panic!(
            "response body did not match the expected shape ({parse_err}), body was: {body_bytes:?}"
        ),
    }
}
