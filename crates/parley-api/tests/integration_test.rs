use axum::response::IntoResponse;
use axum::http::StatusCode;

use parley_api::error::ApiError;
use parley_chat::ChatError;

#[tokio::test]
async fn validation_errors_map_to_bad_request() {
    let error = ApiError::Chat(ChatError::Validation("message must not be empty".to_string()));
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error = ApiError::BadRequest("bad".to_string());
    assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn access_denied_maps_to_not_found() {
    // Ownership mismatch and absence share one response
    let error = ApiError::Chat(ChatError::AccessDenied);
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn agent_errors_map_to_bad_gateway() {
    let error = ApiError::Chat(ChatError::Agent("runtime unreachable".to_string()));
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
