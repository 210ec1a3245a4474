use axum::http::StatusCode;
use axum::response::IntoResponse;
use common_http_errors::ApiError;
use http_body_util::BodyExt;
use serde_json::Value;

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn authentication_required_variant() {
    let resp = ApiError::AuthenticationRequired.into_response();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "AUTHENTICATION_REQUIRED");
    let body = body_json(resp).await;
    assert_eq!(body["code"], "AUTHENTICATION_REQUIRED");
    assert!(body["error"].is_string());
    assert!(body.get("requiredRole").is_none());
}

#[tokio::test]
async fn insufficient_role_variant() {
    let resp = ApiError::InsufficientRole { required: "SUPER_ADMIN".into() }.into_response();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "INSUFFICIENT_ROLE");
    let body = body_json(resp).await;
    assert_eq!(body["code"], "INSUFFICIENT_ROLE");
    assert_eq!(body["requiredRole"], "SUPER_ADMIN");
}

#[test]
fn invalid_credentials_variant() {
    let resp = ApiError::InvalidCredentials.into_response();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "INVALID_CREDENTIALS");
}

#[test]
fn bad_request_variant() {
    let resp = ApiError::BadRequest { code: "INVALID_ROLE", message: None }.into_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "INVALID_ROLE");
}

#[test]
fn not_found_variant() {
    let resp = ApiError::NotFound { code: "USER_NOT_FOUND" }.into_response();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "USER_NOT_FOUND");
}

#[tokio::test]
async fn internal_variant_hides_detail() {
    let resp = ApiError::internal("connection reset by peer").into_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "INTERNAL_ERROR");
    let body = body_json(resp).await;
    assert!(!body["error"].as_str().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn malformed_json_body_uses_error_shape() {
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header::CONTENT_TYPE, Request};
    use axum::Json;

    let req = Request::builder()
        .method("POST")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let rejection = Json::<Value>::from_request(req, &()).await.unwrap_err();
    let resp = ApiError::from(rejection).into_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "INVALID_REQUEST");
    let body = body_json(resp).await;
    assert_eq!(body["code"], "INVALID_REQUEST");
    assert!(body["error"].is_string());
}
