//! 클라이언트 API 키 검증 middleware.
//!
//! `ApiKey` 헤더 값이 설정된 키와 일치해야 요청이 핸들러에 도달합니다.
//! 키가 설정되지 않은 경우 모든 요청을 통과시킵니다.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiErrorResponse;
use crate::state::AppState;

/// 클라이언트 API 키 헤더 이름.
pub const API_KEY_HEADER: &str = "ApiKey";

/// API 키 검증 미들웨어.
///
/// - 헤더 없음 → 401 `API_KEY_MISSING`
/// - 키 불일치 → 401 `API_KEY_INVALID`
pub async fn api_key_layer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.client_api_key.as_ref() else {
        return next.run(request).await;
    };

    let rejection = match request.headers().get(API_KEY_HEADER) {
        None => Some(("missing", "API_KEY_MISSING", "API Key was not provided.")),
        Some(value) if value.as_bytes() == expected.expose_secret().as_bytes() => None,
        Some(_) => Some(("invalid", "API_KEY_INVALID", "Unauthorized client.")),
    };

    match rejection {
        None => next.run(request).await,
        Some((reason, code, message)) => {
            counter!("api_key_rejections_total", "reason" => reason).increment(1);
            warn!(path = %request.uri().path(), reason, "Rejected client request");
            unauthorized(code, message, &request)
        }
    }
}

fn unauthorized(code: &str, message: &str, request: &Request) -> Response {
    let body = ApiErrorResponse::new(code, message)
        .with_request_info(request.method(), request.uri());
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
