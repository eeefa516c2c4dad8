//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.

use axum::http::{Method, StatusCode, Uri};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stock_data::DataError;
use tracing::error;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "RATE_LIMIT_EXCEEDED",
///   "message": "API rate limit exceeded. Please wait a minute.",
///   "details": {"scope": "per_minute"},
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_SYMBOL", "UPSTREAM_ERROR")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// HTTP 메서드 (GET, POST 등)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// 요청 경로
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    ///
    /// # Example
    ///
    /// ```
    /// use stock_api::error::ApiErrorResponse;
    ///
    /// let error = ApiErrorResponse::new("INVALID_SYMBOL", "symbol is empty");
    /// assert_eq!(error.code(), "INVALID_SYMBOL");
    /// ```
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
            method: None,
            path: None,
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    /// 요청 정보(메서드, 경로)를 추가합니다.
    #[must_use]
    pub fn with_request_info(mut self, method: &Method, uri: &Uri) -> Self {
        self.method = Some(method.to_string());
        self.path = Some(uri.path().to_string());
        self
    }

    /// 에러 코드 반환.
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// `DataError`를 HTTP 상태 코드와 에러 본문으로 변환합니다.
///
/// | 오류 | 상태 | 코드 |
/// |------|------|------|
/// | `InvalidSymbol` | 400 | `INVALID_SYMBOL` |
/// | `RateLimitExceeded` | 429 | `RATE_LIMIT_EXCEEDED` |
/// | `UpstreamStatus` / `Upstream` | 502 | `UPSTREAM_ERROR` |
/// | `CacheError` | 503 | `CACHE_UNAVAILABLE` |
/// | 그 외 | 500 | `INTERNAL_ERROR` |
pub fn data_error_response(err: &DataError) -> (StatusCode, Json<ApiErrorResponse>) {
    let (status, body) = match err {
        DataError::InvalidSymbol(msg) => (
            StatusCode::BAD_REQUEST,
            ApiErrorResponse::new("INVALID_SYMBOL", msg.clone()),
        ),
        DataError::RateLimitExceeded(scope) => (
            StatusCode::TOO_MANY_REQUESTS,
            ApiErrorResponse::with_details(
                "RATE_LIMIT_EXCEEDED",
                scope.to_string(),
                serde_json::json!({ "scope": scope }),
            ),
        ),
        DataError::UpstreamStatus { status, .. } => (
            StatusCode::BAD_GATEWAY,
            ApiErrorResponse::with_details(
                "UPSTREAM_ERROR",
                "Error fetching stock data",
                serde_json::json!({ "upstream_status": status }),
            ),
        ),
        DataError::Upstream(msg) => (
            StatusCode::BAD_GATEWAY,
            ApiErrorResponse::with_details(
                "UPSTREAM_ERROR",
                "Error fetching stock data",
                serde_json::json!({ "reason": msg }),
            ),
        ),
        DataError::CacheError(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorResponse::new("CACHE_UNAVAILABLE", "Cache store is unavailable"),
        ),
        DataError::SerializationError(_) | DataError::ConfigError(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorResponse::new("INTERNAL_ERROR", "Internal server error"),
        ),
    };

    if status.is_server_error() {
        error!(error = %err, status = status.as_u16(), "Request failed");
    }

    (status, Json(body))
}
