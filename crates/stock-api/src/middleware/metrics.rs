//! HTTP 요청 metrics middleware.
//!
//! 경로 라벨은 요청 URI가 아니라 매칭된 라우트 템플릿(`/api/stocks/{symbol}`)을
//! 사용하므로 심볼마다 라벨이 늘어나지 않습니다.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::metrics::{record_http_duration, record_http_request, record_http_response};

/// 라우트에 매칭되지 않은 요청의 경로 라벨.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// 요청의 메트릭 경로 라벨.
pub fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

/// HTTP 메트릭을 수집하는 미들웨어 레이어.
///
/// `Router::layer`로 적용해야 `MatchedPath`가 채워집니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = route_label(&request);

    record_http_request(&method, &route);
    let response = next.run(request).await;

    record_http_response(&method, &route, response.status().as_u16());
    record_http_duration(&method, &route, start.elapsed().as_secs_f64());

    response
}
