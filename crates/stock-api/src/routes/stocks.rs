//! 일봉 시세 조회 endpoint.
//!
//! # 엔드포인트
//!
//! - `GET /api/stocks/{symbol}` - 심볼의 일봉 시세 (Alpha Vantage 형식)

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use stock_core::{StockResponse, TickerSymbol};
use stock_data::DataError;
use tracing::debug;

use crate::error::{data_error_response, ApiResult};
use crate::metrics::record_stock_request;
use crate::state::AppState;

/// 일봉 시세 조회.
///
/// GET /api/stocks/{symbol}
///
/// 심볼은 대문자로 정규화되며, 캐시에 있으면 캐시 값을, 없으면 업스트림
/// 조회 결과를 반환합니다.
pub async fn get_stock(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<StockResponse>> {
    let result = match TickerSymbol::parse(&symbol) {
        Ok(symbol) => state.gateway.get_stock_data(&symbol).await,
        Err(e) => Err(DataError::from(e)),
    };

    match result {
        Ok(response) => {
            record_stock_request("ok");
            debug!(symbol = response.symbol(), days = response.len(), "Serving stock data");
            Ok(Json(response))
        }
        Err(e) => {
            record_stock_request(outcome_label(&e));
            Err(data_error_response(&e))
        }
    }
}

fn outcome_label(err: &DataError) -> &'static str {
    match err {
        DataError::InvalidSymbol(_) => "invalid_symbol",
        DataError::RateLimitExceeded(_) => "rate_limited",
        DataError::UpstreamStatus { .. } | DataError::Upstream(_) => "upstream_error",
        DataError::CacheError(_) => "cache_unavailable",
        DataError::SerializationError(_) | DataError::ConfigError(_) => "internal_error",
    }
}

/// 시세 라우터 생성.
pub fn stocks_router() -> Router<Arc<AppState>> {
    Router::new().route("/{symbol}", get(get_stock))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorResponse;
    use crate::state::create_test_state;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use stock_data::{
        MemoryCache, RateLimitConfig, RateLimiter, StockDataGateway, StubProvider,
    };
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        Router::new()
            .nest("/api/stocks", stocks_router())
            .with_state(Arc::new(state))
    }

    async fn send(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_get_stock_normalizes_symbol() {
        let (status, body) = send(app(create_test_state()), "/api/stocks/aapl").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["Meta Data"]["2. Symbol"], "AAPL");
        assert_eq!(json["Time Series (Daily)"]["2024-01-02"]["4. close"], "185.6400");
    }

    #[tokio::test]
    async fn test_invalid_symbol_is_bad_request() {
        let (status, body) = send(app(create_test_state()), "/api/stocks/AA%24PL").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "INVALID_SYMBOL");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let cache = Arc::new(MemoryCache::new());
        let provider = Arc::new(StubProvider::new());
        provider.set_failing(true);
        let limiter = RateLimiter::new(cache.clone(), RateLimitConfig::default());
        let gateway = StockDataGateway::new(cache, provider, limiter, 300);

        let (status, body) =
            send(app(AppState::new(Arc::new(gateway))), "/api/stocks/MSFT").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let error: ApiErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "UPSTREAM_ERROR");
    }

    #[tokio::test]
    async fn test_unavailable_store_is_service_unavailable() {
        let cache = Arc::new(MemoryCache::new());
        cache.set_unavailable(true);
        let limiter = RateLimiter::new(cache.clone(), RateLimitConfig::default());
        let gateway =
            StockDataGateway::new(cache, Arc::new(StubProvider::new()), limiter, 300);

        let (status, body) =
            send(app(AppState::new(Arc::new(gateway))), "/api/stocks/MSFT").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let error: ApiErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "CACHE_UNAVAILABLE");
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome_label(&DataError::InvalidSymbol("x".into())), "invalid_symbol");
        assert_eq!(outcome_label(&DataError::CacheError("x".into())), "cache_unavailable");
    }
}
