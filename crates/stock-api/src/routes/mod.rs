//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/stocks/{symbol}` - 일봉 시세 조회 (API 키 검증 적용)

pub mod health;
pub mod stocks;

pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use stocks::stocks_router;

use axum::{middleware, Router};
use std::sync::Arc;

use crate::middleware::api_key_layer;
use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// `/api` 하위 라우트에만 클라이언트 API 키 검증이 적용됩니다.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .nest("/api/stocks", stocks_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), api_key_layer));

    Router::new()
        .nest("/health", health_router())
        .merge(api)
        .with_state(state)
}
