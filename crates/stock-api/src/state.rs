//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 모든 API 핸들러에서 공유되는 상태를 관리합니다.
//! Arc로 래핑되어 여러 요청 간에 안전하게 공유됩니다.

use secrecy::SecretString;
use std::sync::Arc;
use stock_data::StockDataGateway;

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 핸들러에 주입됩니다.
pub struct AppState {
    /// 시세 조회 게이트웨이 (캐시 + 호출 한도 + 업스트림)
    pub gateway: Arc<StockDataGateway>,

    /// `/api` 요청에 요구되는 클라이언트 API 키 (없으면 검사 비활성화)
    pub client_api_key: Option<SecretString>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    pub fn new(gateway: Arc<StockDataGateway>) -> Self {
        Self {
            gateway,
            client_api_key: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 클라이언트 API 키 설정.
    #[must_use]
    pub fn with_client_api_key(mut self, key: Option<SecretString>) -> Self {
        self.client_api_key = key;
        self
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }

    /// Redis 연결 상태 확인.
    pub async fn is_redis_healthy(&self) -> bool {
        self.gateway.cache().health_check().await.unwrap_or(false)
    }
}

/// 테스트용 AppState 생성 헬퍼.
///
/// 인메모리 캐시와 스텁 provider로 구성되며 API 키 검사는 비활성화됩니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use stock_data::{MemoryCache, RateLimitConfig, RateLimiter, StubProvider};

    let cache = Arc::new(MemoryCache::new());
    let limiter = RateLimiter::new(cache.clone(), RateLimitConfig::default());
    let gateway = StockDataGateway::new(cache, Arc::new(StubProvider::new()), limiter, 300);

    AppState::new(Arc::new(gateway))
}
