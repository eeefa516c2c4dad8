//! read-through 시세 캐시 게이트웨이.
//!
//! 조회 순서:
//! 1. 캐시 조회 (hit이면 바로 반환, 호출 한도 확인 없음)
//! 2. 호출 한도 확인 및 카운터 증가 (초과 시 업스트림 호출 없이 실패)
//! 3. 업스트림 조회
//! 4. TTL과 함께 캐시에 저장 (실패해도 응답은 반환)
//!
//! 캐시 조회 실패는 miss와 같이 취급하여 업스트림으로 진행하되 로그를 남깁니다.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use stock_core::{StockResponse, TickerSymbol};
use tracing::{error, info, instrument, warn};

use crate::error::{DataError, Result};
use crate::provider::DailySeriesProvider;
use crate::rate_limit::RateLimiter;
use crate::storage::CacheStore;

/// 캐시 조회 결과.
#[derive(Debug)]
pub enum CacheLookup {
    /// 유효한 캐시 항목
    Hit(StockResponse),
    /// 항목 없음 (또는 복원할 수 없는 항목)
    Miss,
    /// 저장소에 접근할 수 없음
    Unavailable(DataError),
}

/// 게이트웨이 통계.
#[derive(Debug, Default)]
pub struct GatewayStats {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    cache_errors: AtomicU64,
    rate_limited: AtomicU64,
    upstream_fetches: AtomicU64,
    upstream_failures: AtomicU64,
}

/// 게이트웨이 통계 스냅샷.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GatewayStatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_errors: u64,
    pub rate_limited: u64,
    pub upstream_fetches: u64,
    pub upstream_failures: u64,
    pub hit_rate: f64,
}

impl GatewayStats {
    fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> GatewayStatsSnapshot {
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.cache_misses.load(Ordering::Relaxed);
        let total = cache_hits + cache_misses;
        let hit_rate = if total > 0 {
            cache_hits as f64 / total as f64
        } else {
            0.0
        };

        GatewayStatsSnapshot {
            cache_hits,
            cache_misses,
            cache_errors: self.cache_errors.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            upstream_fetches: self.upstream_fetches.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
            hit_rate,
        }
    }
}

/// 시세 조회 게이트웨이.
pub struct StockDataGateway {
    cache: Arc<dyn CacheStore>,
    provider: Arc<dyn DailySeriesProvider>,
    rate_limiter: RateLimiter,
    cache_ttl_secs: u64,
    stats: GatewayStats,
}

impl StockDataGateway {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        provider: Arc<dyn DailySeriesProvider>,
        rate_limiter: RateLimiter,
        cache_ttl_secs: u64,
    ) -> Self {
        Self {
            cache,
            provider,
            rate_limiter,
            cache_ttl_secs,
            stats: GatewayStats::default(),
        }
    }

    /// 심볼의 캐시 키.
    pub fn cache_key(symbol: &TickerSymbol) -> String {
        format!("stock:daily:{}", symbol)
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    pub fn stats(&self) -> GatewayStatsSnapshot {
        self.stats.snapshot()
    }

    /// 심볼의 일봉 시세를 조회합니다.
    ///
    /// # Errors
    /// - `RateLimitExceeded`: 캐시 miss이고 호출 한도 초과
    /// - `UpstreamStatus` / `Upstream`: 업스트림 호출 실패
    /// - `CacheError`: 호출 한도 카운터에 접근할 수 없음
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn get_stock_data(&self, symbol: &TickerSymbol) -> Result<StockResponse> {
        let key = Self::cache_key(symbol);

        match self.lookup(&key).await {
            CacheLookup::Hit(response) => {
                GatewayStats::incr(&self.stats.cache_hits);
                info!("Cache hit");
                return Ok(response);
            }
            CacheLookup::Miss => {
                GatewayStats::incr(&self.stats.cache_misses);
            }
            CacheLookup::Unavailable(e) => {
                GatewayStats::incr(&self.stats.cache_misses);
                GatewayStats::incr(&self.stats.cache_errors);
                warn!(error = %e, "Cache read failed, treating as miss");
            }
        }

        if let Err(e) = self.rate_limiter.check_and_increment().await {
            if matches!(e, DataError::RateLimitExceeded(_)) {
                GatewayStats::incr(&self.stats.rate_limited);
            }
            return Err(e);
        }

        info!(provider = self.provider.name(), "Cache miss, fetching from upstream");
        GatewayStats::incr(&self.stats.upstream_fetches);

        let response = match self.provider.fetch_daily(symbol).await {
            Ok(response) => response,
            Err(e) => {
                GatewayStats::incr(&self.stats.upstream_failures);
                error!(error = %e, "Error fetching stock data");
                return Err(e);
            }
        };

        match self.store(&key, &response).await {
            Ok(()) => info!(key, ttl_secs = self.cache_ttl_secs, "Cached stock data"),
            Err(e) => error!(key, error = %e, "Error caching stock data"),
        }

        Ok(response)
    }

    /// 캐시를 조회합니다.
    ///
    /// 저장된 값이 현재 형식으로 복원되지 않으면 miss로 취급합니다.
    /// 다음 업스트림 조회가 같은 키를 덮어씁니다.
    pub async fn lookup(&self, key: &str) -> CacheLookup {
        match self.cache.get_string(key).await {
            Ok(Some(json)) => match decode_entry(&json) {
                Ok(response) => CacheLookup::Hit(response),
                Err(e) => {
                    warn!(key, error = %e, "Discarding undecodable cache entry");
                    CacheLookup::Miss
                }
            },
            Ok(None) => CacheLookup::Miss,
            Err(e) => CacheLookup::Unavailable(e),
        }
    }

    /// 응답을 TTL과 함께 캐시에 저장합니다.
    async fn store(&self, key: &str, response: &StockResponse) -> Result<()> {
        let json = encode_entry(response)?;
        self.cache.set_string(key, &json, self.cache_ttl_secs).await
    }
}

/// 캐시 항목 직렬화.
pub fn encode_entry(response: &StockResponse) -> Result<String> {
    Ok(serde_json::to_string(response)?)
}

/// 캐시 항목 역직렬화.
pub fn decode_entry(json: &str) -> Result<StockResponse> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::stub::{sample_response, StubProvider};
    use crate::rate_limit::{RateLimitConfig, RateLimitScope, DAILY_COUNTER_KEY, MINUTE_COUNTER_KEY};
    use crate::storage::memory::MemoryCache;
    use std::time::Duration;

    struct Fixture {
        cache: Arc<MemoryCache>,
        provider: Arc<StubProvider>,
        gateway: StockDataGateway,
    }

    fn fixture() -> Fixture {
        let cache = Arc::new(MemoryCache::new());
        let provider = Arc::new(StubProvider::new());
        let limiter = RateLimiter::new(cache.clone(), RateLimitConfig::default());
        let gateway = StockDataGateway::new(cache.clone(), provider.clone(), limiter, 300);
        Fixture {
            cache,
            provider,
            gateway,
        }
    }

    fn symbol(s: &str) -> TickerSymbol {
        TickerSymbol::parse(s).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_fetches_once_and_caches() {
        let f = fixture();
        let aapl = symbol("AAPL");

        let response = f.gateway.get_stock_data(&aapl).await.unwrap();

        assert_eq!(response, sample_response("AAPL"));
        assert_eq!(f.provider.calls(), 1);
        assert_eq!(f.cache.get_counter(MINUTE_COUNTER_KEY).await.unwrap(), 1);
        assert_eq!(f.cache.get_counter(DAILY_COUNTER_KEY).await.unwrap(), 1);
        assert_eq!(
            f.cache.ttl(&StockDataGateway::cache_key(&aapl)),
            Some(Duration::from_secs(300))
        );
    }

    #[tokio::test]
    async fn test_hit_skips_rate_limiter_and_upstream() {
        let f = fixture();
        let aapl = symbol("AAPL");

        let first = f.gateway.get_stock_data(&aapl).await.unwrap();
        let second = f.gateway.get_stock_data(&aapl).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(f.provider.calls(), 1);
        assert_eq!(f.cache.get_counter(MINUTE_COUNTER_KEY).await.unwrap(), 1);

        let stats = f.gateway.stats();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.upstream_fetches, 1);
    }

    #[tokio::test]
    async fn test_hit_returns_cached_value_as_stored() {
        let f = fixture();
        let msft = symbol("MSFT");
        let mut cached = sample_response("MSFT");
        cached.metadata.last_refreshed = "cached".to_string();
        f.cache.insert_raw(
            &StockDataGateway::cache_key(&msft),
            &serde_json::to_string(&cached).unwrap(),
        );

        let response = f.gateway.get_stock_data(&msft).await.unwrap();

        assert_eq!(response, cached);
        assert_eq!(f.provider.calls(), 0);
        assert_eq!(f.cache.get_counter(MINUTE_COUNTER_KEY).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rate_limited_miss_never_reaches_upstream() {
        let f = fixture();

        for s in ["A", "B", "C", "D", "E"] {
            f.gateway.get_stock_data(&symbol(s)).await.unwrap();
        }
        assert_eq!(f.provider.calls(), 5);

        let err = f.gateway.get_stock_data(&symbol("F")).await.unwrap_err();

        assert!(matches!(
            err,
            DataError::RateLimitExceeded(RateLimitScope::PerMinute)
        ));
        assert_eq!(f.provider.calls(), 5);
        assert_eq!(f.gateway.stats().rate_limited, 1);

        // 이미 캐시된 심볼은 한도와 무관하게 조회됨
        assert!(f.gateway.get_stock_data(&symbol("A")).await.is_ok());
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_treated_as_miss() {
        let f = fixture();
        let aapl = symbol("AAPL");
        let key = StockDataGateway::cache_key(&aapl);
        f.cache.insert_raw(&key, "{not json");

        assert!(matches!(f.gateway.lookup(&key).await, CacheLookup::Miss));

        let response = f.gateway.get_stock_data(&aapl).await.unwrap();
        assert_eq!(response.symbol(), "AAPL");
        assert_eq!(f.provider.calls(), 1);
        assert!(matches!(f.gateway.lookup(&key).await, CacheLookup::Hit(_)));
    }

    #[tokio::test]
    async fn test_cache_write_failure_still_returns_response() {
        let f = fixture();
        f.cache.set_fail_writes(true);
        let aapl = symbol("AAPL");

        let response = f.gateway.get_stock_data(&aapl).await.unwrap();

        assert_eq!(response.symbol(), "AAPL");
        assert!(!f.cache.contains(&StockDataGateway::cache_key(&aapl)));
    }

    #[tokio::test]
    async fn test_unavailable_cache_lookup_reports_error() {
        let f = fixture();
        f.cache.set_unavailable(true);

        let lookup = f.gateway.lookup("stock:daily:AAPL").await;
        assert!(matches!(lookup, CacheLookup::Unavailable(DataError::CacheError(_))));

        // 카운터 저장소도 같은 저장소이므로 호출 한도 확인에서 실패
        let err = f.gateway.get_stock_data(&symbol("AAPL")).await.unwrap_err();
        assert!(matches!(err, DataError::CacheError(_)));
        assert_eq!(f.provider.calls(), 0);
        assert_eq!(f.gateway.stats().cache_errors, 1);
    }

    #[tokio::test]
    async fn test_read_failure_with_separate_counter_store_proceeds_upstream() {
        let cache = Arc::new(MemoryCache::new());
        cache.set_unavailable(true);
        let counters = Arc::new(MemoryCache::new());
        let provider = Arc::new(StubProvider::new());
        let limiter = RateLimiter::new(counters.clone(), RateLimitConfig::default());
        let gateway = StockDataGateway::new(cache, provider.clone(), limiter, 300);

        let response = gateway.get_stock_data(&symbol("AAPL")).await.unwrap();

        assert_eq!(response.symbol(), "AAPL");
        assert_eq!(provider.calls(), 1);
        assert_eq!(counters.get_counter(MINUTE_COUNTER_KEY).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_not_cached() {
        let f = fixture();
        f.provider.set_failing(true);
        let aapl = symbol("AAPL");

        let err = f.gateway.get_stock_data(&aapl).await.unwrap_err();

        assert!(err.is_upstream());
        assert!(!f.cache.contains(&StockDataGateway::cache_key(&aapl)));
        assert_eq!(f.gateway.stats().upstream_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let f = fixture();
        let aapl = symbol("AAPL");

        f.gateway.get_stock_data(&aapl).await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        f.gateway.get_stock_data(&aapl).await.unwrap();
        assert_eq!(f.provider.calls(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        f.gateway.get_stock_data(&aapl).await.unwrap();
        assert_eq!(f.provider.calls(), 2);
    }

    #[test]
    fn test_decode_entry_reports_serialization_error() {
        assert!(matches!(
            decode_entry("{not json"),
            Err(DataError::SerializationError(_))
        ));

        let response = sample_response("AAPL");
        let json = encode_entry(&response).unwrap();
        assert_eq!(decode_entry(&json).unwrap(), response);
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(
            StockDataGateway::cache_key(&symbol("brk.b")),
            "stock:daily:BRK.B"
        );
    }
}
