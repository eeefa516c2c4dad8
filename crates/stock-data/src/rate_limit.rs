//! 업스트림 API 호출 한도 관리.
//!
//! 분당/일일 두 개의 카운터를 캐시 저장소에 두고, 각 카운터는 윈도우의
//! 첫 증가(0 → 1) 시점에 만료 시간을 설정합니다. 여러 인스턴스가 같은
//! 카운터를 공유합니다.
//!
//! 조회 후 증가는 트랜잭션이 아니므로 동시 요청이 몰리면 한도를 약간 넘을 수
//! 있습니다. 한도는 근사치로 취급합니다.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use stock_core::RateLimitSettings;
use tracing::{debug, warn};

use crate::error::{DataError, Result};
use crate::storage::CacheStore;

/// 분당 카운터 키.
pub const MINUTE_COUNTER_KEY: &str = "stock:requests:minute";

/// 일일 카운터 키.
pub const DAILY_COUNTER_KEY: &str = "stock:requests:day";

/// 한도 초과 범위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    /// 분당 한도
    PerMinute,
    /// 일일 한도
    Daily,
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitScope::PerMinute => {
                write!(f, "API rate limit exceeded. Please wait a minute.")
            }
            RateLimitScope::Daily => write!(f, "Daily API limit exceeded. Try again tomorrow."),
        }
    }
}

/// Rate Limiter 설정.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// 분당 최대 호출 수
    pub per_minute: i64,
    /// 일일 최대 호출 수
    pub per_day: i64,
    /// 분 윈도우 (초)
    pub minute_window_secs: u64,
    /// 일 윈도우 (초)
    pub day_window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::from(&RateLimitSettings::default())
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        Self {
            per_minute: i64::try_from(settings.per_minute).unwrap_or(i64::MAX),
            per_day: i64::try_from(settings.per_day).unwrap_or(i64::MAX),
            minute_window_secs: settings.minute_window_secs,
            day_window_secs: settings.day_window_secs,
        }
    }
}

/// 현재 카운터 사용량.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitUsage {
    pub minute_count: i64,
    pub minute_limit: i64,
    pub daily_count: i64,
    pub daily_limit: i64,
}

/// 업스트림 호출 한도 관리자.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CacheStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CacheStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// 한도를 확인하고 통과하면 두 카운터를 증가시킵니다.
    ///
    /// # Errors
    /// - `RateLimitExceeded(PerMinute)`: 분당 카운터가 한도 이상
    /// - `RateLimitExceeded(Daily)`: 일일 카운터가 한도 이상
    /// - `CacheError`: 카운터 저장소에 접근할 수 없음
    pub async fn check_and_increment(&self) -> Result<()> {
        let minute_count = self.store.get_counter(MINUTE_COUNTER_KEY).await?;
        let daily_count = self.store.get_counter(DAILY_COUNTER_KEY).await?;

        if minute_count >= self.config.per_minute {
            warn!(
                minute_count,
                limit = self.config.per_minute,
                "API limit reached: per-minute quota exceeded"
            );
            return Err(DataError::RateLimitExceeded(RateLimitScope::PerMinute));
        }
        if daily_count >= self.config.per_day {
            warn!(
                daily_count,
                limit = self.config.per_day,
                "API limit reached: daily quota exceeded"
            );
            return Err(DataError::RateLimitExceeded(RateLimitScope::Daily));
        }

        let minute = self
            .bump(MINUTE_COUNTER_KEY, self.config.minute_window_secs)
            .await?;
        let daily = self
            .bump(DAILY_COUNTER_KEY, self.config.day_window_secs)
            .await?;

        debug!(minute, daily, "Upstream call slot acquired");
        Ok(())
    }

    /// 현재 사용량을 조회합니다.
    pub async fn usage(&self) -> Result<RateLimitUsage> {
        Ok(RateLimitUsage {
            minute_count: self.store.get_counter(MINUTE_COUNTER_KEY).await?,
            minute_limit: self.config.per_minute,
            daily_count: self.store.get_counter(DAILY_COUNTER_KEY).await?,
            daily_limit: self.config.per_day,
        })
    }

    /// 카운터를 증가시키고, 윈도우의 첫 요청이면 만료 시간을 설정합니다.
    ///
    /// 만료 설정 실패는 카운터가 예상보다 오래 남는 것일 뿐이므로 경고만 남깁니다.
    async fn bump(&self, key: &str, window_secs: u64) -> Result<i64> {
        let count = self.store.increment(key).await?;

        if count == 1 {
            match self.store.expire(key, window_secs).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(key, window_secs, "Rate limit counter vanished before expiry was set");
                }
                Err(e) => {
                    warn!(
                        key,
                        window_secs,
                        error = %e,
                        "Failed to set rate limit counter expiry"
                    );
                }
            }
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryCache;
    use std::time::Duration;

    fn limiter(cache: &Arc<MemoryCache>) -> RateLimiter {
        RateLimiter::new(cache.clone(), RateLimitConfig::default())
    }

    #[test]
    fn test_oversized_settings_saturate() {
        let settings = RateLimitSettings {
            per_minute: u64::MAX,
            per_day: i64::MAX as u64 + 1,
            ..Default::default()
        };
        let config = RateLimitConfig::from(&settings);

        assert_eq!(config.per_minute, i64::MAX);
        assert_eq!(config.per_day, i64::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sixth_call_in_minute_is_rejected() {
        let cache = Arc::new(MemoryCache::new());
        let limiter = limiter(&cache);

        for _ in 0..5 {
            limiter.check_and_increment().await.unwrap();
        }

        let err = limiter.check_and_increment().await.unwrap_err();
        assert!(matches!(
            err,
            DataError::RateLimitExceeded(RateLimitScope::PerMinute)
        ));

        // 거부된 호출은 카운터를 증가시키지 않음
        let usage = limiter.usage().await.unwrap();
        assert_eq!(usage.minute_count, 5);
        assert_eq!(usage.daily_count, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_minute_window_resets() {
        let cache = Arc::new(MemoryCache::new());
        let limiter = limiter(&cache);

        for _ in 0..5 {
            limiter.check_and_increment().await.unwrap();
        }
        assert!(limiter.check_and_increment().await.is_err());

        tokio::time::advance(Duration::from_secs(60)).await;

        limiter.check_and_increment().await.unwrap();
        let usage = limiter.usage().await.unwrap();
        assert_eq!(usage.minute_count, 1);
        assert_eq!(usage.daily_count, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_daily_limit() {
        let cache = Arc::new(MemoryCache::new());
        let limiter = limiter(&cache);

        for i in 0..500 {
            if i > 0 && i % 5 == 0 {
                tokio::time::advance(Duration::from_secs(60)).await;
            }
            limiter.check_and_increment().await.unwrap();
        }
        tokio::time::advance(Duration::from_secs(60)).await;

        let err = limiter.check_and_increment().await.unwrap_err();
        assert!(matches!(err, DataError::RateLimitExceeded(RateLimitScope::Daily)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_set_on_first_increment_only() {
        let cache = Arc::new(MemoryCache::new());
        let limiter = limiter(&cache);

        limiter.check_and_increment().await.unwrap();
        assert_eq!(cache.ttl(MINUTE_COUNTER_KEY), Some(Duration::from_secs(60)));
        assert_eq!(cache.ttl(DAILY_COUNTER_KEY), Some(Duration::from_secs(86_400)));

        tokio::time::advance(Duration::from_secs(10)).await;
        limiter.check_and_increment().await.unwrap();

        // 두 번째 증가에서 만료가 연장되지 않음
        assert_eq!(cache.ttl(MINUTE_COUNTER_KEY), Some(Duration::from_secs(50)));
    }

    #[tokio::test]
    async fn test_expire_failure_is_not_fatal() {
        let cache = Arc::new(MemoryCache::new());
        cache.set_fail_expire(true);
        let limiter = limiter(&cache);

        limiter.check_and_increment().await.unwrap();

        assert_eq!(cache.get_counter(MINUTE_COUNTER_KEY).await.unwrap(), 1);
        assert!(cache.ttl(MINUTE_COUNTER_KEY).is_none());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let cache = Arc::new(MemoryCache::new());
        cache.set_unavailable(true);
        let limiter = limiter(&cache);

        assert!(matches!(
            limiter.check_and_increment().await,
            Err(DataError::CacheError(_))
        ));
    }

    #[test]
    fn test_config_from_settings() {
        let settings = RateLimitSettings {
            per_minute: 10,
            per_day: 100,
            minute_window_secs: 30,
            day_window_secs: 3600,
        };
        let config = RateLimitConfig::from(&settings);

        assert_eq!(config.per_minute, 10);
        assert_eq!(config.per_day, 100);
        assert_eq!(config.minute_window_secs, 30);
        assert_eq!(config.day_window_secs, 3600);
    }
}
