//! 시세 데이터 조회 및 캐싱.
//!
//! 이 crate는 다음을 제공합니다:
//! - 캐시 저장소 추상화 (`CacheStore`)와 Redis 구현
//! - 업스트림 호출 한도 관리 (분당/일일 카운터)
//! - Alpha Vantage 일봉 시세 클라이언트
//! - read-through 캐시 게이트웨이 (`StockDataGateway`)

pub mod error;
pub mod gateway;
pub mod provider;
pub mod rate_limit;
pub mod storage;

pub use error::{DataError, Result};
pub use gateway::{CacheLookup, GatewayStats, GatewayStatsSnapshot, StockDataGateway};
pub use provider::{AlphaVantageClient, DailySeriesProvider};
pub use rate_limit::{RateLimitConfig, RateLimitScope, RateLimitUsage, RateLimiter};
pub use storage::{CacheStore, RedisCache};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::stub::{sample_response, StubProvider};
#[cfg(any(test, feature = "test-utils"))]
pub use storage::memory::MemoryCache;
