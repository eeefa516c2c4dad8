//! 캐시 저장소.
//!
//! 시세 응답 캐시와 호출 한도 카운터는 모두 외부 key-value 저장소에 둡니다.
//! 여러 인스턴스가 같은 저장소를 공유하므로 프로세스 내부 상태는 두지 않습니다.

pub mod redis;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;

pub use self::redis::RedisCache;

/// key-value 캐시 저장소.
///
/// 문자열 get/set-with-TTL, 원자적 증가, 만료 설정을 제공합니다.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 저장소 이름 (로그/헬스 체크용).
    fn name(&self) -> &str;

    /// 문자열 값을 조회합니다. 키가 없으면 `None`.
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// TTL과 함께 문자열 값을 저장합니다.
    async fn set_string(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// 정수 카운터를 조회합니다. 키가 없으면 0.
    async fn get_counter(&self, key: &str) -> Result<i64>;

    /// 카운터를 원자적으로 1 증가시키고 증가 후 값을 반환합니다.
    ///
    /// 키가 없으면 만료 없이 1로 생성됩니다.
    async fn increment(&self, key: &str) -> Result<i64>;

    /// 기존 키에 TTL을 설정합니다. 키가 없으면 `false`.
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool>;

    /// 저장소 상태를 확인합니다.
    async fn health_check(&self) -> Result<bool>;
}
