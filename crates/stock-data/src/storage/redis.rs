//! Redis cache 구현.
//!
//! 시세 응답 캐시와 업스트림 호출 한도 카운터를 Redis에 저장합니다.
//! `ConnectionManager`는 연결이 끊기면 자동으로 재연결하므로
//! 일시적인 Redis 장애 후에도 프로세스를 재시작할 필요가 없습니다.

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client};
use stock_core::RedisConfig;
use tracing::{debug, info};

use super::CacheStore;
use crate::error::{DataError, Result};

/// Redis 연결 래퍼.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// 새로운 Redis cache 연결을 생성합니다.
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        info!("Connecting to Redis...");

        let client =
            Client::open(config.url.as_str()).map_err(|e| DataError::CacheError(e.to_string()))?;

        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(config.connection_timeout())
            .set_response_timeout(config.response_timeout());

        let connection = ConnectionManager::new_with_config(client, manager_config)
            .await
            .map_err(|e| DataError::CacheError(e.to_string()))?;

        info!("Redis connection established");

        Ok(Self { connection })
    }

    // ConnectionManager는 clone이 저렴하고 내부적으로 multiplexed 연결을 공유함
    fn conn(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_string(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.conn();
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        debug!(key, ttl_secs, "Cache entry stored");
        Ok(())
    }

    async fn get_counter(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn();
        let count: Option<i64> = conn.get(key).await?;
        Ok(count.unwrap_or(0))
    }

    async fn increment(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn();
        let count: i64 = conn.incr(key, 1).await?;
        Ok(count)
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool> {
        let mut conn = self.conn();
        let result: bool = conn.expire(key, ttl_secs as i64).await?;
        Ok(result)
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.conn();
        let result: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(result == "PONG")
    }
}
