//! 데이터 모듈 오류 타입.

use stock_core::CoreError;
use thiserror::Error;

use crate::rate_limit::RateLimitScope;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 업스트림 호출 한도 초과
    #[error("{0}")]
    RateLimitExceeded(RateLimitScope),

    /// 업스트림이 성공이 아닌 HTTP 상태를 반환
    #[error("Upstream returned {status}: {reason}")]
    UpstreamStatus { status: u16, reason: String },

    /// 업스트림 전송 실패, 타임아웃, 잘못된 응답 형식
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// 캐시 저장소 연결/명령 오류
    #[error("Cache error: {0}")]
    CacheError(String),

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 잘못된 티커 심볼
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DataError {
    /// 업스트림 실패 여부 (HTTP 502 대상).
    pub fn is_upstream(&self) -> bool {
        matches!(self, DataError::Upstream(_) | DataError::UpstreamStatus { .. })
    }
}

impl From<redis::RedisError> for DataError {
    fn from(err: redis::RedisError) -> Self {
        DataError::CacheError(err.to_string())
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataError::Upstream(format!("request timed out: {}", err))
        } else {
            DataError::Upstream(err.to_string())
        }
    }
}

impl From<CoreError> for DataError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidSymbol(msg) => DataError::InvalidSymbol(msg),
            other => DataError::ConfigError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
