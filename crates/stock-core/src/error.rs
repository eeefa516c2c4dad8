//! 핵심 에러 타입.

use thiserror::Error;

/// 설정 및 도메인 입력 검증 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정 소스 로드/역직렬화 실패
    #[error("Configuration load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    /// 필수 설정 누락 또는 잘못된 값
    #[error("Configuration error: {0}")]
    Config(String),

    /// 잘못된 티커 심볼
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
}

/// Core 결과 타입.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
