//! # Stock Core
//!
//! 주식 대시보드 API의 핵심 도메인 모델 및 공통 인프라를 제공합니다.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 일봉 시세 응답 모델 (`StockResponse`, `StockMetaData`, `StockData`)
//! - 티커 심볼 정규화
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use self::config::*;
pub use error::*;
pub use logging::*;
pub use types::*;
