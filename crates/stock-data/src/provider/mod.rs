//! 시세 데이터 Provider 모듈.
//!
//! ## Alpha Vantage
//! - `AlphaVantageClient`: RapidAPI를 통한 `TIME_SERIES_DAILY` 조회
//! - API 키/호스트 헤더 인증, 요청 타임아웃 설정

pub mod alpha_vantage;

#[cfg(any(test, feature = "test-utils"))]
pub mod stub;

use async_trait::async_trait;
use stock_core::{StockResponse, TickerSymbol};

use crate::error::Result;

pub use alpha_vantage::AlphaVantageClient;

/// 일봉 시세를 제공하는 업스트림 Provider.
#[async_trait]
pub trait DailySeriesProvider: Send + Sync {
    /// Provider 이름.
    fn name(&self) -> &str;

    /// 심볼의 일봉 시세를 조회합니다.
    async fn fetch_daily(&self, symbol: &TickerSymbol) -> Result<StockResponse>;
}
