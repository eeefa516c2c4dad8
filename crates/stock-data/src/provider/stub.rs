//! 테스트용 스텁 Provider.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use stock_core::{StockData, StockMetaData, StockResponse, TickerSymbol};

use super::DailySeriesProvider;
use crate::error::{DataError, Result};

/// 심볼 하나에 대한 고정 일봉 응답 (`2024-01-02` 하루치).
pub fn sample_response(symbol: &str) -> StockResponse {
    let mut time_series = BTreeMap::new();
    time_series.insert(
        "2024-01-02".to_string(),
        StockData {
            open: "187.1500".to_string(),
            high: "188.4400".to_string(),
            low: "183.8850".to_string(),
            close: "185.6400".to_string(),
            volume: "82488674".to_string(),
        },
    );

    StockResponse {
        metadata: StockMetaData {
            information: "Daily Prices (open, high, low, close) and Volumes".to_string(),
            symbol: symbol.to_string(),
            last_refreshed: "2024-01-02".to_string(),
            output_size: "Compact".to_string(),
            time_zone: "US/Eastern".to_string(),
        },
        time_series,
    }
}

/// 호출 횟수를 세는 스텁 Provider.
#[derive(Debug, Default)]
pub struct StubProvider {
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이후 호출이 업스트림 오류를 반환하도록 설정합니다.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// 지금까지의 호출 횟수.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DailySeriesProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn fetch_daily(&self, symbol: &TickerSymbol) -> Result<StockResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(DataError::UpstreamStatus {
                status: 500,
                reason: "Internal Server Error".to_string(),
            });
        }

        Ok(sample_response(symbol.as_str()))
    }
}
