//! 일봉 시세 응답 모델.
//!
//! Alpha Vantage `TIME_SERIES_DAILY` 응답 형식을 그대로 따릅니다.
//! 업스트림 파싱, Redis 캐시 직렬화, API 응답이 모두 같은 필드명을 사용하므로
//! 캐시에 저장된 값은 다시 읽었을 때 동일한 구조로 복원됩니다.
//!
//! 가격/거래량 값은 정밀도 손실을 막기 위해 업스트림이 준 문자열 그대로 보존합니다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 일봉 시세 응답.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockResponse {
    /// 메타데이터 (심볼, 갱신 시각 등)
    #[serde(rename = "Meta Data")]
    pub metadata: StockMetaData,

    /// 날짜(YYYY-MM-DD) → 일봉 데이터
    #[serde(rename = "Time Series (Daily)")]
    pub time_series: BTreeMap<String, StockData>,
}

/// 응답 메타데이터.
///
/// 모든 값은 업스트림이 제공한 불투명 문자열입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMetaData {
    #[serde(rename = "1. Information")]
    pub information: String,

    #[serde(rename = "2. Symbol")]
    pub symbol: String,

    #[serde(rename = "3. Last Refreshed")]
    pub last_refreshed: String,

    #[serde(rename = "4. Output Size")]
    pub output_size: String,

    #[serde(rename = "5. Time Zone")]
    pub time_zone: String,
}

/// 하루치 OHLCV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockData {
    #[serde(rename = "1. open")]
    pub open: String,

    #[serde(rename = "2. high")]
    pub high: String,

    #[serde(rename = "3. low")]
    pub low: String,

    #[serde(rename = "4. close")]
    pub close: String,

    #[serde(rename = "5. volume")]
    pub volume: String,
}

impl StockResponse {
    /// 응답의 심볼.
    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    /// 가장 최근 거래일의 (날짜, 일봉).
    pub fn latest(&self) -> Option<(&str, &StockData)> {
        self.time_series
            .iter()
            .next_back()
            .map(|(date, bar)| (date.as_str(), bar))
    }

    /// 특정 날짜의 일봉.
    pub fn on(&self, date: &str) -> Option<&StockData> {
        self.time_series.get(date)
    }

    /// 일봉 개수.
    pub fn len(&self) -> usize {
        self.time_series.len()
    }

    /// 일봉이 하나도 없는지 여부.
    pub fn is_empty(&self) -> bool {
        self.time_series.is_empty()
    }
}
