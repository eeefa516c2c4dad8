//! Alpha Vantage 일봉 시세 클라이언트.
//!
//! RapidAPI 게이트웨이를 통해 `TIME_SERIES_DAILY`를 호출합니다.
//!
//! # 요청 형식
//!
//! ```text
//! GET {base_url}?function=TIME_SERIES_DAILY&symbol=AAPL&outputsize=compact&datatype=json
//! X-RapidAPI-Key: {api_key}
//! X-RapidAPI-Host: alpha-vantage.p.rapidapi.com
//! ```
//!
//! Alpha Vantage는 호출 한도 초과나 잘못된 심볼에도 HTTP 200과 함께
//! `{"Note": ...}`, `{"Error Message": ...}` 같은 본문을 돌려주므로
//! 본문 형식까지 확인해야 실패를 구분할 수 있습니다.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use stock_core::{StockResponse, TickerSymbol, UpstreamConfig};
use tracing::{debug, warn};

use super::DailySeriesProvider;
use crate::error::{DataError, Result};

/// 고정 function 식별자.
pub const DAILY_FUNCTION: &str = "TIME_SERIES_DAILY";

const API_KEY_HEADER: &str = "X-RapidAPI-Key";
const HOST_HEADER: &str = "X-RapidAPI-Host";

/// 정상 응답 대신 오는 provider 메시지 필드.
const SOFT_ERROR_FIELDS: [&str; 3] = ["Error Message", "Note", "Information"];

/// Alpha Vantage API 클라이언트.
#[derive(Clone)]
pub struct AlphaVantageClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    host_header: String,
}

impl AlphaVantageClient {
    /// 새 클라이언트를 생성합니다.
    ///
    /// # Arguments
    /// * `base_url` - 요청 URL (쿼리 제외)
    /// * `api_key` - RapidAPI 키
    /// * `host_header` - `X-RapidAPI-Host` 값
    /// * `timeout` - 요청 타임아웃
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        host_header: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::ConfigError(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
            host_header: host_header.into(),
        })
    }

    /// 업스트림 설정에서 클라이언트를 생성합니다.
    ///
    /// # Errors
    /// 기본 URL이나 API 키가 없으면 `ConfigError`를 반환합니다.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        Self::new(
            config.base_url()?,
            config.api_key()?,
            config.host_header.clone(),
            config.timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl DailySeriesProvider for AlphaVantageClient {
    fn name(&self) -> &str {
        "AlphaVantage"
    }

    async fn fetch_daily(&self, symbol: &TickerSymbol) -> Result<StockResponse> {
        debug!(symbol = %symbol, "Alpha Vantage 일봉 요청");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", DAILY_FUNCTION),
                ("symbol", symbol.as_str()),
                ("outputsize", "compact"),
                ("datatype", "json"),
            ])
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .header(HOST_HEADER, &self.host_header)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(symbol = %symbol, status = status.as_u16(), "Error fetching stock data");
            return Err(DataError::UpstreamStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await?;
        let stock = parse_daily_payload(&body)?;

        debug!(symbol = %symbol, days = stock.len(), "Alpha Vantage 일봉 수신");
        Ok(stock)
    }
}

/// 응답 본문을 검증하고 `StockResponse`로 변환합니다.
pub fn parse_daily_payload(body: &str) -> Result<StockResponse> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| DataError::Upstream(format!("invalid JSON payload: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| DataError::Upstream("payload is not a JSON object".to_string()))?;

    if !object.contains_key("Meta Data") {
        if let Some(message) = SOFT_ERROR_FIELDS
            .iter()
            .find_map(|field| object.get(*field).and_then(|v| v.as_str()))
        {
            return Err(DataError::Upstream(format!("provider message: {}", message)));
        }
    }

    let stock: StockResponse = serde_json::from_value(value)
        .map_err(|e| DataError::Upstream(format!("malformed payload: {}", e)))?;

    if stock.is_empty() {
        return Err(DataError::Upstream("empty time series".to_string()));
    }

    Ok(stock)
}
