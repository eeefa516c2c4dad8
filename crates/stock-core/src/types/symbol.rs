//! 티커 심볼 정의.
//!
//! 요청 경로로 들어온 심볼을 정규화(공백 제거, 대문자화)하고 검증합니다.
//! 같은 종목이 `aapl`, ` AAPL `처럼 다르게 들어와도 하나의 캐시 키를 공유합니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 심볼 최대 길이.
pub const MAX_SYMBOL_LEN: usize = 12;

/// 정규화된 티커 심볼 (예: `AAPL`, `BRK.B`, `005930`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TickerSymbol(String);

impl TickerSymbol {
    /// 입력 문자열을 정규화하여 심볼을 생성합니다.
    ///
    /// 허용 문자: 영문자, 숫자, `.`, `-`. 길이는 1~12자.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let normalized = raw.trim().to_ascii_uppercase();

        if normalized.is_empty() {
            return Err(CoreError::InvalidSymbol("symbol is empty".to_string()));
        }
        if normalized.len() > MAX_SYMBOL_LEN {
            return Err(CoreError::InvalidSymbol(format!(
                "symbol '{}' exceeds {} characters",
                normalized, MAX_SYMBOL_LEN
            )));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(CoreError::InvalidSymbol(format!(
                "symbol '{}' contains unsupported characters",
                normalized
            )));
        }

        Ok(Self(normalized))
    }

    /// 문자열 참조.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TickerSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TickerSymbol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TickerSymbol {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TickerSymbol> for String {
    fn from(symbol: TickerSymbol) -> Self {
        symbol.0
    }
}

impl AsRef<str> for TickerSymbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
