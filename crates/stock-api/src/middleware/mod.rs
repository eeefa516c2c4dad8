//! API 서버용 HTTP middleware.
//!
//! 요청 처리 파이프라인에 적용되는 middleware 모듈.

mod api_key;
mod metrics;

pub use api_key::{api_key_layer, API_KEY_HEADER};
pub use metrics::{metrics_layer, route_label, UNMATCHED_ROUTE};
