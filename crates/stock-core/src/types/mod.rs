//! 시세 API 전반에서 사용되는 공통 타입.

mod stock;
mod symbol;

pub use stock::*;
pub use symbol::*;
