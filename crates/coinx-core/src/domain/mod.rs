//! 어댑터가 엔진에 노출하는 도메인 모델.

mod capabilities;
mod order;
mod portfolio;
mod ticker;
mod trade;

pub use capabilities::*;
pub use order::*;
pub use portfolio::*;
pub use ticker::*;
pub use trade::*;
