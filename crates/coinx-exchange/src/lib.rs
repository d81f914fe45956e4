//! CoinX 거래소 연결 및 트레이딩 어댑터.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 요청 서명 (HMAC-SHA256, 인스턴스별 자격증명과 tonce)
//! - 공개/비공개 REST 클라이언트 (`CoinxClient`)
//! - 고정 지연 재시도 정책 (시도 횟수 제한 및 종료 에러)
//! - 거래소 JSON 응답 정규화
//! - 엔진용 트레이딩 파사드 (`Trader`)

pub mod capabilities;
pub mod client;
pub mod error;
pub mod normalize;
pub mod retry;
pub mod signing;
pub mod trader;
pub mod traits;

pub use capabilities::coinx_capabilities;
pub use client::{CoinxClient, CoinxConfig, OrdersQuery, TradesQuery};
pub use error::*;
pub use retry::{Backoff, RetryPolicy};
pub use signing::{Credentials, HttpMethod, NonceGenerator, Params, RequestSigner, SignedRequest};
pub use trader::{PricePolicy, Trader, TraderConfig, MAKER_FEE};
pub use traits::*;
