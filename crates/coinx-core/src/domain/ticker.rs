//! 시세 스냅샷.

use crate::types::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 거래소의 현재 최우선 호가/최종 체결가 스냅샷.
///
/// 필드 이름과 값은 거래소 응답을 그대로 따릅니다.
/// `buy`는 최우선 매수 호가(bid), `sell`은 최우선 매도 호가(ask)입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    /// 스냅샷 시각 (Unix 초)
    pub at: i64,
    /// 최우선 매수 호가
    pub buy: Price,
    /// 최우선 매도 호가
    pub sell: Price,
    /// 24시간 저가
    pub low: Price,
    /// 24시간 고가
    pub high: Price,
    /// 최종 체결가
    pub last: Price,
    /// 24시간 거래량
    pub vol: Decimal,
}

impl Ticker {
    /// 최우선 매수 호가.
    pub fn bid(&self) -> Price {
        self.buy
    }

    /// 최우선 매도 호가.
    pub fn ask(&self) -> Price {
        self.sell
    }
}
