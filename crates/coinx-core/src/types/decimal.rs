//! 정밀한 금융 계산을 위한 Decimal 유틸리티.
//!
//! 주문 수량은 잔고 초과를 막기 위해 항상 내림(floor) 처리되며,
//! 가격 자릿수 조정은 매수/매도 방향에 따라 보수적으로 적용됩니다.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 주문 수량을 위한 타입.
pub type Quantity = Decimal;

/// 주문 수량의 최대 소수점 자릿수.
pub const AMOUNT_DECIMALS: u32 = 8;

/// 자릿수 조정 방법.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundMethod {
    /// 일반 반올림
    Round,
    /// 내림 (음의 무한대 방향)
    Floor,
    /// 올림 (양의 무한대 방향)
    Ceil,
}

impl RoundMethod {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundMethod::Round => RoundingStrategy::MidpointAwayFromZero,
            RoundMethod::Floor => RoundingStrategy::ToNegativeInfinity,
            RoundMethod::Ceil => RoundingStrategy::ToPositiveInfinity,
        }
    }
}

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 지정된 소수점 자릿수로 조정합니다.
    fn round_dp_by(&self, dp: u32, method: RoundMethod) -> Decimal;

    /// 주문 수량 규칙에 따라 `dp` 자리로 내림합니다 (기본 `AMOUNT_DECIMALS`).
    ///
    /// 결과는 항상 원래 값 이하입니다.
    fn truncate_amount(&self, dp: u32) -> Decimal;

    /// 지정된 퍼센트만큼 줄인 값을 반환합니다 (예: 1 → 1% 감소).
    fn shave_pct(&self, pct: Decimal) -> Decimal;
}

impl DecimalExt for Decimal {
    fn round_dp_by(&self, dp: u32, method: RoundMethod) -> Decimal {
        self.round_dp_with_strategy(dp, method.strategy())
    }

    fn truncate_amount(&self, dp: u32) -> Decimal {
        self.round_dp_by(dp, RoundMethod::Floor)
    }

    fn shave_pct(&self, pct: Decimal) -> Decimal {
        *self - *self * pct / Decimal::ONE_HUNDRED
    }
}
