//! 주문 타입.
//!
//! 이 모듈은 주문 관련 타입을 정의합니다:
//! - `OrderId` - 거래소가 발급한 숫자형 주문 ID
//! - `Side` - 주문 방향 (매수/매도)
//! - `OrderStatusType` - 주문 상태
//! - `Order` - 정규화된 주문 엔티티
//! - `OrderSnapshot` - 엔진이 조회하는 주문 요약 (가격/수량/시각)

use crate::types::{Price, Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 거래소 주문 ID.
///
/// 주문 ID는 항상 숫자로 다루며 문자열 비교는 하지 않습니다.
pub type OrderId = u64;

/// 주문 방향 (매수 또는 매도).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// 매수
    Buy,
    /// 매도
    Sell,
}

impl Side {
    /// 거래소 파라미터 값 ("buy" / "sell").
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// 주문 상태 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// 거래소에서 체결 대기 중
    Open,
    /// 전량 체결됨
    Filled,
    /// 취소됨 (외부 취소 포함)
    Cancelled,
}

impl OrderStatusType {
    /// 주문이 여전히 활성 상태인지 확인합니다.
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatusType::Open)
    }
}

/// 정규화된 주문.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// 거래소 주문 ID
    pub id: OrderId,
    /// 주문 가격
    pub price: Price,
    /// 주문 수량 (항상 0 이상)
    pub amount: Quantity,
    /// 주문 방향
    pub side: Side,
    /// 주문 상태
    pub status: OrderStatusType,
    /// 주문 생성 시각
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// 엔진용 요약으로 변환합니다.
    pub fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            price: self.price,
            amount: self.amount,
            date: self.created_at,
        }
    }
}

/// 엔진이 `get_order`로 받는 주문 요약.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// 주문 가격
    pub price: Price,
    /// 주문 수량
    pub amount: Quantity,
    /// 주문 생성 시각
    pub date: DateTime<Utc>,
}

impl OrderSnapshot {
    /// 거래소에서 사라진 주문(취소로 간주)을 나타내는 0 값 요약.
    ///
    /// 가격 0, 수량 0, 시각은 Unix epoch 입니다.
    pub fn cancelled() -> Self {
        Self {
            price: Decimal::ZERO,
            amount: Decimal::ZERO,
            date: DateTime::UNIX_EPOCH,
        }
    }

    /// 취소로 간주된 0 값 요약인지 확인합니다.
    pub fn is_cancelled(&self) -> bool {
        self.price.is_zero() && self.amount.is_zero() && self.date == DateTime::UNIX_EPOCH
    }
}
