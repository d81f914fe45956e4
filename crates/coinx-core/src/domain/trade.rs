//! 체결 기록.
//!
//! 정규형 체결 목록은 항상 시간 오름차순입니다.

use crate::types::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// 마켓 체결 기록.
///
/// 한 번 반환된 체결은 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// 거래소 체결 ID
    pub tid: u64,
    /// 체결 가격
    pub price: Price,
    /// 체결 수량 (항상 0 이상)
    pub amount: Quantity,
    /// 체결 시각 (Unix 초)
    #[serde(rename = "date")]
    pub timestamp: i64,
}

/// 체결 목록을 시간 오름차순으로 정렬합니다.
///
/// 같은 시각의 체결은 체결 ID 순서를 따릅니다. 정렬은 안정 정렬입니다.
pub fn sort_trades_ascending(trades: &mut [Trade]) {
    trades.sort_by_key(|t| (t.timestamp, t.tid));
}
