//! 포트폴리오 (계좌 통화별 잔고).

use crate::types::Quantity;
use serde::{Deserialize, Serialize};

/// 통화 하나의 보유 잔고.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    /// 통화 코드 (대문자, 예: "BTC")
    #[serde(rename = "name")]
    pub currency_code: String,
    /// 보유 수량
    pub amount: Quantity,
}

impl PortfolioEntry {
    /// 새 항목을 생성합니다. 통화 코드는 대문자로 정규화됩니다.
    pub fn new(currency_code: impl AsRef<str>, amount: Quantity) -> Self {
        Self {
            currency_code: currency_code.as_ref().to_uppercase(),
            amount,
        }
    }
}
