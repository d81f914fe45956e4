//! 마켓(자산/통화 쌍) 정의.
//!
//! 거래소 마켓 코드는 소문자 자산 코드와 소문자 통화 코드를
//! 이어 붙인 형식입니다 (예: ETH/BTC → "ethbtc").

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 거래 대상 마켓.
///
/// `asset`은 거래되는 자산, `currency`는 가격이 표시되는 통화입니다.
/// 두 값 모두 소문자로 저장됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Market {
    /// 자산 (예: "eth")
    pub asset: String,
    /// 통화 (예: "btc")
    pub currency: String,
}

impl Market {
    /// 새 마켓을 생성합니다.
    ///
    /// # Errors
    /// 자산이나 통화가 비어 있으면 `CoreError::InvalidInput`을 반환합니다.
    pub fn new(asset: impl AsRef<str>, currency: impl AsRef<str>) -> CoreResult<Self> {
        let asset = asset.as_ref().trim().to_lowercase();
        let currency = currency.as_ref().trim().to_lowercase();

        if asset.is_empty() || currency.is_empty() {
            return Err(CoreError::InvalidInput(format!(
                "마켓에는 자산과 통화가 모두 필요합니다: '{}'/'{}'",
                asset, currency
            )));
        }

        Ok(Self { asset, currency })
    }

    /// 거래소 마켓 코드를 반환합니다 (예: "ethbtc").
    pub fn code(&self) -> String {
        format!("{}{}", self.asset, self.currency)
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.asset.to_uppercase(),
            self.currency.to_uppercase()
        )
    }
}
