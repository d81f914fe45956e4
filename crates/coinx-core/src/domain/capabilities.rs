//! 엔진에 노출하는 거래소 기능 명세.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 최소 주문 수량의 단위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderUnit {
    /// 자산 단위
    Asset,
    /// 통화 단위
    Currency,
}

/// 최소 주문 조건.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimalOrder {
    /// 최소 수량
    pub amount: Decimal,
    /// 수량 단위
    pub unit: OrderUnit,
}

/// 거래 가능한 마켓 쌍.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketCapability {
    /// (통화, 자산) 쌍, 대문자
    pub pair: (String, String),
    /// 최소 주문 조건
    #[serde(rename = "minimalOrder")]
    pub minimal_order: MinimalOrder,
}

impl MarketCapability {
    /// 새 마켓 기능 항목을 생성합니다.
    pub fn new(currency: &str, asset: &str, amount: Decimal, unit: OrderUnit) -> Self {
        Self {
            pair: (currency.to_uppercase(), asset.to_uppercase()),
            minimal_order: MinimalOrder { amount, unit },
        }
    }
}

/// 거래소 기능 명세.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeCapabilities {
    /// 표시 이름
    pub name: String,
    /// 식별자
    pub slug: String,
    /// 지원 통화
    pub currencies: Vec<String>,
    /// 지원 자산
    pub assets: Vec<String>,
    /// 거래 가능한 마켓
    pub markets: Vec<MarketCapability>,
    /// 필요한 자격증명 필드
    pub requires: Vec<String>,
    /// 체결 기록 최대 보관 기간 (분)
    pub max_trades_age: u32,
    /// 체결 조회 주기 (분)
    pub fetch_timespan: u32,
    /// 체결 식별자 필드 이름
    pub tid: String,
    /// 주문 가능 여부
    pub tradable: bool,
}

impl ExchangeCapabilities {
    /// 통화/자산 조합이 지원되는 마켓인지 확인합니다.
    pub fn supports(&self, currency: &str, asset: &str) -> bool {
        self.markets.iter().any(|m| {
            m.pair.0.eq_ignore_ascii_case(currency) && m.pair.1.eq_ignore_ascii_case(asset)
        })
    }

    /// 통화/자산 조합의 최소 주문 조건을 반환합니다.
    pub fn minimal_order(&self, currency: &str, asset: &str) -> Option<&MinimalOrder> {
        self.markets
            .iter()
            .find(|m| {
                m.pair.0.eq_ignore_ascii_case(currency) && m.pair.1.eq_ignore_ascii_case(asset)
            })
            .map(|m| &m.minimal_order)
    }
}
