//! 거래소 응답 정규화.
//!
//! 거래소 JSON 형태(`Venue*` 구조체)를 엔진용 도메인 레코드로 변환합니다.
//! - 숫자 문자열은 `Decimal`로 파싱
//! - 수량은 항상 절대값
//! - 시각은 RFC 3339 `created_at` 또는 Unix 초 `at`에서 하나의 `DateTime<Utc>`로
//! - 주문 조회는 숫자 ID 비교로만 매칭

use crate::{ExchangeError, ExchangeResult};
use chrono::{DateTime, Utc};
use coinx_core::{
    sort_trades_ascending, Order, OrderId, OrderStatusType, PortfolioEntry, Side, Ticker, Trade,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

// ============================================================================
// 거래소 응답 타입
// ============================================================================

/// 계좌 통화 하나.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueAccount {
    pub currency: String,
    pub balance: Decimal,
    #[serde(default)]
    pub locked: Decimal,
}

/// `/members/me.json` 응답.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueMember {
    #[serde(default)]
    pub sn: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub activated: Option<bool>,
    #[serde(default)]
    pub accounts: Vec<VenueAccount>,
}

/// 주문 객체.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueOrder {
    pub id: u64,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub ord_type: Option<String>,
    /// 시장가 주문은 가격이 없을 수 있음
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub avg_price: Option<Decimal>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    pub volume: Decimal,
    #[serde(default)]
    pub remaining_volume: Option<Decimal>,
    #[serde(default)]
    pub executed_volume: Option<Decimal>,
    #[serde(default)]
    pub trades_count: Option<u64>,
}

/// 체결 객체.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueTrade {
    pub id: u64,
    pub price: Decimal,
    pub volume: Decimal,
    #[serde(default)]
    pub funds: Option<Decimal>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub at: Option<i64>,
    #[serde(default)]
    pub side: Option<String>,
}

/// `/tickers/{market}.json` 응답.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueTickerResponse {
    pub at: i64,
    pub ticker: VenueTicker,
}

/// 시세 본문.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueTicker {
    pub buy: Decimal,
    pub sell: Decimal,
    pub low: Decimal,
    pub high: Decimal,
    pub last: Decimal,
    pub vol: Decimal,
}

/// 단일 객체 또는 배열로 오는 응답.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// 항상 목록으로 변환합니다.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

// ============================================================================
// 변환
// ============================================================================

/// 계좌 목록을 포트폴리오로 변환합니다. 통화 코드는 대문자입니다.
pub fn normalize_portfolio(member: &VenueMember) -> Vec<PortfolioEntry> {
    member
        .accounts
        .iter()
        .map(|account| PortfolioEntry::new(&account.currency, account.balance))
        .collect()
}

/// 시세 응답을 그대로 옮깁니다.
pub fn normalize_ticker(response: VenueTickerResponse) -> Ticker {
    let VenueTickerResponse { at, ticker } = response;
    Ticker {
        at,
        buy: ticker.buy,
        sell: ticker.sell,
        low: ticker.low,
        high: ticker.high,
        last: ticker.last,
        vol: ticker.vol,
    }
}

/// 거래소 시각 필드를 `DateTime<Utc>`로 파싱합니다.
///
/// `created_at`(RFC 3339)을 우선하고, 없으면 `at`(Unix 초)을 사용합니다.
pub fn parse_timestamp(
    created_at: Option<&str>,
    at: Option<i64>,
) -> ExchangeResult<DateTime<Utc>> {
    if let Some(text) = created_at {
        return DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                ExchangeError::ParseError(format!("invalid timestamp '{}': {}", text, e))
            });
    }

    at.and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| ExchangeError::ParseError("missing timestamp".to_string()))
}

/// 주문 방향 문자열 파싱.
pub fn parse_side(side: &str) -> ExchangeResult<Side> {
    match side.to_lowercase().as_str() {
        "buy" | "bid" => Ok(Side::Buy),
        "sell" | "ask" => Ok(Side::Sell),
        other => Err(ExchangeError::ParseError(format!("unknown side: {}", other))),
    }
}

/// 주문 상태 문자열 파싱.
///
/// `wait` → Open, `done` → Filled, `cancel` → Cancelled.
pub fn parse_order_state(state: &str) -> OrderStatusType {
    match state {
        "done" => OrderStatusType::Filled,
        "cancel" => OrderStatusType::Cancelled,
        _ => OrderStatusType::Open,
    }
}

/// 주문 상태. 상태 필드가 없으면 대기 중으로 봅니다.
pub fn order_status(order: &VenueOrder) -> OrderStatusType {
    order
        .state
        .as_deref()
        .map(parse_order_state)
        .unwrap_or(OrderStatusType::Open)
}

/// 거래소 주문을 정규 주문으로 변환합니다.
pub fn normalize_order(order: &VenueOrder) -> ExchangeResult<Order> {
    let side = order
        .side
        .as_deref()
        .ok_or_else(|| ExchangeError::ParseError(format!("order {} has no side", order.id)))
        .and_then(parse_side)?;

    Ok(Order {
        id: order.id,
        price: order.price.unwrap_or_default(),
        amount: order.volume.abs(),
        side,
        status: order_status(order),
        created_at: parse_timestamp(order.created_at.as_deref(), None)?,
    })
}

/// 숫자 ID가 일치하는 주문을 찾습니다.
pub fn find_order(orders: Vec<VenueOrder>, id: OrderId) -> Option<VenueOrder> {
    orders.into_iter().find(|order| order.id == id)
}

/// 체결 목록을 정규화합니다.
///
/// 결과는 거래소 정렬과 무관하게 (시각, 체결 ID) 오름차순이며,
/// `since`보다 오래된 체결은 제외됩니다.
pub fn normalize_trades(
    trades: Vec<VenueTrade>,
    since: Option<DateTime<Utc>>,
) -> ExchangeResult<Vec<Trade>> {
    let min_ts = since.map(|dt| dt.timestamp());

    let mut result = Vec::with_capacity(trades.len());
    for trade in trades {
        let executed_at = parse_timestamp(trade.created_at.as_deref(), trade.at)?;
        let timestamp = executed_at.timestamp();

        if min_ts.is_some_and(|min| timestamp < min) {
            continue;
        }

        result.push(Trade {
            tid: trade.id,
            price: trade.price,
            amount: trade.volume.abs(),
            timestamp,
        });
    }

    sort_trades_ascending(&mut result);
    Ok(result)
}

/// 응답 본문에 담긴 거래소 에러를 찾습니다.
///
/// 비어 있지 않은 최상위 `error`는 HTTP 상태와 무관하게 거래소 에러이며,
/// `error.code`는 숫자와 숫자 문자열을 모두 받습니다. 코드가 없으면 0입니다.
/// `{"status": "error", "reason": ...}` 응답은 `Rejected`입니다.
pub fn venue_error(body: &Value) -> Option<ExchangeError> {
    if let Some(error) = body.get("error").filter(|error| !is_falsy(error)) {
        let code = error
            .get("code")
            .and_then(|code| {
                code.as_i64()
                    .or_else(|| code.as_str().and_then(|s| s.trim().parse().ok()))
            })
            .and_then(|code| i32::try_from(code).ok())
            .unwrap_or_default();
        let message = match error {
            Value::String(text) => text.clone(),
            other => other
                .get("message")
                .map(value_to_text)
                .unwrap_or_else(|| other.to_string()),
        };
        return Some(ExchangeError::from_venue(code, &message));
    }

    if body.get("status").and_then(Value::as_str) == Some("error") {
        let reason = body
            .get("reason")
            .map(value_to_text)
            .unwrap_or_else(|| "unknown reason".to_string());
        return Some(ExchangeError::Rejected(reason));
    }

    None
}

/// 주문 생성 응답에서 주문 ID를 꺼냅니다.
pub fn parse_order_reply(reply: &Value) -> ExchangeResult<OrderId> {
    reply
        .get("id")
        .and_then(|id| id.as_u64().or_else(|| id.as_str().and_then(|s| s.parse().ok())))
        .ok_or_else(|| ExchangeError::ParseError(format!("order id missing in reply: {}", reply)))
}

/// 값이 비어 있거나 거짓인지 확인합니다 (`null`, `false`, `0`, `""`, `[]`, `{}`).
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
