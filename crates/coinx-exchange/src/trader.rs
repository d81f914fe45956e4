//! 엔진용 트레이딩 파사드.
//!
//! `Trader`는 클라이언트, 재시도 정책, 응답 정규화를 묶어 엔진에
//! 정규 트레이딩 작업을 제공합니다.
//!
//! # 에러 분류
//! - 치명적(`InvalidCredentials`): 재시도 없이 반환, 엔진은 중단해야 함
//! - 입력 오류(`MissingParameter`): 네트워크 호출 전에 즉시 반환
//! - 그 밖의 에러: 재시도 정책이 같은 인자로 다시 호출

use crate::client::{CoinxClient, CoinxConfig, OrdersQuery, TradesQuery};
use crate::normalize::{
    find_order, is_falsy, normalize_order, normalize_portfolio, normalize_ticker,
    normalize_trades, order_status, parse_order_reply,
};
use crate::retry::RetryPolicy;
use crate::traits::TradingAdapter;
use crate::{coinx_capabilities, ExchangeError, ExchangeResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coinx_core::{
    adapter_span, AppConfig, DecimalExt, ExchangeCapabilities, Market, OrderId, OrderSnapshot,
    PortfolioEntry, RoundMethod, Side, Ticker, Trade, AMOUNT_DECIMALS,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info, Instrument};

/// 메이커 수수료율 (0.1%).
pub const MAKER_FEE: Decimal = dec!(0.001);

/// 열린 주문 조회 페이지 크기.
const OPEN_ORDERS_PAGE_SIZE: u32 = 100;

// ============================================================================
// 설정
// ============================================================================

/// 주문 가격 자릿수 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PricePolicy {
    /// 가격을 그대로 전송
    #[default]
    Unchanged,
    /// 지정 자릿수로 조정. 매수는 내림, 매도는 올림.
    Truncate { decimals: u32 },
}

impl PricePolicy {
    /// 설정 값에서 생성. `None`이면 조정하지 않습니다.
    pub fn from_decimals(decimals: Option<u32>) -> Self {
        decimals
            .map(|decimals| PricePolicy::Truncate { decimals })
            .unwrap_or_default()
    }

    /// 주문 방향에 맞게 가격을 조정합니다.
    pub fn apply(&self, side: Side, price: Decimal) -> Decimal {
        match self {
            PricePolicy::Unchanged => price,
            PricePolicy::Truncate { decimals } => {
                let method = match side {
                    Side::Buy => RoundMethod::Floor,
                    Side::Sell => RoundMethod::Ceil,
                };
                price.round_dp_by(*decimals, method)
            }
        }
    }
}

/// `Trader` 설정.
#[derive(Debug, Clone)]
pub struct TraderConfig {
    /// 거래 마켓
    pub market: Market,
    /// 주문 수량 소수점 자릿수 (내림)
    pub amount_decimals: u32,
    /// 매수 시 수량에서 미리 빼는 비율 (%)
    pub buy_safety_margin_pct: Decimal,
    /// 주문 가격 정책
    pub price_policy: PricePolicy,
    /// 재시도 정책
    pub retry: RetryPolicy,
}

impl TraderConfig {
    /// 기본값으로 생성 (수량 8자리, 매수 1% 여유, 가격 조정 없음).
    pub fn new(market: Market) -> Self {
        Self {
            market,
            amount_decimals: AMOUNT_DECIMALS,
            buy_safety_margin_pct: Decimal::ONE,
            price_policy: PricePolicy::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// 재시도 정책 변경.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// 가격 정책 변경.
    pub fn with_price_policy(mut self, policy: PricePolicy) -> Self {
        self.price_policy = policy;
        self
    }

    /// 애플리케이션 설정에서 생성.
    pub fn from_app_config(app: &AppConfig) -> ExchangeResult<Self> {
        let market = Market::new(&app.exchange.asset, &app.exchange.currency)?;
        Ok(Self {
            market,
            amount_decimals: app.precision.amount_decimals,
            buy_safety_margin_pct: app.precision.buy_safety_margin_pct,
            price_policy: PricePolicy::from_decimals(app.precision.price_decimals),
            retry: RetryPolicy::from_settings(&app.retry),
        })
    }
}

// ============================================================================
// Trader
// ============================================================================

/// CoinX 트레이딩 어댑터.
#[derive(Debug)]
pub struct Trader {
    client: CoinxClient,
    config: TraderConfig,
}

impl Trader {
    /// 새 Trader 생성.
    pub fn new(client: CoinxClient, config: TraderConfig) -> Self {
        Self { client, config }
    }

    /// 애플리케이션 설정에서 생성.
    pub fn from_app_config(app: &AppConfig) -> ExchangeResult<Self> {
        let client = CoinxClient::new(CoinxConfig::from_app_config(app))?;
        Ok(Self::new(client, TraderConfig::from_app_config(app)?))
    }

    /// 내부 클라이언트.
    pub fn client(&self) -> &CoinxClient {
        &self.client
    }

    /// 거래 마켓.
    pub fn market(&self) -> &Market {
        &self.config.market
    }

    /// 설정.
    pub fn config(&self) -> &TraderConfig {
        &self.config
    }

    /// 주문 방향에 맞게 조정한 전송 수량.
    ///
    /// 매수는 잔고 초과를 막기 위해 여유 비율만큼 줄인 뒤 내림합니다.
    pub fn adjusted_amount(&self, side: Side, amount: Decimal) -> Decimal {
        let amount = match side {
            Side::Buy => amount.shave_pct(self.config.buy_safety_margin_pct),
            Side::Sell => amount,
        };
        amount.truncate_amount(self.config.amount_decimals)
    }

    /// 주문 방향에 맞게 조정한 전송 가격.
    pub fn adjusted_price(&self, side: Side, price: Decimal) -> Decimal {
        self.config.price_policy.apply(side, price)
    }

    /// 열린 주문 목록(`state=wait`)을 페이지 단위로 훑어 주문 ID를 찾습니다.
    ///
    /// 한 페이지가 가득 차 있으면 다음 페이지를 이어서 조회합니다.
    async fn is_order_open(&self, order_id: OrderId) -> ExchangeResult<bool> {
        let mut page = 0;
        let mut last_seen: Option<OrderId> = None;

        loop {
            let query = OrdersQuery {
                limit: Some(OPEN_ORDERS_PAGE_SIZE),
                page: Some(page),
                ..OrdersQuery::default()
            };
            let open = self.client.get_orders(&self.config.market, query).await?;
            if open
                .iter()
                .any(|order| order.id == order_id && order_status(order).is_active())
            {
                return Ok(true);
            }

            // 마지막 페이지이거나, 페이지 번호를 무시하고 같은 목록을 돌려주는 경우
            let last = open.last().map(|order| order.id);
            if open.len() < OPEN_ORDERS_PAGE_SIZE as usize || last <= last_seen {
                return Ok(false);
            }

            debug!(page, "Open order list is full, fetching next page");
            last_seen = last;
            page += 1;
        }
    }

    async fn place_order(
        &self,
        side: Side,
        amount: Decimal,
        price: Decimal,
    ) -> ExchangeResult<OrderId> {
        if amount <= Decimal::ZERO {
            return Err(ExchangeError::missing("amount"));
        }
        if price <= Decimal::ZERO {
            return Err(ExchangeError::missing("price"));
        }

        let operation = match side {
            Side::Buy => "buy",
            Side::Sell => "sell",
        };

        // 매 시도마다 원래 인자에서 다시 조정
        let id = self
            .config
            .retry
            .run(operation, || async move {
                let volume = self.adjusted_amount(side, amount);
                let order_price = self.adjusted_price(side, price);
                if volume <= Decimal::ZERO {
                    return Err(ExchangeError::missing("amount"));
                }

                let reply = self
                    .client
                    .create_order(&self.config.market, side, order_price, volume)
                    .await?;
                parse_order_reply(&reply)
            })
            .await?;

        info!(order_id = id, side = %side, %amount, %price, "Order placed");
        Ok(id)
    }
}

#[async_trait]
impl TradingAdapter for Trader {
    fn name(&self) -> &str {
        "coinx"
    }

    fn capabilities(&self) -> ExchangeCapabilities {
        coinx_capabilities()
    }

    async fn get_portfolio(&self) -> ExchangeResult<Vec<PortfolioEntry>> {
        let span = adapter_span!("get_portfolio", self.config.market);
        self.config
            .retry
            .run("get_portfolio", || async move {
                let member = self.client.get_member().await?;
                Ok(normalize_portfolio(&member))
            })
            .instrument(span)
            .await
    }

    async fn get_fee(&self) -> ExchangeResult<Decimal> {
        Ok(MAKER_FEE)
    }

    async fn get_ticker(&self) -> ExchangeResult<Ticker> {
        let response = self.client.get_ticker(&self.config.market).await?;
        Ok(normalize_ticker(response))
    }

    async fn get_trades(
        &self,
        since: Option<DateTime<Utc>>,
        _descending: bool,
    ) -> ExchangeResult<Vec<Trade>> {
        let span = adapter_span!("get_trades", self.config.market);
        let trades = self
            .config
            .retry
            .run("get_trades", || async move {
                let raw = self
                    .client
                    .get_trades(&self.config.market, TradesQuery::default())
                    .await?;
                normalize_trades(raw, since)
            })
            .instrument(span)
            .await?;

        debug!(count = trades.len(), "Fetched trades");
        Ok(trades)
    }

    async fn buy(&self, amount: Decimal, price: Decimal) -> ExchangeResult<OrderId> {
        let span = adapter_span!("buy", self.config.market);
        self.place_order(Side::Buy, amount, price)
            .instrument(span)
            .await
    }

    async fn sell(&self, amount: Decimal, price: Decimal) -> ExchangeResult<OrderId> {
        let span = adapter_span!("sell", self.config.market);
        self.place_order(Side::Sell, amount, price)
            .instrument(span)
            .await
    }

    async fn get_order(&self, order_id: OrderId) -> ExchangeResult<OrderSnapshot> {
        if order_id == 0 {
            return Err(ExchangeError::missing("order_id"));
        }

        let span = adapter_span!("get_order", self.config.market, order_id);
        self.config
            .retry
            .run("get_order", || async move {
                let orders = match self.client.get_order(order_id).await {
                    Ok(orders) => orders,
                    Err(ExchangeError::OrderNotFound(_)) => return Ok(OrderSnapshot::cancelled()),
                    Err(e) => return Err(e),
                };

                if orders.is_empty() {
                    return Err(ExchangeError::EmptyResponse("/order.json".to_string()));
                }

                match find_order(orders, order_id) {
                    Some(order) => Ok(normalize_order(&order)?.snapshot()),
                    // 취소된 주문은 조회되지 않음
                    None => {
                        debug!(order_id, "Order not found, assuming cancelled");
                        Ok(OrderSnapshot::cancelled())
                    }
                }
            })
            .instrument(span)
            .await
    }

    async fn check_order(&self, order_id: OrderId) -> ExchangeResult<bool> {
        if order_id == 0 {
            return Err(ExchangeError::missing("order_id"));
        }

        let span = adapter_span!("check_order", self.config.market, order_id);
        self.config
            .retry
            .run("check_order", || async move {
                self.is_order_open(order_id).await
            })
            .instrument(span)
            .await
    }

    async fn cancel_order(&self, order_id: OrderId) -> ExchangeResult<()> {
        if order_id == 0 {
            return Err(ExchangeError::missing("order_id"));
        }

        let span = adapter_span!("cancel_order", self.config.market, order_id);
        self.config
            .retry
            .run("cancel_order", || async move {
                let result = self.client.cancel_order(order_id).await?;
                if is_falsy(&result) {
                    return Err(ExchangeError::EmptyResponse("/order/delete.json".to_string()));
                }
                Ok(())
            })
            .instrument(span)
            .await?;

        info!(order_id, "Order cancelled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn trader(config: TraderConfig) -> Trader {
        let client = CoinxClient::new(
            CoinxConfig::new("key", "secret", "user").with_base_url("http://127.0.0.1:1"),
        )
        .unwrap();
        Trader::new(client, config)
    }

    fn market() -> Market {
        Market::new("eth", "btc").unwrap()
    }

    #[test]
    fn test_buy_amount_is_shaved_and_truncated() {
        let t = trader(TraderConfig::new(market()));
        assert_eq!(t.adjusted_amount(Side::Buy, dec!(1)), dec!(0.99));
        assert_eq!(t.adjusted_amount(Side::Buy, dec!(0.123456789)), dec!(0.12222222));
        assert_eq!(t.adjusted_amount(Side::Sell, dec!(0.123456789)), dec!(0.12345678));
    }

    #[test]
    fn test_price_policy() {
        assert_eq!(PricePolicy::from_decimals(None), PricePolicy::Unchanged);
        assert_eq!(PricePolicy::Unchanged.apply(Side::Buy, dec!(0.123456)), dec!(0.123456));

        let policy = PricePolicy::from_decimals(Some(2));
        assert_eq!(policy.apply(Side::Buy, dec!(0.129)), dec!(0.12));
        assert_eq!(policy.apply(Side::Sell, dec!(0.121)), dec!(0.13));
        assert_eq!(policy.apply(Side::Sell, dec!(0.12)), dec!(0.12));
    }

    #[test]
    fn test_trader_config_from_app_config() {
        let app = AppConfig::from_toml_str(
            r#"
            [exchange]
            asset = "OPC"
            currency = "ETH"
            [retry]
            delay_secs = 1
            max_attempts = 0
            [precision]
            price_decimals = 4
            "#,
        )
        .unwrap();

        let config = TraderConfig::from_app_config(&app).unwrap();
        assert_eq!(config.market.code(), "opceth");
        assert_eq!(config.price_policy, PricePolicy::Truncate { decimals: 4 });
        assert_eq!(config.retry.max_attempts, None);
    }

    #[tokio::test]
    async fn test_fee_and_capabilities() {
        let t = trader(TraderConfig::new(market()));
        assert_eq!(t.get_fee().await.unwrap(), dec!(0.001));
        assert_eq!(t.name(), "coinx");
        assert_eq!(t.capabilities().name, "CoinX");
    }

    #[tokio::test]
    async fn test_missing_parameters_return_immediately() {
        let t = trader(TraderConfig::new(market()));

        assert!(matches!(
            t.buy(Decimal::ZERO, dec!(0.05)).await,
            Err(ExchangeError::MissingParameter(ref p)) if p == "amount"
        ));
        assert!(matches!(
            t.sell(dec!(1), Decimal::ZERO).await,
            Err(ExchangeError::MissingParameter(ref p)) if p == "price"
        ));
        assert!(matches!(t.get_order(0).await, Err(ExchangeError::MissingParameter(_))));
        assert!(matches!(t.check_order(0).await, Err(ExchangeError::MissingParameter(_))));
        assert!(matches!(t.cancel_order(0).await, Err(ExchangeError::MissingParameter(_))));
    }

    proptest! {
        #[test]
        fn prop_buy_amount_never_exceeds_shaved_amount(units in 1u64..1_000_000_000_000u64) {
            let t = trader(TraderConfig::new(market()));
            let amount = Decimal::new(units as i64, 10);
            let submitted = t.adjusted_amount(Side::Buy, amount);
            let expected = (amount - amount / dec!(100)).round_dp_by(8, RoundMethod::Floor);

            prop_assert_eq!(submitted, expected);
            prop_assert!(submitted <= amount);
            prop_assert!(submitted.scale() <= 8);
        }
    }
}
