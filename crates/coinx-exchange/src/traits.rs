//! 엔진이 사용하는 트레이딩 어댑터 trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coinx_core::{ExchangeCapabilities, OrderId, OrderSnapshot, PortfolioEntry, Ticker, Trade};
use rust_decimal::Decimal;

use crate::ExchangeResult;

/// 엔진용 거래소 어댑터 인터페이스.
///
/// `InvalidCredentials` 에러를 받은 엔진은 실행을 중단해야 합니다.
#[async_trait]
pub trait TradingAdapter: Send + Sync {
    /// 거래소 식별자.
    fn name(&self) -> &str;

    /// 기능 명세.
    fn capabilities(&self) -> ExchangeCapabilities;

    // === 계좌 ===

    /// 통화별 잔고.
    async fn get_portfolio(&self) -> ExchangeResult<Vec<PortfolioEntry>>;

    /// 메이커 수수료율.
    async fn get_fee(&self) -> ExchangeResult<Decimal>;

    // === 시장 데이터 ===

    /// 현재 시세.
    async fn get_ticker(&self) -> ExchangeResult<Ticker>;

    /// 체결 내역 (항상 시간 오름차순).
    async fn get_trades(
        &self,
        since: Option<DateTime<Utc>>,
        descending: bool,
    ) -> ExchangeResult<Vec<Trade>>;

    // === 주문 ===

    /// 매수 주문. 새 주문 ID를 반환합니다.
    async fn buy(&self, amount: Decimal, price: Decimal) -> ExchangeResult<OrderId>;

    /// 매도 주문. 새 주문 ID를 반환합니다.
    async fn sell(&self, amount: Decimal, price: Decimal) -> ExchangeResult<OrderId>;

    /// 주문 요약 조회. 사라진 주문은 0 값 요약입니다.
    async fn get_order(&self, order_id: OrderId) -> ExchangeResult<OrderSnapshot>;

    /// 주문이 아직 미체결 목록에 있는지 확인.
    async fn check_order(&self, order_id: OrderId) -> ExchangeResult<bool>;

    /// 주문 취소.
    async fn cancel_order(&self, order_id: OrderId) -> ExchangeResult<()>;
}
