//! CoinX REST 클라이언트.
//!
//! 공개 요청은 서명 없이, 비공개 요청은 인스턴스 전용 서명기로 서명하여
//! 전송합니다. 로그에는 경로만 남기며 쿼리와 본문은 기록하지 않습니다.

use crate::normalize::{
    venue_error, OneOrMany, VenueMember, VenueOrder, VenueTickerResponse, VenueTrade,
};
use crate::signing::{Credentials, HttpMethod, Params, RequestSigner};
use crate::{ExchangeError, ExchangeResult};
use coinx_core::{mask, AppConfig, Market, OrderId, ParamOrdering, Side};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, warn};

/// 기본 REST 호스트.
pub const DEFAULT_REST_BASE_URL: &str = "https://x.tth365.com:443";
/// 기본 API 경로 접두사.
pub const DEFAULT_API_BASE_PATH: &str = "/api/v2";

/// 모든 요청에 붙는 User-Agent.
pub fn user_agent() -> String {
    format!("CoinX API Client/{}", env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// 설정
// ============================================================================

/// CoinX 클라이언트 설정.
///
/// # 보안
/// - `Debug` 구현은 민감 정보(`api_key`, `api_secret`)를 마스킹합니다.
#[derive(Clone)]
pub struct CoinxConfig {
    /// API 키
    pub api_key: String,
    /// API 시크릿
    pub api_secret: String,
    /// 거래소 사용자 ID
    pub username: String,
    /// REST 호스트
    pub rest_base_url: String,
    /// API 경로 접두사 (서명 메시지에 포함)
    pub api_base_path: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 서명 파라미터 정렬 방식
    pub param_ordering: ParamOrdering,
}

impl fmt::Debug for CoinxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoinxConfig")
            .field("api_key", &mask(&self.api_key))
            .field("api_secret", &"***REDACTED***")
            .field("username", &self.username)
            .field("rest_base_url", &self.rest_base_url)
            .field("api_base_path", &self.api_base_path)
            .field("timeout_secs", &self.timeout_secs)
            .field("param_ordering", &self.param_ordering)
            .finish()
    }
}

impl CoinxConfig {
    /// 새 설정 생성.
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            username: username.into(),
            rest_base_url: DEFAULT_REST_BASE_URL.to_string(),
            api_base_path: DEFAULT_API_BASE_PATH.to_string(),
            timeout_secs: 30,
            param_ordering: ParamOrdering::default(),
        }
    }

    /// 자격증명 없는 설정 (공개 API 전용).
    pub fn public_only() -> Self {
        Self::new("", "", "")
    }

    /// REST 호스트 변경.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.rest_base_url = url.into();
        self
    }

    /// 파라미터 정렬 방식 변경.
    pub fn with_param_ordering(mut self, ordering: ParamOrdering) -> Self {
        self.param_ordering = ordering;
        self
    }

    /// 환경 변수에서 생성.
    ///
    /// `COINX_API_KEY`, `COINX_API_SECRET`가 없으면 `None`을 반환합니다.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("COINX_API_KEY").ok()?;
        let api_secret = std::env::var("COINX_API_SECRET").ok()?;
        let username = std::env::var("COINX_USERNAME").unwrap_or_default();

        let mut config = Self::new(api_key, api_secret, username);
        if let Ok(url) = std::env::var("COINX_BASE_URL") {
            config.rest_base_url = url;
        }
        Some(config)
    }

    /// 애플리케이션 설정에서 생성.
    pub fn from_app_config(app: &AppConfig) -> Self {
        Self {
            api_key: app.credentials.key.clone(),
            api_secret: app.credentials.secret.clone(),
            username: app.credentials.username.clone(),
            rest_base_url: app.exchange.rest_base_url.clone(),
            api_base_path: app.exchange.api_base_path.clone(),
            timeout_secs: app.exchange.timeout_secs,
            param_ordering: app.precision.param_ordering,
        }
    }

    /// 키와 시크릿이 모두 있는지 확인.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

// ============================================================================
// 조회 파라미터
// ============================================================================

/// `/orders.json` 조회 옵션.
#[derive(Debug, Clone, Default)]
pub struct OrdersQuery {
    /// 주문 상태 (기본 "wait")
    pub state: Option<String>,
    /// 최대 개수 (기본 100)
    pub limit: Option<u32>,
    /// 페이지 (기본 0)
    pub page: Option<u32>,
    /// 정렬 (기본 "asc")
    pub order_by: Option<String>,
}

/// `/trades.json`, `/trades/my.json` 조회 옵션.
#[derive(Debug, Clone, Default)]
pub struct TradesQuery {
    /// 최대 개수 (기본 50)
    pub limit: Option<u32>,
    /// 이 시각(Unix 초) 이전 체결만
    pub timestamp: Option<i64>,
    /// 이 체결 ID 이후
    pub from: Option<u64>,
    /// 이 체결 ID 이전
    pub to: Option<u64>,
    /// 정렬 (기본 "desc")
    pub order_by: Option<String>,
}

impl TradesQuery {
    fn into_params(self, market: &Market) -> Params {
        Params::new()
            .with("market", market.code())
            .with("limit", self.limit.unwrap_or(50))
            .with_opt("timestamp", self.timestamp)
            .with_opt("from", self.from)
            .with_opt("to", self.to)
            .with("order_by", self.order_by.unwrap_or_else(|| "desc".to_string()))
    }
}

// ============================================================================
// 클라이언트
// ============================================================================

/// CoinX REST 클라이언트.
pub struct CoinxClient {
    client: Client,
    api_url: String,
    signer: Option<RequestSigner>,
}

impl fmt::Debug for CoinxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoinxClient")
            .field("api_url", &self.api_url)
            .field("signer", &self.signer)
            .finish()
    }
}

impl CoinxClient {
    /// 새 클라이언트 생성.
    ///
    /// 자격증명이 없으면 공개 API만 사용할 수 있으며, 비공개 호출은
    /// `ExchangeError::Config`로 즉시 실패합니다.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::NetworkError`를 반환합니다.
    pub fn new(config: CoinxConfig) -> ExchangeResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent())
            .build()
            .map_err(|e| {
                ExchangeError::NetworkError(format!("HTTP 클라이언트 생성 실패: {}", e))
            })?;

        let signer = if config.has_credentials() {
            let credentials =
                Credentials::new(config.api_key, config.api_secret, config.username)?;
            Some(RequestSigner::new(
                credentials,
                config.api_base_path.clone(),
                config.param_ordering,
            ))
        } else {
            None
        };

        Ok(Self {
            client,
            api_url: format!(
                "{}{}",
                config.rest_base_url.trim_end_matches('/'),
                config.api_base_path
            ),
            signer,
        })
    }

    /// 경로 접두사를 포함한 API URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// 비공개 API 사용 가능 여부.
    pub fn has_credentials(&self) -> bool {
        self.signer.is_some()
    }

    fn signer(&self) -> ExchangeResult<&RequestSigner> {
        self.signer.as_ref().ok_or_else(|| {
            ExchangeError::Config("CoinX: API key and secret required".to_string())
        })
    }

    /// 공개 API 요청 (인증 불필요).
    pub async fn public_request<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Params,
    ) -> ExchangeResult<T> {
        let query = params.to_query();
        let url = if query.is_empty() {
            format!("{}{}", self.api_url, path)
        } else {
            format!("{}{}?{}", self.api_url, path, query)
        };

        debug!(path, "GET");

        let response = self.client.get(&url).send().await?;
        self.handle_response(path, response).await
    }

    /// 서명된 GET 요청.
    pub async fn private_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Params,
    ) -> ExchangeResult<T> {
        let signed = self.signer()?.sign(HttpMethod::Get, path, params)?;
        let url = format!("{}{}?{}", self.api_url, path, signed.payload);

        debug!(path, tonce = signed.tonce, "GET (signed)");

        let response = self.client.get(&url).send().await?;
        self.handle_response(path, response).await
    }

    /// 서명된 POST 요청 (폼 본문 + `Key`/`Sign` 헤더).
    pub async fn private_post<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Params,
    ) -> ExchangeResult<T> {
        let signed = self.signer()?.sign(HttpMethod::Post, path, params)?;
        let url = format!("{}{}", self.api_url, path);

        debug!(path, tonce = signed.tonce, "POST (signed)");

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/x-www-form-urlencoded");
        for (name, value) in &signed.headers {
            request = request.header(*name, value);
        }

        let response = request.body(signed.payload).send().await?;
        self.handle_response(path, response).await
    }

    /// API 응답 처리.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> ExchangeResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if body.trim().is_empty() {
            return Err(ExchangeError::EmptyResponse(path.to_string()));
        }

        // 거래소 에러 객체는 상태 코드와 무관하게 우선
        if let Some(err) = serde_json::from_str::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(venue_error)
        {
            warn!(path, status = status.as_u16(), error = %err, "Venue returned an error");
            return Err(err);
        }

        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                return Err(ExchangeError::InvalidCredentials(body));
            }
            return Err(ExchangeError::ApiError {
                code: i32::from(status.as_u16()),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(path, error = %e, "Failed to parse response");
            ExchangeError::ParseError(e.to_string())
        })
    }

    // ========================================================================
    // 공개 API
    // ========================================================================

    /// 마켓 시세.
    pub async fn get_ticker(&self, market: &Market) -> ExchangeResult<VenueTickerResponse> {
        let path = format!("/tickers/{}.json", market.code());
        self.public_request(&path, Params::new().with("market", market.code()))
            .await
    }

    /// 전체 마켓 시세.
    pub async fn get_all_tickers(&self) -> ExchangeResult<Value> {
        self.public_request("/tickers.json", Params::new()).await
    }

    /// 호가 깊이 (기본 300단계).
    pub async fn get_depth(&self, market: &Market, limit: Option<u32>) -> ExchangeResult<Value> {
        let params = Params::new()
            .with("market", market.code())
            .with("limit", limit.unwrap_or(300));
        self.public_request("/depth.json", params).await
    }

    /// 호가창 (기본 매도/매수 각 20건).
    pub async fn get_order_book(
        &self,
        market: &Market,
        asks_limit: Option<u32>,
        bids_limit: Option<u32>,
    ) -> ExchangeResult<Value> {
        let params = Params::new()
            .with("market", market.code())
            .with("asks_limit", asks_limit.unwrap_or(20))
            .with("bids_limit", bids_limit.unwrap_or(20));
        self.public_request("/order_book.json", params).await
    }

    /// 마켓 목록.
    pub async fn get_markets(&self) -> ExchangeResult<Value> {
        self.public_request("/markets.json", Params::new()).await
    }

    /// 서버 시각 (Unix 초).
    pub async fn get_timestamp(&self) -> ExchangeResult<i64> {
        self.public_request("/timestamp.json", Params::new()).await
    }

    /// K 라인.
    pub async fn get_k(
        &self,
        market: &Market,
        limit: Option<u32>,
        period: Option<u32>,
        timestamp: Option<i64>,
    ) -> ExchangeResult<Value> {
        let params = Params::new()
            .with("market", market.code())
            .with_opt("limit", limit)
            .with_opt("period", period)
            .with_opt("timestamp", timestamp);
        self.public_request("/k.json", params).await
    }

    /// 대기 중인 체결을 포함한 K 라인.
    pub async fn get_k_with_pending_trades(
        &self,
        market: &Market,
        trade_id: u64,
        period: Option<u32>,
        timestamp: Option<i64>,
    ) -> ExchangeResult<Value> {
        if trade_id == 0 {
            return Err(ExchangeError::missing("trade_id"));
        }
        let params = Params::new()
            .with("market", market.code())
            .with("trade_id", trade_id)
            .with_opt("period", period)
            .with_opt("timestamp", timestamp);
        self.public_request("/k_with_pending_trades.json", params)
            .await
    }

    // ========================================================================
    // 비공개 API (GET)
    // ========================================================================

    /// 회원 정보와 계좌 잔고.
    pub async fn get_member(&self) -> ExchangeResult<VenueMember> {
        self.private_get("/members/me.json", Params::new()).await
    }

    /// 입금 목록 (기본 100건, 상태 "wait").
    pub async fn get_deposits(
        &self,
        currency: &str,
        limit: Option<u32>,
        state: Option<&str>,
    ) -> ExchangeResult<Value> {
        if currency.is_empty() {
            return Err(ExchangeError::missing("currency"));
        }
        let params = Params::new()
            .with("currency", currency.to_lowercase())
            .with("limit", limit.unwrap_or(100))
            .with("state", state.unwrap_or("wait"));
        self.private_get("/deposits.json", params).await
    }

    /// 단일 입금.
    pub async fn get_deposit(&self, txid: &str) -> ExchangeResult<Value> {
        if txid.is_empty() {
            return Err(ExchangeError::missing("txid"));
        }
        self.private_get("/deposit.json", Params::new().with("txid", txid))
            .await
    }

    /// 입금 주소.
    pub async fn get_deposit_address(&self, currency: &str) -> ExchangeResult<Value> {
        if currency.is_empty() {
            return Err(ExchangeError::missing("currency"));
        }
        let params = Params::new().with("currency", currency.to_lowercase());
        self.private_get("/deposit_address.json", params).await
    }

    /// 주문 목록.
    pub async fn get_orders(
        &self,
        market: &Market,
        query: OrdersQuery,
    ) -> ExchangeResult<Vec<VenueOrder>> {
        let params = Params::new()
            .with("state", query.state.unwrap_or_else(|| "wait".to_string()))
            .with("limit", query.limit.unwrap_or(100))
            .with("page", query.page.unwrap_or(0))
            .with("order_by", query.order_by.unwrap_or_else(|| "asc".to_string()))
            .with("market", market.code());
        self.private_get("/orders.json", params).await
    }

    /// 단일 주문. 거래소는 객체 또는 배열로 응답할 수 있습니다.
    pub async fn get_order(&self, id: OrderId) -> ExchangeResult<Vec<VenueOrder>> {
        if id == 0 {
            return Err(ExchangeError::missing("id"));
        }
        let orders: OneOrMany<VenueOrder> = self
            .private_get("/order.json", Params::new().with("id", id))
            .await?;
        Ok(orders.into_vec())
    }

    /// 마켓 체결 내역.
    pub async fn get_trades(
        &self,
        market: &Market,
        query: TradesQuery,
    ) -> ExchangeResult<Vec<VenueTrade>> {
        self.private_get("/trades.json", query.into_params(market))
            .await
    }

    /// 내 체결 내역.
    pub async fn get_my_trades(
        &self,
        market: &Market,
        query: TradesQuery,
    ) -> ExchangeResult<Vec<VenueTrade>> {
        self.private_get("/trades/my.json", query.into_params(market))
            .await
    }

    // ========================================================================
    // 비공개 API (POST)
    // ========================================================================

    /// 지정가 주문 생성.
    ///
    /// 응답 원문을 반환합니다. `status: "error"` 판정은 호출자 몫입니다.
    pub async fn create_order(
        &self,
        market: &Market,
        side: Side,
        price: Decimal,
        volume: Decimal,
    ) -> ExchangeResult<Value> {
        if price <= Decimal::ZERO {
            return Err(ExchangeError::missing("price"));
        }
        if volume <= Decimal::ZERO {
            return Err(ExchangeError::missing("volume"));
        }

        let params = Params::new()
            .with("market", market.code())
            .with("price", price.normalize())
            .with("volume", volume.normalize())
            .with("side", side.as_str());
        self.private_post("/orders.json", params).await
    }

    /// 전체 주문 취소. `side`가 있으면 해당 방향만 취소합니다.
    pub async fn cancel_all_orders(&self, side: Option<Side>) -> ExchangeResult<Value> {
        let params = Params::new().with_opt("side", side.map(|s| s.as_str()));
        self.private_post("/orders/clear.json", params).await
    }

    /// 단일 주문 취소.
    pub async fn cancel_order(&self, id: OrderId) -> ExchangeResult<Value> {
        if id == 0 {
            return Err(ExchangeError::missing("id"));
        }
        self.private_post("/order/delete.json", Params::new().with("id", id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_debug_is_masked() {
        let config = CoinxConfig::new("AbCdEfGhIjKlMnOp", "super-secret-value", "trader01");
        let debug = format!("{:?}", config);
        assert!(debug.contains("AbCd...MnOp"));
        assert!(!debug.contains("super-secret-value"));
    }

    #[test]
    fn test_from_app_config() {
        let app = AppConfig::from_toml_str(
            r#"
            [exchange]
            rest_base_url = "http://127.0.0.1:9000/"
            [credentials]
            key = "k"
            secret = "s"
            username = "u"
            [precision]
            param_ordering = "nonce_last"
            "#,
        )
        .unwrap();

        let config = CoinxConfig::from_app_config(&app);
        assert!(config.has_credentials());
        assert_eq!(config.param_ordering, ParamOrdering::NonceLast);

        let client = CoinxClient::new(config).unwrap();
        assert_eq!(client.api_url(), "http://127.0.0.1:9000/api/v2");
        assert!(client.has_credentials());
    }

    #[test]
    fn test_user_agent() {
        assert!(user_agent().starts_with("CoinX API Client/"));
    }

    #[tokio::test]
    async fn test_private_call_without_credentials_fails_fast() {
        let client = CoinxClient::new(CoinxConfig::public_only().with_base_url("http://127.0.0.1:1"))
            .unwrap();
        assert!(!client.has_credentials());

        let result = client.get_member().await;
        assert!(matches!(result, Err(ExchangeError::Config(_))));
    }

    #[tokio::test]
    async fn test_missing_parameters_fail_before_network() {
        let client = CoinxClient::new(
            CoinxConfig::new("k", "s", "u").with_base_url("http://127.0.0.1:1"),
        )
        .unwrap();
        let market = Market::new("eth", "btc").unwrap();

        assert!(matches!(client.get_order(0).await, Err(ExchangeError::MissingParameter(_))));
        assert!(matches!(client.cancel_order(0).await, Err(ExchangeError::MissingParameter(_))));
        assert!(matches!(
            client.get_deposit_address("").await,
            Err(ExchangeError::MissingParameter(_))
        ));
        assert!(matches!(
            client
                .create_order(&market, Side::Buy, Decimal::ZERO, Decimal::ONE)
                .await,
            Err(ExchangeError::MissingParameter(ref p)) if p == "price"
        ));
    }
}
