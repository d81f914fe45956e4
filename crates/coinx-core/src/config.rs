//! 설정 관리.
//!
//! 설정은 TOML 파일에서 로드되며 `COINX__` 접두사 환경 변수로 덮어쓸 수 있습니다
//! (예: `COINX__CREDENTIALS__KEY`, `COINX__RETRY__MAX_ATTEMPTS`).

use crate::error::{CoreError, CoreResult};
use crate::types::AMOUNT_DECIMALS;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 애플리케이션 설정.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 거래소 연결 설정
    #[serde(default)]
    pub exchange: ExchangeSettings,
    /// 자격증명
    #[serde(default)]
    pub credentials: CredentialSettings,
    /// 재시도 정책 설정
    #[serde(default)]
    pub retry: RetrySettings,
    /// 정밀도 및 서명 정책 설정
    #[serde(default)]
    pub precision: PrecisionSettings,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 거래소 연결 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExchangeSettings {
    /// REST API 호스트 (경로 접두사 제외)
    #[serde(default = "default_rest_base_url")]
    pub rest_base_url: String,
    /// API 경로 접두사 (서명 메시지에도 포함됨)
    #[serde(default = "default_api_base_path")]
    pub api_base_path: String,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 거래 자산 (예: "eth")
    #[serde(default = "default_asset")]
    pub asset: String,
    /// 가격 통화 (예: "btc")
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_rest_base_url() -> String {
    "https://x.tth365.com:443".to_string()
}
fn default_api_base_path() -> String {
    "/api/v2".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_asset() -> String {
    "eth".to_string()
}
fn default_currency() -> String {
    "btc".to_string()
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            rest_base_url: default_rest_base_url(),
            api_base_path: default_api_base_path(),
            timeout_secs: default_timeout_secs(),
            asset: default_asset(),
            currency: default_currency(),
        }
    }
}

/// 자격증명 설정.
///
/// `Debug` 구현은 키와 시크릿을 마스킹합니다.
#[derive(Default, Deserialize)]
pub struct CredentialSettings {
    /// API 키
    #[serde(default)]
    pub key: String,
    /// API 시크릿
    #[serde(default)]
    pub secret: String,
    /// 거래소 사용자 ID
    #[serde(default)]
    pub username: String,
}

impl CredentialSettings {
    /// 키와 시크릿이 모두 설정되었는지 확인합니다.
    pub fn is_complete(&self) -> bool {
        !self.key.is_empty() && !self.secret.is_empty()
    }
}

impl std::fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("key", &mask(&self.key))
            .field("secret", &"***REDACTED***")
            .field("username", &self.username)
            .finish()
    }
}

/// 로그/디버그 출력용 마스킹 (앞뒤 4자만 노출).
pub fn mask(value: &str) -> String {
    if value.len() > 8 && value.is_ascii() {
        format!("{}...{}", &value[..4], &value[value.len() - 4..])
    } else {
        "***REDACTED***".to_string()
    }
}

/// 재시도 대기 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    /// 매 시도마다 같은 지연
    #[default]
    Fixed,
    /// 시도마다 지연을 두 배로 (최대값까지)
    Exponential,
}

/// 재시도 정책 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrySettings {
    /// 재시도 전 대기 시간 (초)
    #[serde(default = "default_retry_delay_secs")]
    pub delay_secs: u64,
    /// 최대 시도 횟수 (첫 시도 포함). 0이면 무제한.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// 대기 방식
    #[serde(default)]
    pub backoff: BackoffKind,
    /// 지수 대기 시 최대 대기 시간 (초)
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

fn default_retry_delay_secs() -> u64 {
    10
}
fn default_max_attempts() -> u32 {
    30
}
fn default_max_delay_secs() -> u64 {
    300
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            delay_secs: default_retry_delay_secs(),
            max_attempts: default_max_attempts(),
            backoff: BackoffKind::default(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

/// 서명 메시지의 파라미터 정렬 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamOrdering {
    /// 모든 키를 알파벳 순으로 정렬
    #[default]
    Alphabetical,
    /// 알파벳 순으로 정렬하되 `tonce`를 마지막에 배치
    NonceLast,
}

/// 정밀도 및 서명 정책 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrecisionSettings {
    /// 주문 수량 소수점 자릿수 (내림)
    #[serde(default = "default_amount_decimals")]
    pub amount_decimals: u32,
    /// 주문 가격 소수점 자릿수. 없으면 가격을 조정하지 않습니다.
    #[serde(default)]
    pub price_decimals: Option<u32>,
    /// 매수 시 수량에서 미리 빼는 비율 (%)
    #[serde(default = "default_buy_safety_margin_pct")]
    pub buy_safety_margin_pct: Decimal,
    /// 서명 파라미터 정렬 방식
    #[serde(default)]
    pub param_ordering: ParamOrdering,
}

fn default_amount_decimals() -> u32 {
    AMOUNT_DECIMALS
}
fn default_buy_safety_margin_pct() -> Decimal {
    Decimal::ONE
}

impl Default for PrecisionSettings {
    fn default() -> Self {
        Self {
            amount_decimals: default_amount_decimals(),
            price_decimals: None,
            buy_safety_margin_pct: default_buy_safety_margin_pct(),
            param_ordering: ParamOrdering::default(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("COINX")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 로드합니다 (환경 변수 덮어쓰기 없음).
    pub fn from_toml_str(toml: &str) -> CoreResult<Self> {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 설정 값의 일관성을 검증합니다.
    pub fn validate(&self) -> CoreResult<()> {
        if self.exchange.asset.trim().is_empty() || self.exchange.currency.trim().is_empty() {
            return Err(CoreError::Config(
                "exchange.asset 과 exchange.currency 는 비어 있을 수 없습니다".to_string(),
            ));
        }
        if !self.exchange.api_base_path.is_empty() && !self.exchange.api_base_path.starts_with('/')
        {
            return Err(CoreError::Config(format!(
                "exchange.api_base_path 는 '/'로 시작해야 합니다: {}",
                self.exchange.api_base_path
            )));
        }
        if self.precision.amount_decimals > AMOUNT_DECIMALS {
            return Err(CoreError::Config(format!(
                "precision.amount_decimals 는 {} 이하여야 합니다",
                AMOUNT_DECIMALS
            )));
        }
        if self.precision.buy_safety_margin_pct.is_sign_negative()
            || self.precision.buy_safety_margin_pct >= Decimal::ONE_HUNDRED
        {
            return Err(CoreError::Config(
                "precision.buy_safety_margin_pct 는 0 이상 100 미만이어야 합니다".to_string(),
            ));
        }
        if self.retry.delay_secs > self.retry.max_delay_secs {
            return Err(CoreError::Config(
                "retry.delay_secs 는 retry.max_delay_secs 보다 클 수 없습니다".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.exchange.api_base_path, "/api/v2");
        assert_eq!(config.retry.delay_secs, 10);
        assert_eq!(config.retry.max_attempts, 30);
        assert_eq!(config.retry.backoff, BackoffKind::Fixed);
        assert_eq!(config.precision.amount_decimals, 8);
        assert_eq!(config.precision.price_decimals, None);
        assert_eq!(config.precision.buy_safety_margin_pct, dec!(1));
        assert_eq!(config.precision.param_ordering, ParamOrdering::Alphabetical);
        assert!(!config.credentials.is_complete());
    }

    #[test]
    fn test_load_sections_from_toml() {
        let toml = r#"
            [exchange]
            rest_base_url = "http://127.0.0.1:9000"
            asset = "OPC"
            currency = "ETH"

            [credentials]
            key = "access-key-123456"
            secret = "secret-value"
            username = "trader01"

            [retry]
            delay_secs = 2
            max_attempts = 5
            backoff = "exponential"

            [precision]
            price_decimals = 6
            param_ordering = "nonce_last"
        "#;

        let config = AppConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.exchange.rest_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.exchange.asset, "OPC");
        assert!(config.credentials.is_complete());
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.backoff, BackoffKind::Exponential);
        assert_eq!(config.precision.price_decimals, Some(6));
        assert_eq!(config.precision.param_ordering, ParamOrdering::NonceLast);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let toml = "[precision]\namount_decimals = 12\n";
        assert!(AppConfig::from_toml_str(toml).is_err());

        let toml = "[retry]\ndelay_secs = 600\nmax_delay_secs = 60\n";
        assert!(AppConfig::from_toml_str(toml).is_err());

        let toml = "[exchange]\napi_base_path = \"api/v2\"\n";
        assert!(AppConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_credential_debug_is_masked() {
        let creds = CredentialSettings {
            key: "AbCdEfGhIjKlMnOp".to_string(),
            secret: "super-secret-value".to_string(),
            username: "trader01".to_string(),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("AbCd...MnOp"));
        assert!(!debug.contains("super-secret-value"));
        assert!(!debug.contains("AbCdEfGhIjKlMnOp"));
    }
}
