//! 거래소 에러 타입.
//!
//! 에러는 세 부류로 나뉩니다:
//! - 치명적: 잘못된 자격증명, 설정 누락. 재시도해도 성공할 수 없습니다.
//! - 입력 오류: 필수 파라미터 누락. 네트워크 호출 전에 즉시 반환됩니다.
//! - 일시적: 그 밖의 모든 네트워크/거래소 오류. 재시도 정책이 처리합니다.

use thiserror::Error;

/// 거래소 관련 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 설정 에러 (서명 시점에 자격증명 없음 등)
    #[error("Config error: {0}")]
    Config(String),

    /// 거래소가 API 키를 거부함
    #[error("Invalid API credentials: {0}")]
    InvalidCredentials(String),

    /// 필수 호출 파라미터 누락
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 빈 응답 본문
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// 거래소 에러 객체
    #[error("API error {code}: {message}")]
    ApiError { code: i32, message: String },

    /// 거래소가 `status: "error"`로 요청을 거부함
    #[error("Rejected by venue: {0}")]
    Rejected(String),

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 주문을 찾을 수 없음
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// 재시도 한도 소진
    #[error("{operation} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last: Box<ExchangeError>,
    },
}

/// 거래소 작업을 위한 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// 자격증명 오류를 뜻하는 거래소 에러 코드.
const CREDENTIAL_ERROR_CODES: [i32; 3] = [
    2001, // Authorization failed
    2005, // Signature is incorrect
    2008, // The access key does not exist
];

/// 주문 없음 에러 코드.
const ORDER_NOT_FOUND_CODE: i32 = 2004;

impl ExchangeError {
    /// 필수 파라미터 누락 에러를 생성합니다.
    pub fn missing(param: &str) -> Self {
        ExchangeError::MissingParameter(param.to_string())
    }

    /// 거래소 에러 코드와 메시지를 ExchangeError로 매핑합니다.
    pub fn from_venue(code: i32, message: &str) -> Self {
        if CREDENTIAL_ERROR_CODES.contains(&code) || is_invalid_key_message(message) {
            ExchangeError::InvalidCredentials(message.to_string())
        } else if code == ORDER_NOT_FOUND_CODE {
            ExchangeError::OrderNotFound(message.to_string())
        } else {
            ExchangeError::ApiError {
                code,
                message: message.to_string(),
            }
        }
    }

    /// 재시도 가능한 에러인지 확인.
    ///
    /// 치명적 에러와 입력 오류를 제외한 모든 에러는 재시도 대상입니다.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ExchangeError::Config(_)
                | ExchangeError::InvalidCredentials(_)
                | ExchangeError::MissingParameter(_)
                | ExchangeError::RetriesExhausted { .. }
        )
    }

    /// 인증 에러인지 확인.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ExchangeError::InvalidCredentials(_))
    }

    /// 호출 흐름을 중단해야 하는 치명적 에러인지 확인.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExchangeError::Config(_) | ExchangeError::InvalidCredentials(_)
        )
    }

    /// 재시도 소진 에러라면 마지막 원인 에러를 반환합니다.
    pub fn root_cause(&self) -> &ExchangeError {
        match self {
            ExchangeError::RetriesExhausted { last, .. } => last.root_cause(),
            other => other,
        }
    }
}

fn is_invalid_key_message(message: &str) -> bool {
    message.to_lowercase().contains("invalid api key")
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout(err.to_string())
        } else if err.is_decode() {
            ExchangeError::ParseError(err.to_string())
        } else {
            ExchangeError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::ParseError(err.to_string())
    }
}

impl From<coinx_core::CoreError> for ExchangeError {
    fn from(err: coinx_core::CoreError) -> Self {
        match err {
            coinx_core::CoreError::InvalidInput(msg) => ExchangeError::MissingParameter(msg),
            other => ExchangeError::Config(other.to_string()),
        }
    }
}
