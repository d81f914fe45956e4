//! 어댑터 핵심 에러 타입.
//!
//! 설정 로드/검증 및 도메인 값 생성 단계에서 발생하는 에러를 정의합니다.
//! 거래소 호출 에러는 `coinx-exchange`의 `ExchangeError`가 담당합니다.

use thiserror::Error;

/// 핵심 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::Config("credentials.key 누락".to_string());
        assert_eq!(err.to_string(), "설정 에러: credentials.key 누락");

        let err = CoreError::InvalidInput("빈 자산 코드".to_string());
        assert!(err.to_string().contains("빈 자산 코드"));
    }

    #[test]
    fn test_from_serde_json() {
        let err: CoreError = serde_json::from_str::<u64>("not-a-number")
            .unwrap_err()
            .into();
        assert!(matches!(err, CoreError::Serialization(_)));
    }
}
