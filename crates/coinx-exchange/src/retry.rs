//! 재시도 정책.
//!
//! 실패한 작업을 같은 인자로 다시 호출합니다. 재시도 대기는
//! `tokio::time::sleep`으로 해당 future 안에서만 이루어지므로 다른
//! 진행 중인 작업에 영향을 주지 않습니다.
//!
//! 재시도하지 않는 에러:
//! - `InvalidCredentials`, `Config`: 치명적. 즉시 반환합니다.
//! - `MissingParameter`: 입력 오류. 즉시 반환합니다.

use crate::{ExchangeError, ExchangeResult};
use coinx_core::{BackoffKind, RetrySettings};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

/// 재시도 간 대기 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// 매번 같은 지연
    Fixed,
    /// 시도마다 두 배, `max_delay`에서 상한
    Exponential { max_delay: Duration },
}

/// 재시도 정책.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 기본 지연
    pub delay: Duration,
    /// 최대 시도 횟수 (첫 시도 포함). `None`이면 무제한.
    pub max_attempts: Option<u32>,
    /// 대기 방식
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    /// 고정 지연 정책.
    pub fn fixed(delay: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            delay,
            max_attempts,
            backoff: Backoff::Fixed,
        }
    }

    /// 재시도 없이 한 번만 시도하는 정책.
    pub fn no_retry() -> Self {
        Self::fixed(Duration::ZERO, Some(1))
    }

    /// 설정에서 정책 생성. `max_attempts = 0`은 무제한입니다.
    pub fn from_settings(settings: &RetrySettings) -> Self {
        let backoff = match settings.backoff {
            BackoffKind::Fixed => Backoff::Fixed,
            BackoffKind::Exponential => Backoff::Exponential {
                max_delay: Duration::from_secs(settings.max_delay_secs),
            },
        };

        Self {
            delay: Duration::from_secs(settings.delay_secs),
            max_attempts: (settings.max_attempts > 0).then_some(settings.max_attempts),
            backoff,
        }
    }

    /// `attempt`번째 실패(1부터) 뒤의 대기 시간.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { max_delay } => {
                let exp = attempt.saturating_sub(1).min(31);
                self.delay
                    .checked_mul(1u32 << exp)
                    .unwrap_or(max_delay)
                    .min(max_delay)
            }
        }
    }

    /// 작업을 실행하고 실패 시 정책에 따라 재시도합니다.
    ///
    /// `op`는 매 시도마다 호출되어 새 future를 만듭니다. 원래 인자는
    /// 클로저가 캡처한 값으로 그대로 재사용됩니다.
    ///
    /// # Errors
    /// - 재시도 불가 에러는 그대로 반환
    /// - 시도 횟수 소진 시 `ExchangeError::RetriesExhausted`
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> ExchangeResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ExchangeResult<T>>,
    {
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);

            let err = match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                if err.is_fatal() {
                    error!(operation, error = %err, "Fatal error, not retrying");
                }
                return Err(err);
            }

            if self.max_attempts.is_some_and(|max| attempt >= max) {
                error!(operation, attempt, error = %err, "Retries exhausted");
                return Err(ExchangeError::RetriesExhausted {
                    operation: operation.to_string(),
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = self.delay_for_attempt(attempt);
            warn!(
                operation,
                attempt,
                max_attempts = ?self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Operation failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
