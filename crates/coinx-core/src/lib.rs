//! # CoinX Core
//!
//! CoinX 거래소 어댑터의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 어댑터 전반에서 사용되는 기본 타입을 제공합니다:
//! - 마켓(자산/통화 쌍) 정의
//! - 주문 조회 결과 및 주문 ID 타입
//! - 체결 기록, 포트폴리오 항목, 시세 스냅샷
//! - 거래소 기능 명세 (엔진 노출용)
//! - 소수점 정밀도 규칙 (수량 내림, 가격 정책)
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
