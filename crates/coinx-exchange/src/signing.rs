//! 요청 서명.
//!
//! 서명 메시지 형식:
//!
//! ```text
//! {METHOD}|{api_base_path}{path}|{정렬된 key=value&... 쿼리}
//! ```
//!
//! 서명 대상 파라미터에는 `access_key`와 `tonce`가 포함되며, 계산된
//! HMAC-SHA256 16진수 서명은 `signature` 파라미터로 마지막에 덧붙습니다.
//!
//! 자격증명과 tonce 카운터는 서명기 인스턴스가 단독으로 소유합니다.
//! 서로 다른 자격증명을 가진 두 어댑터는 상태를 공유하지 않습니다.

use crate::{ExchangeError, ExchangeResult};
use chrono::Utc;
use coinx_core::{mask, ParamOrdering};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

type HmacSha256 = Hmac<Sha256>;

/// tonce 파라미터 이름.
pub const NONCE_PARAM: &str = "tonce";
/// API 키 파라미터 이름.
pub const ACCESS_KEY_PARAM: &str = "access_key";
/// 서명 파라미터 이름.
pub const SIGNATURE_PARAM: &str = "signature";

// ============================================================================
// 자격증명
// ============================================================================

/// API 자격증명.
///
/// # 보안
/// - 시크릿은 `SecretString`으로 보관되며 서명 계산에만 사용됩니다.
/// - `Debug` 구현은 키를 마스킹하고 시크릿을 출력하지 않습니다.
pub struct Credentials {
    api_key: String,
    api_secret: SecretString,
    client_id: String,
}

impl Credentials {
    /// 새 자격증명 생성.
    ///
    /// # Errors
    /// 키나 시크릿이 비어 있으면 `ExchangeError::Config`를 반환합니다.
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        client_id: impl Into<String>,
    ) -> ExchangeResult<Self> {
        let api_key = api_key.into();
        let api_secret = api_secret.into();

        if api_key.is_empty() || api_secret.is_empty() {
            return Err(ExchangeError::Config(
                "CoinX: API key and secret required".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            api_secret: SecretString::from(api_secret),
            client_id: client_id.into(),
        })
    }

    /// API 키.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// 거래소 사용자 ID.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// 메시지에 대한 HMAC-SHA256 서명 (소문자 16진수).
    pub fn sign(&self, message: &str) -> ExchangeResult<String> {
        hmac_sha256_hex(self.api_secret.expose_secret().as_bytes(), message)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &mask(&self.api_key))
            .field("api_secret", &"***REDACTED***")
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// HMAC-SHA256 16진수 다이제스트.
pub fn hmac_sha256_hex(secret: &[u8], message: &str) -> ExchangeResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| ExchangeError::Config(format!("HMAC key error: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

// ============================================================================
// tonce
// ============================================================================

/// 단조 증가하는 tonce 생성기.
///
/// 값은 밀리초 단위 현재 시각을 따르되, 직전 값보다 항상 큽니다.
/// 동시에 호출되어도 같은 값을 두 번 반환하지 않습니다.
#[derive(Debug, Default)]
pub struct NonceGenerator {
    last: AtomicU64,
}

impl NonceGenerator {
    /// 새 생성기.
    pub fn new() -> Self {
        Self::default()
    }

    /// 다음 tonce 값.
    pub fn next(&self) -> u64 {
        let now_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        self.next_at(now_ms)
    }

    /// 주어진 현재 시각 기준으로 다음 tonce 값을 계산합니다.
    pub fn next_at(&self, now_ms: u64) -> u64 {
        let prev = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now_ms.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now_ms.max(prev + 1)
    }

    /// 마지막으로 발급한 값.
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::Acquire)
    }
}

// ============================================================================
// 파라미터
// ============================================================================

/// 요청 파라미터 목록.
///
/// 값이 없는(`None`) 파라미터는 추가 단계에서 버려집니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    /// 빈 파라미터 목록.
    pub fn new() -> Self {
        Self::default()
    }

    /// 파라미터 추가.
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.push(key, value);
        self
    }

    /// 값이 있을 때만 파라미터 추가.
    pub fn with_opt<T: ToString>(mut self, key: &str, value: Option<T>) -> Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    /// 파라미터 추가.
    pub fn push(&mut self, key: &str, value: impl ToString) {
        self.0.push((key.to_string(), value.to_string()));
    }

    /// 키로 값 조회.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 비어 있는지 확인.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 파라미터 순회.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 입력 순서 그대로 인코딩한 쿼리 문자열.
    pub fn to_query(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// 정렬 후 인코딩한 서명용 쿼리 문자열.
    pub fn canonical_query(&self, ordering: ParamOrdering) -> String {
        let mut sorted: Vec<&(String, String)> = self.0.iter().collect();
        match ordering {
            ParamOrdering::Alphabetical => sorted.sort_by(|a, b| a.0.cmp(&b.0)),
            ParamOrdering::NonceLast => sorted.sort_by(|a, b| {
                (a.0 == NONCE_PARAM)
                    .cmp(&(b.0 == NONCE_PARAM))
                    .then_with(|| a.0.cmp(&b.0))
            }),
        }

        sorted
            .into_iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn encode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

// ============================================================================
// 서명기
// ============================================================================

/// HTTP 메서드.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    /// 서명 메시지에 쓰이는 메서드 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// 서명 메시지 생성.
pub fn canonical_message(method: HttpMethod, base_path: &str, path: &str, query: &str) -> String {
    format!("{}|{}{}|{}", method.as_str(), base_path, path, query)
}

/// 서명이 끝난 요청.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// HTTP 메서드
    pub method: HttpMethod,
    /// 경로 접두사를 제외한 엔드포인트 경로
    pub path: String,
    /// 서명된 쿼리/폼 본문 (`signature`가 마지막)
    pub payload: String,
    /// 서명 (16진수)
    pub signature: String,
    /// 사용된 tonce
    pub tonce: u64,
    /// 추가 헤더 (POST: `Key`, `Sign`)
    pub headers: Vec<(&'static str, String)>,
}

/// 인스턴스 전용 요청 서명기.
#[derive(Debug)]
pub struct RequestSigner {
    credentials: Credentials,
    nonce: NonceGenerator,
    base_path: String,
    ordering: ParamOrdering,
}

impl RequestSigner {
    /// 새 서명기 생성.
    pub fn new(
        credentials: Credentials,
        base_path: impl Into<String>,
        ordering: ParamOrdering,
    ) -> Self {
        Self {
            credentials,
            nonce: NonceGenerator::new(),
            base_path: base_path.into(),
            ordering,
        }
    }

    /// 자격증명 참조.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// 새 tonce로 요청 서명.
    pub fn sign(
        &self,
        method: HttpMethod,
        path: &str,
        params: Params,
    ) -> ExchangeResult<SignedRequest> {
        let tonce = self.nonce.next();
        self.sign_with_tonce(method, path, params, tonce)
    }

    /// 주어진 tonce로 요청 서명.
    pub fn sign_with_tonce(
        &self,
        method: HttpMethod,
        path: &str,
        mut params: Params,
        tonce: u64,
    ) -> ExchangeResult<SignedRequest> {
        params.push(ACCESS_KEY_PARAM, self.credentials.api_key());
        params.push(NONCE_PARAM, tonce);

        let query = params.canonical_query(self.ordering);
        let message = canonical_message(method, &self.base_path, path, &query);
        let signature = self.credentials.sign(&message)?;
        let payload = format!("{}&{}={}", query, SIGNATURE_PARAM, signature);

        let headers = match method {
            HttpMethod::Get => Vec::new(),
            HttpMethod::Post => vec![
                ("Key", self.credentials.api_key().to_string()),
                ("Sign", signature.clone()),
            ],
        };

        Ok(SignedRequest {
            method,
            path: path.to_string(),
            payload,
            signature,
            tonce,
            headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn signer(ordering: ParamOrdering) -> RequestSigner {
        let creds = Credentials::new("xxx", "yyy", "trader01").unwrap();
        RequestSigner::new(creds, "/api/v2", ordering)
    }

    #[test]
    fn test_hmac_known_vector() {
        let sig = hmac_sha256_hex(b"key", "The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(
            sig,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn test_credentials_require_key_and_secret() {
        assert!(matches!(
            Credentials::new("", "secret", "u"),
            Err(ExchangeError::Config(_))
        ));
        assert!(matches!(
            Credentials::new("key", "", "u"),
            Err(ExchangeError::Config(_))
        ));
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let creds = Credentials::new("ABCDEFGHIJKLMNOP", "very-secret-value", "u1").unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("very-secret-value"));
        assert!(!debug.contains("ABCDEFGHIJKLMNOP"));
        assert!(debug.contains("ABCD...MNOP"));
    }

    #[test]
    fn test_canonical_query_sorting() {
        let params = Params::new()
            .with("volume", "1.5")
            .with("market", "ethbtc")
            .with("tonce", 123)
            .with("access_key", "xxx");

        assert_eq!(
            params.canonical_query(ParamOrdering::Alphabetical),
            "access_key=xxx&market=ethbtc&tonce=123&volume=1.5"
        );
        assert_eq!(
            params.canonical_query(ParamOrdering::NonceLast),
            "access_key=xxx&market=ethbtc&volume=1.5&tonce=123"
        );
    }

    #[test]
    fn test_params_drop_none_and_encode() {
        let params = Params::new()
            .with("market", "ethbtc")
            .with_opt::<u64>("timestamp", None)
            .with_opt("limit", Some(50))
            .with("note", "a b&c");

        assert_eq!(params.get("timestamp"), None);
        assert_eq!(params.get("limit"), Some("50"));
        assert_eq!(params.to_query(), "market=ethbtc&limit=50&note=a+b%26c");
    }

    #[test]
    fn test_private_get_signature_is_reproducible() {
        let signed = signer(ParamOrdering::Alphabetical)
            .sign_with_tonce(HttpMethod::Get, "/members/me.json", Params::new(), 123456789)
            .unwrap();

        let message = "GET|/api/v2/members/me.json|access_key=xxx&tonce=123456789";
        let expected = hmac_sha256_hex(b"yyy", message).unwrap();

        assert_eq!(signed.signature, expected);
        assert_eq!(
            signed.payload,
            format!("access_key=xxx&tonce=123456789&signature={}", expected)
        );
        assert!(signed.headers.is_empty());
    }

    #[test]
    fn test_private_post_signature_and_headers() {
        let params = Params::new()
            .with("market", "ethbtc")
            .with("price", "0.05")
            .with("side", "buy")
            .with("volume", "1.2");
        let signed = signer(ParamOrdering::Alphabetical)
            .sign_with_tonce(HttpMethod::Post, "/orders.json", params, 1000)
            .unwrap();

        let message =
            "POST|/api/v2/orders.json|access_key=xxx&market=ethbtc&price=0.05&side=buy&tonce=1000&volume=1.2";
        let expected = hmac_sha256_hex(b"yyy", message).unwrap();

        assert_eq!(signed.signature, expected);
        assert!(signed.payload.ends_with(&format!("&signature={}", expected)));
        assert_eq!(
            signed.headers,
            vec![("Key", "xxx".to_string()), ("Sign", expected.clone())]
        );
    }

    #[test]
    fn test_nonce_strictly_increases() {
        let nonce = NonceGenerator::new();
        assert_eq!(nonce.next_at(1_000), 1_000);
        // 시계가 멈추거나 뒤로 가도 값은 증가
        assert_eq!(nonce.next_at(1_000), 1_001);
        assert_eq!(nonce.next_at(900), 1_002);
        assert_eq!(nonce.next_at(5_000), 5_000);
        assert_eq!(nonce.last(), 5_000);
    }

    #[test]
    fn test_nonce_unique_across_threads() {
        let nonce = Arc::new(NonceGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let nonce = Arc::clone(&nonce);
                std::thread::spawn(move || (0..500).map(|_| nonce.next_at(42)).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.join().unwrap() {
                assert!(seen.insert(value), "duplicate tonce {}", value);
            }
        }
        assert_eq!(seen.len(), 2_000);
    }

    #[test]
    fn test_separate_signers_do_not_share_state() {
        let a = RequestSigner::new(
            Credentials::new("key-a", "secret-a", "a").unwrap(),
            "/api/v2",
            ParamOrdering::Alphabetical,
        );
        let b = RequestSigner::new(
            Credentials::new("key-b", "secret-b", "b").unwrap(),
            "/api/v2",
            ParamOrdering::Alphabetical,
        );

        let signed_a = a
            .sign_with_tonce(HttpMethod::Get, "/members/me.json", Params::new(), 7)
            .unwrap();
        let signed_b = b
            .sign_with_tonce(HttpMethod::Get, "/members/me.json", Params::new(), 7)
            .unwrap();

        assert!(signed_a.payload.contains("access_key=key-a"));
        assert!(!signed_a.payload.contains("key-b"));
        assert!(signed_b.payload.contains("access_key=key-b"));
        assert_ne!(signed_a.signature, signed_b.signature);
        assert_eq!(
            signed_a.signature,
            hmac_sha256_hex(
                b"secret-a",
                "GET|/api/v2/members/me.json|access_key=key-a&tonce=7"
            )
            .unwrap()
        );
    }
}
