//! CoinxClient 엔드포인트 파라미터 테스트.

use coinx_core::{Market, Side};
use coinx_exchange::{CoinxClient, CoinxConfig, ExchangeError, TradesQuery};
use mockito::{Matcher, Server, ServerGuard};

fn client_for(server: &ServerGuard) -> CoinxClient {
    CoinxClient::new(CoinxConfig::new("key-a", "secret-a", "trader01").with_base_url(server.url()))
        .unwrap()
}

fn market() -> Market {
    Market::new("ETH", "BTC").unwrap()
}

#[tokio::test]
async fn test_public_endpoints_use_default_limits() {
    let mut server = Server::new_async().await;
    let depth = server
        .mock("GET", "/api/v2/depth.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("market".into(), "ethbtc".into()),
            Matcher::UrlEncoded("limit".into(), "300".into()),
        ]))
        .with_body(r#"{"timestamp":1,"asks":[],"bids":[]}"#)
        .create_async()
        .await;
    let book = server
        .mock("GET", "/api/v2/order_book.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("asks_limit".into(), "20".into()),
            Matcher::UrlEncoded("bids_limit".into(), "5".into()),
        ]))
        .with_body(r#"{"asks":[],"bids":[]}"#)
        .create_async()
        .await;
    let timestamp = server
        .mock("GET", "/api/v2/timestamp.json")
        .with_body("1700000000")
        .create_async()
        .await;

    let client = client_for(&server);
    client.get_depth(&market(), None).await.unwrap();
    client.get_order_book(&market(), None, Some(5)).await.unwrap();
    assert_eq!(client.get_timestamp().await.unwrap(), 1_700_000_000);

    depth.assert_async().await;
    book.assert_async().await;
    timestamp.assert_async().await;
}

#[tokio::test]
async fn test_k_line_drops_absent_params() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v2/k.json")
        .match_query(Matcher::Exact("market=ethbtc&period=5".into()))
        .with_body("[]")
        .create_async()
        .await;

    let client = client_for(&server);
    client.get_k(&market(), None, Some(5), None).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_private_endpoints_use_defaults() {
    let mut server = Server::new_async().await;
    let deposits = server
        .mock("GET", "/api/v2/deposits.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("currency".into(), "btc".into()),
            Matcher::UrlEncoded("limit".into(), "100".into()),
            Matcher::UrlEncoded("state".into(), "wait".into()),
            Matcher::UrlEncoded("access_key".into(), "key-a".into()),
        ]))
        .with_body("[]")
        .create_async()
        .await;
    let my_trades = server
        .mock("GET", "/api/v2/trades/my.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("market".into(), "ethbtc".into()),
            Matcher::UrlEncoded("limit".into(), "10".into()),
            Matcher::UrlEncoded("order_by".into(), "desc".into()),
            Matcher::UrlEncoded("from".into(), "99".into()),
        ]))
        .with_body("[]")
        .create_async()
        .await;

    let client = client_for(&server);
    client.get_deposits("BTC", None, None).await.unwrap();
    let trades = client
        .get_my_trades(
            &market(),
            TradesQuery {
                limit: Some(10),
                from: Some(99),
                ..TradesQuery::default()
            },
        )
        .await
        .unwrap();
    assert!(trades.is_empty());

    deposits.assert_async().await;
    my_trades.assert_async().await;
}

#[tokio::test]
async fn test_cancel_all_orders_with_side() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v2/orders/clear.json")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("side".into(), "sell".into()),
            Matcher::UrlEncoded("access_key".into(), "key-a".into()),
        ]))
        .with_body("[]")
        .create_async()
        .await;

    let client = client_for(&server);
    client.cancel_all_orders(Some(Side::Sell)).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unparseable_body_is_parse_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v2/members/me.json")
        .match_query(Matcher::Any)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.get_member().await.unwrap_err();
    assert!(matches!(err, ExchangeError::ParseError(_)));
    assert!(err.is_retryable());
}
