//! CoinX 기능 명세.

use coinx_core::{ExchangeCapabilities, MarketCapability, OrderUnit};
use rust_decimal_macros::dec;

/// 엔진에 노출하는 CoinX 기능 명세.
pub fn coinx_capabilities() -> ExchangeCapabilities {
    ExchangeCapabilities {
        name: "CoinX".to_string(),
        slug: "coinx".to_string(),
        currencies: vec!["BTC".to_string(), "ETH".to_string()],
        assets: vec!["ETH".to_string(), "OPC".to_string()],
        markets: vec![
            MarketCapability::new("BTC", "ETH", dec!(0.001), OrderUnit::Currency),
            MarketCapability::new("BTC", "OPC", dec!(5), OrderUnit::Asset),
            MarketCapability::new("ETH", "OPC", dec!(5), OrderUnit::Asset),
        ],
        requires: vec![
            "key".to_string(),
            "secret".to_string(),
            "username".to_string(),
        ],
        max_trades_age: 60,
        fetch_timespan: 60,
        tid: "tid".to_string(),
        tradable: true,
    }
}
