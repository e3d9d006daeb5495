use serde::Deserialize;

use crate::model::tick::Tick;

/// Deserialize Binance string-encoded numbers to f64.
pub fn string_to_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<f64>().map_err(serde::de::Error::custom)
}

/// Binance trade stream event (symbol@trade).
#[derive(Debug, Deserialize)]
pub struct BinanceTradeEvent {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: u64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "t")]
    pub trade_id: u64,
    #[serde(rename = "p", deserialize_with = "string_to_f64")]
    pub price: f64,
    #[serde(rename = "q", deserialize_with = "string_to_f64")]
    pub qty: f64,
    #[serde(rename = "T")]
    pub trade_time: u64,
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

/// Recent trades item (GET /api/v3/trades).
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BinanceRecentTrade {
    pub id: u64,
    #[serde(deserialize_with = "string_to_f64")]
    pub price: f64,
    #[serde(deserialize_with = "string_to_f64")]
    pub qty: f64,
    pub time: u64,
    pub is_buyer_maker: bool,
}

/// Aggregate trades item (GET /api/v3/aggTrades).
#[derive(Debug, Deserialize, Clone)]
pub struct BinanceAggTrade {
    #[serde(rename = "a")]
    pub agg_id: u64,
    #[serde(rename = "p", deserialize_with = "string_to_f64")]
    pub price: f64,
    #[serde(rename = "q", deserialize_with = "string_to_f64")]
    pub qty: f64,
    #[serde(rename = "f")]
    pub first_trade_id: u64,
    #[serde(rename = "l")]
    pub last_trade_id: u64,
    #[serde(rename = "T")]
    pub time: u64,
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

/// Order book snapshot (GET /api/v3/depth). Levels stay string-encoded.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BinanceDepthSnapshot {
    pub last_update_id: u64,
    pub bids: Vec<[String; 2]>,
    pub asks: Vec<[String; 2]>,
}

/// Binance API error response.
#[derive(Debug, Deserialize)]
pub struct BinanceApiErrorResponse {
    pub code: i64,
    pub msg: String,
}

impl From<&BinanceTradeEvent> for Tick {
    fn from(event: &BinanceTradeEvent) -> Self {
        Tick::new(event.trade_time, event.price, event.qty)
    }
}

impl From<&BinanceRecentTrade> for Tick {
    fn from(trade: &BinanceRecentTrade) -> Self {
        Tick::new(trade.time, trade.price, trade.qty)
    }
}

impl From<&BinanceAggTrade> for Tick {
    fn from(trade: &BinanceAggTrade) -> Self {
        Tick::new(trade.time, trade.price, trade.qty)
    }
}
