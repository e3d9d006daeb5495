use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::model::orderbook::OrderbookSnapshot;
use crate::model::tick::Tick;

use super::types::{
    BinanceAggTrade, BinanceApiErrorResponse, BinanceDepthSnapshot, BinanceRecentTrade,
};

/// Hard cap Binance applies to `limit` on the trade endpoints.
pub const MAX_TRADES_PER_PAGE: u32 = 1000;
/// Safety stop for aggTrades pagination.
const MAX_AGG_TRADE_PAGES: usize = 10_000;

/// Client for the unauthenticated market-data endpoints.
pub struct BinanceRestClient {
    http: reqwest::Client,
    base_url: String,
}

impl BinanceRestClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Most recent `limit` trades for `symbol`.
    pub async fn recent_trades(&self, symbol: &str, limit: u32) -> Result<Vec<Tick>> {
        let url = format!("{}/api/v3/trades", self.base_url);
        let query = [
            ("symbol", symbol.to_ascii_uppercase()),
            ("limit", clamp_limit(limit).to_string()),
        ];
        let trades: Vec<BinanceRecentTrade> = self
            .get_json(&url, &query)
            .await
            .context("recent_trades failed")?;
        tracing::info!(symbol, count = trades.len(), "Fetched recent trades");
        Ok(trades.iter().map(Tick::from).collect())
    }

    /// Aggregate trades from `start_ms` up to `end_ms` (inclusive, if given).
    ///
    /// The first page is selected by time; while pages come back full, the
    /// next one is requested with `fromId = last_id + 1`.
    pub async fn historical_agg_trades(
        &self,
        symbol: &str,
        start_ms: u64,
        end_ms: Option<u64>,
        limit: u32,
    ) -> Result<Vec<Tick>> {
        let url = format!("{}/api/v3/aggTrades", self.base_url);
        let symbol = symbol.to_ascii_uppercase();
        let limit = clamp_limit(limit);

        let mut query = vec![
            ("symbol", symbol.clone()),
            ("startTime", start_ms.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(end) = end_ms {
            query.push(("endTime", end.to_string()));
        }
        let mut page: Vec<BinanceAggTrade> = self
            .get_json(&url, &query)
            .await
            .context("aggTrades initial page failed")?;
        let mut all = Vec::with_capacity(page.len());
        let mut pages = 1usize;

        loop {
            let next_from = next_from_id(&page, limit);
            let reached_end = truncate_after(&mut page, end_ms);
            all.extend(page.iter().map(Tick::from));

            let Some(from_id) = next_from else { break };
            if reached_end {
                break;
            }
            if pages >= MAX_AGG_TRADE_PAGES {
                tracing::warn!(symbol = %symbol, pages, "aggTrades page limit reached, stopping");
                break;
            }

            let query = [
                ("symbol", symbol.clone()),
                ("fromId", from_id.to_string()),
                ("limit", limit.to_string()),
            ];
            page = self
                .get_json(&url, &query)
                .await
                .with_context(|| format!("aggTrades page fromId={} failed", from_id))?;
            pages += 1;
            tracing::debug!(symbol = %symbol, pages, from_id, "Fetched aggTrades page");
        }

        tracing::info!(symbol = %symbol, count = all.len(), pages, "Fetched aggregate trades");
        Ok(all)
    }

    pub async fn depth_snapshot(&self, symbol: &str, limit: u32) -> Result<OrderbookSnapshot> {
        let url = format!("{}/api/v3/depth", self.base_url);
        let query = [
            ("symbol", symbol.to_ascii_uppercase()),
            ("limit", limit.to_string()),
        ];
        let depth: BinanceDepthSnapshot = self
            .get_json(&url, &query)
            .await
            .context("depth_snapshot failed")?;
        tracing::debug!(
            symbol,
            last_update_id = depth.last_update_id,
            bids = depth.bids.len(),
            asks = depth.asks.len(),
            "Fetched depth snapshot"
        );
        Ok(OrderbookSnapshot::from_string_pairs(&depth.bids, &depth.asks)?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(AppError::from)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            if let Ok(err) = serde_json::from_str::<BinanceApiErrorResponse>(&body) {
                return Err(AppError::BinanceApi {
                    code: err.code,
                    msg: err.msg,
                }
                .into());
            }
            return Err(anyhow::anyhow!("request failed ({}): {}", status, body));
        }

        Ok(resp.json().await.map_err(AppError::from)?)
    }
}

fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_TRADES_PER_PAGE)
}

/// `fromId` for the next page, or `None` when `page` was short (no more data).
fn next_from_id(page: &[BinanceAggTrade], limit: u32) -> Option<u64> {
    if page.len() < limit as usize {
        return None;
    }
    page.last().map(|t| t.agg_id + 1)
}

/// Drop trades after `end_ms`; returns true when anything was dropped.
fn truncate_after(page: &mut Vec<BinanceAggTrade>, end_ms: Option<u64>) -> bool {
    let Some(end) = end_ms else { return false };
    let before = page.len();
    page.retain(|t| t.time <= end);
    page.len() < before
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(id: u64, time: u64) -> BinanceAggTrade {
        BinanceAggTrade {
            agg_id: id,
            price: 1.0,
            qty: 1.0,
            first_trade_id: id,
            last_trade_id: id,
            time,
            is_buyer_maker: false,
        }
    }

    #[test]
    fn full_page_continues_from_last_id() {
        let page = vec![agg(10, 1), agg(11, 2), agg(12, 3)];
        assert_eq!(next_from_id(&page, 3), Some(13));
        assert_eq!(next_from_id(&page, 4), None);
        assert_eq!(next_from_id(&[], 3), None);
    }

    #[test]
    fn truncate_drops_trades_past_end() {
        let mut page = vec![agg(1, 100), agg(2, 200), agg(3, 300)];
        assert!(!truncate_after(&mut page, None));
        assert!(!truncate_after(&mut page, Some(300)));
        assert!(truncate_after(&mut page, Some(250)));
        assert_eq!(page.len(), 2);
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(500), 500);
        assert_eq!(clamp_limit(5000), MAX_TRADES_PER_PAGE);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = BinanceRestClient::new("https://api.binance.com/");
        assert_eq!(client.base_url, "https://api.binance.com");
    }
}
