use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::quotes::{dollars_to_cents, normalize_symbol, Quote, QuoteProvider};

#[derive(Clone)]
pub struct FinnhubClient {
    http: Client,
    api_key: String,
}

impl FinnhubClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
        }
    }

    fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub async fn quote(&self, symbol: &str) -> Result<QuoteResponse, String> {
        if !self.has_key() {
            return Err("FINNHUB_API_KEY is missing in .env".to_string());
        }

        let url = "https://finnhub.io/api/v1/quote";
        let res = self
            .http
            .get(url)
            .query(&[("symbol", symbol), ("token", &self.api_key)])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("Finnhub quote failed: {status} {body}"));
        }

        res.json::<QuoteResponse>().await.map_err(|e| e.to_string())
    }

    pub async fn profile(&self, symbol: &str) -> Result<ProfileResponse, String> {
        if !self.has_key() {
            return Err("FINNHUB_API_KEY is missing in .env".to_string());
        }

        let url = "https://finnhub.io/api/v1/stock/profile2";
        let res = self
            .http
            .get(url)
            .query(&[("symbol", symbol), ("token", &self.api_key)])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !res.status().is_success() {
            let status = res.status();
            return Err(format!("Finnhub profile failed: {status}"));
        }

        res.json::<ProfileResponse>().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl QuoteProvider for FinnhubClient {
    async fn lookup(&self, symbol: &str) -> Option<Quote> {
        let sym = normalize_symbol(symbol);
        if sym.is_empty() {
            return None;
        }

        let q = match self.quote(&sym).await {
            Ok(q) => q,
            Err(e) => {
                tracing::warn!(symbol = %sym, error = %e, "quote lookup failed");
                return None;
            }
        };

        // Finnhub answers unknown symbols with an all-zero quote.
        let price = dollars_to_cents(q.c)?;

        // name is best effort
        let name = match self.profile(&sym).await {
            Ok(p) => p.name.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| sym.clone()),
            Err(e) => {
                tracing::debug!(symbol = %sym, error = %e, "profile lookup failed");
                sym.clone()
            }
        };

        Some(Quote {
            symbol: sym,
            name,
            price,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct QuoteResponse {
    // current
    pub c: f64,
}

#[derive(Debug, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub name: Option<String>,
}
