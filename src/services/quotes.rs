use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    // cents
    pub price: i64,
}

/// Source of current prices. `None` means the symbol is unknown or the
/// provider could not be reached; callers treat both as an invalid symbol.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn lookup(&self, symbol: &str) -> Option<Quote>;
}

pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Converts a provider's dollar price to cents. Non-finite and non-positive
/// prices are rejected.
pub fn dollars_to_cents(price: f64) -> Option<i64> {
    if !price.is_finite() || price <= 0.0 {
        return None;
    }
    let cents = (price * 100.0).round();
    if cents < 1.0 || cents > i64::MAX as f64 {
        return None;
    }
    Some(cents as i64)
}

/// Fixed in-process price table, used when no market data key is configured.
#[derive(Debug, Clone, Default)]
pub struct StaticQuotes {
    table: HashMap<String, Quote>,
}

impl StaticQuotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, symbol: &str, name: &str, price_cents: i64) -> Self {
        let symbol = normalize_symbol(symbol);
        self.table.insert(
            symbol.clone(),
            Quote {
                symbol,
                name: name.to_string(),
                price: price_cents,
            },
        );
        self
    }

    pub fn demo() -> Self {
        Self::new()
            .with_quote("AAPL", "Apple Inc.", 18_950)
            .with_quote("MSFT", "Microsoft Corporation", 41_525)
            .with_quote("GOOGL", "Alphabet Inc.", 14_230)
            .with_quote("AMZN", "Amazon.com, Inc.", 17_815)
            .with_quote("TSLA", "Tesla, Inc.", 24_890)
            .with_quote("NFLX", "Netflix, Inc.", 62_040)
    }
}

#[async_trait]
impl QuoteProvider for StaticQuotes {
    async fn lookup(&self, symbol: &str) -> Option<Quote> {
        self.table.get(&normalize_symbol(symbol)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dollars_to_cents_rounds_to_nearest_cent() {
        assert_eq!(dollars_to_cents(189.5), Some(18_950));
        assert_eq!(dollars_to_cents(0.015), Some(2));
        assert_eq!(dollars_to_cents(0.0), None);
        assert_eq!(dollars_to_cents(-3.0), None);
        assert_eq!(dollars_to_cents(f64::NAN), None);
    }

    #[tokio::test]
    async fn static_lookup_is_case_insensitive() {
        let quotes = StaticQuotes::demo();
        let q = quotes.lookup(" aapl ").await.expect("known symbol");
        assert_eq!(q.symbol, "AAPL");
        assert_eq!(q.price, 18_950);
        assert!(quotes.lookup("NOPE").await.is_none());
    }
}
