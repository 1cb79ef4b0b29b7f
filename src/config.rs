use std::env;

use chrono::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteSource {
    Finnhub,
    Static,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    pub session_cookie_name: String,
    pub cookie_secure: bool,
    // sessions stop authenticating this long after login
    pub session_ttl: Duration,

    pub finnhub_api_key: String,
    pub quote_source: QuoteSource,

    // new users start with this balance
    pub starting_cash_cents: i64,
    pub bcrypt_cost: u32,
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

// ten years
const MAX_SESSION_TTL_SECS: i64 = 10 * 365 * 24 * 3600;

// SESSION_TTL is in seconds
fn parse_ttl(raw: Option<&str>) -> Duration {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|secs| (1..=MAX_SESSION_TTL_SECS).contains(secs))
        .map(Duration::seconds)
        .unwrap_or_else(|| Duration::days(7))
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let database_url = env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://finance.db".to_string());

    let host = env::var("HOST")
        .unwrap_or_else(|_| "127.0.0.1".to_string());

    let port = env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let session_cookie_name = env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "session".to_string());
    let cookie_secure = env::var("COOKIE_SECURE").map(|v| parse_bool(&v)).unwrap_or(false);
    let session_ttl = parse_ttl(env::var("SESSION_TTL").ok().as_deref());

    let finnhub_api_key = env::var("FINNHUB_API_KEY").unwrap_or_default();

    let quote_source = match env::var("QUOTE_PROVIDER").ok().as_deref().map(str::trim) {
        Some("finnhub") => QuoteSource::Finnhub,
        Some("static") => QuoteSource::Static,
        _ if !finnhub_api_key.trim().is_empty() => QuoteSource::Finnhub,
        _ => QuoteSource::Static,
    };

    let starting_cash_cents = env::var("STARTING_CASH_CENTS")
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|c| *c >= 0)
        .unwrap_or(1_000_000);

    let bcrypt_cost = env::var("BCRYPT_COST")
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|c| (4..=31).contains(c))
        .unwrap_or(bcrypt::DEFAULT_COST);

    Settings {
        database_url,
        host,
        port,
        session_cookie_name,
        cookie_secure,
        session_ttl,
        finnhub_api_key,
        quote_source,
        starting_cash_cents,
        bcrypt_cost,
    }
}
