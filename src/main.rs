use std::net::SocketAddr;
use std::sync::Arc;

use tradesim::{
    config::{self, QuoteSource},
    routes,
    services::{db_init, finnhub::FinnhubClient, quotes::{QuoteProvider, StaticQuotes}},
    templates, AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let settings = config::load();

    let db = db_init::connect(&settings.database_url).await?;
    db_init::ensure_schema(&db).await?;

    let quotes: Arc<dyn QuoteProvider> = match settings.quote_source {
        QuoteSource::Finnhub => Arc::new(FinnhubClient::new(settings.finnhub_api_key.clone())),
        QuoteSource::Static => {
            tracing::warn!("using the static demo price table");
            Arc::new(StaticQuotes::demo())
        }
    };

    let state = AppState {
        hbs: templates::build_handlebars(),
        db,
        settings: settings.clone(),
        quotes,
    };

    let app = routes::app(state);

    let addr = SocketAddr::from((settings.host.parse::<std::net::IpAddr>()?, settings.port));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
