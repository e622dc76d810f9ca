use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use shared::{
    domain::Quote,
    error::{ApiError, ErrorCode},
    protocol::{PostQuoteRequest, HEALTHZ_PATH, QUOTES_PATH},
};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

mod api;
mod config;

use api::{load_seed, ListQuotesQuery, QuoteBook};
use config::load_settings;

struct AppState {
    book: RwLock<QuoteBook>,
}

impl AppState {
    fn new(book: QuoteBook) -> Self {
        Self {
            book: RwLock::new(book),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let book = match &settings.seed_path {
        Some(path) => {
            let seed = load_seed(path).map_err(|error| {
                error!(path = %path.display(), %error, "server: failed to load seed file");
                error
            })?;
            QuoteBook::new(seed)
        }
        None => QuoteBook::seeded(),
    };
    info!(quotes = book.quotes().len(), "server: quote book ready");

    let app = build_router(Arc::new(AppState::new(book)));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(HEALTHZ_PATH, get(healthz))
        .route(QUOTES_PATH, get(list_quotes).post(create_quote))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_quotes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuotesQuery>,
) -> Json<Vec<Quote>> {
    Json(state.book.read().await.list(&query))
}

async fn create_quote(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PostQuoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Quote>), (StatusCode, Json<ApiError>)> {
    let Json(req) = payload.map_err(|rejection| {
        warn!(%rejection, "server: rejected malformed quote body");
        error_response(ApiError::new(ErrorCode::Validation, rejection.body_text()))
    })?;

    let quote = state
        .book
        .write()
        .await
        .create(req)
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(quote)))
}

fn error_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
    };
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
