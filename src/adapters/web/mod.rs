//! Web server adapter.
//!
//! A small JSON API over the bar store and the fetcher: list tickers,
//! serve bar history, and trigger/inspect data updates. Analysis itself
//! stays in the CLI; the API only exposes the data layer.

mod error;
mod handlers;

pub use error::WebError;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::domain::error::TradereviewError;
use crate::ports::bar_store_port::BarStorePort;
use crate::ports::fetch_port::FetchPort;

pub struct AppState {
    pub bar_store: Arc<dyn BarStorePort + Send + Sync>,
    pub fetcher: Arc<dyn FetchPort + Send + Sync>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/tickers", get(handlers::list_tickers))
        .route("/api/data/{ticker}", get(handlers::ticker_data))
        .route("/api/update", post(handlers::start_update))
        .route("/api/update/status", get(handlers::update_status))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}

/// Bind and serve until interrupted. Creates its own runtime so the
/// synchronous CLI can call it directly.
pub fn serve(state: AppState, addr: &str) -> Result<(), TradereviewError> {
    let router = build_router(state);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        eprintln!("listening on {addr}");
        axum::serve(listener, router).await?;
        Ok(())
    })
}
