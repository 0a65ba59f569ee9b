//! HTTP request handlers for the data API.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::domain::bar::Bar;

use super::{AppState, WebError};

pub async fn list_tickers(State(state): State<Arc<AppState>>) -> Result<Response, WebError> {
    let tickers = state.bar_store.list_tickers()?;
    Ok(Json(json!({ "tickers": tickers })).into_response())
}

#[derive(Debug, Deserialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

fn parse_date(raw: &Option<String>, name: &str) -> Result<Option<NaiveDate>, WebError> {
    match raw {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| WebError::bad_request(format!("invalid {name} date: {s:?}"))),
    }
}

fn bar_json(bar: &Bar) -> Value {
    json!({
        "time": bar.time.format("%H:%M").to_string(),
        "open": bar.open,
        "high": bar.high,
        "low": bar.low,
        "close": bar.close,
        "volume": bar.volume,
        "EMA_10": bar.ema10,
        "EMA_20": bar.ema20,
        "VWAP": bar.vwap,
        "RSI_14": bar.rsi14,
    })
}

pub async fn ticker_data(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(range): Query<DateRange>,
) -> Result<Response, WebError> {
    let start = parse_date(&range.start, "start")?;
    let end = parse_date(&range.end, "end")?;

    let days = state.bar_store.load_days(&ticker, start, end)?;
    let mut day_map = Map::new();
    for (date, bars) in &days {
        day_map.insert(
            date.to_string(),
            Value::Array(bars.iter().map(bar_json).collect()),
        );
    }
    Ok(Json(json!({ "ticker": ticker, "days": day_map })).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub tickers: Vec<String>,
}

pub async fn start_update(
    State(state): State<Arc<AppState>>,
    body: Option<Json<UpdateRequest>>,
) -> Result<Response, WebError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    state.fetcher.start_update(&request.tickers)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "started" }))).into_response())
}

pub async fn update_status(State(state): State<Arc<AppState>>) -> Response {
    let st = state.fetcher.status();
    Json(json!({
        "running": st.running,
        "started_at": st.started_at.map(|t| t.to_string()),
        "finished_at": st.finished_at.map(|t| t.to_string()),
        "success": st.success,
        "output": st.output,
    }))
    .into_response()
}

pub async fn not_found() -> WebError {
    WebError::not_found("no such endpoint")
}
