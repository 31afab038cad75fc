use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::Method,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::models::{ArtistStatus, Event, EventFilter};
use crate::query::EventQueryService;
use crate::utils;

#[derive(Clone)]
pub struct AppState {
    pub queries: EventQueryService,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ArtistParams {
    artist: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DateParams {
    date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountResponse {
    pub date: String,
    pub count: usize,
}

/// Read-only API. Every handler answers 200; failures surface as empty bodies.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/health", get(health))
        .route("/api/events", get(list_events))
        .route("/api/events/count", get(count_events))
        .route("/api/artists", get(list_artists))
        .route("/api/artists/options", get(list_artist_options))
        .route("/api/schedule", get(artist_schedule))
        .with_state(state)
        .layer(cors)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_events(
    State(state): State<AppState>,
    params: Result<Query<EventFilter>, QueryRejection>,
) -> Json<Vec<Event>> {
    let Some(Query(mut filter)) = accept_query(params, "/api/events") else {
        return Json(Vec::new());
    };
    filter.date = filter.date.map(normalize_date);
    info!(artist = ?filter.artist, date = ?filter.date, "GET /api/events");

    let events = state.queries.all_events(&filter).await.into_inner();
    info!("returning {} events", events.len());
    Json(events)
}

async fn count_events(
    State(state): State<AppState>,
    params: Result<Query<DateParams>, QueryRejection>,
) -> Json<CountResponse> {
    let date = accept_query(params, "/api/events/count")
        .and_then(|Query(p)| p.date)
        .map(normalize_date)
        .unwrap_or_default();
    let count = state.queries.count_on_date(&date).await.into_inner();
    Json(CountResponse { date, count })
}

async fn list_artists(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.queries.list_artist_names().await.into_inner())
}

async fn list_artist_options(State(state): State<AppState>) -> Json<Vec<ArtistStatus>> {
    Json(state.queries.list_artist_options().await.into_inner())
}

async fn artist_schedule(
    State(state): State<AppState>,
    params: Result<Query<ArtistParams>, QueryRejection>,
) -> Json<Vec<Event>> {
    let artist = accept_query(params, "/api/schedule")
        .and_then(|Query(p)| p.artist)
        .unwrap_or_default();
    Json(state.queries.schedule_for_artist(&artist).await.into_inner())
}

/// A rejected query string (repeated keys, bad encoding) matches nothing
/// rather than falling back to an unfiltered listing.
fn accept_query<T>(params: Result<Query<T>, QueryRejection>, route: &str) -> Option<Query<T>> {
    match params {
        Ok(query) => Some(query),
        Err(err) => {
            warn!("rejected query for {route}, answering empty: {err}");
            None
        }
    }
}

/// Canonicalizes ISO input; anything unrecognized is matched verbatim.
fn normalize_date(raw: String) -> String {
    utils::format_date_for_api(&raw).unwrap_or(raw)
}
