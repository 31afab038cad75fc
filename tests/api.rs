use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{http::StatusCode, routing::get, Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};

use livesearch::{
    server::{self, AppState, CountResponse},
    ArtistStatus, Clock, Event, EventFilter, EventQueryService, EventSource, MemorySource,
    RemoteSource,
};

async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn fixture() -> Vec<Event> {
    serde_json::from_value(json!([
        {"artist": "A", "date": "2025/01/01", "venue": "Fireloop"},
        {"artist": "A", "date": "2099/01/01", "venue": "club vijon"},
        {"artist": "B", "date": "2020/01/01", "venue": "BANGBOO"}
    ]))
    .unwrap()
}

async fn spawn_api(events: Vec<Event>) -> SocketAddr {
    let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let state = AppState {
        queries: EventQueryService::new(Arc::new(MemorySource::new(events)), Clock::Fixed(today)),
    };
    spawn(server::router(state)).await
}

async fn get_json(url: String) -> (StatusCode, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn events_endpoint_filters_and_passes_fields_through() {
    let addr = spawn_api(fixture()).await;

    let (status, all) = get_json(format!("http://{addr}/api/events")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);
    assert_eq!(all[0]["venue"], "Fireloop");

    let (_, by_artist) = get_json(format!("http://{addr}/api/events?artist=A")).await;
    assert_eq!(by_artist.as_array().unwrap().len(), 2);

    let (_, by_date) = get_json(format!("http://{addr}/api/events?date=2020%2F01%2F01")).await;
    assert_eq!(by_date, json!([{"artist": "B", "date": "2020/01/01", "venue": "BANGBOO"}]));

    let (_, iso_date) = get_json(format!("http://{addr}/api/events?date=2020-01-01")).await;
    assert_eq!(iso_date, by_date);
}

#[tokio::test]
async fn query_endpoints_expose_derived_views() {
    let addr = spawn_api(fixture()).await;

    let (_, names) = get_json(format!("http://{addr}/api/artists")).await;
    assert_eq!(names, json!(["A", "B"]));

    let (_, options) = get_json(format!("http://{addr}/api/artists/options")).await;
    let options: Vec<ArtistStatus> = serde_json::from_value(options).unwrap();
    assert!(options[0].has_schedule);
    assert!(!options[1].has_schedule);

    let (_, schedule) = get_json(format!("http://{addr}/api/schedule?artist=A")).await;
    assert_eq!(
        schedule,
        json!([{"artist": "A", "date": "2099/01/01", "venue": "club vijon"}])
    );

    let (_, missing) = get_json(format!("http://{addr}/api/schedule")).await;
    assert_eq!(missing, json!([]));

    let (_, count) = get_json(format!("http://{addr}/api/events/count?date=2020/01/01")).await;
    let count: CountResponse = serde_json::from_value(count).unwrap();
    assert_eq!(count.count, 1);

    let (_, health) = get_json(format!("http://{addr}/health")).await;
    assert_eq!(health, json!({"status": "ok"}));
}

#[tokio::test]
async fn remote_source_reads_published_document() {
    let doc = serde_json::to_value(fixture()).unwrap();
    let addr = spawn(Router::new().route(
        "/events.json",
        get(move || {
            let doc = doc.clone();
            async move { Json(doc) }
        }),
    ))
    .await;

    let source = RemoteSource::new(&format!("http://{addr}/events.json"), Duration::from_secs(5))
        .unwrap();
    let out = source.load(&EventFilter::by_artist("B")).await;
    assert!(!out.is_degraded());
    assert_eq!(out.into_inner().len(), 1);
}

#[tokio::test]
async fn remote_source_degrades_on_error_status() {
    let addr = spawn(Router::new().route(
        "/events.json",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    ))
    .await;

    let source = RemoteSource::new(&format!("http://{addr}/events.json"), Duration::from_secs(5))
        .unwrap();
    let out = source.load(&EventFilter::default()).await;
    assert!(out.is_degraded());
    assert!(out.value().is_empty());
}

#[tokio::test]
async fn api_answers_empty_when_source_is_unreachable() {
    let closed = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let source =
        RemoteSource::new(&format!("http://{closed}/events.json"), Duration::from_secs(2))
            .unwrap();
    let state = AppState {
        queries: EventQueryService::new(Arc::new(source), Clock::Local),
    };
    let addr = spawn(server::router(state)).await;

    let (status, events) = get_json(format!("http://{addr}/api/events?artist=A")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events, json!([]));

    let (status, count) = get_json(format!("http://{addr}/api/events/count?date=2025/01/01")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count, json!({"date": "2025/01/01", "count": 0}));
}

#[tokio::test]
async fn repeated_filter_keys_match_nothing() {
    let addr = spawn_api(fixture()).await;

    let (status, by_dates) = get_json(format!(
        "http://{addr}/api/events?date=2025/01/01&date=2020/01/01"
    ))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_dates, json!([]));

    let (status, by_artists) = get_json(format!("http://{addr}/api/events?artist=A&artist=B")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_artists, json!([]));

    let (_, schedule) = get_json(format!("http://{addr}/api/schedule?artist=A&artist=A")).await;
    assert_eq!(schedule, json!([]));

    let (_, count) = get_json(format!(
        "http://{addr}/api/events/count?date=2020/01/01&date=2020/01/01"
    ))
    .await;
    assert_eq!(count, json!({"date": "", "count": 0}));
}

#[tokio::test]
async fn remote_source_degrades_on_malformed_body() {
    let addr = spawn(
        Router::new()
            .route("/object.json", get(|| async { Json(json!({"artist": "A"})) }))
            .route("/garbage.json", get(|| async { "not json" })),
    )
    .await;

    for path in ["object.json", "garbage.json"] {
        let source = RemoteSource::new(&format!("http://{addr}/{path}"), Duration::from_secs(5))
            .unwrap();
        let out = source.load(&EventFilter::default()).await;
        assert!(out.is_degraded(), "{path} should degrade");
        assert!(out.value().is_empty());
    }
}
