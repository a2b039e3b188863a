use std::net::SocketAddr;
use std::sync::Arc;

use playlist_builder::server::services::AppServices;
use playlist_builder::server::services::fetch_services::{FetchError, MockPlaylistFetcherTrait};
use playlist_builder::server::utils::m3u_utils::split_lines;
use playlist_builder::{AppConfig, PlaylistApplicationServer};
use serde_json::Value;

async fn spawn_app(config: AppConfig, fetcher: MockPlaylistFetcherTrait) -> SocketAddr {
    let services = AppServices::with_fetcher(Arc::new(config), Arc::new(fetcher));
    let app = PlaylistApplicationServer::router(services);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn playlist_fetcher() -> MockPlaylistFetcherTrait {
    let mut fetcher = MockPlaylistFetcherTrait::new();
    fetcher.expect_fetch_lines().returning(|url: &str| {
        if url.contains("broken") {
            return Err(FetchError::UpstreamStatus {
                url: url.to_string(),
                status: 500,
            });
        }
        Ok(split_lines(
            "#EXTM3U\n#EXTINF:-1,Channel\nhttp://cdn.example/live.m3u8\n",
        ))
    });
    fetcher
}

fn playlist_url(addr: SocketAddr, d: &str) -> String {
    format!(
        "http://{}/playlist?d={}",
        addr,
        urlencoding::encode(d)
    )
}

#[tokio::test]
async fn test_stream_combined_playlist() {
    let addr = spawn_app(AppConfig::default(), playlist_fetcher()).await;

    let response = reqwest::get(playlist_url(
        addr,
        "http://one.example/list.m3u;http://broken.example/list.m3u",
    ))
    .await
    .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "application/vnd.apple.mpegurl"
    );
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"playlist.m3u\""
    );
    assert_eq!(response.headers()["access-control-allow-origin"], "*");

    let body = response.text().await.unwrap();
    let expected_entry = format!(
        "http://{}/proxy/hls/manifest.m3u8?d=http%3A%2F%2Fcdn.example%2Flive.m3u8",
        addr
    );
    assert_eq!(
        body,
        format!(
            "#EXTM3U\n#EXTINF:-1,Channel\n{}\n# ERROR processing playlist http://broken.example/list.m3u: upstream returned status 500\n",
            expected_entry
        )
    );
}

#[tokio::test]
async fn test_use_override_and_configured_password() {
    let config = AppConfig {
        api_password: Some("global".to_string()),
        ..AppConfig::default()
    };
    let addr = spawn_app(config, playlist_fetcher()).await;

    let body = reqwest::get(playlist_url(
        addr,
        "https://mfp.example&http://one.example/list.m3u",
    ))
    .await
    .unwrap()
    .text()
    .await
    .unwrap();

    assert!(body.contains(
        "https://mfp.example/proxy/hls/manifest.m3u8?d=http%3A%2F%2Fcdn.example%2Flive.m3u8&api_password=global\n"
    ));
}

#[tokio::test]
async fn test_configured_base_url_wins_over_host() {
    let config = AppConfig {
        base_url: Some("https://public.example/".to_string()),
        ..AppConfig::default()
    };
    let addr = spawn_app(config, playlist_fetcher()).await;

    let body = reqwest::get(playlist_url(addr, "http://one.example/list.m3u"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("https://public.example/proxy/hls/manifest.m3u8?d="));
}

#[tokio::test]
async fn test_reject_invalid_definition() {
    let mut fetcher = MockPlaylistFetcherTrait::new();
    fetcher.expect_fetch_lines().never();
    let addr = spawn_app(AppConfig::default(), fetcher).await;

    let response = reqwest::get(playlist_url(addr, "http://one.example/list.m3u;nope"))
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = serde_json::from_str(&response.text().await.unwrap()).unwrap();
    assert_eq!(body["detail"], "Invalid URL in definition: nope");
}

#[tokio::test]
async fn test_reject_missing_and_overlong_query() {
    let mut fetcher = MockPlaylistFetcherTrait::new();
    fetcher.expect_fetch_lines().never();
    let addr = spawn_app(AppConfig::default(), fetcher).await;

    let response = reqwest::get(format!("http://{}/playlist", addr))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = serde_json::from_str(&response.text().await.unwrap()).unwrap();
    assert_eq!(body["detail"], "Query string missing");

    let long = format!("http://one.example/{}", "a".repeat(10_000));
    let response = reqwest::get(playlist_url(addr, &long)).await.unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_report_health() {
    let addr = spawn_app(AppConfig::default(), MockPlaylistFetcherTrait::new()).await;

    let response = reqwest::get(format!("http://{}/health", addr))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = serde_json::from_str(&response.text().await.unwrap()).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["environment"], "development");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
