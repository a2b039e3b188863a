use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{Router, body::Body, http::StatusCode, routing::get};
use playlist_builder::server::services::fetch_services::{
    FetchError, FetchLimits, HttpPlaylistFetcher, PlaylistFetcherTrait,
};

const LIMIT: u64 = 1024;

async fn spawn_upstream() -> SocketAddr {
    let app = Router::new()
        .route(
            "/list.m3u",
            get(|| async { "#EXTM3U\r\n#EXTINF:-1,A\r\nhttp://a.example/x.m3u8" }),
        )
        .route("/big.m3u", get(|| async { "#".repeat(2048) }))
        .route(
            "/chunked.m3u",
            get(|| async {
                let chunks =
                    futures::stream::iter((0..4).map(|_| Ok::<_, Infallible>(vec![b'#'; 512])));
                Body::from_stream(chunks)
            }),
        )
        .route(
            "/slow.m3u",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "#EXTM3U\n"
            }),
        )
        .route(
            "/missing.m3u",
            get(|| async { (StatusCode::NOT_FOUND, "gone") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn fetcher() -> HttpPlaylistFetcher {
    HttpPlaylistFetcher::with_client(
        reqwest::Client::new(),
        FetchLimits {
            timeout: Duration::from_millis(300),
            max_bytes: LIMIT,
        },
    )
}

#[tokio::test]
async fn test_download_and_split_lines() {
    let addr = spawn_upstream().await;

    let lines = fetcher()
        .fetch_lines(&format!("http://{}/list.m3u", addr))
        .await
        .unwrap();

    assert_eq!(
        lines,
        vec![
            "#EXTM3U\r\n".to_string(),
            "#EXTINF:-1,A\r\n".to_string(),
            "http://a.example/x.m3u8\n".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_reject_declared_oversize_body() {
    let addr = spawn_upstream().await;
    let url = format!("http://{}/big.m3u", addr);

    let err = fetcher().fetch_lines(&url).await.unwrap_err();

    assert_eq!(err, FetchError::Oversize { url, limit: LIMIT });
}

#[tokio::test]
async fn test_reject_streamed_oversize_body() {
    let addr = spawn_upstream().await;
    let url = format!("http://{}/chunked.m3u", addr);

    let err = fetcher().fetch_lines(&url).await.unwrap_err();

    assert_eq!(err, FetchError::Oversize { url, limit: LIMIT });
}

#[tokio::test]
async fn test_time_out_slow_upstream() {
    let addr = spawn_upstream().await;
    let url = format!("http://{}/slow.m3u", addr);

    let err = fetcher().fetch_lines(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::Timeout { .. }), "got {:?}", err);
    assert_eq!(err.url(), url);
}

#[tokio::test]
async fn test_report_upstream_status() {
    let addr = spawn_upstream().await;
    let url = format!("http://{}/missing.m3u", addr);

    let err = fetcher().fetch_lines(&url).await.unwrap_err();

    assert_eq!(err, FetchError::UpstreamStatus { url, status: 404 });
    assert_eq!(err.to_string(), "upstream returned status 404");
}

#[tokio::test]
async fn test_report_unreachable_host() {
    // grab a free port and release it again so nothing is listening there
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let url = format!("http://127.0.0.1:{}/list.m3u", port);

    let err = fetcher().fetch_lines(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::Unreachable { .. }), "got {:?}", err);
    assert!(
        err.to_string()
            .starts_with("Unable to connect to playlist source (DNS or network issue)")
    );
}
