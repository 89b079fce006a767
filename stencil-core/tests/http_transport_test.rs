use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};
use std::time::Duration;
use stencil_core::{
    Client, HttpOptions, HttpTransport, LoadError, Options, RefreshStrategy, Transport,
    TransportError,
};
use stencil_fixtures::ONE;
use tokio::net::TcpListener;

async fn private_schema(headers: HeaderMap) -> impl IntoResponse {
    match headers.get("authorization") {
        Some(value) if value == "Bearer secret" => {
            (StatusCode::OK, stencil_fixtures::descriptor_set_bytes()).into_response()
        }
        _ => (StatusCode::UNAUTHORIZED, "denied").into_response(),
    }
}

async fn start_registry() -> String {
    let app = Router::new()
        .route(
            "/schema",
            get(|| async { stencil_fixtures::descriptor_set_bytes() }),
        )
        .route("/private", get(private_schema))
        .route(
            "/versioned/versions",
            get(|| async { Json(serde_json::json!({ "versions": [1, 3, 2] })) }),
        )
        .route(
            "/versioned/versions/3",
            get(|| async { stencil_fixtures::descriptor_set_bytes() }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_get_returns_body_on_success() {
    let base = start_registry().await;
    let transport = HttpTransport::new(&HttpOptions::default()).unwrap();

    let body = transport.get(&format!("{base}/schema")).await.unwrap();
    assert_eq!(body.as_ref(), stencil_fixtures::descriptor_set_bytes().as_slice());
}

#[tokio::test]
async fn test_get_classifies_failures() {
    let base = start_registry().await;
    let transport = HttpTransport::new(&HttpOptions::default()).unwrap();

    // 1. Non 200 answers keep their body
    match transport.get(&format!("{base}/private")).await {
        Err(TransportError::UnexpectedStatus { status, body, .. }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "denied");
        }
        other => panic!("Expected UnexpectedStatus, got {other:?}"),
    }

    // 2. Unknown routes
    assert!(matches!(
        transport.get(&format!("{base}/missing")).await,
        Err(TransportError::UnexpectedStatus { status: 404, .. })
    ));

    // 3. Malformed URL
    assert!(matches!(
        transport.get("h_ttp://invalidurl").await,
        Err(TransportError::InvalidRequest { .. })
    ));

    // 4. Nobody listening
    assert!(matches!(
        transport.get("http://127.0.0.1:1/schema").await,
        Err(TransportError::RequestFailed { .. })
    ));
}

#[tokio::test]
async fn test_get_times_out() {
    let base = start_registry().await;
    let options = HttpOptions {
        timeout: Duration::from_millis(100),
        ..HttpOptions::default()
    };
    let transport = HttpTransport::new(&options).unwrap();

    assert!(matches!(
        transport.get(&format!("{base}/slow")).await,
        Err(TransportError::RequestFailed { .. })
    ));
}

#[tokio::test]
async fn test_client_sends_configured_headers() {
    let base = start_registry().await;

    let err = Client::new(format!("{base}/private"), Options::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err.load_failures()[0].source,
        LoadError::Transport(TransportError::UnexpectedStatus { status: 401, .. })
    ));

    let options = Options::default().with_header("Authorization", "Bearer secret");
    let client = Client::new(format!("{base}/private"), options)
        .await
        .expect("Failed to create client with headers");
    assert!(client.get_descriptor(ONE).is_ok());
}

#[tokio::test]
async fn test_client_over_http() {
    let base = start_registry().await;

    let client = Client::new_multi_url(
        [format!("{base}/schema"), format!("{base}/versioned")],
        Options::default().with_refresh_strategy(RefreshStrategy::VersionBased),
    )
    .await;

    // The plain schema URL has no versions endpoint, strict construction fails
    let err = client.unwrap_err();
    assert_eq!(err.load_failures().len(), 1);
    assert_eq!(err.load_failures()[0].url, format!("{base}/schema"));

    let client = Client::new(
        format!("{base}/versioned"),
        Options::default().with_refresh_strategy(RefreshStrategy::VersionBased),
    )
    .await
    .unwrap();
    assert_eq!(client.stores()[0].last_version(), Some(3));
    assert!(client.get_descriptor(ONE).is_ok());
}
