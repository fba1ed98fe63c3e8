//! 実際にソケットを開いて、上流（ダミーのチャット補完 API）→ プロキシ → クライアントまで通す

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use nft_searcher::client::{ClientError, InsightClient};
use nft_searcher::insight::{ChatBackend, InsightError, InsightService, DEFAULT_MODEL, SYSTEM_PROMPT};
use nft_searcher::metadata::NftRecord;
use nft_searcher::openai::OpenAiBackend;
use nft_searcher::orchestrator::{SearchOrchestrator, SearchPhase};
use nft_searcher::server;
use nft_searcher::widget::WidgetConfig;

const INSIGHT: &str = r#"{"collection_name":"CryptoPunks","overview":{"total_supply":10000,"blockchain":"Ethereum"}}"#;

#[derive(Clone, Default)]
struct Upstream {
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    fail: bool,
}

async fn chat_completions(
    State(upstream): State<Upstream>,
    headers: axum::http::HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    upstream.seen.lock().unwrap().push((auth, body));

    if upstream.fail {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"error": {"message": "Rate limit reached", "type": "requests", "code": "rate_limit_exceeded"}})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": INSIGHT}}]})),
    )
}

async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_upstream(upstream: Upstream) -> SocketAddr {
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(upstream);
    spawn(app).await
}

fn backend(addr: SocketAddr, key: Option<&str>) -> OpenAiBackend {
    OpenAiBackend::new(
        format!("http://{}/v1", addr),
        key.map(str::to_string),
        "OPENAI_KEY",
        Duration::from_secs(5),
    )
    .unwrap()
}

async fn spawn_proxy(backend: OpenAiBackend) -> String {
    let service = Arc::new(InsightService::new(Arc::new(backend), DEFAULT_MODEL));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        server::serve(listener, service).await.unwrap();
    });
    format!("http://{}{}", addr, server::INSIGHT_PATH)
}

#[tokio::test]
async fn test_backend_sends_json_mode_request() {
    let upstream = Upstream::default();
    let addr = spawn_upstream(upstream.clone()).await;
    let service = InsightService::new(Arc::new(backend(addr, Some("sk-test"))), DEFAULT_MODEL);

    let content = service
        .summarize("CryptoPunks", "A collection of 10000 unique characters")
        .await
        .unwrap();
    assert_eq!(content, INSIGHT);

    let seen = upstream.seen.lock().unwrap();
    let (auth, body) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], DEFAULT_MODEL);
    assert_eq!(body["response_format"]["type"], "json_object");
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
    assert_eq!(body["messages"][1]["role"], "user");
}

#[tokio::test]
async fn test_backend_maps_api_error() {
    let upstream = Upstream {
        fail: true,
        ..Default::default()
    };
    let addr = spawn_upstream(upstream).await;

    let request = InsightService::new(Arc::new(backend(addr, Some("k"))), DEFAULT_MODEL)
        .build_request("a", "b");
    let err = backend(addr, Some("k")).complete(&request).await.unwrap_err();
    match err {
        InsightError::Api { status, code, kind, .. } => {
            assert_eq!(status, 429);
            assert_eq!(code.as_deref(), Some("rate_limit_exceeded"));
            assert_eq!(kind.as_deref(), Some("requests"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_search_to_rendered_insight() {
    let upstream = spawn_upstream(Upstream::default()).await;
    let endpoint = spawn_proxy(backend(upstream, Some("sk-test"))).await;
    let client = InsightClient::new(endpoint, Duration::from_secs(5)).unwrap();

    let mut orch = SearchOrchestrator::new(WidgetConfig::default());
    let request = orch
        .on_nfts_fetched(vec![NftRecord(json!({
            "metadata": {
                "name": "CryptoPunks",
                "description": "A collection of 10000 unique characters",
                "attributes": [{"trait_type": "Type", "value": "Alien"}]
            }
        }))])
        .unwrap();

    let data = client.summarize(&request.subject).await.unwrap();
    assert!(orch.on_insight(request.token, data));
    assert_eq!(orch.phase(), SearchPhase::Annotated);

    let tree = orch.insight().unwrap().render().unwrap();
    assert_eq!(
        tree.to_string(),
        "Collection Name: CryptoPunks\nOverview:\n  Total Supply: 10000\n  Blockchain: Ethereum\n"
    );
}

#[tokio::test]
async fn test_client_sees_upstream_failure() {
    let upstream = spawn_upstream(Upstream {
        fail: true,
        ..Default::default()
    })
    .await;
    let endpoint = spawn_proxy(backend(upstream, Some("sk-test"))).await;
    let client = InsightClient::new(endpoint, Duration::from_secs(5)).unwrap();

    let mut orch = SearchOrchestrator::new(WidgetConfig::default());
    let request = orch
        .on_nfts_fetched(vec![NftRecord(json!({"name": "X", "attributes": {}}))])
        .unwrap();

    let err = client.summarize(&request.subject).await.unwrap_err();
    match &err {
        ClientError::Service { status, message } => {
            assert_eq!(*status, 502);
            assert_eq!(message, "Rate limit reached");
        }
        other => panic!("unexpected {other:?}"),
    }

    assert!(orch.on_insight_failed(request.token, err.to_string()));
    assert!(orch.insight_error().unwrap().contains("Rate limit reached"));
}

#[tokio::test]
async fn test_client_reports_undecodable_body() {
    let app = Router::new().route(
        server::INSIGHT_PATH,
        post(|| async { (StatusCode::OK, "not json") }),
    );
    let addr = spawn(app).await;
    let client = InsightClient::new(format!("http://{}{}", addr, server::INSIGHT_PATH), Duration::from_secs(5)).unwrap();

    let subject = nft_searcher::orchestrator::InsightSubject {
        name: "X".into(),
        description: "Y".into(),
    };
    let err = client.summarize(&subject).await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)), "unexpected {err:?}");
}
