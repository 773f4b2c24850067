use scriptgate::Config;
use scriptgate::gateway::run_gateway_with_listener;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "302010";

struct GatewayTestServer {
    port: u16,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
    _workspace: TempDir,
}

impl GatewayTestServer {
    #[allow(clippy::field_reassign_with_default)]
    async fn start(provider_uri: &str) -> Self {
        let workspace = TempDir::new().expect("temp workspace should be created");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral gateway listener should bind");
        let port = listener
            .local_addr()
            .expect("ephemeral gateway listener should expose local address")
            .port();

        let mut config = Config::default();
        config.workspace_dir = workspace.path().to_path_buf();
        config.config_path = workspace.path().join("config.toml");
        config.gate.secret = Some(SECRET.to_string());
        config.gate.max_attempts = 2;
        config.provider.base_url = provider_uri.to_string();
        config.provider.api_key = Some("sk-test".to_string());

        let handle = tokio::spawn(async move {
            run_gateway_with_listener("127.0.0.1", listener, Arc::new(config)).await
        });

        Self {
            port,
            handle,
            _workspace: workspace,
        }
    }

    fn url(&self, route: &str) -> String {
        format!("http://127.0.0.1:{}{route}", self.port)
    }
}

impl Drop for GatewayTestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn http_round_trip_covers_every_route() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "print('esp on')"}}],
            "usage": {"total_tokens": 40}
        })))
        .expect(1)
        .mount(&provider)
        .await;

    let server = GatewayTestServer::start(&provider.uri()).await;
    let client = reqwest::Client::new();

    let health = client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let status: Value = client
        .get(server.url("/api/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["status"], "online");
    assert_eq!(status["model"], "deepseek-chat");

    let verify = client
        .post(server.url("/api/verify"))
        .json(&json!({"pin": SECRET}))
        .send()
        .await
        .unwrap();
    assert_eq!(verify.status(), StatusCode::OK);

    let generated = client
        .post(server.url("/api/generate"))
        .json(&json!({"secret": SECRET, "prompt": "esp for players"}))
        .send()
        .await
        .unwrap();
    assert_eq!(generated.status(), StatusCode::OK);
    let body: Value = generated.json().await.unwrap();
    assert_eq!(body["succeeded"], true);
    assert_eq!(body["category"], "visibility-overlay");
    assert!(body["code"].as_str().unwrap().ends_with("print('esp on')"));

    let malformed = client
        .post(server.url("/api/generate"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_lockout_returns_429_then_403_on_generate() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&provider)
        .await;

    let server = GatewayTestServer::start(&provider.uri()).await;
    let client = reqwest::Client::new();

    let first = client
        .post(server.url("/api/verify"))
        .json(&json!({"secret": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);

    let second = client
        .post(server.url("/api/verify"))
        .json(&json!({"secret": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["reason"], "LOCKED_OUT");
    assert!(body["retry_after"].as_u64().unwrap() > 0);

    let denied = client
        .post(server.url("/api/generate"))
        .json(&json!({"secret": SECRET, "prompt": "fly script"}))
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    let body: Value = denied.json().await.unwrap();
    assert_eq!(body["reason"], "LOCKED_OUT");
}
