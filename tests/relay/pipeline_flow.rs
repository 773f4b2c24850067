use chrono::{Duration, TimeZone, Utc};
use scriptgate::Config;
use scriptgate::error::{RelayError, ValidationError};
use scriptgate::llm::{OpenAiCompatibleProvider, Provider};
use scriptgate::pipeline::RelayService;
use scriptgate::security::{GateReason, JsonFileLedgerStore, LedgerStore, ManualClock};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "302010";

struct Relay {
    relay: RelayService,
    clock: Arc<ManualClock>,
    store: Arc<JsonFileLedgerStore>,
    _workspace: TempDir,
}

fn relay_against(server_uri: &str, timeout_secs: u64) -> Relay {
    let workspace = TempDir::new().expect("temp workspace should be created");
    let mut config = Config::default();
    config.workspace_dir = workspace.path().to_path_buf();
    config.gate.secret = Some(SECRET.to_string());
    config.provider.base_url = server_uri.to_string();
    config.provider.api_key = Some("sk-test".to_string());
    config.provider.timeout_secs = timeout_secs;

    let provider: Arc<dyn Provider> = Arc::new(OpenAiCompatibleProvider::new(
        "deepseek",
        &config.provider.base_url,
        config.provider.api_key.as_deref(),
        timeout_secs,
    ));
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
    ));
    let store = Arc::new(JsonFileLedgerStore::new(config.ledger_path()));
    let relay = RelayService::with_store(&config, provider, store.clone(), clock.clone())
        .expect("relay should build from config");

    Relay {
        relay,
        clock,
        store,
        _workspace: workspace,
    }
}

fn completion(text: &str) -> serde_json::Value {
    json!({
        "model": "deepseek-chat",
        "choices": [{"message": {"role": "assistant", "content": text}}],
        "usage": {"total_tokens": 321}
    })
}

#[tokio::test]
async fn generation_sends_classified_instruction_and_records_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "deepseek-chat",
            "max_tokens": 1500,
            "stream": false
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("```lua\nprint('flying')\n```")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let harness = relay_against(&server.uri(), 5);
    let result = harness
        .relay
        .generate(SECRET, "Give me a FLY script")
        .await
        .expect("gate should allow the correct secret");

    assert!(result.succeeded);
    assert_eq!(result.provider_tokens, 321);
    assert_eq!(result.model.as_deref(), Some("deepseek-chat"));
    assert!(result.code.contains("-- Generated: 01/03/2026 12:00 UTC"));
    assert!(result.code.ends_with("print('flying')"));
    assert!(!result.code.contains(SECRET));

    let requests = server.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let user = sent["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("[category: movement-boost]"));
    assert!(user.contains("give me a fly script"));

    let ledger = harness.store.load().unwrap().unwrap();
    assert_eq!(ledger.successes.len(), 1);
    assert_eq!(ledger.total_generations, 1);
}

#[tokio::test]
async fn provider_error_status_falls_back_and_still_counts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let harness = relay_against(&server.uri(), 5);
    let result = harness
        .relay
        .generate(SECRET, "random unrelated text")
        .await
        .unwrap();

    assert!(!result.succeeded);
    assert!(result.error_detail.as_deref().unwrap().contains("500"));
    let fallback = result.fallback.as_deref().unwrap();
    assert!(fallback.contains("random unrelated text"));
    assert_eq!(harness.store.load().unwrap().unwrap().total_generations, 1);
}

#[tokio::test]
async fn slow_provider_times_out_into_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("print('late')"))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let harness = relay_against(&server.uri(), 1);
    let result = harness.relay.generate(SECRET, "speed hack").await.unwrap();

    assert!(!result.succeeded);
    assert!(result.error_detail.as_deref().unwrap().contains("1s"));
    assert!(result.code.contains("speed hack"));
}

#[tokio::test]
async fn short_prompt_is_rejected_before_any_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("print(1)")))
        .expect(0)
        .mount(&server)
        .await;

    let harness = relay_against(&server.uri(), 5);
    let err = harness.relay.generate(SECRET, " x ").await.unwrap_err();
    assert!(matches!(
        err,
        RelayError::Validation(ValidationError::PromptTooShort { min: 3, actual: 1 })
    ));
    assert_eq!(harness.store.load().unwrap().unwrap().total_generations, 0);
}

#[tokio::test]
async fn lockout_blocks_generation_until_window_passes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("print('ok')")))
        .expect(1)
        .mount(&server)
        .await;

    let harness = relay_against(&server.uri(), 5);
    for expected_remaining in (1..=4).rev() {
        let decision = harness.relay.verify("wrong").unwrap();
        assert_eq!(decision.reason, GateReason::WrongSecret);
        assert_eq!(decision.attempts_remaining, expected_remaining);
    }
    let decision = harness.relay.verify("still-wrong").unwrap();
    assert_eq!(decision.reason, GateReason::LockedOut);

    match harness.relay.generate(SECRET, "fly script").await {
        Err(RelayError::Auth(decision)) => {
            assert_eq!(decision.reason, GateReason::LockedOut);
            assert_eq!(decision.attempts_remaining, 0);
        }
        other => panic!("expected lockout, got {other:?}"),
    }

    harness.clock.advance(Duration::minutes(15));
    let result = harness.relay.generate(SECRET, "fly script").await.unwrap();
    assert!(result.succeeded);

    let ledger = harness.store.load().unwrap().unwrap();
    assert_eq!(ledger.failure_count(), 5, "success does not clear failures");
    assert_eq!(ledger.successes.len(), 1);

    // History is never pruned: one more miss re-locks immediately.
    let decision = harness.relay.verify("wrong-again").unwrap();
    assert_eq!(decision.reason, GateReason::LockedOut);
}
