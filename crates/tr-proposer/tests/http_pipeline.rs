//! Full pipeline against a mocked token service over HTTP.
//!
//! The mock serves a byte-level tokenizer (ids = byte values, EOS = 256)
//! and a greedy step endpoint that honors the allowed set, so the
//! constrained decode reproduces a candidate exactly — through the real
//! `HttpBackend` wire path, batch-of-one shape included.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use tr_decoder::{HttpBackend, HttpBackendConfig};
use tr_proposer::run_query;

const EOS: u32 = 256;

struct ByteEncode;

impl Respond for ByteEncode {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let text = body["text"].as_str().unwrap();
        let ids: Vec<u32> = text.bytes().map(u32::from).collect();
        // Batch-of-one shape, as some serving stacks produce.
        ResponseTemplate::new(200).set_body_json(json!({ "ids": [ids] }))
    }
}

struct ByteDecode;

impl Respond for ByteDecode {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let bytes: Vec<u8> = body["ids"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_u64())
            .filter(|&id| id < 256)
            .map(|id| id as u8)
            .collect();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        ResponseTemplate::new(200).set_body_json(json!({ "text": text }))
    }
}

struct GreedyStep;

impl Respond for GreedyStep {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let token = body["allowed"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_u64())
            .min()
            .unwrap();
        ResponseTemplate::new(200).set_body_json(json!({ "token": token }))
    }
}

async fn token_service(accelerated: bool) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device": if accelerated { "mps" } else { "cpu" },
            "accelerated": accelerated,
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/encode"))
        .respond_with(ByteEncode)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/decode"))
        .respond_with(ByteDecode)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/prime"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/step"))
        .respond_with(GreedyStep)
        .mount(&server)
        .await;
    server
}

fn backend_for(server: &MockServer) -> HttpBackend {
    HttpBackend::new(HttpBackendConfig {
        host: server.uri(),
        model: "gpt2".into(),
        timeout_secs: 5,
        eos_token: Some(EOS),
    })
    .unwrap()
}

#[tokio::test]
async fn http_pipeline_reproduces_the_candidate() {
    let server = token_service(true).await;
    let backend = backend_for(&server);

    let record = run_query(&backend, "Show right triangles like 5,12,13").await;
    assert!(record.ok, "error: {:?}", record.error);
    assert_eq!(record.meta.device, "mps");
    assert_eq!(
        record.raw_text,
        "START_ELEM 5,12,13\nSET_BIT i=4 b=1\nWITNESS_NEAREST target_elem=5,12,13 metric=ABS_DIFF\nRETURN_SET max_items=20 include_witness=false\n"
    );
    assert_eq!(record.exit_code(), 0);
}

#[tokio::test]
async fn http_pipeline_respects_the_accelerator_precondition() {
    let server = token_service(false).await;
    let backend = backend_for(&server);

    let record = run_query(&backend, "anything").await;
    assert!(!record.ok);
    assert_eq!(record.prompt, None);
    assert_eq!(record.meta.device, "cpu");
    assert!(record.error.as_deref().unwrap().contains("unavailable"));
    assert_eq!(record.exit_code(), 2);
}

#[tokio::test]
async fn http_pipeline_surfaces_transport_failures() {
    // Health succeeds but generation endpoints are missing.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device": "mps",
            "accelerated": true,
        })))
        .mount(&server)
        .await;
    let backend = backend_for(&server);

    let record = run_query(&backend, "fractions near 1/2").await;
    assert!(!record.ok);
    assert!(record.error.as_deref().unwrap().contains("generation failed"));
    assert_eq!(record.exit_code(), 2);
}
