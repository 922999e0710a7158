use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use cloud_roi_advisor::{
    AdvisoryProviderConfig, AdvisoryRequest, AzureOpenAiConfig, ChatMessage,
    OpenAiCompatibleConfig, ProviderError, build_advisory_provider,
};
use cloud_roi_core::{InputValues, compute};

struct Captured {
    head: String,
    body: serde_json::Value,
}

/// Serves exactly one HTTP request with the given status and body and hands
/// the parsed request back through the channel.
fn fake_chat_server(status: u16, response_body: &'static str) -> (String, mpsc::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake server");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("read timeout");

        let mut buf = Vec::new();
        let mut chunk = [0_u8; 4096];
        let header_end = loop {
            let n = stream.read(&mut chunk).expect("read request");
            assert!(n > 0, "client closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|l| {
                let (k, v) = l.split_once(':')?;
                k.eq_ignore_ascii_case("content-length")
                    .then(|| v.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = stream.read(&mut chunk).expect("read body");
            assert!(n > 0, "client closed before body");
            buf.extend_from_slice(&chunk[..n]);
        }
        let body: serde_json::Value =
            serde_json::from_slice(&buf[header_end..header_end + content_length])
                .expect("request body is json");

        let reason = if status == 200 { "OK" } else { "Error" };
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{response_body}",
            response_body.len()
        );
        stream
            .write_all(response.as_bytes())
            .expect("write response");
        let _ = tx.send(Captured { head, body });
    });

    (format!("http://{addr}"), rx)
}

const COMPLETION: &str = r#"{"id":"chatcmpl-1","model":"gpt-4o-2024-11-20","choices":[{"index":0,"message":{"role":"assistant","content":"  Move 20% of on-demand compute to spot instances.  "}}],"usage":{"prompt_tokens":900,"completion_tokens":12,"total_tokens":912}}"#;

fn request(query: &str) -> AdvisoryRequest {
    let inputs = InputValues {
        company_name: "Contoso".to_string(),
        ..InputValues::default()
    };
    let results = compute(&inputs);
    let mut req = AdvisoryRequest::new(inputs, results, query);
    req.history = vec![
        ChatMessage::user("What drives cost savings?"),
        ChatMessage::assistant("Pricing model and compute spend. Are you open to spot?"),
    ];
    req
}

#[tokio::test]
async fn azure_provider_posts_deployment_url_with_api_key() {
    let (endpoint, rx) = fake_chat_server(200, COMPLETION);
    let mut cfg = AzureOpenAiConfig::new("azure-secret", endpoint);
    cfg.deployment = "roi-gpt".to_string();
    let provider =
        build_advisory_provider(AdvisoryProviderConfig::AzureOpenAi(cfg)).expect("provider");

    let res = provider.advise(request("Yes, I am")).await.expect("advice");
    assert_eq!(res.provider, "azure-openai");
    assert_eq!(res.model, "gpt-4o-2024-11-20");
    assert_eq!(res.advice, "Move 20% of on-demand compute to spot instances.");
    assert_eq!(res.usage_tokens, Some(912));

    let captured = rx.recv_timeout(Duration::from_secs(5)).expect("captured");
    let request_line = captured.head.lines().next().unwrap_or_default().to_string();
    assert_eq!(
        request_line,
        "POST /openai/deployments/roi-gpt/chat/completions?api-version=2025-01-01-preview HTTP/1.1"
    );
    assert!(
        captured
            .head
            .to_ascii_lowercase()
            .contains("api-key: azure-secret")
    );
    assert_eq!(captured.body["max_tokens"], 800);
    assert!(captured.body.get("model").is_none());

    let messages = captured.body["messages"].as_array().expect("messages");
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["role"], "system");
    assert!(
        messages[0]["content"]
            .as_str()
            .unwrap_or_default()
            .contains("- Company: Contoso")
    );
    assert_eq!(messages[3]["role"], "user");
    assert_eq!(messages[3]["content"], "Yes, I am");
}

#[tokio::test]
async fn openai_compatible_provider_uses_bearer_auth_and_model() {
    let (base_url, rx) = fake_chat_server(200, COMPLETION);
    let mut cfg = OpenAiCompatibleConfig::new("sk-test", "gpt-4o-mini");
    cfg.base_url = base_url;
    let provider = build_advisory_provider(AdvisoryProviderConfig::OpenAiCompatible(cfg))
        .expect("provider");

    let res = provider
        .advise(request("How do I cut spend?"))
        .await
        .expect("advice");
    assert_eq!(res.provider, "openai-compatible");

    let captured = rx.recv_timeout(Duration::from_secs(5)).expect("captured");
    assert!(captured.head.starts_with("POST /v1/chat/completions HTTP/1.1"));
    assert!(
        captured
            .head
            .to_ascii_lowercase()
            .contains("authorization: bearer sk-test")
    );
    assert_eq!(captured.body["model"], "gpt-4o-mini");
}

#[tokio::test]
async fn api_failure_keeps_status_and_body() {
    let (endpoint, _rx) = fake_chat_server(429, r#"{"error":{"message":"rate limited"}}"#);
    let provider = build_advisory_provider(AdvisoryProviderConfig::AzureOpenAi(
        AzureOpenAiConfig::new("azure-secret", endpoint),
    ))
    .expect("provider");

    let err = provider
        .advise(request("anything"))
        .await
        .err()
        .expect("api error");
    match err {
        ProviderError::Api { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("rate limited"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn empty_choices_are_an_invalid_response() {
    let (endpoint, _rx) = fake_chat_server(200, r#"{"choices":[]}"#);
    let provider = build_advisory_provider(AdvisoryProviderConfig::AzureOpenAi(
        AzureOpenAiConfig::new("azure-secret", endpoint),
    ))
    .expect("provider");

    let err = provider
        .advise(request("anything"))
        .await
        .err()
        .expect("invalid response");
    assert!(matches!(err, ProviderError::InvalidResponse(_)));
}

#[tokio::test]
async fn blank_query_is_rejected_before_any_request() {
    let provider = build_advisory_provider(AdvisoryProviderConfig::AzureOpenAi(
        AzureOpenAiConfig::new("azure-secret", "http://127.0.0.1:9"),
    ))
    .expect("provider");

    let err = provider.advise(request("   ")).await.err().expect("config error");
    assert!(matches!(err, ProviderError::Config(_)));
}
