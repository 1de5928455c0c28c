use std::sync::Arc;
use std::time::Duration;

use pairbench::config::{BenchmarkConfig, ModelConfig, ProviderKind};
use pairbench::dataset::TestCase;
use pairbench::gateway::{
    AnthropicClient, ChatMessage, GatewaySpec, GeminiClient, ModelGateway, OpenAiClient,
    ProviderGateway, RateLimiter, SamplingParams,
};
use pairbench::judge::{JudgeProtocol, Winner};
use pairbench::runner::Orchestrator;
use pairbench::GatewayError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn limiter() -> Arc<RateLimiter> {
    Arc::new(RateLimiter::per_minute(600))
}

fn params() -> SamplingParams {
    SamplingParams {
        temperature: 0.2,
        max_tokens: Some(256),
    }
}

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 30, "total_tokens": 42 }
    })
}

#[tokio::test]
async fn openai_parses_content_and_usage() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 256,
            "messages": [
                { "role": "system", "content": "You are a waiter." },
                { "role": "user", "content": "Any vegan options?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("The falafel wrap.")))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::new("sk-test".to_string(), Some(server.uri()), limiter()).unwrap();
    let messages = vec![
        ChatMessage::system("You are a waiter."),
        ChatMessage::user("Any vegan options?"),
    ];

    let completion = client
        .generate("gpt-4o-mini", &messages, &params())
        .await
        .unwrap();
    assert_eq!(completion.content, "The falafel wrap.");
    assert_eq!(completion.usage.prompt_tokens, 12);
    assert_eq!(completion.usage.completion_tokens, 30);
    assert_eq!(completion.usage.total_tokens, 42);
}

#[tokio::test]
async fn anthropic_sends_headers_and_lifts_system_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "ak-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-5-haiku-latest",
            "system": "You are a waiter.",
            "messages": [{ "role": "user", "content": "Any vegan options?" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                { "type": "text", "text": "The falafel " },
                { "type": "text", "text": "wrap." }
            ],
            "usage": { "input_tokens": 9, "output_tokens": 4 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        AnthropicClient::new("ak-test".to_string(), Some(server.uri()), limiter()).unwrap();
    let messages = vec![
        ChatMessage::system("You are a waiter."),
        ChatMessage::user("Any vegan options?"),
    ];

    let completion = client
        .generate("claude-3-5-haiku-latest", &messages, &params())
        .await
        .unwrap();
    assert_eq!(completion.content, "The falafel wrap.");
    assert_eq!(completion.usage.total_tokens, 13);
}

#[tokio::test]
async fn gemini_flattens_conversation_into_one_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .and(header("x-goog-api-key", "gk-test"))
        .and(body_partial_json(json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": "SYSTEM: Be brief.\nUSER: Hello" }]
            }],
            "generationConfig": { "maxOutputTokens": 256 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": "Hi!" }] } }],
            "usageMetadata": { "promptTokenCount": 5, "candidatesTokenCount": 2 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new("gk-test".to_string(), Some(server.uri()), limiter()).unwrap();
    let messages = vec![ChatMessage::system("Be brief."), ChatMessage::user("Hello")];

    let completion = client
        .generate("gemini-1.5-flash", &messages, &params())
        .await
        .unwrap();
    assert_eq!(completion.content, "Hi!");
    assert_eq!(completion.usage.total_tokens, 7);
}

#[tokio::test]
async fn error_statuses_are_classified() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/limited/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/broken/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let messages = vec![ChatMessage::user("hi")];
    let call = |prefix: &str| {
        let client = OpenAiClient::new(
            "sk-test".to_string(),
            Some(format!("{}/{}", server.uri(), prefix)),
            limiter(),
        )
        .unwrap();
        let messages = messages.clone();
        async move { client.generate("gpt-4o-mini", &messages, &params()).await }
    };

    let err = call("auth").await.unwrap_err();
    assert!(matches!(err, GatewayError::Auth { status: 401, .. }));
    assert!(!err.is_retryable());

    let err = call("limited").await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));

    let err = call("broken").await.unwrap_err();
    match &err {
        GatewayError::Api {
            status, message, ..
        } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn provider_gateway_retries_transient_failures() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("second time lucky")))
        .mount(&server)
        .await;

    let spec = GatewaySpec {
        provider: ProviderKind::Ollama,
        api_key_env: None,
        base_url: Some(server.uri()),
    };
    let gateway = ProviderGateway::connect(&spec, 600, 2).unwrap();

    let completion = gateway
        .generate("llama3", &[ChatMessage::user("hi")], &params())
        .await
        .unwrap();
    assert_eq!(completion.content, "second time lucky");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn provider_gateway_gives_up_after_retry_budget() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .mount(&server)
        .await;

    let spec = GatewaySpec {
        provider: ProviderKind::Ollama,
        api_key_env: None,
        base_url: Some(server.uri()),
    };
    let gateway = ProviderGateway::connect(&spec, 600, 1).unwrap();

    let err = gateway
        .generate("llama3", &[ChatMessage::user("hi")], &params())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::RateLimited { .. }));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn position_biased_judge_yields_tie_over_http() {
    let models = MockServer::start().await;
    let judge_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "model": "model-a" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("Answer from A")))
        .mount(&models)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "model": "model-b" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("Answer from B")))
        .mount(&models)
        .await;

    // Always prefers whichever response is shown first
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            r#"{"winner":"A","score_A":8,"score_B":4,"reasons":["first is better"]}"#,
        )))
        .mount(&judge_server)
        .await;

    let mut config = BenchmarkConfig::default();
    config.models = vec![
        ModelConfig::new(ProviderKind::Ollama, "model-a"),
        ModelConfig::new(ProviderKind::Ollama, "model-b"),
    ];
    config.settings.sleep_between_calls = 0.0;

    let model_gateway = Arc::new(
        OpenAiClient::ollama(Some(models.uri()), limiter()).unwrap(),
    );
    let judge_gateway = Arc::new(
        OpenAiClient::ollama(Some(judge_server.uri()), limiter()).unwrap(),
    );
    let judge = JudgeProtocol::new(judge_gateway, "judge-model", 2);

    let orchestrator =
        Orchestrator::new(&config, Arc::clone(&model_gateway), model_gateway, judge).unwrap();
    let dataset = vec![TestCase::new(
        "t1",
        "menu_qa",
        vec!["What is the soup of the day?".to_string()],
    )];

    let result = orchestrator.run(&dataset).await.unwrap();

    assert_eq!(result.results.len(), 1);
    let case = &result.results[0];
    assert_eq!(case.verdict.winner, Winner::Tie);
    assert_eq!(case.verdict.score_a, 6.0);
    assert_eq!(case.verdict.score_b, 6.0);
    assert_eq!(case.model_a.response, "Answer from A");
    assert_eq!(case.model_b.response, "Answer from B");
    assert_eq!(case.model_a.tokens, 42);
    assert_eq!(result.summary.overall_winner, "tie");
    assert_eq!(judge_server.received_requests().await.unwrap().len(), 2);
}
