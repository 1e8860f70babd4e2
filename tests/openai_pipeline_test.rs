#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use change_narrator::ai::OpenAiClient;
use change_narrator::git::VersionIdentifier;
use change_narrator::narrative::{generate_change_narratives, HaltReason, PipelineOptions};
use common::TestRepo;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}],
        "model": "gpt-3.5-turbo"
    }))
}

fn modified_repo() -> TestRepo {
    let test_repo = TestRepo::new().unwrap();
    test_repo.stage("app.py", "print(1)").unwrap();
    test_repo.commit("Initial commit").unwrap();
    test_repo.stage("app.py", "print(2)").unwrap();
    test_repo
}

#[tokio::test]
async fn narrates_through_the_http_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_string_contains("You are a project manager."))
        .respond_with(chat_reply("1. Adjust the printed value"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("You are a machine-learning software engineer."))
        .respond_with(chat_reply("  Sure, here it is:\n- Adjusted the printed value  "))
        .expect(1)
        .mount(&server)
        .await;

    let test_repo = modified_repo();
    let client = OpenAiClient::new(server.uri(), Some("sk-test".to_string())).unwrap();

    let outcome = generate_change_narratives(
        &test_repo.repo_path,
        &VersionIdentifier::RelativeHead(0),
        &VersionIdentifier::Staged,
        &client,
        &PipelineOptions::default(),
    )
    .await
    .unwrap();

    assert!(outcome.halt().is_none());
    assert_eq!(
        outcome.result().get("app.py"),
        Some("- Adjusted the printed value")
    );
}

#[tokio::test]
async fn http_429_halts_as_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(1)
        .mount(&server)
        .await;

    let test_repo = modified_repo();
    let client = OpenAiClient::new(server.uri(), Some("sk-test".to_string())).unwrap();

    let outcome = generate_change_narratives(
        &test_repo.repo_path,
        &VersionIdentifier::RelativeHead(0),
        &VersionIdentifier::Staged,
        &client,
        &PipelineOptions::default(),
    )
    .await
    .unwrap();

    let halt = outcome.halt().unwrap();
    assert_eq!(halt.reason, HaltReason::RateLimited);
    assert!(outcome.result().is_empty());
}
