//! End-to-end pipeline runs against a mocked Groq endpoint

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

use eda_config::EdaConfig;
use eda_dataset::Frame;
use eda_engine::{Node, Pipeline, PipelineOptions, render};
use eda_providers::LlmClient;
use eda_types::{AnalysisOutput, ProblemType};
use wiremock::MockServer;

use crate::common::{HOUSES_CSV, csv_file, mount_chat_sequence, mount_error_response};

fn replies(focus: &str) -> Vec<String> {
    vec![
        serde_json::json!({
            "problem_type": "regression",
            "target_variable": "price",
            "confidence_score_regression": 0.92,
            "confidence_score_classification": 0.05,
            "confidence_score_clustering": 0.03
        })
        .to_string(),
        "Ten listings across two cities. No missing values.".to_string(),
        serde_json::json!({
            "report": "Check spread, then extremes.",
            "focus_areas": [focus],
            "red_flags": ["one very large area"],
            "analysis_to_run": ["iqr fences"],
            "analysis_to_skip": [],
            "priority_order": [focus]
        })
        .to_string(),
        serde_json::json!({
            "report": "One listing has an implausible area.",
            "key_insights": ["price rises with rooms"],
            "risks": ["area outlier"],
            "modeling_implications": ["use a robust scaler"],
            "next_steps": ["verify the 900 m² listing"]
        })
        .to_string(),
    ]
}

/// Config file pointing Groq at the mock server.
fn config_file(server: &MockServer) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[app]
provider = "groq"

[api_keys]
groq = "test-key"

[endpoints]
groq = "{}"

[llm]
max_retries = 0
structured_repair_attempts = 1

[analysis]
sample_rows = 3
"#,
        server.uri()
    )
    .unwrap();
    file
}

fn config_for(server: &MockServer) -> EdaConfig {
    EdaConfig::load_from(config_file(server).path()).unwrap()
}

/// Run the `eda-agent` binary off the runtime so the mock server keeps serving.
async fn eda_agent_run(dataset: &Path, config: &Path) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_eda-agent"));
    command
        .arg("run")
        .arg(dataset)
        .arg("--config")
        .arg(config)
        .env("RUST_LOG", "off");
    tokio::task::spawn_blocking(move || command.output().unwrap())
        .await
        .unwrap()
}

fn pipeline_from(config: &EdaConfig) -> Pipeline<LlmClient> {
    let api = config.api_config(None, None).unwrap();
    let client = LlmClient::new(api, config.retry_config()).unwrap();
    Pipeline::new(
        client,
        PipelineOptions {
            settings: config.analysis_settings(),
            repair_attempts: config.repair_attempts(),
        },
    )
}

#[tokio::test]
async fn full_run_over_http_produces_report() {
    let server = MockServer::start().await;
    mount_chat_sequence(&server, &replies("outlier_detection")).await;
    let config = config_for(&server);
    let csv = csv_file(HOUSES_CSV);
    let frame = Frame::from_csv_path(csv.path(), &config.csv_options().unwrap()).unwrap();

    let run = pipeline_from(&config).run(&frame).await;

    assert!(run.is_success(), "{:?}", run.error);
    assert_eq!(run.problem_type, Some(ProblemType::Regression));
    assert_eq!(
        &run.visited[2..6],
        &[
            Node::ProfileRegression,
            Node::ProfilingReport,
            Node::StrategyGenerator,
            Node::ExecuteOutliers,
        ]
    );
    assert!(matches!(
        run.state.eda_executor(),
        Some(AnalysisOutput::Outliers(_))
    ));

    let markdown = render::markdown(&run);
    assert!(markdown.contains("## Summary\n\nOne listing has an implausible area."));
    assert!(markdown.contains("- verify the 900 m² listing"));
    assert!(markdown.contains("## Analysis: outlier_detection"));

    let json: serde_json::Value = serde_json::from_str(&render::json(&run).unwrap()).unwrap();
    assert_eq!(json["state"]["domain_expert"]["target_variable"], "price");
    assert_eq!(json["state"]["eda_executor"]["analysis"], "outliers");
}

#[tokio::test]
async fn domain_expert_sees_only_sample_rows() {
    let server = MockServer::start().await;
    mount_chat_sequence(&server, &replies("descriptive_analysis")).await;
    let config = config_for(&server);
    let frame = Frame::from_csv_path(csv_file(HOUSES_CSV).path(), &Default::default()).unwrap();

    let run = pipeline_from(&config).run(&frame).await;
    assert!(run.is_success(), "{:?}", run.error);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
    let first: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = first["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("160"), "third row is part of the sample");
    assert!(!prompt.contains("210"), "fourth row is past the sample");
    assert_eq!(first["response_format"]["type"], "json_object");
}

#[tokio::test]
async fn provider_failure_is_captured_with_partial_state() {
    let server = MockServer::start().await;
    mount_error_response(&server, "/chat/completions", 400, "model overloaded").await;
    let config = config_for(&server);
    let frame = Frame::from_csv_path(csv_file(HOUSES_CSV).path(), &Default::default()).unwrap();

    let run = pipeline_from(&config).run(&frame).await;

    assert!(!run.is_success());
    assert_eq!(run.visited, vec![Node::Start, Node::ProblemType]);
    assert!(run.state.domain_expert().is_none());
    let error = run.error.as_deref().unwrap();
    assert!(error.contains("problem_type failed"), "{error}");
    assert!(error.contains("400"), "{error}");
    assert!(render::markdown(&run).contains("> **Run failed:**"));
}

#[tokio::test(flavor = "multi_thread")]
async fn cli_exits_non_zero_when_the_run_fails() {
    let server = MockServer::start().await;
    mount_error_response(&server, "/chat/completions", 400, "model overloaded").await;
    let config = config_file(&server);
    let csv = csv_file(HOUSES_CSV);

    let output = eda_agent_run(csv.path(), config.path()).await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: problem_type failed"), "{stderr}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("> **Run failed:**"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn cli_exits_zero_after_a_full_run() {
    let server = MockServer::start().await;
    mount_chat_sequence(&server, &replies("correlation_analysis")).await;
    let config = config_file(&server);
    let csv = csv_file(HOUSES_CSV);

    let output = eda_agent_run(csv.path(), config.path()).await;

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("## Analysis: correlation_analysis"), "{stdout}");
}
