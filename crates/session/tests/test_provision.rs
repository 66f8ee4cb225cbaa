//! Provisioning tests against a mocked back end

mod common;

use common::*;
use finsight_agents::{Agent, AgentSpec, BackendError, StoredFile};
use finsight_capability::ToolIndex;
use finsight_docintel::DocIntelClient;
use finsight_session::provision::{ensure_agent, ensure_store};
use finsight_session::{FilingMeta, SessionError};
use std::path::Path;
use std::time::Duration;

fn tesla_10k() -> FilingMeta {
    FilingMeta {
        ticker: "TSLA".to_string(),
        form: "10-K".to_string(),
        date: "2024-10-01".to_string(),
    }
}

/// Test that an existing store with the filing's name is reused without a
/// second upload
#[tokio::test]
async fn test_existing_store_reused_without_upload() {
    let mut api = MockApi::new();
    api.expect_list_vector_stores().times(1).returning(|| {
        Ok(vec![
            store("vs_other", "Q4--2023-12-31"),
            store("vs_1", "10-K--2024-10-01"),
        ])
    });
    api.expect_upload_file().times(0);
    api.expect_create_vector_store().times(0);

    let result = ensure_store(
        &api,
        None,
        Path::new("TSLA--10-K--2024-10-01_120000.txt"),
        &tesla_10k(),
    )
    .await
    .expect("existing store should be reused");

    assert_eq!(result.id, "vs_1");
    assert_eq!(result.name, "10-K--2024-10-01");
}

/// Test that a missing store triggers upload and creation with the
/// filing-derived name
#[tokio::test]
async fn test_store_created_when_absent() {
    let mut api = MockApi::new();
    api.expect_list_vector_stores()
        .times(1)
        .returning(|| Ok(vec![store("vs_other", "Q4--2023-12-31")]));
    api.expect_upload_file()
        .withf(|path: &Path| path.ends_with("TSLA--10-K--2024-10-01_120000.txt"))
        .times(1)
        .returning(|_| {
            Ok(StoredFile {
                id: "file_9".to_string(),
                filename: "TSLA--10-K--2024-10-01_120000.txt".to_string(),
            })
        });
    api.expect_create_vector_store()
        .withf(|name: &str, file_ids: &Vec<String>| {
            name == "10-K--2024-10-01" && file_ids == &vec!["file_9".to_string()]
        })
        .times(1)
        .returning(|name, _| Ok(store("vs_new", name)));

    let result = ensure_store(
        &api,
        None,
        Path::new("TSLA--10-K--2024-10-01_120000.txt"),
        &tesla_10k(),
    )
    .await
    .expect("store creation should succeed");

    assert_eq!(result.id, "vs_new");
}

/// Test that a store listing failure is soft and creation proceeds
#[tokio::test]
async fn test_store_list_failure_is_soft() {
    let mut api = MockApi::new();
    api.expect_list_vector_stores()
        .times(1)
        .returning(|| Err(BackendError::Api("503: listing unavailable".to_string())));
    api.expect_upload_file().times(1).returning(|_| {
        Ok(StoredFile {
            id: "file_1".to_string(),
            filename: String::new(),
        })
    });
    api.expect_create_vector_store()
        .times(1)
        .returning(|name, _| Ok(store("vs_1", name)));

    let result = ensure_store(
        &api,
        None,
        Path::new("TSLA--10-K--2024-10-01_120000.txt"),
        &tesla_10k(),
    )
    .await;

    assert!(result.is_ok());
}

/// Test that image uploads require the analysis client
#[tokio::test]
async fn test_image_without_analysis_client_is_an_error() {
    let mut api = MockApi::new();
    api.expect_list_vector_stores().returning(|| Ok(Vec::new()));
    api.expect_upload_file().times(0);
    api.expect_create_vector_store().times(0);

    let err = ensure_store(
        &api,
        None,
        Path::new("TSLA--10-K--2024-10-01_120000.png"),
        &tesla_10k(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SessionError::MissingDocIntel));
}

/// Test that a pdf is flattened to a sibling Markdown artifact and the
/// artifact is what gets uploaded
#[tokio::test]
async fn test_pdf_is_extracted_before_upload() {
    let dir = tempfile::tempdir().unwrap();
    let document = dir.path().join("TSLA--10-K--2024-10-01_120000.pdf");
    std::fs::write(&document, b"%PDF-1.4 fake").unwrap();

    let mut server = mockito::Server::new_async().await;
    let operation_url = format!("{}/operations/op_1", server.url());
    server
        .mock(
            "POST",
            "/documentintelligence/documentModels/prebuilt-layout:analyze?api-version=2024-11-30",
        )
        .with_status(202)
        .with_header("operation-location", &operation_url)
        .create_async()
        .await;
    server
        .mock("GET", "/operations/op_1")
        .with_body(
            r#"{
                "status": "succeeded",
                "analyzeResult": {
                    "pages": [{"lines": [{"content": "Item 1. Business"}]}],
                    "tables": []
                }
            }"#,
        )
        .create_async()
        .await;
    let docintel =
        DocIntelClient::new(server.url(), "doc-key").with_poll_interval(Duration::from_millis(5));

    let mut api = MockApi::new();
    api.expect_list_vector_stores().returning(|| Ok(Vec::new()));
    api.expect_upload_file()
        .withf(|path: &Path| path.ends_with("TSLA--10-K--2024-10-01_120000_processed.md"))
        .times(1)
        .returning(|_| {
            Ok(StoredFile {
                id: "file_md".to_string(),
                filename: String::new(),
            })
        });
    api.expect_create_vector_store()
        .times(1)
        .returning(|name, _| Ok(store("vs_1", name)));

    ensure_store(&api, Some(&docintel), &document, &tesla_10k())
        .await
        .expect("extraction and upload should succeed");

    let artifact = dir.path().join("TSLA--10-K--2024-10-01_120000_processed.md");
    let contents = std::fs::read_to_string(artifact).expect("artifact should exist");
    assert!(contents.contains("Item 1. Business"));
}

/// Test that an agent carrying the target name is deleted before the
/// replacement is created
#[tokio::test]
async fn test_agent_replaced_when_name_exists() {
    let mut api = MockApi::new();
    api.expect_list_agents().times(1).returning(|| {
        Ok(vec![Agent {
            id: "agent_old".to_string(),
            name: "DefaultUser_TSLA-10-K".to_string(),
        }])
    });
    api.expect_delete_agent()
        .withf(|id: &str| id == "agent_old")
        .times(1)
        .returning(|_| Ok(()));
    api.expect_create_agent()
        .withf(|spec: &AgentSpec| {
            spec.name == "DefaultUser_TSLA-10-K"
                && spec.model == "gpt-4o"
                && spec.vector_store_id == "vs_1"
                && spec.instructions.contains("annual 10-K filings")
        })
        .times(1)
        .returning(|spec| {
            Ok(Agent {
                id: "agent_new".to_string(),
                name: spec.name,
            })
        });

    let agent = ensure_agent(
        &api,
        &ToolIndex::new(),
        &store("vs_1", "10-K--2024-10-01"),
        &tesla_10k(),
        "gpt-4o",
        "DefaultUser",
        "http://localhost:8080",
    )
    .await
    .expect("agent should be recreated");

    assert_eq!(agent.id, "agent_new");
}

/// Test that agent listing failures are soft and creation proceeds without
/// a delete
#[tokio::test]
async fn test_agent_list_failure_still_creates() {
    let mut api = MockApi::new();
    api.expect_list_agents()
        .times(1)
        .returning(|| Err(BackendError::Api("500: agents endpoint down".to_string())));
    api.expect_delete_agent().times(0);
    api.expect_create_agent().times(1).returning(|spec| {
        Ok(Agent {
            id: "agent_1".to_string(),
            name: spec.name,
        })
    });

    let result = ensure_agent(
        &api,
        &ToolIndex::new(),
        &store("vs_1", "10-K--2024-10-01"),
        &tesla_10k(),
        "gpt-4o",
        "DefaultUser",
        "http://localhost:8080",
    )
    .await;

    assert!(result.is_ok());
}

/// Test that a failed delete is soft and creation still happens
#[tokio::test]
async fn test_agent_delete_failure_is_soft() {
    let mut api = MockApi::new();
    api.expect_list_agents().returning(|| {
        Ok(vec![Agent {
            id: "agent_old".to_string(),
            name: "DefaultUser_TSLA-10-K".to_string(),
        }])
    });
    api.expect_delete_agent()
        .times(1)
        .returning(|_| Err(BackendError::Api("409: agent busy".to_string())));
    api.expect_create_agent().times(1).returning(|spec| {
        Ok(Agent {
            id: "agent_new".to_string(),
            name: spec.name,
        })
    });

    let result = ensure_agent(
        &api,
        &ToolIndex::new(),
        &store("vs_1", "10-K--2024-10-01"),
        &tesla_10k(),
        "gpt-4o",
        "DefaultUser",
        "http://localhost:8080",
    )
    .await;

    assert!(result.is_ok());
}

/// Test that discovered tool schemas are embedded in the agent
/// instructions
#[tokio::test]
async fn test_agent_instructions_embed_tool_schemas() {
    let mut api = MockApi::new();
    api.expect_list_agents().returning(|| Ok(Vec::new()));
    api.expect_create_agent()
        .withf(|spec: &AgentSpec| {
            spec.instructions.contains("\"name\": \"yahoo_stock_price\"")
                && spec.instructions.contains("Fetch historical stock prices")
        })
        .times(1)
        .returning(|spec| {
            Ok(Agent {
                id: "agent_1".to_string(),
                name: spec.name,
            })
        });

    ensure_agent(
        &api,
        &yahoo_index(),
        &store("vs_1", "10-K--2024-10-01"),
        &tesla_10k(),
        "gpt-4o",
        "DefaultUser",
        "http://localhost:8080",
    )
    .await
    .expect("agent creation should succeed");
}
