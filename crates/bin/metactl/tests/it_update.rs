//! End-to-end tests for the update command against a fake catalog.

use std::{net::SocketAddr, path::Path};

use axum::{
    extract::Path as AxumPath,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metactl::{
    args::{CatalogArgs, GlobalArgs},
    cmd::update,
};
use network_metadata::{Kind, MetadataDocument};
use serde_json::{json, Value};

/// A fake catalog serving two datasets: an EVM chain and a Solana chain.
fn catalog_app(datasets: Vec<&'static str>) -> Router {
    Router::new()
        .route(
            "/",
            get(move || async move {
                let listing: Vec<Value> =
                    datasets.iter().map(|d| json!({ "dataset": d })).collect();
                Json(json!(listing))
            }),
        )
        .route(
            "/{dataset}/head",
            get(|| async { Json(json!({ "number": 1000 })) }),
        )
        .route(
            "/{dataset}/metadata",
            get(|AxumPath(dataset): AxumPath<String>| async move {
                if dataset.starts_with("eth") {
                    Json(json!({ "start_block": 5 })).into_response()
                } else {
                    StatusCode::NOT_FOUND.into_response()
                }
            }),
        )
        .route(
            "/{dataset}/stream",
            post(
                |AxumPath(dataset): AxumPath<String>, Json(body): Json<Value>| async move {
                    let query = body["type"].as_str().unwrap_or_default();
                    let accepted = match (dataset.as_str(), query) {
                        ("eth-holesky", "evm") => body.get("transactions").is_some(),
                        ("solana-mainnet", "solana") => {
                            body.get("instructions").is_some()
                                || body.get("tokenBalances").is_some()
                        }
                        _ => false,
                    };
                    if accepted {
                        StatusCode::OK
                    } else {
                        StatusCode::BAD_REQUEST
                    }
                },
            ),
        )
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind an ephemeral port");
    let addr = listener.local_addr().expect("should have a local address");

    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("server should not fail");
    });

    addr
}

fn args(addr: SocketAddr, metadata: &Path, missing_out: &Path) -> update::Args {
    update::Args {
        global: GlobalArgs {
            metadata: metadata.to_path_buf(),
        },
        catalog: CatalogArgs {
            catalog_url: format!("http://{addr}/").parse().expect("valid URL"),
            batch_size: 10,
            max_retries: 5,
            retry_min_delay_ms: 10,
            request_timeout_secs: 5,
        },
        overwrite: false,
        full_update: false,
        missing_out: missing_out.to_path_buf(),
    }
}

#[tokio::test]
async fn update_classifies_unclassified_datasets() {
    //* Given
    let dir = tempfile::tempdir().expect("should create temp dir");
    let metadata = dir.path().join("metadata.yml");
    let missing_out = dir.path().join("missing-networks.txt");

    std::fs::write(
        &metadata,
        r#"
datasets:
  eth-holesky:
    metadata:
      display_name: Ethereum Holesky
  solana-mainnet:
    metadata:
      kind: solana
      display_name: Solana
"#,
    )
    .expect("should write document");

    let addr = serve(catalog_app(vec!["eth-holesky", "solana-mainnet"])).await;

    //* When
    update::run(args(addr, &metadata, &missing_out))
        .await
        .expect("update should succeed");

    //* Then
    let document = MetadataDocument::load(&metadata).expect("should reload");

    // The unclassified record got a kind and the catalog's start block,
    // and kept its display name.
    let eth = &document.datasets["eth-holesky"];
    assert_eq!(eth.metadata.kind, Some(Kind::Evm));
    assert_eq!(eth.metadata.display_name.as_deref(), Some("Ethereum Holesky"));
    assert_eq!(eth.schema.start_block, Some(5));

    // The classified record was left alone.
    let solana = &document.datasets["solana-mainnet"];
    assert_eq!(solana.metadata.kind, Some(Kind::Solana));
    assert_eq!(solana.schema.start_block, None);
}

#[tokio::test]
async fn catalog_datasets_without_a_record_fail_the_run() {
    //* Given
    let dir = tempfile::tempdir().expect("should create temp dir");
    let metadata = dir.path().join("metadata.yml");
    let missing_out = dir.path().join("missing-networks.txt");

    std::fs::write(
        &metadata,
        "datasets:\n  solana-mainnet:\n    metadata:\n      kind: solana\n",
    )
    .expect("should write document");

    let addr = serve(catalog_app(vec!["eth-holesky", "solana-mainnet"])).await;

    //* When
    let result = update::run(args(addr, &metadata, &missing_out)).await;

    //* Then
    assert!(
        matches!(result, Err(update::Error::MissingFromDocument { count: 1, .. })),
        "got: {result:?}"
    );

    let written = std::fs::read_to_string(&missing_out).expect("file should exist");
    assert_eq!(written, "eth-holesky\n");
}

#[tokio::test]
async fn records_absent_from_the_catalog_fail_the_run() {
    //* Given
    let dir = tempfile::tempdir().expect("should create temp dir");
    let metadata = dir.path().join("metadata.yml");
    let missing_out = dir.path().join("missing-networks.txt");

    std::fs::write(
        &metadata,
        "datasets:\n  gone-mainnet:\n    metadata:\n      kind: evm\n  solana-mainnet:\n    metadata:\n      kind: solana\n",
    )
    .expect("should write document");

    let addr = serve(catalog_app(vec!["solana-mainnet"])).await;

    //* When
    let result = update::run(args(addr, &metadata, &missing_out)).await;

    //* Then
    match result {
        Err(update::Error::AbsentFromRemote { datasets }) => {
            assert_eq!(datasets, "gone-mainnet");
        }
        other => panic!("expected AbsentFromRemote, got: {other:?}"),
    }
}

#[tokio::test]
async fn unclassifiable_datasets_fail_after_the_whole_run() {
    //* Given
    let dir = tempfile::tempdir().expect("should create temp dir");
    let metadata = dir.path().join("metadata.yml");
    let missing_out = dir.path().join("missing-networks.txt");

    // Neither record has a kind; only eth-holesky matches a rule on the
    // fake catalog.
    std::fs::write(
        &metadata,
        "datasets:\n  eth-holesky:\n    metadata: {}\n  unknowable:\n    metadata: {}\n",
    )
    .expect("should write document");

    let addr = serve(catalog_app(vec!["eth-holesky", "unknowable"])).await;

    //* When
    let result = update::run(args(addr, &metadata, &missing_out)).await;

    //* Then
    assert!(
        matches!(result, Err(update::Error::DatasetsFailed { failed: 1 })),
        "got: {result:?}"
    );

    // Nothing was persisted: even the sibling's successful
    // classification is discarded.
    let document = MetadataDocument::load(&metadata).expect("should reload");
    assert!(document.datasets["eth-holesky"].metadata.kind.is_none());
    assert!(document.datasets["unknowable"].metadata.kind.is_none());
}
