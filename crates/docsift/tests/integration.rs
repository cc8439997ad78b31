use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

fn docsift_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("docsift");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("alpha.txt"),
        "The quick brown fox jumps over the lazy dog. Rust gives memory safety without garbage collection. Cargo builds and tests Rust projects. The borrow checker enforces aliasing rules.",
    )
    .unwrap();
    fs::write(
        files_dir.join("beta.txt"),
        "Kubernetes schedules containers across a cluster. Deployments describe desired state.",
    )
    .unwrap();

    // The generator base_url points nowhere; commands under test never
    // reach the generator.
    let config_content = format!(
        r#"[db]
path = "{root}/data/docsift.sqlite"

[chunking]
max_tokens = 16
overlap_sentences = 1

[retrieval]
top_k = 2

[generator]
base_url = "http://127.0.0.1:1"
model = "llama3.1"

[server]
bind = "127.0.0.1:7431"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("docsift.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_docsift(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = docsift_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docsift binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn document_id(stdout: &str) -> String {
    stdout
        .lines()
        .find_map(|l| l.strip_prefix("document id: "))
        .unwrap_or_else(|| panic!("no document id in output: {}", stdout))
        .to_string()
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_docsift(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_docsift(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_docsift(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_ingest_writes_chunks() {
    let (tmp, config_path) = setup_test_env();

    run_docsift(&config_path, &["init"]);
    let file = tmp.path().join("files/alpha.txt");
    let (stdout, stderr, success) =
        run_docsift(&config_path, &["ingest", file.to_str().unwrap()]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("chunks written: 3"), "stdout: {}", stdout);
    assert!(stdout.contains("ok"));
}

#[test]
fn test_ingest_idempotent_reuses_document() {
    let (tmp, config_path) = setup_test_env();

    run_docsift(&config_path, &["init"]);
    let file = tmp.path().join("files/alpha.txt");

    let (first, _, success1) = run_docsift(&config_path, &["ingest", file.to_str().unwrap()]);
    assert!(success1);
    let (second, _, success2) = run_docsift(&config_path, &["ingest", file.to_str().unwrap()]);
    assert!(success2);

    assert!(second.contains("already ingested"), "stdout: {}", second);
    assert_eq!(document_id(&first), document_id(&second));
}

#[test]
fn test_distinct_documents_get_distinct_ids() {
    let (tmp, config_path) = setup_test_env();

    run_docsift(&config_path, &["init"]);
    let alpha = tmp.path().join("files/alpha.txt");
    let beta = tmp.path().join("files/beta.txt");

    let (out_a, _, _) = run_docsift(&config_path, &["ingest", alpha.to_str().unwrap()]);
    let (out_b, _, _) = run_docsift(&config_path, &["ingest", beta.to_str().unwrap()]);
    assert_ne!(document_id(&out_a), document_id(&out_b));
}

#[test]
fn test_ingest_missing_file_fails() {
    let (tmp, config_path) = setup_test_env();

    run_docsift(&config_path, &["init"]);
    let missing = tmp.path().join("files/nope.txt");
    let (_, stderr, success) = run_docsift(&config_path, &["ingest", missing.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("not found"), "stderr: {}", stderr);
}

#[test]
fn test_ingest_unsupported_type_fails() {
    let (tmp, config_path) = setup_test_env();

    run_docsift(&config_path, &["init"]);
    let image = tmp.path().join("files/picture.png");
    fs::write(&image, b"\x89PNG\r\n").unwrap();
    let (_, stderr, success) = run_docsift(&config_path, &["ingest", image.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("unsupported"), "stderr: {}", stderr);
}

#[test]
fn test_ask_rejects_empty_query_before_any_work() {
    let (tmp, config_path) = setup_test_env();

    run_docsift(&config_path, &["init"]);
    let file = tmp.path().join("files/alpha.txt");
    let (_, stderr, success) =
        run_docsift(&config_path, &["ask", file.to_str().unwrap(), "  "]);
    assert!(!success);
    assert!(stderr.contains("query must not be empty"), "stderr: {}", stderr);
}

// ============ SQLite-backed pipeline ============

mod sqlite_pipeline {
    use async_trait::async_trait;
    use futures_util::{stream, StreamExt};
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    use docsift::config::{
        ChunkingConfig, Config, DbConfig, GeneratorConfig, RetrievalConfig, ServerConfig,
    };
    use docsift::db;
    use docsift::generate::{
        FragmentStream, GenerateError, GenerationRequest, Generator,
    };
    use docsift::migrate;
    use docsift::pipeline::{self, RequestKind};
    use docsift::sqlite_store::SqliteStore;
    use docsift_core::store::CorpusStore;

    struct ScriptedGenerator {
        fragments: Vec<String>,
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<FragmentStream, GenerateError> {
            let fragments: Vec<Result<String, GenerateError>> =
                self.fragments.iter().cloned().map(Ok).collect();
            Ok(stream::iter(fragments).boxed())
        }
    }

    fn sqlite_config(tmp: &TempDir) -> Config {
        Config {
            db: DbConfig {
                path: tmp.path().join("data/docsift.sqlite"),
            },
            chunking: ChunkingConfig {
                max_tokens: 4,
                overlap_sentences: 1,
            },
            retrieval: RetrievalConfig { top_k: 2 },
            generator: GeneratorConfig::default(),
            server: ServerConfig {
                bind: "127.0.0.1:0".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn end_to_end_ingest_rank_and_stream() {
        let tmp = TempDir::new().unwrap();
        let config = sqlite_config(&tmp);
        migrate::run_migrations(&config).await.unwrap();

        let pool = db::connect(&config).await.unwrap();
        let store = SqliteStore::new(pool);

        // Three 2-token sentences with max_tokens=4, overlap=1 give a
        // chunk boundary after every second sentence.
        let outcome = pipeline::ingest(
            &store,
            "doc1",
            "Sentence one. Sentence two. Sentence three.",
            &config,
        )
        .await
        .unwrap();
        assert_eq!(outcome.chunks_written, 2);

        let chunks = store.list_chunks(&outcome.document.id).await.unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Sentence one. Sentence two.",
                "Sentence two. Sentence three."
            ]
        );

        let ranked = pipeline::select_context("Sentence two", &chunks, config.retrieval.top_k);
        assert!(ranked[0].chunk.text.contains("Sentence two"));

        // Stream an answer through the full respond path, observing
        // fragment order at the sink.
        let generator = ScriptedGenerator {
            fragments: vec!["A".to_string(), "B".to_string(), "C".to_string()],
        };
        let (tx, mut rx) = mpsc::channel(8);
        let collector = tokio::spawn(async move {
            let mut received = Vec::new();
            while let Some(f) = rx.recv().await {
                received.push(f);
            }
            received
        });

        let kind = RequestKind::Ask {
            query: "Sentence two".to_string(),
        };
        let answer = pipeline::respond(
            &store,
            &generator,
            &config,
            &outcome.document.id,
            &kind,
            tx,
        )
        .await
        .unwrap();

        assert_eq!(answer, "ABC");
        assert_eq!(collector.await.unwrap(), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn sqlite_ingest_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let config = sqlite_config(&tmp);
        migrate::run_migrations(&config).await.unwrap();

        let pool = db::connect(&config).await.unwrap();
        let store = SqliteStore::new(pool);
        let text = "Sentence one. Sentence two. Sentence three.";

        let first = pipeline::ingest(&store, "doc1", text, &config).await.unwrap();
        let second = pipeline::ingest(&store, "doc1", text, &config).await.unwrap();

        assert!(!first.deduplicated);
        assert!(second.deduplicated);
        assert_eq!(first.document.id, second.document.id);
        assert_eq!(
            store.list_chunks(&first.document.id).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn sqlite_create_document_resolves_duplicate_insert() {
        let tmp = TempDir::new().unwrap();
        let config = sqlite_config(&tmp);
        migrate::run_migrations(&config).await.unwrap();

        let pool = db::connect(&config).await.unwrap();
        let store = SqliteStore::new(pool);

        // Two direct creates with the same hash model the dedup race:
        // the second must adopt the winning row, not error.
        let (winner, created) = store.create_document("doc", "same-hash").await.unwrap();
        assert!(created);
        let (loser, created) = store.create_document("doc", "same-hash").await.unwrap();
        assert!(!created);
        assert_eq!(winner.id, loser.id);
    }
}
