use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn codex_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("codex");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let corpus_dir = root.join("corpus");
    fs::create_dir_all(&corpus_dir).unwrap();
    fs::write(
        corpus_dir.join("cv.md"),
        "# Curriculum Vitae\n\nTechnical skills: Python, Java, SQL and Docker.\n\nBSc Computer Science and Statistics.",
    )
    .unwrap();
    fs::write(
        corpus_dir.join("project_nexgen.md"),
        "# NexGen Learn\n\nAn AI-powered learning platform built with TypeScript and Node.js.\n\nIt adapts lessons to each learner.",
    )
    .unwrap();
    fs::write(
        corpus_dir.join("values.txt"),
        "Resilience, curiosity and continuous learning guide how I approach every new problem I take on.",
    )
    .unwrap();
    fs::write(corpus_dir.join("stub.txt"), "too short").unwrap();

    write_config(&root, &config_dir, &corpus_dir);
    (tmp, config_dir.join("codex.toml"))
}

fn write_config(root: &Path, config_dir: &Path, corpus_dir: &Path) {
    let config_content = format!(
        r#"[corpus]
dir = "{}"

[index]
dir = "{}/db"

[embedding]
provider = "hash"
dims = 128

[retrieval]
k = 3

[generation]
provider = "static"
static_text = "I mostly build backend services in Python and Java."

[chat]
typing_delay_ms = 0
"#,
        corpus_dir.display(),
        root.display()
    );
    fs::write(config_dir.join("codex.toml"), config_content).unwrap();
}

fn run_codex(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = codex_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run codex binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_ingest_reports_summary() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_codex(&config_path, &["ingest"]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("records loaded: 4"), "{}", stdout);
    assert!(stdout.contains("fragments dropped: 1"), "{}", stdout);
    assert!(stdout.contains("documents: 3"), "{}", stdout);
    assert!(stdout.contains("ok"));
}

#[test]
fn test_ingest_json_lists_every_type() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_codex(&config_path, &["ingest", "--json"]);
    assert!(success, "ingest failed: stderr={}", stderr);

    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["total_docs"], 3);
    for key in ["cv", "project", "values", "general"] {
        assert!(summary["chunks_by_type"].get(key).is_some(), "missing {}", key);
    }
    assert_eq!(summary["chunks_by_type"]["general"], 0);
    assert!(summary["chunks_by_type"]["cv"].as_u64().unwrap() >= 1);
    assert!(tmp.path().join("db").join("index.sqlite").exists());
}

#[test]
fn test_ingest_empty_corpus_fails() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    let config_dir = root.join("config");
    let corpus_dir = root.join("corpus");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(&corpus_dir).unwrap();
    write_config(&root, &config_dir, &corpus_dir);

    let (stdout, stderr, success) = run_codex(&config_dir.join("codex.toml"), &["ingest"]);
    assert!(!success, "ingest should fail on empty corpus: {}", stdout);
    assert!(stderr.contains("no documents survived preprocessing"), "{}", stderr);
    assert!(!root.join("db").exists());
}

#[test]
fn test_index_dir_sharing_corpus_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    let config_dir = root.join("config");
    let corpus_dir = root.join("corpus");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(&corpus_dir).unwrap();
    let values = corpus_dir.join("values.md");
    fs::write(
        &values,
        "Resilience, curiosity and continuous learning guide how I approach every new problem I take on.",
    )
    .unwrap();
    fs::write(
        config_dir.join("codex.toml"),
        format!(
            "[corpus]\ndir = \"{0}\"\n\n[index]\ndir = \"{0}\"\n\n[embedding]\nprovider = \"hash\"\n",
            corpus_dir.display()
        ),
    )
    .unwrap();

    let (_, stderr, success) = run_codex(&config_dir.join("codex.toml"), &["ingest"]);
    assert!(!success);
    assert!(stderr.contains("must not be or contain corpus.dir"), "{}", stderr);
    assert!(values.exists());
}

#[test]
fn test_search_after_ingest() {
    let (_tmp, config_path) = setup_test_env();
    run_codex(&config_path, &["ingest"]);

    let (stdout, stderr, success) =
        run_codex(&config_path, &["search", "technical skills python", "-k", "2"]);
    assert!(success, "search failed: stderr={}", stderr);
    assert!(stdout.contains("1. ["), "{}", stdout);
    assert!(!stdout.contains("3. ["), "k=2 should print two results: {}", stdout);
    assert!(stdout.contains("cv / cv.md"), "{}", stdout);
}

#[test]
fn test_search_without_index_fails() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_codex(&config_path, &["search", "anything"]);
    assert!(!success);
    assert!(stderr.contains("no index found"), "{}", stderr);
}

#[test]
fn test_search_with_mismatched_dims_fails_cleanly() {
    let (_tmp, config_path) = setup_test_env();
    run_codex(&config_path, &["ingest"]);

    let original = fs::read_to_string(&config_path).unwrap();
    fs::write(&config_path, original.replace("dims = 128", "dims = 64")).unwrap();
    let (_, stderr, success) = run_codex(&config_path, &["search", "python"]);
    assert!(!success);
    assert!(stderr.contains("dimensions"), "{}", stderr);

    fs::write(&config_path, original).unwrap();
    let (stdout, stderr, success) = run_codex(&config_path, &["search", "python"]);
    assert!(success, "search failed: stderr={}", stderr);
    assert!(stdout.contains("1. ["), "{}", stdout);
}

#[test]
fn test_ask_prints_answer() {
    let (_tmp, config_path) = setup_test_env();
    run_codex(&config_path, &["ingest"]);

    let (stdout, stderr, success) = run_codex(
        &config_path,
        &["ask", "What are your technical skills?", "--mode", "fast_facts"],
    );
    assert!(success, "ask failed: stderr={}", stderr);
    assert!(stdout.contains("I mostly build backend services in Python and Java."));
}

#[test]
fn test_ask_invalid_mode_fails() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_codex(&config_path, &["ask", "Hello?", "--mode", "poetry"]);
    assert!(!success);
    assert!(stderr.contains("invalid mode 'poetry'"), "{}", stderr);
}

#[test]
fn test_chat_session_commands() {
    let (_tmp, config_path) = setup_test_env();
    run_codex(&config_path, &["ingest"]);

    let mut child = Command::new(codex_binary())
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("chat")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"What do you build?\n/mode storytelling\n/mode poetry\n/reset\n/quit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Currently in Interview Mode"), "{}", stdout);
    assert!(stdout.contains("Yanga: I mostly build backend services"), "{}", stdout);
    assert!(stdout.contains("Switched to Personal Storytelling."), "{}", stdout);
    assert!(stdout.contains("invalid mode 'poetry'"), "{}", stdout);
    assert!(stdout.contains("History cleared."), "{}", stdout);
}

#[test]
fn test_stats_after_ingest() {
    let (_tmp, config_path) = setup_test_env();
    run_codex(&config_path, &["ingest"]);

    let (stdout, stderr, success) = run_codex(&config_path, &["stats"]);
    assert!(success, "stats failed: stderr={}", stderr);
    assert!(stdout.contains("Model:       hash (128 dims)"), "{}", stdout);
    assert!(stdout.contains("values"));
}

#[test]
fn test_modes_needs_no_config() {
    let (stdout, _, success) = run_codex(Path::new("/nonexistent/codex.toml"), &["modes"]);
    assert!(success);
    for mode in ["interview", "storytelling", "fast_facts", "humble_brag"] {
        assert!(stdout.contains(mode), "missing {}", mode);
    }
}

#[test]
fn test_missing_config_fails() {
    let (_, stderr, success) = run_codex(Path::new("/nonexistent/codex.toml"), &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"), "{}", stderr);
}
