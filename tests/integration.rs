use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tempfile::TempDir;

fn lectio_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("lectio");
    path
}

fn setup_test_env_with_port(port: u16) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();

    let usfm_dir = root.join("usfm");
    fs::create_dir_all(&usfm_dir).unwrap();
    fs::write(
        usfm_dir.join("01-GEN.usfm"),
        "\\id GEN Genesis test\n\\h Genesis\n\\c 1\n\\v 1 Text one.\n\\v 2 Text two.\n",
    )
    .unwrap();
    fs::write(
        usfm_dir.join("02-EXO.usfm"),
        "\\id EXO\n\\c 1\n\\v 1 Text three.\n",
    )
    .unwrap();

    let html_dir = root.join("html");
    fs::create_dir_all(&html_dir).unwrap();
    fs::write(
        html_dir.join("RUT01.htm"),
        r#"<div class="main"><span class="verse" id="V1">1</span>Ruth one.</div>"#,
    )
    .unwrap();

    fs::create_dir_all(root.join("empty")).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/lectio.sqlite"

[server]
bind = "127.0.0.1:{}"

[logging]
level = "warn"
"#,
        root.display(),
        port
    );

    let config_path = config_dir.join("lectio.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn setup_test_env() -> (TempDir, PathBuf) {
    setup_test_env_with_port(7340)
}

fn run_lectio(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = lectio_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run lectio binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn dir_arg(config_path: &Path, name: &str) -> String {
    // config lives in <root>/config/lectio.toml
    let root = config_path.parent().unwrap().parent().unwrap();
    root.join(name).to_str().unwrap().to_string()
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_lectio(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_lectio(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_lectio(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_import_usfm() {
    let (_tmp, config_path) = setup_test_env();
    run_lectio(&config_path, &["init"]);

    let usfm = dir_arg(&config_path, "usfm");
    let (stdout, stderr, success) = run_lectio(
        &config_path,
        &["import", "usfm", &usfm, "test", "human", "--progress", "off"],
    );
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);

    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["verses_imported"], 3);
    assert_eq!(result["books_processed"], 2);
    assert_eq!(result["is_reimport"], false);
    assert_eq!(result["message"], "Imported 3 verses from 2 books");
}

#[test]
fn test_import_twice_reports_updates() {
    let (_tmp, config_path) = setup_test_env();
    run_lectio(&config_path, &["init"]);

    let usfm = dir_arg(&config_path, "usfm");
    run_lectio(&config_path, &["import", "usfm", &usfm, "test"]);
    let (stdout, _, success) = run_lectio(&config_path, &["import", "usfm", &usfm, "test"]);
    assert!(success);

    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["verses_imported"], 0);
    assert_eq!(result["verses_updated"], 3);
    assert_eq!(result["is_reimport"], true);
}

#[test]
fn test_import_html() {
    let (_tmp, config_path) = setup_test_env();
    run_lectio(&config_path, &["init"]);

    let html = dir_arg(&config_path, "html");
    let (stdout, stderr, success) = run_lectio(
        &config_path,
        &["import", "html", &html, "test", "ai", "--language-name", "Test"],
    );
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);

    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["verses_imported"], 1);
    assert_eq!(result["chapters_processed"], 1);
}

#[test]
fn test_import_empty_directory_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_lectio(&config_path, &["init"]);

    let empty = dir_arg(&config_path, "empty");
    let (_, stderr, success) = run_lectio(&config_path, &["import", "usfm", &empty, "test"]);
    assert!(!success, "importing an empty directory should fail");
    assert!(stderr.contains("no verses found"));
}

#[test]
fn test_import_missing_directory_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_lectio(&config_path, &["init"]);

    let (_, stderr, success) = run_lectio(
        &config_path,
        &["import", "html", "/nonexistent/lectio-html", "test"],
    );
    assert!(!success);
    assert!(stderr.contains("directory not found"));
}

#[test]
fn test_import_unknown_translation_type_rejected() {
    let (_tmp, config_path) = setup_test_env();
    let usfm = dir_arg(&config_path, "usfm");
    let (_, _, success) = run_lectio(&config_path, &["import", "usfm", &usfm, "test", "robot"]);
    assert!(!success);
}

#[test]
fn test_read_verify_and_languages() {
    let (_tmp, config_path) = setup_test_env();
    run_lectio(&config_path, &["init"]);
    let usfm = dir_arg(&config_path, "usfm");
    run_lectio(&config_path, &["import", "usfm", &usfm, "test"]);

    let (stdout, stderr, success) = run_lectio(&config_path, &["read", "test", "GEN", "1"]);
    assert!(success, "read failed: {}", stderr);
    assert!(stdout.contains("Genesis 1"));
    assert!(stdout.contains("Text one."));
    assert!(stdout.contains("Text two."));

    let (stdout, stderr, success) =
        run_lectio(&config_path, &["verify", "test", "genesis", "1", "2"]);
    assert!(success, "verify failed: {}", stderr);
    assert!(stdout.contains("\"human_verified\": true"));

    let (_, _, success) = run_lectio(&config_path, &["verify", "test", "genesis", "1", "20"]);
    assert!(!success, "verifying a missing verse should fail");

    let (stdout, _, success) = run_lectio(&config_path, &["languages"]);
    assert!(success);
    assert!(stdout.contains("test"));
    assert!(stdout.contains("33.3%"));

    let (stdout, _, success) = run_lectio(&config_path, &["books", "test"]);
    assert!(success);
    assert!(stdout.contains("Genesis"));
    assert!(stdout.contains("Exodus"));
}

#[test]
fn test_new_language() {
    let (_tmp, config_path) = setup_test_env();
    run_lectio(&config_path, &["init"]);

    let (stdout, stderr, success) = run_lectio(&config_path, &["new-language", "Kope Dialect"]);
    assert!(success, "new-language failed: {}", stderr);
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["created"], true);
    assert_eq!(result["language"]["language_code"], "kope_dialect");

    let (stdout, _, success) = run_lectio(&config_path, &["languages"]);
    assert!(success);
    assert!(stdout.contains("kope_dialect"));

    let (_, _, success) = run_lectio(&config_path, &["new-language", "bad/name"]);
    assert!(!success);
}

#[test]
fn test_read_missing_chapter_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_lectio(&config_path, &["init"]);

    let (_, stderr, success) = run_lectio(&config_path, &["read", "test", "GEN", "1"]);
    assert!(!success);
    assert!(stderr.contains("no human verses"));
}

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

struct ServerGuard(Child);

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

#[test]
fn test_serve_health_and_import() {
    let port = find_free_port();
    let (_tmp, config_path) = setup_test_env_with_port(port);
    run_lectio(&config_path, &["init"]);

    let child = Command::new(lectio_binary())
        .arg("--config")
        .arg(&config_path)
        .arg("serve")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    let _guard = ServerGuard(child);

    let client = reqwest::blocking::Client::new();
    let base = format!("http://127.0.0.1:{}", port);
    let mut ready = false;
    for _ in 0..50 {
        std::thread::sleep(std::time::Duration::from_millis(100));
        if let Ok(resp) = client.get(format!("{}/health", base)).send() {
            if resp.status().is_success() {
                let body: serde_json::Value = resp.json().unwrap();
                assert_eq!(body["status"], "ok");
                ready = true;
                break;
            }
        }
    }
    assert!(ready, "Server did not become ready within 5 seconds");

    let resp = client
        .post(format!("{}/import-html-bible", base))
        .json(&serde_json::json!({
            "language_code": "Test",
            "language_name": "Test",
            "html_directory": dir_arg(&config_path, "html"),
            "translation_type": "human"
        }))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["language_code"], "test");
    assert_eq!(body["chapters_processed"], 1);

    let resp = client
        .get(format!("{}/verses/test/ruth/1", base))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["verses"][0]["text"], "Ruth one.");
}
