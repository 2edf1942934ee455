use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_config(dir: &Path, blog_url: &str, native_editor: bool) -> std::path::PathBuf {
    let config = format!(
        r#"settings_path = "{settings}"

[http.retry]
max_attempts = 1

[features]
native_editor = {native_editor}

[[blogs]]
name = "personal"
url = "{blog_url}"
username = "admin"
password = "secret"
"#,
        settings = dir.join("editor.json").display(),
        native_editor = native_editor,
        blog_url = blog_url,
    );
    let path = dir.join("wpsync.toml");
    std::fs::write(&path, config).unwrap();
    path
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("wpsync")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("post-formats"))
        .stdout(predicate::str::contains("metadata"))
        .stdout(predicate::str::contains("editor"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempdir().unwrap();

    Command::cargo_bin("wpsync")
        .unwrap()
        .args(["-c"])
        .arg(dir.path().join("nope.toml"))
        .args(["categories", "personal"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_unknown_blog_fails() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "https://example.org", false);

    Command::cargo_bin("wpsync")
        .unwrap()
        .arg("-c")
        .arg(&config)
        .args(["options", "elsewhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown blog: elsewhere"));
}

#[test]
fn test_editor_preferences_persist() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "https://example.org", true);

    Command::cargo_bin("wpsync")
        .unwrap()
        .arg("-c")
        .arg(&config)
        .args(["editor", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""visual_editor_enabled": true"#))
        .stdout(predicate::str::contains(r#""native_editor_enabled": false"#));

    Command::cargo_bin("wpsync")
        .unwrap()
        .arg("-c")
        .arg(&config)
        .args(["editor", "set", "--visual", "false", "--native", "true"])
        .assert()
        .success();

    let output = Command::cargo_bin("wpsync")
        .unwrap()
        .arg("-c")
        .arg(&config)
        .args(["editor", "show"])
        .output()
        .unwrap();
    let preferences: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(preferences["visual_editor_enabled"], false);
    assert_eq!(preferences["native_editor_enabled"], true);
    assert!(dir.path().join("editor.json").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_post_formats_over_xmlrpc() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/xmlrpc.php"))
        .and(body_string_contains("<methodName>wp.getPostFormats</methodName>"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<?xml version=\"1.0\"?><methodResponse><params><param><value><struct>\
               <member><name>video</name><value><string>Video</string></value></member>\
             </struct></value></param></params></methodResponse>",
            "text/xml",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri(), false);

    let output = tokio::task::spawn_blocking(move || {
        Command::cargo_bin("wpsync")
            .unwrap()
            .arg("-c")
            .arg(&config)
            .args(["post-formats", "personal"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let formats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(formats["video"], "Video");
    assert_eq!(formats["standard"], "Standard");
}
