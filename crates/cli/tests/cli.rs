use assert_cmd::Command;

fn bookshelf() -> Command {
    let mut cmd = Command::cargo_bin("bookshelf").unwrap();
    cmd.env_remove("BOOKSHELF_ENV")
        .env("BOOKSHELF_CONFIG_DIR", "/nonexistent/bookshelf-config")
        .env("BOOKSHELF_DATABASE__BACKEND", "memory")
        .env("RUST_LOG", "error");
    cmd
}

#[test]
fn config_redacts_password() {
    let output = bookshelf()
        .arg("config")
        .env("DB_USER", "shelf-reader")
        .env("DB_PASS", "hunter2")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("virtualBook"));
    assert!(stdout.contains("shelf-reader"));
    assert!(!stdout.contains("hunter2"));
}

#[test]
fn stats_on_empty_memory_store() {
    let output = bookshelf().arg("stats").output().unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["stats"]["bookCount"], 0);
    assert_eq!(report["stats"]["userCount"], 0);
    assert_eq!(report["stats"]["reviewCount"], 0);
    assert_eq!(report["topReviewers"], serde_json::json!([]));
}

#[test]
fn rejects_unknown_environment() {
    let output = bookshelf()
        .arg("config")
        .env("BOOKSHELF_ENV", "qa")
        .output()
        .unwrap();

    assert!(!output.status.success());
}
