use pretty_assertions::assert_eq;

use super::*;

const MINIMAL: &str = r#"
[repo]
remote_url = "https://git.example.com/team/demo.git"
"#;

#[test]
fn test_parse_minimal_applies_defaults() {
    let config = SessionConfig::parse(MINIMAL, "test").expect("parse");
    let setup = config.resolve();

    assert_eq!(setup.repo.name, "demo");
    assert_eq!(setup.repo.branch, "main");
    assert!(setup.allowlist.is_empty());
    assert_eq!(setup.limits.max_output_bytes, DEFAULT_MAX_OUTPUT_BYTES);
    assert_eq!(setup.limits.max_output_lines, DEFAULT_MAX_OUTPUT_LINES);
    assert_eq!(setup.limits.timeout_secs, Some(DEFAULT_TIMEOUT_SECS));
}

#[test]
fn test_explicit_name_wins_over_derived() {
    let text = r#"
[repo]
name = "frontend"
remote_url = "https://git.example.com/team/demo.git"
branch = "release"
"#;
    let setup = SessionConfig::parse(text, "test").expect("parse").resolve();
    assert_eq!(setup.repo.name, "frontend");
    assert_eq!(setup.repo.branch, "release");
}

#[test]
fn test_zero_timeout_means_unbounded() {
    let text = r#"
[repo]
remote_url = "https://git.example.com/demo.git"

[limits]
timeout_secs = 0
"#;
    let setup = SessionConfig::parse(text, "test").expect("parse").resolve();
    assert_eq!(setup.limits.timeout_secs, None);
}

#[test]
fn test_remote_url_without_scheme_is_rejected() {
    let text = r#"
[repo]
remote_url = "git.example.com/demo.git"
"#;
    let err = SessionConfig::parse(text, "test").expect_err("must fail");
    assert!(matches!(err, ConfigError::InvalidRemoteUrl(_)));
}

#[test]
fn test_non_http_allowlist_entry_is_rejected() {
    let text = r#"
allowlist = ["ftp://mirror.example.com/"]

[repo]
remote_url = "https://git.example.com/demo.git"
"#;
    let err = SessionConfig::parse(text, "test").expect_err("must fail");
    assert!(matches!(err, ConfigError::InvalidAllowlistEntry(_)));
}

#[test]
fn test_non_positive_budget_is_rejected() {
    let text = r#"
[repo]
remote_url = "https://git.example.com/demo.git"

[limits]
max_output_lines = 0
"#;
    let err = SessionConfig::parse(text, "test").expect_err("must fail");
    assert!(matches!(
        err,
        ConfigError::InvalidLimit {
            field: "max_output_lines",
            ..
        }
    ));
}

#[test]
fn test_load_reads_file_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.toml");
    std::fs::write(&path, MINIMAL).expect("write");

    let config = SessionConfig::load(&path).expect("load");
    assert_eq!(config.repo.branch, "main");
}

#[test]
fn test_load_missing_file_is_not_found() {
    let err = SessionConfig::load(Path::new("/nonexistent/session.toml")).expect_err("must fail");
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[test]
fn test_bad_toml_reports_origin() {
    let err = SessionConfig::parse("repo = ", "bad.toml").expect_err("must fail");
    match err {
        ConfigError::InvalidToml { file, .. } => assert_eq!(file, "bad.toml"),
        other => panic!("unexpected error: {other}"),
    }
}
