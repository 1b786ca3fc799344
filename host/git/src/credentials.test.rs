use std::sync::Arc;
use std::sync::Mutex;

use pretty_assertions::assert_eq;

use super::Credential;
use super::CredentialError;
use super::StaticCredentials;
use super::host_matches;
use super::try_each_credential;
use crate::engine::EngineError;

fn store(pairs: &[(&str, &str)]) -> StaticCredentials {
    StaticCredentials::new(
        pairs
            .iter()
            .map(|(host, token)| Credential {
                host: host.to_string(),
                token: token.to_string(),
            })
            .collect(),
    )
}

#[test]
fn identical_hosts_match() {
    assert!(host_matches("git.example.com", "git.example.com"));
}

#[test]
fn subdomain_requests_match_a_parent_entry() {
    assert!(host_matches("example.com", "git.example.com"));
    assert!(host_matches("example.com", "deep.git.example.com"));
}

#[test]
fn suffix_without_a_dot_boundary_does_not_match() {
    assert!(!host_matches("example.com", "badexample.com"));
    assert!(!host_matches("git.example.com", "example.com"));
}

#[tokio::test]
async fn no_matching_credentials_is_its_own_error() {
    let store = store(&[("other.io", "t1")]);
    let outcome: Result<(), _> = try_each_credential(&store, "git.example.com", |_token| async {
        Ok(())
    })
    .await;
    assert_eq!(
        outcome,
        Err(CredentialError::NoCredentials {
            host: "git.example.com".to_string()
        })
    );
}

#[tokio::test]
async fn attempts_run_in_store_order_until_one_succeeds() {
    let store = store(&[
        ("example.com", "bad-1"),
        ("git.example.com", "bad-2"),
        ("example.com", "good"),
    ]);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let outcome = {
        let seen = seen.clone();
        try_each_credential(&store, "git.example.com", move |token| {
            let seen = seen.clone();
            async move {
                seen.lock().expect("lock").push(token.clone());
                if token == "good" {
                    Ok("pushed")
                } else {
                    Err(EngineError::Auth {
                        reason: "token rejected".to_string(),
                    })
                }
            }
        })
        .await
    };
    assert_eq!(outcome, Ok("pushed"));
    assert_eq!(
        *seen.lock().expect("lock"),
        vec!["bad-1".to_string(), "bad-2".to_string(), "good".to_string()]
    );
}

#[tokio::test]
async fn exhausted_credentials_keep_every_failure_reason() {
    let store = store(&[("example.com", "bad-1"), ("example.com", "bad-2")]);
    let outcome: Result<(), _> =
        try_each_credential(&store, "git.example.com", |token| async move {
            Err(EngineError::Auth {
                reason: format!("remote refused {token}"),
            })
        })
        .await;
    match outcome {
        Err(CredentialError::AllRejected { host, attempts }) => {
            assert_eq!(host, "git.example.com");
            assert_eq!(attempts.len(), 2);
            assert_eq!(
                attempts[0].reason,
                "authentication failed: remote refused bad-1"
            );
            assert_eq!(
                attempts[1].reason,
                "authentication failed: remote refused bad-2"
            );
        }
        other => panic!("expected AllRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn non_auth_errors_abort_the_retry() {
    let store = store(&[("example.com", "t1"), ("example.com", "t2")]);
    let seen = Arc::new(Mutex::new(0u32));
    let outcome: Result<(), _> = {
        let seen = seen.clone();
        try_each_credential(&store, "git.example.com", move |_token| {
            let seen = seen.clone();
            async move {
                *seen.lock().expect("lock") += 1;
                Err(EngineError::DirtyWorkTree)
            }
        })
        .await
    };
    assert_eq!(
        outcome,
        Err(CredentialError::Engine(EngineError::DirtyWorkTree))
    );
    // The second credential was never tried.
    assert_eq!(*seen.lock().expect("lock"), 1);
}
