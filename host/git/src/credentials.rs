//! Credential selection and retry.
//!
//! The store is an external collaborator: a read-only list of
//! `{host, token}` pairs. For any operation that authenticates to a
//! remote, every stored credential matching the target host is attempted
//! in store order. Auth rejections are non-fatal until the list runs out;
//! any other engine error aborts the retry immediately, because presenting
//! a different token cannot change a preflight refusal.

use std::future::Future;

use thiserror::Error;
use tracing::debug;

use crate::engine::EngineError;

/// One stored credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Host the token belongs to, e.g. `git.example.com` or `example.com`.
    pub host: String,
    /// The bearer token.
    pub token: String,
}

/// Read-only access to the session's stored credentials.
pub trait CredentialStore: Send + Sync {
    /// All credentials, in the order they should be attempted.
    fn credentials(&self) -> Vec<Credential>;
}

/// A fixed credential list.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    entries: Vec<Credential>,
}

impl StaticCredentials {
    pub fn new(entries: Vec<Credential>) -> Self {
        Self { entries }
    }
}

impl CredentialStore for StaticCredentials {
    fn credentials(&self) -> Vec<Credential> {
        self.entries.clone()
    }
}

/// One rejected credential, kept for the aggregate error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    /// Host the rejected credential was stored under.
    pub credential_host: String,
    /// Why the attempt failed.
    pub reason: String,
}

/// Outcome of a credential-backed operation that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// The store holds nothing for this host.
    #[error("no credentials stored for host '{host}'")]
    NoCredentials {
        /// The host that had no match.
        host: String,
    },
    /// Every matching credential was individually rejected.
    #[error("all credentials for host '{host}' were rejected")]
    AllRejected {
        /// The host whose credentials all failed.
        host: String,
        /// The failures, in attempt order.
        attempts: Vec<AttemptFailure>,
    },
    /// The operation failed for a reason no credential can fix.
    #[error(transparent)]
    Engine(EngineError),
}

/// Whether a stored host covers a request host: identical, or the request
/// host is a subdomain of the stored one.
pub fn host_matches(stored: &str, request: &str) -> bool {
    request == stored || request.ends_with(&format!(".{stored}"))
}

/// Run `attempt` with each matching credential in order until one
/// succeeds.
pub async fn try_each_credential<T, F, Fut>(
    store: &dyn CredentialStore,
    host: &str,
    mut attempt: F,
) -> Result<T, CredentialError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    let matching: Vec<Credential> = store
        .credentials()
        .into_iter()
        .filter(|credential| host_matches(&credential.host, host))
        .collect();
    if matching.is_empty() {
        return Err(CredentialError::NoCredentials {
            host: host.to_string(),
        });
    }

    let mut attempts = Vec::new();
    for credential in matching {
        match attempt(credential.token).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_auth() => {
                debug!(host = %credential.host, "credential rejected, trying next");
                attempts.push(AttemptFailure {
                    credential_host: credential.host,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(CredentialError::Engine(e)),
        }
    }
    Err(CredentialError::AllRejected {
        host: host.to_string(),
        attempts,
    })
}

#[cfg(test)]
#[path = "credentials.test.rs"]
mod tests;
