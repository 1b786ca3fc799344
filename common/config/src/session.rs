//! Session configuration types and loading.
//!
//! These types mirror the TOML file layout. [`SessionConfig::resolve`]
//! applies defaults and produces the wire-level
//! [`sandbar_protocol::SessionSetup`] the host sends in its `configure`
//! envelope.

use std::path::Path;

use sandbar_protocol::OutputLimits;
use sandbar_protocol::RepoRef;
use sandbar_protocol::SessionSetup;
use sandbar_protocol::limits::DEFAULT_MAX_OUTPUT_BYTES;
use sandbar_protocol::limits::DEFAULT_MAX_OUTPUT_LINES;
use sandbar_protocol::limits::DEFAULT_TIMEOUT_SECS;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;
use crate::error::Result;

/// The `[repo]` section.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RepoConfig {
    /// Display name. Defaults to the last path segment of the remote URL
    /// with any `.git` suffix removed.
    #[serde(default)]
    pub name: Option<String>,

    /// Remote URL. Must carry a scheme; also the source of the credential
    /// host for authenticated git operations.
    pub remote_url: String,

    /// Branch the read-only repository projection is pinned to.
    #[serde(default = "default_branch")]
    pub branch: String,
}

fn default_branch() -> String {
    "main".to_string()
}

/// The `[limits]` section.
///
/// ```toml
/// [limits]
/// max_output_bytes = 200000
/// max_output_lines = 1000
/// timeout_secs = 120
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LimitsConfig {
    /// Combined stdout+stderr byte budget per command.
    #[serde(default)]
    pub max_output_bytes: Option<i64>,

    /// Combined stdout+stderr line budget per command.
    #[serde(default)]
    pub max_output_lines: Option<i64>,

    /// Wall-clock ceiling per command in seconds. `0` removes the ceiling
    /// entirely; absent uses the default.
    #[serde(default)]
    pub timeout_secs: Option<i64>,
}

/// Top-level session configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// The repository this session works against.
    pub repo: RepoConfig,

    /// Outbound URL prefixes fetches may target. Empty means no allowlist
    /// is configured.
    #[serde(default)]
    pub allowlist: Vec<String>,

    /// Output and time budgets.
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl SessionConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let origin = path.display().to_string();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(origin));
        }
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, &origin)
    }

    /// Parse and validate TOML text. `origin` names the source in errors.
    pub fn parse(text: &str, origin: &str) -> Result<Self> {
        let config: SessionConfig = toml::from_str(text).map_err(|e| ConfigError::InvalidToml {
            file: origin.to_string(),
            error: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check structural rules: remote URL has a scheme, allowlist entries
    /// are http(s) prefixes, budgets are in range.
    pub fn validate(&self) -> Result<()> {
        match self.repo.remote_url.split_once("://") {
            Some((scheme, rest)) if !scheme.is_empty() && !rest.is_empty() => {}
            _ => {
                return Err(ConfigError::InvalidRemoteUrl(self.repo.remote_url.clone()));
            }
        }
        for entry in &self.allowlist {
            if !entry.starts_with("https://") && !entry.starts_with("http://") {
                return Err(ConfigError::InvalidAllowlistEntry(entry.clone()));
            }
        }
        if let Some(v) = self.limits.max_output_bytes
            && v <= 0
        {
            return Err(ConfigError::InvalidLimit {
                field: "max_output_bytes",
                value: v,
            });
        }
        if let Some(v) = self.limits.max_output_lines
            && v <= 0
        {
            return Err(ConfigError::InvalidLimit {
                field: "max_output_lines",
                value: v,
            });
        }
        if let Some(v) = self.limits.timeout_secs
            && v < 0
        {
            return Err(ConfigError::InvalidLimit {
                field: "timeout_secs",
                value: v,
            });
        }
        Ok(())
    }

    /// Apply defaults and produce the wire-level session setup.
    pub fn resolve(&self) -> SessionSetup {
        let timeout_secs = match self.limits.timeout_secs {
            Some(0) => None,
            Some(v) => Some(v),
            None => Some(DEFAULT_TIMEOUT_SECS),
        };
        SessionSetup {
            repo: RepoRef {
                name: self.repo_name(),
                remote_url: self.repo.remote_url.clone(),
                branch: self.repo.branch.clone(),
            },
            allowlist: self.allowlist.clone(),
            limits: OutputLimits {
                max_output_bytes: self
                    .limits
                    .max_output_bytes
                    .unwrap_or(DEFAULT_MAX_OUTPUT_BYTES),
                max_output_lines: self
                    .limits
                    .max_output_lines
                    .unwrap_or(DEFAULT_MAX_OUTPUT_LINES),
                timeout_secs,
            },
        }
    }

    fn repo_name(&self) -> String {
        if let Some(name) = &self.repo.name {
            return name.clone();
        }
        let tail = self
            .repo
            .remote_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        let tail = tail.strip_suffix(".git").unwrap_or(tail);
        if tail.is_empty() {
            "repo".to_string()
        } else {
            tail.to_string()
        }
    }
}

#[cfg(test)]
#[path = "session.test.rs"]
mod tests;
