//! Session configuration for the sandboxed shell.
//!
//! A session is described by a small TOML file (or built in code) naming the
//! repository, the outbound fetch allowlist, and the output budgets:
//!
//! ```toml
//! [repo]
//! remote_url = "https://git.example.com/team/demo.git"
//! branch = "main"
//!
//! allowlist = ["https://crates.io/", "https://static.crates.io/"]
//!
//! [limits]
//! max_output_bytes = 200000
//! max_output_lines = 1000
//! timeout_secs = 120
//! ```
//!
//! [`SessionConfig::resolve`] validates the file and turns it into the
//! wire-level [`sandbar_protocol::SessionSetup`] with defaults applied.

pub mod error;
pub mod session;

pub use error::ConfigError;
pub use error::Result;
pub use session::LimitsConfig;
pub use session::RepoConfig;
pub use session::SessionConfig;
