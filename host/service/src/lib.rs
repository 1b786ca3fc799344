//! Host service: the privileged context of a session.
//!
//! The shell never touches storage or the repository itself; every side
//! effect crosses the channel as a request and is serviced here. This
//! crate provides:
//!
//! - [`HostService`]: the loop owning the overlay, git handler, and
//!   session branch, answering fs/git requests and relaying output.
//! - [`spawn_session`]: one-call wiring of a shell worker and a host
//!   service into a running session.

pub mod service;
pub mod topology;

pub use service::HostService;
pub use topology::SessionHandles;
pub use topology::spawn_session;
