//! Adapts the repository engine to the overlay's projection interface.
//!
//! The overlay wants a [`RepoSnapshot`]; the engine already knows how to
//! list and read trees. This wrapper is the only place the two vocabularies
//! meet, so repository content shown through the filesystem and through
//! `git` always comes from the same source.

use std::sync::Arc;

use async_trait::async_trait;

use crate::engine::RepoEngine;
use sandbar_overlay::OverlayError;
use sandbar_overlay::RepoSnapshot;
use sandbar_protocol::DirEntry;

/// A [`RepoSnapshot`] backed by [`RepoEngine`] tree reads.
#[derive(Clone)]
pub struct EngineProjection {
    engine: Arc<dyn RepoEngine>,
}

impl EngineProjection {
    pub fn new(engine: Arc<dyn RepoEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl RepoSnapshot for EngineProjection {
    async fn read_file(
        &self,
        branch: &str,
        path: &str,
    ) -> sandbar_overlay::Result<Option<Vec<u8>>> {
        self.engine
            .read_repo_file(branch, path)
            .await
            .map_err(|e| OverlayError::Snapshot(e.to_string()))
    }

    async fn read_dir(
        &self,
        branch: &str,
        path: &str,
    ) -> sandbar_overlay::Result<Option<Vec<DirEntry>>> {
        self.engine
            .list_repo_files(branch, path)
            .await
            .map_err(|e| OverlayError::Snapshot(e.to_string()))
    }
}
