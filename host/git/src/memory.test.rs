use pretty_assertions::assert_eq;

use super::MemoryEngine;
use super::pseudo_sha;
use crate::engine::EngineError;
use crate::engine::RepoEngine;
use sandbar_protocol::NodeKind;

const REMOTE: &str = "https://git.example.com/team/demo.git";

fn seeded() -> MemoryEngine {
    let engine = MemoryEngine::new(REMOTE);
    engine.set_valid_token("good");
    engine.seed_commit(
        "main",
        "Ada Lovelace <ada@example.com>",
        "Mon Jul 21 10:12:00 2025 +0000",
        "initial import",
        &[
            ("/README.md", "# demo\n"),
            ("/src/lib.rs", "pub fn demo() {}\n"),
            ("/src/bin/main.rs", "fn main() {}\n"),
        ],
    );
    engine
}

#[test]
fn pseudo_shas_are_distinct_forty_digit_hex() {
    let mut seed = 0x5eed;
    let first = pseudo_sha(&mut seed);
    let second = pseudo_sha(&mut seed);
    assert_eq!(first.len(), 40);
    assert_eq!(second.len(), 40);
    assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(first, second);
}

#[tokio::test]
async fn history_is_newest_first() {
    let engine = seeded();
    let second = engine.seed_commit(
        "main",
        "Ada Lovelace <ada@example.com>",
        "Tue Jul 22 09:00:00 2025 +0000",
        "second",
        &[],
    );
    let history = engine.history("main", 10).await.expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second);
    assert_eq!(history[0].message, "second");
    assert_eq!(history[1].message, "initial import");

    let one = engine.history("main", 1).await.expect("history");
    assert_eq!(one.len(), 1);
}

#[tokio::test]
async fn commit_detail_resolves_ids_and_branch_heads() {
    let engine = MemoryEngine::new(REMOTE);
    let id = engine.seed_commit(
        "main",
        "Ada Lovelace <ada@example.com>",
        "Mon Jul 21 10:12:00 2025 +0000",
        "initial import",
        &[("/README.md", "# demo\n")],
    );

    let by_id = engine.commit_detail(&id).await.expect("by id");
    assert_eq!(by_id.info.message, "initial import");
    assert_eq!(by_id.files, vec!["/README.md".to_string()]);

    let by_branch = engine.commit_detail("main").await.expect("by branch");
    assert_eq!(by_branch.info.id, id);

    let missing = engine.commit_detail("deadbeef").await;
    assert_eq!(
        missing,
        Err(EngineError::UnknownRevision("deadbeef".to_string()))
    );
}

#[tokio::test]
async fn tree_listing_is_one_level_deep() {
    let engine = seeded();
    engine.seed_commit(
        "empty",
        "Ada Lovelace <ada@example.com>",
        "Mon Jul 21 10:12:00 2025 +0000",
        "empty branch",
        &[],
    );

    let root = engine
        .list_repo_files("main", "/")
        .await
        .expect("list")
        .expect("root is a directory");
    let names: Vec<(String, NodeKind)> = root
        .into_iter()
        .map(|entry| (entry.name, entry.kind))
        .collect();
    assert_eq!(
        names,
        vec![
            ("README.md".to_string(), NodeKind::File),
            ("src".to_string(), NodeKind::Dir),
        ]
    );

    let src = engine
        .list_repo_files("main", "/src")
        .await
        .expect("list")
        .expect("src is a directory");
    let names: Vec<(String, NodeKind)> = src
        .into_iter()
        .map(|entry| (entry.name, entry.kind))
        .collect();
    assert_eq!(
        names,
        vec![
            ("bin".to_string(), NodeKind::Dir),
            ("lib.rs".to_string(), NodeKind::File),
        ]
    );

    // A file path is not a directory; neither is a missing one.
    assert_eq!(engine.list_repo_files("main", "/src/lib.rs").await, Ok(None));
    assert_eq!(engine.list_repo_files("main", "/ghost").await, Ok(None));
    // The root of an empty branch lists as empty rather than missing.
    assert_eq!(engine.list_repo_files("empty", "/").await, Ok(Some(Vec::new())));
}

#[tokio::test]
async fn file_reads_honor_the_refspec() {
    let engine = MemoryEngine::new(REMOTE);
    let first = engine.seed_commit(
        "main",
        "Ada Lovelace <ada@example.com>",
        "Mon Jul 21 10:12:00 2025 +0000",
        "one",
        &[("/a.txt", "one\n")],
    );
    engine.seed_commit(
        "main",
        "Ada Lovelace <ada@example.com>",
        "Tue Jul 22 09:00:00 2025 +0000",
        "two",
        &[("/a.txt", "two\n")],
    );

    let head = engine.read_repo_file("main", "/a.txt").await.expect("read");
    assert_eq!(head, Some(b"two\n".to_vec()));
    // The older commit keeps the tree it was created with.
    let old = engine.read_repo_file(&first, "/a.txt").await.expect("read");
    assert_eq!(old, Some(b"one\n".to_vec()));

    assert_eq!(engine.read_repo_file("main", "/b.txt").await, Ok(None));
    assert_eq!(engine.read_repo_file("nope", "/a.txt").await, Ok(None));
}

#[tokio::test]
async fn file_existence_distinguishes_path_from_revision() {
    let engine = seeded();
    assert_eq!(
        engine.file_exists_at_commit("main", "/README.md").await,
        Ok(true)
    );
    assert_eq!(
        engine.file_exists_at_commit("main", "/ghost.txt").await,
        Ok(false)
    );
    assert_eq!(
        engine.file_exists_at_commit("deadbeef", "/README.md").await,
        Err(EngineError::UnknownRevision("deadbeef".to_string()))
    );
}

#[tokio::test]
async fn patches_commit_on_the_branch_and_record_their_files() {
    let engine = seeded();
    let patch = "--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1 +1,2 @@\n pub fn demo() {}\n+pub fn more() {}\n";
    let commit = engine
        .apply_patch_and_push("main", patch, "add more", "good")
        .await
        .expect("commit");

    let history = engine.history("main", 1).await.expect("history");
    assert_eq!(history[0].id, commit.id);
    assert_eq!(history[0].message, "add more");

    let detail = engine.commit_detail(&commit.id).await.expect("detail");
    assert_eq!(detail.files, vec!["/src/lib.rs".to_string()]);
}

#[tokio::test]
async fn every_presented_token_is_recorded() {
    let engine = seeded();
    let rejected = engine
        .apply_patch_and_push("main", "+++ b/x\n", "x", "bad")
        .await;
    assert_eq!(
        rejected,
        Err(EngineError::Auth {
            reason: "token rejected by remote".to_string()
        })
    );
    engine
        .apply_patch_and_push("main", "+++ b/x\n", "x", "good")
        .await
        .expect("commit");
    assert_eq!(
        engine.attempted_tokens(),
        vec!["bad".to_string(), "good".to_string()]
    );
}

#[tokio::test]
async fn push_preflight_refusals_come_before_the_token_check() {
    let engine = seeded();
    engine.set_dirty(&["/src/lib.rs"]);
    engine.set_behind(1);
    engine.set_diverged(true);

    assert_eq!(
        engine.safe_push("main", false, "good").await,
        Err(EngineError::DirtyWorkTree)
    );
    engine.set_dirty(&[]);
    assert_eq!(
        engine.safe_push("main", false, "good").await,
        Err(EngineError::BranchBehind)
    );
    engine.set_behind(0);
    assert_eq!(
        engine.safe_push("main", false, "good").await,
        Err(EngineError::HistoryRewrite)
    );
    // Preflight refusals never present the token.
    assert!(engine.attempted_tokens().is_empty());

    engine.set_ahead(2);
    let summary = engine.safe_push("main", true, "good").await.expect("push");
    assert_eq!(summary.remote, REMOTE);
    assert_eq!(summary.branch, "main");
    assert_eq!(summary.commits, 2);

    // The forced push settled the divergence and the unpushed commits.
    let status = engine.status("main").await.expect("status");
    assert_eq!(status.ahead, 0);
    assert_eq!(
        engine.safe_push("main", false, "good").await.map(|s| s.commits),
        Ok(0)
    );
}

#[tokio::test]
async fn sync_reports_how_many_commits_arrived() {
    let engine = seeded();
    engine.set_behind(3);
    let sync = engine.sync_with_remote("main", "good").await.expect("sync");
    assert!(sync.updated);
    assert_eq!(sync.commits, 3);

    let again = engine.sync_with_remote("main", "good").await.expect("sync");
    assert!(!again.updated);
    assert_eq!(again.commits, 0);
}

#[tokio::test]
async fn operations_require_a_known_branch() {
    let engine = seeded();
    assert_eq!(
        engine.status("ghost").await,
        Err(EngineError::UnknownBranch("ghost".to_string()))
    );
    assert_eq!(
        engine.history("ghost", 1).await,
        Err(EngineError::UnknownBranch("ghost".to_string()))
    );
    assert_eq!(
        engine.safe_push("ghost", false, "good").await,
        Err(EngineError::UnknownBranch("ghost".to_string()))
    );
}
