use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::GitHandler;
use super::GitSession;
use super::host_of;
use crate::credentials::Credential;
use crate::credentials::StaticCredentials;
use crate::engine::RepoEngine;
use crate::memory::MemoryEngine;
use crate::projection::EngineProjection;
use sandbar_overlay::Overlay;
use sandbar_protocol::GitReply;

const REMOTE: &str = "https://git.example.com/team/demo.git";

struct Fixture {
    engine: Arc<MemoryEngine>,
    handler: GitHandler,
    session: GitSession,
    overlay: Overlay,
}

impl Fixture {
    /// One seeded commit on `main`, credentials as given; the engine
    /// accepts only the token named `good`.
    fn with_tokens(tokens: &[(&str, &str)]) -> Self {
        let engine = Arc::new(MemoryEngine::new(REMOTE));
        engine.set_valid_token("good");
        engine.seed_commit(
            "main",
            "Ada Lovelace <ada@example.com>",
            "Mon Jul 21 10:12:00 2025 +0000",
            "initial import",
            &[
                ("/README.md", "# demo\n"),
                ("/src/lib.rs", "pub fn demo() {}\n"),
            ],
        );
        let credentials = StaticCredentials::new(
            tokens
                .iter()
                .map(|(host, token)| Credential {
                    host: host.to_string(),
                    token: token.to_string(),
                })
                .collect(),
        );
        let handler = GitHandler::new(engine.clone(), Arc::new(credentials), REMOTE);
        let overlay = Overlay::new(Arc::new(EngineProjection::new(engine.clone())), "main");
        Self {
            engine,
            handler,
            session: GitSession::new("main"),
            overlay,
        }
    }

    fn new() -> Self {
        Self::with_tokens(&[("git.example.com", "good")])
    }

    async fn run(&mut self, args: &[&str]) -> GitReply {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        self.handler
            .handle(&mut self.session, &mut self.overlay, &args)
            .await
    }
}

#[tokio::test]
async fn status_on_a_clean_tree() {
    let mut f = Fixture::new();
    let reply = f.run(&["status"]).await;
    assert_eq!(reply.code, 0);
    assert_eq!(
        reply.stdout,
        vec![
            "On branch main".to_string(),
            "nothing to commit, working tree clean".to_string(),
        ]
    );
}

#[tokio::test]
async fn status_reports_divergence_and_dirt() {
    let mut f = Fixture::new();
    f.engine.set_dirty(&["/src/lib.rs"]);
    f.engine.set_ahead(1);
    f.engine.set_behind(2);
    let reply = f.run(&["status"]).await;
    assert_eq!(reply.code, 0);
    assert_eq!(
        reply.stdout,
        vec![
            "On branch main".to_string(),
            "Your branch is behind 'origin/main' by 2 commit(s).".to_string(),
            "Your branch is ahead of 'origin/main' by 1 commit(s).".to_string(),
            "Changes not staged for commit:".to_string(),
            "        modified:   /src/lib.rs".to_string(),
        ]
    );
}

#[tokio::test]
async fn log_formats_commits_newest_first() {
    let mut f = Fixture::new();
    let second = f.engine.seed_commit(
        "main",
        "Ada Lovelace <ada@example.com>",
        "Tue Jul 22 09:00:00 2025 +0000",
        "add demo function",
        &[("/src/lib.rs", "pub fn demo() -> u8 { 1 }\n")],
    );
    let reply = f.run(&["log"]).await;
    assert_eq!(reply.code, 0);
    assert_eq!(reply.stdout[0], format!("commit {second}"));
    assert_eq!(
        reply.stdout[1],
        "Author: Ada Lovelace <ada@example.com>".to_string()
    );
    assert_eq!(reply.stdout[2], "Date:   Tue Jul 22 09:00:00 2025 +0000");
    assert_eq!(reply.stdout[3], "");
    assert_eq!(reply.stdout[4], "    add demo function");
    // Blank separator, then the older commit.
    assert_eq!(reply.stdout[5], "");
    assert!(reply.stdout[6].starts_with("commit "));
}

#[tokio::test]
async fn log_depth_flag_limits_output() {
    let mut f = Fixture::new();
    f.engine.seed_commit(
        "main",
        "Ada Lovelace <ada@example.com>",
        "Tue Jul 22 09:00:00 2025 +0000",
        "second",
        &[],
    );
    let reply = f.run(&["log", "-n", "1"]).await;
    let commits = reply
        .stdout
        .iter()
        .filter(|line| line.starts_with("commit "))
        .count();
    assert_eq!(commits, 1);
}

#[tokio::test]
async fn log_rejects_a_bad_depth() {
    let mut f = Fixture::new();
    let reply = f.run(&["log", "-n", "zero"]).await;
    assert_eq!(reply.code, 2);
    assert_eq!(reply.stderr, vec!["usage: git log [-n N]".to_string()]);
}

#[tokio::test]
async fn show_defaults_to_the_branch_head() {
    let mut f = Fixture::new();
    let reply = f.run(&["show"]).await;
    assert_eq!(reply.code, 0);
    assert!(reply.stdout[0].starts_with("commit "));
    assert_eq!(reply.stdout[4], "    initial import");
    // Touched files follow after a separator.
    assert!(reply.stdout.contains(&"/README.md".to_string()));
}

#[tokio::test]
async fn show_rev_path_prints_the_file_at_that_revision() {
    let mut f = Fixture::new();
    let reply = f.run(&["show", "main:README.md"]).await;
    assert_eq!(reply.code, 0);
    assert_eq!(reply.stdout, vec!["# demo".to_string()]);
}

#[tokio::test]
async fn show_rev_path_fails_for_a_path_missing_at_that_revision() {
    let mut f = Fixture::new();
    let reply = f.run(&["show", "main:missing.txt"]).await;
    assert_eq!(reply.code, 1);
    assert_eq!(
        reply.stderr,
        vec!["fatal: path 'missing.txt' does not exist in 'main'".to_string()]
    );
}

#[tokio::test]
async fn show_unknown_revision_fails() {
    let mut f = Fixture::new();
    let reply = f.run(&["show", "deadbeef"]).await;
    assert_eq!(reply.code, 1);
    assert_eq!(
        reply.stderr,
        vec!["error: unknown revision 'deadbeef'".to_string()]
    );
}

#[tokio::test]
async fn diff_lists_dirty_paths_in_name_status_form() {
    let mut f = Fixture::new();
    f.engine.set_dirty(&["/src/lib.rs", "/README.md"]);
    let reply = f.run(&["diff"]).await;
    assert_eq!(reply.code, 0);
    assert_eq!(
        reply.stdout,
        vec!["M\t/src/lib.rs".to_string(), "M\t/README.md".to_string()]
    );
}

#[tokio::test]
async fn branch_marks_the_current_branch() {
    let mut f = Fixture::new();
    f.engine.seed_commit(
        "feature",
        "Ada Lovelace <ada@example.com>",
        "Tue Jul 22 09:00:00 2025 +0000",
        "start feature",
        &[("/feature.txt", "wip\n")],
    );
    let reply = f.run(&["branch"]).await;
    assert_eq!(reply.code, 0);
    assert_eq!(
        reply.stdout,
        vec!["  feature".to_string(), "* main".to_string()]
    );
}

#[tokio::test]
async fn checkout_switches_the_session_and_the_overlay() {
    let mut f = Fixture::new();
    f.engine.seed_commit(
        "feature",
        "Ada Lovelace <ada@example.com>",
        "Tue Jul 22 09:00:00 2025 +0000",
        "start feature",
        &[("/feature.txt", "wip\n")],
    );
    let reply = f.run(&["checkout", "feature"]).await;
    assert_eq!(reply.code, 0);
    assert_eq!(
        reply.stdout,
        vec!["Switched to branch 'feature'".to_string()]
    );
    assert_eq!(f.session.branch, "feature");
    assert_eq!(f.overlay.branch(), "feature");
    // The filesystem projection follows the branch.
    let contents = f.overlay.read_file("/feature.txt").await.expect("file");
    assert_eq!(contents, b"wip\n");
}

#[tokio::test]
async fn checkout_refuses_an_unknown_branch() {
    let mut f = Fixture::new();
    let reply = f.run(&["checkout", "nope"]).await;
    assert_eq!(reply.code, 1);
    assert!(reply.stderr[0].contains("did not match any branch"));
    assert_eq!(f.session.branch, "main");
}

#[tokio::test]
async fn add_stages_visible_paths_once() {
    let mut f = Fixture::new();
    f.overlay
        .write_file("/notes.txt", b"todo\n".to_vec())
        .await
        .expect("write");
    let reply = f.run(&["add", "notes.txt", "README.md", "notes.txt"]).await;
    assert_eq!(reply.code, 0);
    assert_eq!(
        f.session.staged,
        vec!["/notes.txt".to_string(), "/README.md".to_string()]
    );

    let status = f.run(&["status"]).await;
    assert!(
        status
            .stdout
            .contains(&"Changes to be committed:".to_string())
    );
}

#[tokio::test]
async fn add_of_a_missing_path_is_fatal() {
    let mut f = Fixture::new();
    let reply = f.run(&["add", "nope.txt"]).await;
    assert_eq!(reply.code, 1);
    assert_eq!(
        reply.stderr,
        vec!["fatal: pathspec 'nope.txt' did not match any files".to_string()]
    );
}

#[tokio::test]
async fn commit_applies_a_patch_and_clears_the_staged_set() {
    let mut f = Fixture::new();
    let patch = "--- a/README.md\n+++ b/README.md\n@@ -1 +1,2 @@\n # demo\n+more\n";
    f.overlay
        .write_file("/fix.patch", patch.as_bytes().to_vec())
        .await
        .expect("write");
    f.run(&["add", "README.md"]).await;

    let reply = f
        .run(&["commit", "--apply-patch", "fix.patch", "-m", "update readme"])
        .await;
    assert_eq!(reply.code, 0, "stderr: {:?}", reply.stderr);
    assert!(reply.stdout[0].starts_with("[main "));
    assert!(reply.stdout[0].ends_with("] update readme"));
    assert!(f.session.staged.is_empty());

    let head = f.engine.history("main", 1).await.expect("history");
    assert_eq!(head[0].message, "update readme");
}

#[tokio::test]
async fn commit_requires_both_the_patch_and_the_message() {
    let mut f = Fixture::new();
    let reply = f.run(&["commit", "-m", "no patch"]).await;
    assert_eq!(reply.code, 2);
    let reply = f.run(&["commit"]).await;
    assert_eq!(reply.code, 2);
}

#[tokio::test]
async fn commit_with_an_unreadable_patch_fails() {
    let mut f = Fixture::new();
    let reply = f
        .run(&["commit", "--apply-patch", "ghost.patch", "-m", "x"])
        .await;
    assert_eq!(reply.code, 1);
    assert!(reply.stderr[0].starts_with("error: cannot read patch 'ghost.patch'"));
}

#[tokio::test]
async fn push_reports_the_remote_and_branch() {
    let mut f = Fixture::new();
    f.engine.set_ahead(2);
    let reply = f.run(&["push"]).await;
    assert_eq!(reply.code, 0, "stderr: {:?}", reply.stderr);
    assert_eq!(
        reply.stdout,
        vec![format!("To {REMOTE}"), "   main -> main".to_string()]
    );
}

#[tokio::test]
async fn push_refuses_a_dirty_worktree() {
    let mut f = Fixture::new();
    f.engine.set_dirty(&["/src/lib.rs"]);
    let reply = f.run(&["push"]).await;
    assert_eq!(reply.code, 2);
    assert_eq!(
        reply.stderr,
        vec![
            "error: uncommitted changes in working tree; commit or discard them before pushing"
                .to_string()
        ]
    );
}

#[tokio::test]
async fn push_refuses_when_the_branch_is_behind() {
    let mut f = Fixture::new();
    f.engine.set_behind(1);
    let reply = f.run(&["push"]).await;
    assert_eq!(reply.code, 2);
    assert_eq!(
        reply.stderr,
        vec!["error: the local branch is behind its remote; pull before pushing".to_string()]
    );
}

#[tokio::test]
async fn push_refuses_a_history_rewrite_unless_forced() {
    let mut f = Fixture::new();
    f.engine.set_diverged(true);
    let reply = f.run(&["push"]).await;
    assert_eq!(reply.code, 2);
    assert_eq!(
        reply.stderr,
        vec!["error: push would rewrite remote history; pass --force to confirm".to_string()]
    );

    let reply = f.run(&["push", "--force"]).await;
    assert_eq!(reply.code, 0, "stderr: {:?}", reply.stderr);
}

#[tokio::test]
async fn push_tries_credentials_in_order_until_one_succeeds() {
    // Three credentials match the host; only the last is valid, so the
    // push succeeds after exactly two recorded failures.
    let mut f = Fixture::with_tokens(&[
        ("example.com", "bad-1"),
        ("git.example.com", "bad-2"),
        ("example.com", "good"),
    ]);
    let reply = f.run(&["push"]).await;
    assert_eq!(reply.code, 0, "stderr: {:?}", reply.stderr);
    assert_eq!(
        f.engine.attempted_tokens(),
        vec!["bad-1".to_string(), "bad-2".to_string(), "good".to_string()]
    );
}

#[tokio::test]
async fn push_without_matching_credentials_names_the_host() {
    let mut f = Fixture::with_tokens(&[("elsewhere.io", "token")]);
    let reply = f.run(&["push"]).await;
    assert_eq!(reply.code, 1);
    assert_eq!(
        reply.stderr,
        vec!["error: no credentials stored for host 'git.example.com'".to_string()]
    );
}

#[tokio::test]
async fn push_reports_every_rejected_credential() {
    let mut f = Fixture::with_tokens(&[("git.example.com", "bad-1"), ("example.com", "bad-2")]);
    let reply = f.run(&["push"]).await;
    assert_eq!(reply.code, 1);
    assert_eq!(
        reply.stderr,
        vec![
            "error: all credentials for host 'git.example.com' were rejected".to_string(),
            "  git.example.com: authentication failed: token rejected by remote".to_string(),
            "  example.com: authentication failed: token rejected by remote".to_string(),
        ]
    );
}

#[tokio::test]
async fn pull_when_up_to_date() {
    let mut f = Fixture::new();
    let reply = f.run(&["pull"]).await;
    assert_eq!(reply.code, 0, "stderr: {:?}", reply.stderr);
    assert_eq!(reply.stdout, vec!["Already up to date.".to_string()]);
}

#[tokio::test]
async fn pull_fast_forwards_and_settles() {
    let mut f = Fixture::new();
    f.engine.set_behind(3);
    let reply = f.run(&["pull"]).await;
    assert_eq!(reply.code, 0, "stderr: {:?}", reply.stderr);
    assert_eq!(
        reply.stdout,
        vec![
            "Fast-forward".to_string(),
            "Updated 'main' with 3 new commit(s).".to_string(),
        ]
    );

    let reply = f.run(&["pull"]).await;
    assert_eq!(reply.stdout, vec!["Already up to date.".to_string()]);
}

#[tokio::test]
async fn unknown_subcommands_warn_but_do_not_fail() {
    let mut f = Fixture::new();
    let reply = f.run(&["rebase", "-i"]).await;
    assert_eq!(reply.code, 0);
    assert_eq!(
        reply.stdout,
        vec!["git: 'rebase' is not yet supported".to_string()]
    );
}

#[tokio::test]
async fn bare_git_is_a_usage_error() {
    let mut f = Fixture::new();
    let reply = f.run(&[]).await;
    assert_eq!(reply.code, 2);
}

#[test]
fn host_extraction_understands_common_remote_shapes() {
    assert_eq!(host_of("https://git.example.com/team/demo.git"), "git.example.com");
    assert_eq!(host_of("https://user@git.example.com:8443/demo.git"), "git.example.com");
    assert_eq!(host_of("git@github.com:team/demo.git"), "github.com");
    assert_eq!(host_of("git.example.com"), "git.example.com");
}
