//! Session handling end to end over in-memory streams.

mod common;

use common::{assert_failed, call, exchange, exchange_raw, exists, random_peer, Harness};
use peergit_daemon::SessionOutcome;
use peergit_protocol::{
    CommitRequest, CreateBranchRequest, DiffRequest, Envelope, HandshakeRequest, LinkRepoRequest,
    ListBranchesRequest, ListFilesRequest, ListReposRequest, LogRequest, ReadFileRequest, RenameFileRequest,
    RequestKind, ResetRequest, ResponseKind, StashPopRequest, StashSaveRequest, StatusRequest,
    SwitchBranchRequest, WriteFileRequest, WriteFileResponse, ReadFileResponse, MAX_MESSAGE_SIZE,
};
use peergit_store::{RepoRegistry, TrustStore, REGISTRY_FILE, TRUST_STORE_FILE};
use pretty_assertions::assert_eq;
use serde_json::json;

fn write(repo: &str, file: &str, content: &str) -> WriteFileRequest {
    WriteFileRequest {
        repo_path: repo.into(),
        file_path: file.into(),
        content: content.into(),
    }
}

// ==================== Trust gate ====================

#[tokio::test]
async fn untrusted_peer_gets_no_response() {
    let h = Harness::new();
    let stranger = random_peer();

    let envelope = Envelope::request(&write("web", "a.txt", "hello")).unwrap();
    let (outcome, reply) = exchange(&h.handler, stranger, &envelope).await;

    assert!(matches!(outcome, SessionOutcome::ProtocolViolation(_)));
    assert_eq!(reply, None);
    assert!(!exists(&h.web.join("a.txt")));
    assert!(h.git.invocations().is_empty());
    assert_eq!(h.approver.asked(), 0);
}

#[tokio::test]
async fn handshake_unlocks_commands() {
    let h = Harness::new();
    let peer = random_peer();

    let response = call(&h.handler, peer, &HandshakeRequest {}).await;
    assert!(response.approved);

    let repos = call(&h.handler, peer, &ListReposRequest::default()).await;
    assert_eq!(repos.repos, vec!["api", "web"]);

    let reloaded = TrustStore::open(h.data_dir().join(TRUST_STORE_FILE)).unwrap();
    assert!(reloaded.is_trusted(&peer));
}

#[tokio::test]
async fn repeated_handshake_keeps_membership() {
    let h = Harness::new();
    let peer = random_peer();

    for _ in 0..3 {
        assert!(call(&h.handler, peer, &HandshakeRequest {}).await.approved);
    }

    assert_eq!(h.approver.asked(), 1);
    assert_eq!(h.handler.trust().peers(), vec![peer]);
}

#[tokio::test]
async fn denied_peer_stays_locked_out() {
    let h = Harness::denying();
    let peer = random_peer();

    let response = call(&h.handler, peer, &HandshakeRequest {}).await;
    assert!(!response.approved);
    assert!(h.handler.trust().is_empty());

    let envelope = Envelope::request(&ListReposRequest::default()).unwrap();
    let (_, reply) = exchange(&h.handler, peer, &envelope).await;
    assert_eq!(reply, None);
}

// ==================== Envelopes ====================

#[tokio::test]
async fn empty_stream_is_a_disconnect() {
    let h = Harness::new();
    let (outcome, reply) = exchange_raw(&h.handler, h.trusted_peer(), b"").await;
    assert_eq!(outcome, SessionOutcome::Disconnected);
    assert_eq!(reply, None);
}

#[tokio::test]
async fn malformed_envelope_closes_without_response() {
    let h = Harness::new();
    let peer = h.trusted_peer();

    let (outcome, reply) = exchange_raw(&h.handler, peer, b"{not json\n").await;
    assert!(matches!(outcome, SessionOutcome::ProtocolViolation(_)));
    assert_eq!(reply, None);
}

#[tokio::test]
async fn unknown_tag_closes_without_response() {
    let h = Harness::new();
    let envelope = Envelope {
        kind: "FORMAT_DISK_REQUEST".into(),
        payload: json!({}),
    };

    let (outcome, reply) = exchange(&h.handler, h.trusted_peer(), &envelope).await;
    assert!(matches!(outcome, SessionOutcome::ProtocolViolation(reason) if reason.contains("FORMAT_DISK_REQUEST")));
    assert_eq!(reply, None);
}

#[tokio::test]
async fn bad_payload_gets_structured_failure() {
    let h = Harness::new();
    let envelope = Envelope {
        kind: RequestKind::WriteFile.tag().into(),
        payload: json!({"repo_path": "web", "file_path": 7}),
    };

    let (outcome, reply) = exchange(&h.handler, h.trusted_peer(), &envelope).await;
    assert_eq!(outcome, SessionOutcome::Responded(RequestKind::WriteFile.response()));

    let response: WriteFileResponse = reply.unwrap().into_reply().unwrap();
    assert!(!response.success);
    assert!(response.error.unwrap().starts_with("invalid WRITE_FILE_REQUEST payload"));
}

#[tokio::test]
async fn responses_carry_the_paired_kind() {
    let h = Harness::new();
    let envelope = Envelope::request(&StatusRequest { repo_path: "web".into() }).unwrap();

    let (outcome, reply) = exchange(&h.handler, h.trusted_peer(), &envelope).await;
    assert_eq!(outcome, SessionOutcome::Responded(RequestKind::Status.response()));
    assert_eq!(reply.unwrap().response_kind(), Some(ResponseKind::from_tag("GIT_STATUS_RESPONSE").unwrap()));
}

// ==================== Repositories ====================

#[tokio::test]
async fn unknown_alias_lists_known_ones() {
    let h = Harness::new();
    let response = call(&h.handler, h.trusted_peer(), &StatusRequest { repo_path: "nope".into() }).await;

    assert!(!response.success);
    assert_eq!(response.output, "unknown repository alias 'nope'. Known aliases: api, web");
    assert!(h.git.invocations().is_empty());
}

#[tokio::test]
async fn linked_repo_is_listed_and_persisted() {
    let h = Harness::new();
    let peer = h.trusted_peer();
    let docs = h.dir.path().join("docs");

    let response = call(
        &h.handler,
        peer,
        &LinkRepoRequest {
            alias: "docs".into(),
            path: docs.to_string_lossy().into_owned(),
        },
    )
    .await;
    assert!(response.success, "{:?}", response.error);

    let repos = call(&h.handler, peer, &ListReposRequest::default()).await;
    assert_eq!(repos.repos, vec!["api", "docs", "web"]);

    let reloaded = RepoRegistry::open(h.data_dir().join(REGISTRY_FILE)).unwrap();
    assert_eq!(reloaded.resolve("docs"), Some(docs));
}

#[tokio::test]
async fn invalid_alias_is_refused() {
    let h = Harness::new();
    let response = call(
        &h.handler,
        h.trusted_peer(),
        &LinkRepoRequest {
            alias: "my repo".into(),
            path: "/srv/repo".into(),
        },
    )
    .await;

    assert_failed(&response);
    assert!(response.error.is_some());
    assert_eq!(h.handler.registry().len(), 2);
}

// ==================== Files ====================

#[tokio::test]
async fn write_read_and_list_files() {
    let h = Harness::new();
    let peer = h.trusted_peer();
    std::fs::create_dir_all(h.web.join(".git")).unwrap();
    std::fs::write(h.web.join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();

    assert!(call(&h.handler, peer, &write("web", "src/main.rs", "fn main() {}\n")).await.success);
    assert!(call(&h.handler, peer, &write("web", "README.md", "# web\n")).await.success);

    let read = call(
        &h.handler,
        peer,
        &ReadFileRequest {
            repo_path: "web".into(),
            file_path: "./src/../src/main.rs".into(),
        },
    )
    .await;
    assert_eq!(read.content, "fn main() {}\n");

    let listed = call(&h.handler, peer, &ListFilesRequest { repo_path: "web".into() }).await;
    assert_eq!(listed.files, vec!["README.md", "src/main.rs"]);
}

#[tokio::test]
async fn missing_file_read_fails() {
    let h = Harness::new();
    let read = call(
        &h.handler,
        h.trusted_peer(),
        &ReadFileRequest {
            repo_path: "web".into(),
            file_path: "nothing.txt".into(),
        },
    )
    .await;

    assert!(!read.success);
    assert!(read.error.unwrap().contains("nothing.txt"));
}

#[tokio::test]
async fn escaping_paths_are_denied_without_io() {
    let h = Harness::new();
    let peer = h.trusted_peer();
    let secret = h.dir.path().join("secret.txt");
    std::fs::write(&secret, "top secret").unwrap();

    let read = call(
        &h.handler,
        peer,
        &ReadFileRequest {
            repo_path: "web".into(),
            file_path: "../secret.txt".into(),
        },
    )
    .await;
    assert!(!read.success);
    assert_eq!(read.content, "");
    assert_eq!(read.error.as_deref(), Some("access denied: path is outside of repository root"));

    let written = call(&h.handler, peer, &write("web", "a/../../escaped.txt", "x")).await;
    assert!(!written.success);
    assert!(!exists(&h.dir.path().join("escaped.txt")));

    let absolute = call(&h.handler, peer, &write("web", &secret.to_string_lossy(), "overwritten")).await;
    assert!(!absolute.success);
    assert_eq!(std::fs::read_to_string(&secret).unwrap(), "top secret");

    std::fs::write(h.web.join("inside.txt"), "in").unwrap();
    let renamed = call(
        &h.handler,
        peer,
        &RenameFileRequest {
            repo_path: "web".into(),
            old_path: "inside.txt".into(),
            new_path: "../outside.txt".into(),
        },
    )
    .await;
    assert!(!renamed.success);
    assert!(exists(&h.web.join("inside.txt")));
    assert!(!exists(&h.dir.path().join("outside.txt")));

    assert!(h.git.invocations().is_empty());
}

#[tokio::test]
async fn untracked_rename_moves_the_file() {
    let h = Harness::new();
    let peer = h.trusted_peer();
    std::fs::write(h.web.join("draft.md"), "notes").unwrap();

    let response = call(
        &h.handler,
        peer,
        &RenameFileRequest {
            repo_path: "web".into(),
            old_path: "draft.md".into(),
            new_path: "docs/notes.md".into(),
        },
    )
    .await;

    assert!(response.success, "{:?}", response.error);
    assert!(!exists(&h.web.join("draft.md")));
    assert_eq!(std::fs::read_to_string(h.web.join("docs/notes.md")).unwrap(), "notes");
}

#[tokio::test]
async fn tracked_rename_goes_through_git() {
    let h = Harness::new();
    let peer = h.trusted_peer();
    std::fs::write(h.web.join("README.md"), "# web\n").unwrap();
    h.git.track(&h.web, "README.md");

    let response = call(
        &h.handler,
        peer,
        &RenameFileRequest {
            repo_path: "web".into(),
            old_path: "README.md".into(),
            new_path: "docs/README.md".into(),
        },
    )
    .await;

    assert!(response.success, "{:?}", response.error);
    let moved = h
        .git
        .invocations()
        .into_iter()
        .any(|call| call.args == ["mv", "--", "README.md", "docs/README.md"]);
    assert!(moved);
}

#[tokio::test]
async fn failed_rename_leaves_no_directories() {
    let h = Harness::new();
    let peer = h.trusted_peer();

    let response = call(
        &h.handler,
        peer,
        &RenameFileRequest {
            repo_path: "web".into(),
            old_path: "does-not-exist.txt".into(),
            new_path: "new/deep/dir/x.txt".into(),
        },
    )
    .await;

    assert!(!response.success);
    assert!(response.error.unwrap().contains("does-not-exist.txt"));
    assert!(!exists(&h.web.join("new")));
}

#[tokio::test]
async fn rename_into_existing_directory_keeps_it() {
    let h = Harness::new();
    let peer = h.trusted_peer();
    std::fs::create_dir_all(h.web.join("docs")).unwrap();
    std::fs::write(h.web.join("docs/keep.md"), "keep").unwrap();
    std::fs::write(h.web.join("draft.md"), "notes").unwrap();

    let response = call(
        &h.handler,
        peer,
        &RenameFileRequest {
            repo_path: "web".into(),
            old_path: "draft.md".into(),
            new_path: "docs/nested/notes.md".into(),
        },
    )
    .await;

    assert!(response.success, "{:?}", response.error);
    assert_eq!(std::fs::read_to_string(h.web.join("docs/nested/notes.md")).unwrap(), "notes");
    assert!(exists(&h.web.join("docs/keep.md")));
}

#[tokio::test]
async fn git_directory_is_not_writable() {
    let h = Harness::new();
    let peer = h.trusted_peer();
    std::fs::create_dir_all(h.web.join(".git/hooks")).unwrap();

    let written = call(&h.handler, peer, &write("web", ".git/hooks/pre-commit", "#!/bin/sh\n")).await;
    assert!(!written.success);
    assert_eq!(written.error.as_deref(), Some("access denied: path is inside the .git directory"));
    assert!(!exists(&h.web.join(".git/hooks/pre-commit")));

    let read = call(
        &h.handler,
        peer,
        &ReadFileRequest {
            repo_path: "web".into(),
            file_path: "docs/../.git/config".into(),
        },
    )
    .await;
    assert!(!read.success);

    std::fs::write(h.web.join("hook.sh"), "#!/bin/sh\n").unwrap();
    let renamed = call(
        &h.handler,
        peer,
        &RenameFileRequest {
            repo_path: "web".into(),
            old_path: "hook.sh".into(),
            new_path: ".git/hooks/post-commit".into(),
        },
    )
    .await;
    assert!(!renamed.success);
    assert!(exists(&h.web.join("hook.sh")));
    assert!(h.git.invocations().is_empty());
}

#[tokio::test]
async fn oversized_response_is_a_failure_not_silence() {
    let h = Harness::new();
    let peer = h.trusted_peer();
    let big = vec![b'a'; MAX_MESSAGE_SIZE + 1024 * 1024];
    std::fs::write(h.web.join("big.bin"), &big).unwrap();

    let request = Envelope::request(&ReadFileRequest {
        repo_path: "web".into(),
        file_path: "big.bin".into(),
    })
    .unwrap();
    let (outcome, reply) = exchange(&h.handler, peer, &request).await;

    assert_eq!(outcome, SessionOutcome::Responded(RequestKind::ReadFile.response()));
    let read = reply.unwrap().into_reply::<ReadFileResponse>().unwrap();
    assert!(!read.success);
    assert_eq!(read.content, "");
    assert!(read.error.unwrap().contains("frame limit"));
}

// ==================== Branches ====================

#[tokio::test]
async fn create_and_list_branches() {
    let h = Harness::new();
    let peer = h.trusted_peer();

    let created = call(
        &h.handler,
        peer,
        &CreateBranchRequest {
            repo_path: "web".into(),
            new_branch_name: "feature".into(),
        },
    )
    .await;
    assert!(created.success);
    assert_eq!(created.output, "Branch 'feature' created.");

    let duplicate = call(
        &h.handler,
        peer,
        &CreateBranchRequest {
            repo_path: "web".into(),
            new_branch_name: "feature".into(),
        },
    )
    .await;
    assert!(!duplicate.success);

    let branches = call(&h.handler, peer, &ListBranchesRequest { repo_path: "web".into() }).await;
    assert_eq!(branches.branches, vec!["feature", "main"]);
    assert_eq!(h.git.current_branch(&h.web), "main");
}

#[tokio::test]
async fn switching_to_current_branch_does_nothing() {
    let h = Harness::new();
    h.git.edit(&h.web, "a.txt", "wip");

    let response = call(
        &h.handler,
        h.trusted_peer(),
        &SwitchBranchRequest {
            repo_path: "web".into(),
            branch_name: "main".into(),
        },
    )
    .await;

    assert!(response.success);
    assert_eq!(response.output, "Already on branch 'main'.");
    assert!(h.git.stash_messages(&h.web).is_empty());
    assert_eq!(h.git.changes(&h.web).len(), 1);
}

#[tokio::test]
async fn switching_away_and_back_restores_work() {
    let h = Harness::new();
    let peer = h.trusted_peer();
    h.git.add_branch(&h.web, "feature");
    h.git.edit(&h.web, "a.txt", "wip on main");

    let switch = |branch: &str| SwitchBranchRequest {
        repo_path: "web".into(),
        branch_name: branch.into(),
    };

    let away = call(&h.handler, peer, &switch("feature")).await;
    assert!(away.success);
    assert_eq!(
        away.output,
        "Switched to branch 'feature'. No previous work was stashed for this branch."
    );
    assert!(h.git.changes(&h.web).is_empty());
    assert_eq!(h.git.stash_messages(&h.web), vec!["p2p-auto-stash-for-main"]);

    let back = call(&h.handler, peer, &switch("main")).await;
    assert!(back.success);
    assert!(back.output.starts_with("Switched to branch 'main'.\nRestored previous work for this branch:\n"));
    assert_eq!(h.git.changes(&h.web).get("a.txt").map(String::as_str), Some("wip on main"));
    assert!(h.git.stash_messages(&h.web).is_empty());
}

#[tokio::test]
async fn switching_to_missing_branch_fails() {
    let h = Harness::new();
    let response = call(
        &h.handler,
        h.trusted_peer(),
        &SwitchBranchRequest {
            repo_path: "web".into(),
            branch_name: "ghost".into(),
        },
    )
    .await;

    assert!(!response.success);
    assert!(response.output.contains("ghost"));
    assert_eq!(h.git.current_branch(&h.web), "main");
}

// ==================== Working tree ====================

#[tokio::test]
async fn empty_commit_is_a_success() {
    let h = Harness::new();
    let response = call(
        &h.handler,
        h.trusted_peer(),
        &CommitRequest {
            repo_path: "web".into(),
            message: "nothing".into(),
            branch: "main".into(),
        },
    )
    .await;

    assert!(response.success);
    assert_eq!(response.output, "Working tree is clean. Nothing to commit.");
    assert!(h.git.pushes(&h.web).is_empty());
}

#[tokio::test]
async fn commit_is_pushed() {
    let h = Harness::new();
    h.git.edit(&h.web, "index.html", "<h1>hi</h1>");

    let response = call(
        &h.handler,
        h.trusted_peer(),
        &CommitRequest {
            repo_path: "web".into(),
            message: "Add index".into(),
            branch: "main".into(),
        },
    )
    .await;

    assert!(response.success);
    assert!(response.output.starts_with("Successfully pushed to origin/main\n"));
    assert_eq!(h.git.commits(&h.web, "main"), vec!["Add index"]);
    assert_eq!(h.git.pushes(&h.web), vec![("origin".to_string(), "main".to_string())]);
}

#[tokio::test]
async fn status_log_and_diff() {
    let h = Harness::new();
    let peer = h.trusted_peer();
    let repo = || "web".to_string();

    let clean = call(&h.handler, peer, &StatusRequest { repo_path: repo() }).await;
    assert_eq!(clean.output, "Working tree is clean.");

    h.git.track(&h.web, "app.js");
    h.git.edit(&h.web, "app.js", "console.log(1)");
    h.git.edit(&h.web, "new.txt", "fresh");

    let status = call(&h.handler, peer, &StatusRequest { repo_path: repo() }).await;
    assert_eq!(status.output, " M app.js\n?? new.txt\n");

    let whole = call(&h.handler, peer, &DiffRequest { repo_path: repo(), file_path: Some(String::new()) }).await;
    assert!(whole.output.contains("a/app.js"));

    let other = call(&h.handler, peer, &DiffRequest { repo_path: repo(), file_path: Some("other.js".into()) }).await;
    assert_eq!(other.output, "No differences found.");

    let escaped = call(&h.handler, peer, &DiffRequest { repo_path: repo(), file_path: Some("../x".into()) }).await;
    assert!(!escaped.success);

    let empty_log = call(&h.handler, peer, &LogRequest { repo_path: repo() }).await;
    assert!(!empty_log.success);

    call(
        &h.handler,
        peer,
        &CommitRequest {
            repo_path: repo(),
            message: "First".into(),
            branch: "main".into(),
        },
    )
    .await;
    let log = call(&h.handler, peer, &LogRequest { repo_path: repo() }).await;
    assert!(log.success);
    assert!(log.output.contains("First"));
}

#[tokio::test]
async fn stash_save_pop_and_reset() {
    let h = Harness::new();
    let peer = h.trusted_peer();
    h.git.track(&h.web, "a.txt");
    h.git.edit(&h.web, "a.txt", "changed");

    let saved = call(&h.handler, peer, &StashSaveRequest { repo_path: "web".into() }).await;
    assert!(saved.success);
    assert_eq!(h.git.stash_messages(&h.web), vec!["p2p-remote-stash"]);
    assert!(h.git.changes(&h.web).is_empty());

    let popped = call(&h.handler, peer, &StashPopRequest { repo_path: "web".into() }).await;
    assert!(popped.success);
    assert_eq!(h.git.changes(&h.web).len(), 1);

    let empty_pop = call(&h.handler, peer, &StashPopRequest { repo_path: "web".into() }).await;
    assert!(!empty_pop.success);

    let reset = call(&h.handler, peer, &ResetRequest { repo_path: "web".into() }).await;
    assert!(reset.success);
    assert!(h.git.changes(&h.web).is_empty());
}
