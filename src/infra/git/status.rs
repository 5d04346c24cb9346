//! Repository sync state derived from `git status` output.
//!
//! The human-readable format is classified line by line through
//! [`classify_line`]; that table is the only place that knows git's
//! wording. `git status --porcelain=v2 --branch` is supported as an
//! alternative input with the same flag semantics.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Remote name assumed whenever a new branch line is seen.
pub const DEFAULT_REMOTE: &str = "origin";

/// Structured sync state of a working tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryState {
    pub branch: String,
    pub remote_name: String,
    pub commit_needed: bool,
    pub push_needed: bool,
}

impl RepositoryState {
    /// Prior state for the first parse of a cycle.
    pub fn initial() -> Self {
        Self {
            branch: String::new(),
            remote_name: DEFAULT_REMOTE.to_string(),
            commit_needed: false,
            push_needed: false,
        }
    }
}

/// Which `git status` output shape to request and parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusFormat {
    /// Plain `git status` text.
    #[default]
    Human,
    /// `git status --porcelain=v2 --branch`.
    Porcelain,
}

impl StatusFormat {
    /// Arguments passed to git for this format.
    pub fn args(self) -> &'static [&'static str] {
        match self {
            Self::Human => &["status"],
            Self::Porcelain => &["status", "--porcelain=v2", "--branch"],
        }
    }

    pub fn parse(self, raw: &str, prior: &RepositoryState) -> RepositoryState {
        match self {
            Self::Human => parse_status(raw, prior),
            Self::Porcelain => parse_porcelain(raw, prior),
        }
    }
}

/// Effect of a single status line on the state being built.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LineEffect {
    pub branch: Option<String>,
    pub push_needed: Option<bool>,
    pub commit_needed: Option<bool>,
}

/// Classify one line of human-readable `git status` output.
///
/// `branch` and `remote` are the values known when the line is reached,
/// since the up-to-date line names `<remote>/<branch>`.
pub fn classify_line(line: &str, branch: &str, remote: &str) -> LineEffect {
    let mut effect = LineEffect::default();

    if let Some((_, name)) = line.split_once("On branch ") {
        effect.branch = Some(name.trim().to_string());
    }

    // The up-to-date check must see a branch announced on this same line.
    let branch = effect.branch.as_deref().unwrap_or(branch);
    let up_to_date = format!("is up to date with '{remote}/{branch}'");
    if line.contains(&up_to_date) {
        effect.push_needed = Some(false);
    } else if line.contains("Untracked files:") || line.contains("Your branch is ahead of ") {
        effect.push_needed = Some(true);
    }

    if line.contains("nothing to commit") || line.contains("working tree clean") {
        effect.commit_needed = Some(false);
    } else if line.contains("Untracked files:")
        || line.contains("untracked files present")
        || line.contains("Changes not staged for commit")
    {
        effect.commit_needed = Some(true);
    }

    effect
}

/// Parse human-readable `git status` text on top of `prior`.
///
/// Lines are applied in order and later lines win. Flags not touched by
/// any recognized line keep their prior value.
pub fn parse_status(raw: &str, prior: &RepositoryState) -> RepositoryState {
    let mut state = prior.clone();

    for line in raw.lines() {
        let effect = classify_line(line, &state.branch, &state.remote_name);
        if let Some(branch) = effect.branch {
            state.branch = branch;
            state.remote_name = DEFAULT_REMOTE.to_string();
        }
        if let Some(push) = effect.push_needed {
            state.push_needed = push;
        }
        if let Some(commit) = effect.commit_needed {
            state.commit_needed = commit;
        }
    }

    state
}

/// Parse `git status --porcelain=v2 --branch` output on top of `prior`.
///
/// Mirrors [`parse_status`]: untracked entries mark both commit and push
/// as needed, unstaged modifications mark a commit, an empty entry list
/// means nothing to commit, and the ahead count decides the push flag
/// when an upstream is configured.
pub fn parse_porcelain(raw: &str, prior: &RepositoryState) -> RepositoryState {
    let mut state = prior.clone();
    let mut saw_entry = false;

    for line in raw.lines() {
        if let Some(head) = line.strip_prefix("# branch.head ") {
            state.branch = head.trim().to_string();
            state.remote_name = DEFAULT_REMOTE.to_string();
        } else if let Some(upstream) = line.strip_prefix("# branch.upstream ") {
            if let Some((remote, _)) = upstream.trim().split_once('/') {
                state.remote_name = remote.to_string();
            }
        } else if let Some(ab) = line.strip_prefix("# branch.ab ") {
            if let Some(ahead) = parse_ahead(ab) {
                state.push_needed = ahead > 0;
            }
        } else if line.starts_with("? ") {
            saw_entry = true;
            state.push_needed = true;
            state.commit_needed = true;
        } else if let Some(rest) = line
            .strip_prefix("1 ")
            .or_else(|| line.strip_prefix("2 "))
            .or_else(|| line.strip_prefix("u "))
        {
            saw_entry = true;
            // XY: Y is the worktree side; '.' means unchanged.
            if rest.as_bytes().get(1).is_some_and(|y| *y != b'.') {
                state.commit_needed = true;
            }
        }
    }

    if !saw_entry {
        state.commit_needed = false;
    }

    state
}

/// Extract the ahead count from `+A -B`.
fn parse_ahead(ab: &str) -> Option<u64> {
    ab.split_whitespace()
        .find_map(|part| part.strip_prefix('+'))
        .and_then(|n| n.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use rstest::rstest;

    fn state(branch: &str, commit_needed: bool, push_needed: bool) -> RepositoryState {
        RepositoryState {
            branch: branch.to_string(),
            remote_name: DEFAULT_REMOTE.to_string(),
            commit_needed,
            push_needed,
        }
    }

    #[test]
    fn clean_and_up_to_date() {
        let raw = "On branch main\nYour branch is up to date with 'origin/main'.\nnothing to commit, working tree clean";

        let parsed = parse_status(raw, &RepositoryState::initial());

        assert_eq!(parsed, state("main", false, false));
    }

    #[test]
    fn untracked_files_need_commit_and_push() {
        let raw = "On branch main\nUntracked files:\n  new.txt";

        let parsed = parse_status(raw, &RepositoryState::initial());

        assert_eq!(parsed, state("main", true, true));
    }

    #[rstest]
    #[case::from_clean(false, false)]
    #[case::from_dirty(true, true)]
    #[case::from_push_only(false, true)]
    fn up_to_date_line_always_clears_push(#[case] commit: bool, #[case] push: bool) {
        let raw = indoc! {"
            On branch main
            Your branch is up to date with 'origin/main'.

            Changes not staged for commit:
              (use \"git add <file>...\" to update what will be committed)
            \tmodified:   src/lib.rs
        "};

        let parsed = parse_status(raw, &state("main", commit, push));

        assert!(!parsed.push_needed);
        assert!(parsed.commit_needed);
    }

    #[test]
    fn ahead_of_remote_needs_push_only() {
        let raw = indoc! {"
            On branch main
            Your branch is ahead of 'origin/main' by 2 commits.
              (use \"git push\" to publish your local commits)

            nothing to commit, working tree clean
        "};

        let parsed = parse_status(raw, &state("main", true, false));

        assert_eq!(parsed, state("main", false, true));
    }

    #[test]
    fn untracked_after_up_to_date_sets_push_again() {
        let raw = indoc! {"
            On branch main
            Your branch is up to date with 'origin/main'.

            Untracked files:
              (use \"git add <file>...\" to include in what will be committed)
            \tnew.txt

            nothing added to commit but untracked files present (use \"git add\" to track)
        "};

        let parsed = parse_status(raw, &RepositoryState::initial());

        assert_eq!(parsed, state("main", true, true));
    }

    #[test]
    fn up_to_date_with_other_branch_does_not_clear_push() {
        let raw = indoc! {"
            On branch feature
            Your branch is up to date with 'origin/main'.
        "};

        let parsed = parse_status(raw, &state("", false, true));

        assert!(parsed.push_needed);
        assert_eq!(parsed.branch, "feature");
    }

    #[test]
    fn unrecognized_output_keeps_prior_flags() {
        let prior = RepositoryState {
            branch: "dev".to_string(),
            remote_name: "upstream".to_string(),
            commit_needed: true,
            push_needed: true,
        };

        let parsed = parse_status("HEAD detached at 1a2b3c4\nsomething else", &prior);

        assert_eq!(parsed, prior);
    }

    #[test]
    fn branch_line_resets_remote_to_origin() {
        let prior = RepositoryState {
            remote_name: "upstream".to_string(),
            ..RepositoryState::initial()
        };

        let parsed = parse_status("On branch main", &prior);

        assert_eq!(parsed.remote_name, "origin");
        assert_eq!(parsed.branch, "main");
    }

    #[rstest]
    #[case::branch("On branch main", Some("main"), None, None)]
    #[case::up_to_date("Your branch is up to date with 'origin/main'.", None, Some(false), None)]
    #[case::ahead("Your branch is ahead of 'origin/main' by 1 commit.", None, Some(true), None)]
    #[case::untracked_header("Untracked files:", None, Some(true), Some(true))]
    #[case::untracked_present(
        "nothing added to commit but untracked files present",
        None,
        None,
        Some(true)
    )]
    #[case::unstaged("Changes not staged for commit:", None, None, Some(true))]
    #[case::clean("nothing to commit, working tree clean", None, None, Some(false))]
    #[case::staged_only("Changes to be committed:", None, None, None)]
    #[case::blank("", None, None, None)]
    fn classify_line_table(
        #[case] line: &str,
        #[case] branch: Option<&str>,
        #[case] push: Option<bool>,
        #[case] commit: Option<bool>,
    ) {
        let effect = classify_line(line, "main", "origin");

        assert_eq!(
            effect,
            LineEffect {
                branch: branch.map(str::to_string),
                push_needed: push,
                commit_needed: commit,
            }
        );
    }

    mod porcelain {
        use super::*;

        #[test]
        fn clean_and_in_sync() {
            let raw = indoc! {"
                # branch.oid 1234567890abcdef1234567890abcdef12345678
                # branch.head main
                # branch.upstream origin/main
                # branch.ab +0 -0
            "};

            let parsed = parse_porcelain(raw, &state("", true, true));

            assert_eq!(parsed, state("main", false, false));
        }

        #[test]
        fn untracked_needs_commit_and_push() {
            let raw = indoc! {"
                # branch.oid 1234567890abcdef1234567890abcdef12345678
                # branch.head main
                # branch.upstream origin/main
                # branch.ab +0 -0
                ? new.txt
            "};

            let parsed = parse_porcelain(raw, &RepositoryState::initial());

            assert_eq!(parsed, state("main", true, true));
        }

        #[test]
        fn ahead_needs_push() {
            let raw = indoc! {"
                # branch.head main
                # branch.upstream origin/main
                # branch.ab +3 -0
            "};

            let parsed = parse_porcelain(raw, &RepositoryState::initial());

            assert_eq!(parsed, state("main", false, true));
        }

        #[rstest]
        #[case::unstaged_modification("1 .M N... 100644 100644 100644 aaa bbb src/lib.rs", true)]
        #[case::staged_only("1 M. N... 100644 100644 100644 aaa bbb src/lib.rs", false)]
        fn tracked_entries(#[case] entry: &str, #[case] commit_needed: bool) {
            let raw = format!("# branch.head main\n# branch.ab +0 -0\n{entry}\n");

            let parsed = parse_porcelain(&raw, &RepositoryState::initial());

            assert_eq!(parsed.commit_needed, commit_needed);
            assert!(!parsed.push_needed);
        }

        #[test]
        fn upstream_sets_remote_name() {
            let raw = "# branch.head main\n# branch.upstream upstream/main\n";

            let parsed = parse_porcelain(raw, &RepositoryState::initial());

            assert_eq!(parsed.remote_name, "upstream");
        }

        #[test]
        fn no_upstream_keeps_prior_push_flag() {
            let raw = "# branch.head main\n";

            let parsed = parse_porcelain(raw, &state("", false, true));

            assert!(parsed.push_needed);
        }
    }
}
