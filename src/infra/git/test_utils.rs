//! Test utilities: temporary repositories and a scripted git runner.

use std::cell::RefCell;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};

use git2::Repository;
use tempfile::TempDir;

use super::runner::GitRunner;

/// A temporary git repository for testing.
pub struct TempRepo {
    pub dir: TempDir,
}

impl TempRepo {
    /// Create a repository with an empty initial commit on `branch`.
    pub fn new(branch: &str) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let repo = Repository::init(dir.path()).expect("init repo");

        // Create initial commit so HEAD exists
        {
            let sig = git2::Signature::now("Test", "test@example.com").unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
                .expect("create initial commit");
        }

        {
            let head = repo.head().expect("get head");
            let current_branch = head.shorthand().unwrap_or("master").to_string();
            drop(head);
            if current_branch != branch {
                let mut branch_ref = repo
                    .find_branch(&current_branch, git2::BranchType::Local)
                    .expect("find branch");
                branch_ref.rename(branch, true).expect("rename branch");
            }
        }

        Self { dir }
    }

    /// Get the canonicalized path to the repository.
    pub fn path(&self) -> PathBuf {
        self.dir.path().canonicalize().expect("canonicalize path")
    }
}

type Reply = (i32, String, String);

/// Scripted [`GitRunner`] keyed by argument prefix, recording every call.
///
/// When several scripted prefixes match a call, the longest one answers.
/// Unscripted calls succeed with empty output.
#[derive(Default)]
pub struct FakeGit {
    responses: Vec<(Vec<String>, Reply)>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `git <subcommand> ...` with an exit code and stdout.
    pub fn respond(self, subcommand: &str, code: i32, stdout: &str) -> Self {
        self.respond_args(&[subcommand], code, stdout)
    }

    /// Answer calls starting with `prefix` with an exit code and stdout.
    pub fn respond_args(mut self, prefix: &[&str], code: i32, stdout: &str) -> Self {
        self.script(prefix, (code, stdout.to_string(), String::new()));
        self
    }

    /// Answer `git <subcommand> ...` with an exit code and stderr.
    pub fn respond_err(mut self, subcommand: &str, code: i32, stderr: &str) -> Self {
        self.script(&[subcommand], (code, String::new(), stderr.to_string()));
        self
    }

    fn script(&mut self, prefix: &[&str], reply: Reply) {
        let prefix: Vec<String> = prefix.iter().map(|a| a.to_string()).collect();
        self.responses.retain(|(existing, _)| *existing != prefix);
        self.responses.push((prefix, reply));
    }

    fn reply_for(&self, args: &[&str]) -> Reply {
        self.responses
            .iter()
            .filter(|(prefix, _)| {
                prefix.len() <= args.len() && prefix.iter().zip(args).all(|(p, a)| p == a)
            })
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, reply)| reply.clone())
            .unwrap_or_default()
    }

    /// Every call so far, as argument lists.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// Calls whose first argument is `subcommand`.
    pub fn calls_to(&self, subcommand: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|args| args.first().map(String::as_str) == Some(subcommand))
            .collect()
    }
}

impl GitRunner for FakeGit {
    fn run_git(&self, _cwd: &Path, args: &[&str]) -> io::Result<Output> {
        self.calls
            .borrow_mut()
            .push(args.iter().map(|a| a.to_string()).collect());

        let (code, stdout, stderr) = self.reply_for(args);

        Ok(Output {
            status: ExitStatus::from_raw(code << 8),
            stdout: stdout.into_bytes(),
            stderr: stderr.into_bytes(),
        })
    }

    fn program(&self) -> &str {
        "git"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::git::resolve_repo_root;

    #[test]
    fn temp_repo_creates_valid_repo_on_branch() {
        let temp = TempRepo::new("main");
        let repo = Repository::open(temp.path()).unwrap();

        let head = repo.head().unwrap();
        assert_eq!(head.shorthand(), Some("main"));
        assert_eq!(resolve_repo_root(&temp.path()).unwrap(), temp.path());
    }

    #[test]
    fn fake_git_records_calls_and_replays_responses() {
        let fake = FakeGit::new().respond("status", 0, "On branch main");

        let output = fake.run_git(Path::new("/repo"), &["status"]).unwrap();
        let other = fake.run_git(Path::new("/repo"), &["add", "."]).unwrap();

        assert_eq!(String::from_utf8_lossy(&output.stdout), "On branch main");
        assert!(other.status.success());
        assert_eq!(fake.calls_to("add"), vec![vec!["add", "."]]);
    }

    #[test]
    fn longest_matching_prefix_answers() {
        let fake = FakeGit::new()
            .respond("config", 0, "any")
            .respond_args(&["config", "--get"], 1, "");

        let get = fake
            .run_git(Path::new("/repo"), &["config", "--get", "user.email"])
            .unwrap();
        let set = fake
            .run_git(Path::new("/repo"), &["config", "--local", "user.email", "a@b"])
            .unwrap();

        assert_eq!(get.status.code(), Some(1));
        assert!(set.status.success());
        assert_eq!(String::from_utf8_lossy(&set.stdout), "any");
    }
}
