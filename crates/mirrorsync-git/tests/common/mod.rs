#![allow(dead_code)]
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Runs git in `dir` with a fixed identity and returns trimmed stdout.
/// Panics on failure (intended for tests).
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "user.name=Mirrorsync Test"])
        .args(["-c", "user.email=test@mirrorsync.invalid"])
        .args(["-c", "commit.gpgsign=false"])
        .args(["-c", "tag.gpgsign=false"])
        .args(args)
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE")
        .output()
        .expect("run git");
    assert!(
        output.status.success(),
        "git {:?} failed:\nstdout: {}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A bare "remote" repository plus a seed clone used to push history into it.
pub struct Remote {
    _dir: TempDir,
    bare: PathBuf,
    seed: PathBuf,
}

impl Remote {
    /// Creates a remote whose `main` branch holds one commit with `README`.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let bare = dir.path().join("remote.git");
        let seed = dir.path().join("seed");

        git(dir.path(), &["init", "-q", "--bare", bare.to_str().unwrap()]);
        git(dir.path(), &["init", "-q", "-b", "main", seed.to_str().unwrap()]);
        git(&seed, &["remote", "add", "origin", bare.to_str().unwrap()]);

        let remote = Self {
            _dir: dir,
            bare,
            seed,
        };
        remote.commit("README", "hello\n");
        git(&remote.bare, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        remote
    }

    /// Location to hand to the synchronizer.
    pub fn url(&self) -> String {
        self.bare.to_string_lossy().into_owned()
    }

    /// Writes `file`, commits on the current seed branch, pushes it, and
    /// returns the new commit id.
    pub fn commit(&self, file: &str, contents: &str) -> String {
        let path = self.seed.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        git(&self.seed, &["add", "-A"]);
        git(&self.seed, &["commit", "-q", "-m", &format!("update {}", file)]);
        git(&self.seed, &["push", "-q", "--force", "origin", "HEAD"]);
        git(&self.seed, &["rev-parse", "HEAD"])
    }

    /// Creates `name` from the current seed commit and switches to it.
    pub fn branch(&self, name: &str) {
        git(&self.seed, &["checkout", "-q", "-b", name]);
        git(&self.seed, &["push", "-q", "origin", "HEAD"]);
    }

    /// Switches the seed to an existing branch.
    pub fn checkout(&self, name: &str) {
        git(&self.seed, &["checkout", "-q", name]);
    }

    /// Tags the current seed commit and pushes the tag.
    pub fn tag(&self, name: &str) {
        git(&self.seed, &["tag", "-a", name, "-m", name]);
        git(&self.seed, &["push", "-q", "origin", name]);
    }

    /// Deletes a branch on the remote.
    pub fn delete_branch(&self, name: &str) {
        git(&self.seed, &["push", "-q", "origin", "--delete", name]);
    }

    /// Commit id a branch points at on the remote.
    pub fn head_of(&self, branch: &str) -> String {
        git(&self.bare, &["rev-parse", &format!("refs/heads/{}", branch)])
    }
}

/// Commit currently checked out in `dir`.
pub fn head(dir: &Path) -> String {
    git(dir, &["rev-parse", "HEAD"])
}

/// Porcelain status of `dir`, empty when clean.
pub fn status(dir: &Path) -> String {
    git(dir, &["status", "--porcelain"])
}
