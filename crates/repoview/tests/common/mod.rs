//! Shared test utilities for repoview integration tests.
//!
//! `MirrorHarness` owns a temp directory holding an upstream git repository,
//! a storage root for local clones, and a config file pointing at the
//! upstream through a `file://` URL.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use repoview::{load_config_from_str, Registry};

pub struct MirrorHarness {
    temp_dir: TempDir,
    /// Non-bare upstream repository on branch `main`.
    pub upstream: PathBuf,
    /// Storage root local clones are written under.
    pub storage: PathBuf,
}

impl MirrorHarness {
    /// Upstream with one commit containing a README, a Python file and an image.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let upstream = temp_dir.path().join("upstream");
        let storage = temp_dir.path().join("repos");
        std::fs::create_dir_all(&upstream).expect("Failed to create upstream dir");
        std::fs::create_dir_all(&storage).expect("Failed to create storage dir");

        let harness = Self {
            temp_dir,
            upstream,
            storage,
        };
        harness.git(&["init", "--quiet", "-b", "main"]);
        harness.write("README.md", "# Demo\n");
        harness.write("src/app.py", "print('hello')\n");
        harness.write("docs/logo.png", "not really a png");
        harness.commit("initial");
        harness
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// `file://` URL of the upstream.
    pub fn upstream_url(&self) -> String {
        format!("file://{}", self.upstream.display())
    }

    /// Registry with a single repository named `demo`.
    pub fn registry(&self) -> Registry {
        self.registry_with("")
    }

    /// Registry with a single repository named `demo` and extra YAML lines
    /// appended to its entry.
    pub fn registry_with(&self, extra: &str) -> Registry {
        load_config_from_str(&self.config_yaml(extra)).expect("Failed to load config")
    }

    pub fn config_yaml(&self, extra: &str) -> String {
        format!(
            "repos:\n  demo:\n    url: {}\n{}",
            self.upstream_url(),
            extra
        )
    }

    /// Writes a file in the upstream worktree, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.upstream.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(path, content).expect("Failed to write upstream file");
    }

    /// Stages everything and commits it upstream; returns the new commit id.
    pub fn commit(&self, message: &str) -> String {
        self.git(&["add", "--all"]);
        self.git(&[
            "-c",
            "user.name=Test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
            "commit",
            "--quiet",
            "-m",
            message,
        ]);
        self.git(&["rev-parse", "HEAD"]).trim().to_string()
    }

    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.upstream)
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("HOME", self.temp_dir.path())
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }
}
