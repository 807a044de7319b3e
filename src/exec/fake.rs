//! 测试用的内存版 VcsClient / ToolBuilder

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::{DecomkError, Result};
use crate::exec::{ToolBuilder, VcsClient};

#[derive(Debug, Default)]
pub struct FakeVcs {
    pub origins: Mutex<HashMap<PathBuf, String>>,
    pub heads: Mutex<HashMap<PathBuf, String>>,
    /// pull 之后的 HEAD；未设置时 pull 不改变 HEAD
    pub heads_after_pull: Mutex<HashMap<PathBuf, String>>,
    pub fail_pull: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeVcs {
    pub fn with_origin(self, dir: &Path, url: &str) -> Self {
        self.origins
            .lock()
            .unwrap()
            .insert(dir.to_path_buf(), url.to_string());
        self
    }

    pub fn with_head(self, dir: &Path, rev: &str) -> Self {
        self.heads
            .lock()
            .unwrap()
            .insert(dir.to_path_buf(), rev.to_string());
        self
    }

    pub fn with_head_after_pull(self, dir: &Path, rev: &str) -> Self {
        self.heads_after_pull
            .lock()
            .unwrap()
            .insert(dir.to_path_buf(), rev.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VcsClient for FakeVcs {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("clone {url} {}", dest.display()));
        std::fs::create_dir_all(dest.join(".git"))
            .map_err(|e| DecomkError::io("fake clone", e))?;
        self.origins
            .lock()
            .unwrap()
            .insert(dest.to_path_buf(), url.to_string());
        self.heads
            .lock()
            .unwrap()
            .insert(dest.to_path_buf(), "rev-cloned".to_string());
        Ok(())
    }

    async fn pull_ff_only(&self, dir: &Path) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("pull {}", dir.display()));
        if self.fail_pull {
            return Err(DecomkError::Update("git pull --ff-only failed".into()));
        }
        if let Some(rev) = self.heads_after_pull.lock().unwrap().get(dir) {
            self.heads
                .lock()
                .unwrap()
                .insert(dir.to_path_buf(), rev.clone());
        }
        Ok(())
    }

    async fn head_revision(&self, dir: &Path) -> Option<String> {
        self.heads.lock().unwrap().get(dir).cloned()
    }

    async fn origin_url(&self, dir: &Path) -> Option<String> {
        self.origins.lock().unwrap().get(dir).cloned()
    }

    async fn is_work_tree(&self, dir: &Path) -> bool {
        dir.join(".git").exists()
    }
}

/// 构建时在 `<repo>/target/release/decomk` 写入一个占位二进制
#[derive(Debug, Default)]
pub struct FakeBuilder {
    pub builds: Mutex<Vec<PathBuf>>,
    pub fail: bool,
}

#[async_trait]
impl ToolBuilder for FakeBuilder {
    async fn build(&self, repo_dir: &Path) -> Result<PathBuf> {
        self.builds.lock().unwrap().push(repo_dir.to_path_buf());
        if self.fail {
            return Err(DecomkError::Update("cargo build failed".into()));
        }
        let out = repo_dir.join("target/release/decomk");
        std::fs::create_dir_all(out.parent().unwrap()).unwrap();
        std::fs::write(&out, b"#!/bin/sh\n").unwrap();
        Ok(out)
    }
}
