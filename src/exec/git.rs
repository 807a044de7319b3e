//! 版本控制边界：clone / pull / 修订号 / origin 查询
//!
//! VcsClient 是对外部版本控制的抽象；GitCli 直接调用 `git -C <dir> ...`（不经 shell）。

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::core::{DecomkError, Result};

#[async_trait]
pub trait VcsClient: Send + Sync {
    /// 克隆 url 到 dest（dest 不应存在）
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<()>;

    /// 仅快进地拉取
    async fn pull_ff_only(&self, dir: &Path) -> Result<()>;

    /// 当前 HEAD；无法获取时为 None
    async fn head_revision(&self, dir: &Path) -> Option<String>;

    /// remote.origin.url；未配置或不是仓库时为 None
    async fn origin_url(&self, dir: &Path) -> Option<String>;

    /// dir 是否位于 git 工作树内
    async fn is_work_tree(&self, dir: &Path) -> bool;
}

/// 基于 git 命令行的实现
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    fn command(&self, dir: Option<&Path>, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(dir) = dir {
            cmd.arg("-C").arg(dir);
        }
        cmd.args(args);
        cmd
    }

    /// 运行并返回去除首尾空白的 stdout；失败或输出为空时为 None
    async fn output(&self, dir: &Path, args: &[&str]) -> Option<String> {
        let output = self
            .command(Some(dir), args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!text.is_empty()).then_some(text)
    }

    /// 运行并把子进程输出转到本进程 stderr（stdout 留给 plan 输出）
    async fn run_streaming(&self, dir: Option<&Path>, args: &[&str]) -> Result<()> {
        tracing::info!(args = ?args, dir = ?dir, "git");
        let status = self
            .command(dir, args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(std::io::stderr()))
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| DecomkError::io(format!("spawn {}", self.program), e))?;
        if status.success() {
            Ok(())
        } else {
            Err(DecomkError::Update(format!(
                "git {} failed: {status}",
                args.join(" ")
            )))
        }
    }
}

#[async_trait]
impl VcsClient for GitCli {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        let dest = dest.to_string_lossy();
        self.run_streaming(None, &["clone", url, dest.as_ref()]).await
    }

    async fn pull_ff_only(&self, dir: &Path) -> Result<()> {
        self.run_streaming(Some(dir), &["pull", "--ff-only"]).await
    }

    async fn head_revision(&self, dir: &Path) -> Option<String> {
        self.output(dir, &["rev-parse", "HEAD"]).await
    }

    async fn origin_url(&self, dir: &Path) -> Option<String> {
        self.output(dir, &["config", "--get", "remote.origin.url"])
            .await
    }

    async fn is_work_tree(&self, dir: &Path) -> bool {
        self.output(dir, &["rev-parse", "--is-inside-work-tree"])
            .await
            .is_some_and(|out| out == "true")
    }
}
