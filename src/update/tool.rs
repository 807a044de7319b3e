//! 工具自更新：维护 `<home>/decomk` 源码副本，必要时重建并切换到新二进制
//!
//! 整个 clone/pull/build 过程持有 `<home>/decomk.lock`，切换进程之前释放。

use std::path::{Path, PathBuf};

use crate::core::{DecomkError, Result};
use crate::exec::{install_binary, ToolBuilder, VcsClient};
use crate::identity::is_git_repo_root;
use crate::state::{FileLock, StateLayout};

/// 既无显式 URL 也推断不出时使用的上游仓库
pub const DEFAULT_TOOL_REPO_URL: &str = "https://github.com/stevegt/decomk";

/// 自更新的结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// 当前进程就是最新构建的二进制，继续执行
    Current,
    /// 需要切换到 binary 重新执行
    Restart { binary: PathBuf },
}

pub struct SelfUpdater<'a> {
    pub layout: &'a StateLayout,
    pub workspaces_dir: &'a Path,
    /// --tool-repo / DECOMK_TOOL_REPO
    pub repo_url: Option<&'a str>,
    pub vcs: &'a dyn VcsClient,
    pub builder: &'a dyn ToolBuilder,
    /// 未设置时取 std::env::current_exe
    pub current_exe: Option<PathBuf>,
}

impl SelfUpdater<'_> {
    pub async fn run(&self) -> Result<UpdateOutcome> {
        let _lock = FileLock::acquire(&self.layout.tool_lock())?;

        let changed = self.ensure_tool_repo().await?;
        let binary = self.layout.tool_bin();
        if changed || !binary.is_file() {
            let artifact = self.builder.build(&self.layout.tool_dir()).await?;
            install_binary(&artifact, &binary)?;
            tracing::info!(binary = %binary.display(), "decomk rebuilt");
        }

        let exe = match &self.current_exe {
            Some(exe) => exe.clone(),
            None => std::env::current_exe()
                .map_err(|e| DecomkError::io("find current executable", e))?,
        };
        if changed || !same_file(&exe, &binary) {
            tracing::info!(binary = %binary.display(), changed, "re-exec into tool binary");
            return Ok(UpdateOutcome::Restart { binary });
        }
        Ok(UpdateOutcome::Current)
    }

    /// 返回 true 表示刚克隆或 pull 改变了 HEAD
    async fn ensure_tool_repo(&self) -> Result<bool> {
        let dir = self.layout.tool_dir();
        match std::fs::metadata(&dir) {
            Ok(meta) => {
                if !meta.is_dir() {
                    return Err(DecomkError::Config(format!(
                        "tool repo path exists but is not a directory: {}",
                        dir.display()
                    )));
                }
                if !self.vcs.is_work_tree(&dir).await {
                    return Err(DecomkError::Config(format!(
                        "tool repo directory exists but is not a git work tree: {}",
                        dir.display()
                    )));
                }
                if let (Some(want), Some(got)) = (self.repo_url, self.vcs.origin_url(&dir).await) {
                    if want != got {
                        return Err(DecomkError::OriginMismatch {
                            what: "tool repo",
                            want: want.to_string(),
                            got,
                            dir,
                        });
                    }
                }

                let before = self.vcs.head_revision(&dir).await;
                tracing::info!(dir = %dir.display(), "updating tool repo");
                self.vcs.pull_ff_only(&dir).await?;
                let after = self.vcs.head_revision(&dir).await;
                Ok(matches!((before, after), (Some(b), Some(a)) if b != a))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let url = self.clone_url().await;
                crate::state::ensure_dir(&self.layout.home)?;
                tracing::info!(url = %url, dir = %dir.display(), "cloning tool repo");
                self.vcs.clone_repo(&url, &dir).await?;
                Ok(true)
            }
            Err(e) => Err(DecomkError::io(format!("stat {}", dir.display()), e)),
        }
    }

    /// 显式 URL > 同级工作区 `<workspaces>/decomk`（其 origin，否则其路径）> 上游默认
    async fn clone_url(&self) -> String {
        if let Some(url) = self.repo_url {
            return url.to_string();
        }
        let sibling = self.workspaces_dir.join("decomk");
        if is_git_repo_root(&sibling) {
            return match self.vcs.origin_url(&sibling).await {
                Some(origin) => origin,
                None => sibling.to_string_lossy().into_owned(),
            };
        }
        DEFAULT_TOOL_REPO_URL.to_string()
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
