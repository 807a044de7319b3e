//! 共享策略仓库 `<home>/conf`（decomk.conf + Makefile）的克隆与更新

use crate::core::{DecomkError, Result};
use crate::exec::VcsClient;
use crate::state::{ensure_dir, FileLock, StateLayout};

/// 未配置 URL 时什么也不做；锁文件在工作树之外，避免干扰 clone
pub async fn ensure_conf_repo(
    layout: &StateLayout,
    repo_url: Option<&str>,
    vcs: &dyn VcsClient,
) -> Result<()> {
    let Some(url) = repo_url.filter(|u| !u.is_empty()) else {
        return Ok(());
    };
    let _lock = FileLock::acquire(&layout.conf_lock())?;

    let dir = layout.conf_dir();
    match std::fs::metadata(&dir) {
        Ok(meta) => {
            if !meta.is_dir() {
                return Err(DecomkError::Config(format!(
                    "config repo path exists but is not a directory: {}",
                    dir.display()
                )));
            }
            if !vcs.is_work_tree(&dir).await {
                return Err(DecomkError::Config(format!(
                    "config repo directory exists but is not a git work tree: {}",
                    dir.display()
                )));
            }
            if let Some(origin) = vcs.origin_url(&dir).await {
                if origin != url {
                    return Err(DecomkError::OriginMismatch {
                        what: "config repo",
                        want: url.to_string(),
                        got: origin,
                        dir,
                    });
                }
            }
            tracing::info!(dir = %dir.display(), "updating config repo");
            vcs.pull_ff_only(&dir).await
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            ensure_dir(&layout.home)?;
            tracing::info!(url = %url, dir = %dir.display(), "cloning config repo");
            vcs.clone_repo(url, &dir).await
        }
        Err(e) => Err(DecomkError::io(format!("stat {}", dir.display()), e)),
    }
}
