//! 工作区发现
//!
//! 预期布局是工作区根下每个子目录一个检出（如 /workspaces/<repo>），不递归。
//! 子目录不必是 git 仓库；缺少 origin 时退回到目录名作为身份线索。

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::core::{DecomkError, Result};
use crate::exec::VcsClient;
use crate::identity::remote::parse_owner_repo;

/// 工作区根未配置时的默认值
pub const DEFAULT_WORKSPACES_DIR: &str = "/workspaces";

/// 可能参与上下文选择的工作区
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceRepo {
    pub root: PathBuf,
    /// root 的目录名
    pub name: String,
    pub origin_url: Option<String>,
    pub owner_repo: Option<String>,
    /// 从 origin 解析出的仓库名，解析不到时等于 name
    pub repo_name: String,
}

impl WorkspaceRepo {
    /// 身份候选，从最具体到最宽泛
    pub fn identity_candidates(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(3);
        if let Some(owner_repo) = self.owner_repo.as_deref() {
            out.push(owner_repo);
        }
        out.push(self.repo_name.as_str());
        out.push(self.name.as_str());
        out
    }
}

/// 扫描 workspaces_dir 的直接子目录（跳过隐藏目录），按路径排序；根目录不存在时返回空
pub async fn discover_workspaces(
    workspaces_dir: &Path,
    vcs: &dyn VcsClient,
) -> Result<Vec<WorkspaceRepo>> {
    if !workspaces_dir.exists() {
        tracing::debug!(dir = %workspaces_dir.display(), "workspaces dir missing");
        return Ok(Vec::new());
    }

    let mut roots = Vec::new();
    for entry in WalkDir::new(workspaces_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let context = format!("read workspaces dir {}", workspaces_dir.display());
            match e.into_io_error() {
                Some(io) => DecomkError::io(context, io),
                None => DecomkError::Config(context),
            }
        })?;
        if !entry.file_type().is_dir() || entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        roots.push(entry.into_path());
    }
    roots.sort();

    let mut repos = Vec::with_capacity(roots.len());
    for root in roots {
        repos.push(inspect_workspace(root, vcs).await);
    }
    Ok(repos)
}

/// 从工作区根推导身份线索
pub async fn inspect_workspace(root: PathBuf, vcs: &dyn VcsClient) -> WorkspaceRepo {
    let root = std::path::absolute(&root).unwrap_or(root);
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let origin_url = vcs.origin_url(&root).await;
    let identity = origin_url
        .as_deref()
        .map(parse_owner_repo)
        .unwrap_or_default();

    WorkspaceRepo {
        repo_name: identity.repo_name.unwrap_or_else(|| name.clone()),
        owner_repo: identity.owner_repo,
        origin_url,
        name,
        root,
    }
}

/// dir 下是否存在 `.git`（目录或文件）
pub fn is_git_repo_root(dir: &Path) -> bool {
    dir.join(".git").exists()
}
