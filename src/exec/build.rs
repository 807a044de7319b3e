//! 工具自身的构建边界：在工具仓库中产出 decomk 二进制

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::core::{DecomkError, Result};

/// 构建产物的文件名
pub const BINARY_NAME: &str = "decomk";

#[async_trait]
pub trait ToolBuilder: Send + Sync {
    /// 在 repo_dir 中构建，返回产物路径
    async fn build(&self, repo_dir: &Path) -> Result<PathBuf>;
}

/// `cargo build --release`
#[derive(Debug, Clone)]
pub struct CargoBuilder {
    program: String,
}

impl Default for CargoBuilder {
    fn default() -> Self {
        Self {
            program: "cargo".to_string(),
        }
    }
}

impl CargoBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ToolBuilder for CargoBuilder {
    async fn build(&self, repo_dir: &Path) -> Result<PathBuf> {
        tracing::info!(dir = %repo_dir.display(), "building decomk");
        let status = Command::new(&self.program)
            .args(["build", "--release", "--bin", BINARY_NAME])
            .current_dir(repo_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(std::io::stderr()))
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| DecomkError::io(format!("spawn {}", self.program), e))?;
        if !status.success() {
            return Err(DecomkError::Update(format!(
                "cargo build in {} failed: {status}",
                repo_dir.display()
            )));
        }

        let artifact = repo_dir.join("target").join("release").join(BINARY_NAME);
        if !artifact.is_file() {
            return Err(DecomkError::Update(format!(
                "build produced no binary at {}",
                artifact.display()
            )));
        }
        Ok(artifact)
    }
}

/// 先复制到同目录临时名再 rename，正在运行的旧二进制不受影响
pub fn install_binary(artifact: &Path, dest: &Path) -> Result<()> {
    let dir = dest
        .parent()
        .ok_or_else(|| DecomkError::Config(format!("bad binary path {}", dest.display())))?;
    std::fs::create_dir_all(dir).map_err(|e| DecomkError::io(format!("mkdir {}", dir.display()), e))?;

    let tmp = tempfile::Builder::new()
        .prefix(".decomk-")
        .tempfile_in(dir)
        .map_err(|e| DecomkError::io(format!("create temp file in {}", dir.display()), e))?;
    std::fs::copy(artifact, tmp.path()).map_err(|e| {
        DecomkError::io(
            format!("copy {} -> {}", artifact.display(), tmp.path().display()),
            e,
        )
    })?;
    tmp.persist(dest)
        .map_err(|e| DecomkError::io(format!("install {}", dest.display()), e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_install_binary_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("target/release/decomk");
        std::fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        std::fs::write(&artifact, "new").unwrap();

        let dest = dir.path().join("bin/decomk");
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::write(&dest, "old").unwrap();

        install_binary(&artifact, &dest).unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "new");

        let leftovers: Vec<_> = std::fs::read_dir(dest.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".decomk-"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
