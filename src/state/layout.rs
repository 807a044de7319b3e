//! 磁盘布局
//!
//! 状态全部放在工作区之外：
//! - `<home>/conf`：共享策略仓库（decomk.conf + Makefile）
//! - `<home>/stamps`：全局 stamp 目录，也是 make 的工作目录
//! - `<home>/env.sh`：供其他进程 source 的变量导出
//! - `<home>/decomk`：工具自身源码，二进制在 `bin/decomk`
//! - `/var/log/decomk`：每次运行的日志

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::{DecomkError, Result};

pub const DEFAULT_HOME: &str = "/var/decomk";
pub const DEFAULT_LOG_DIR: &str = "/var/log/decomk";

/// 以 home 为根的各路径；锁文件都放在对应 git 工作树之外
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateLayout {
    pub home: PathBuf,
}

impl StateLayout {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn tool_dir(&self) -> PathBuf {
        self.home.join("decomk")
    }

    pub fn tool_bin(&self) -> PathBuf {
        self.tool_dir().join("bin").join("decomk")
    }

    pub fn tool_lock(&self) -> PathBuf {
        self.home.join("decomk.lock")
    }

    pub fn conf_dir(&self) -> PathBuf {
        self.home.join("conf")
    }

    pub fn conf_lock(&self) -> PathBuf {
        self.home.join("conf.lock")
    }

    pub fn stamps_dir(&self) -> PathBuf {
        self.home.join("stamps")
    }

    pub fn stamps_lock(&self) -> PathBuf {
        self.stamps_dir().join(".lock")
    }

    /// 默认日志目录不可写时的回退位置
    pub fn log_dir(&self) -> PathBuf {
        self.home.join("log")
    }

    pub fn env_file(&self) -> PathBuf {
        self.home.join("env.sh")
    }
}

/// 解析 home；必须是绝对路径，避免把状态写进当前目录（可能是某个仓库）
pub fn resolve_home(configured: Option<&Path>) -> Result<PathBuf> {
    match configured {
        Some(p) if !p.as_os_str().is_empty() => require_absolute(p, "home"),
        _ => Ok(PathBuf::from(DEFAULT_HOME)),
    }
}

/// 日志根目录及其是否显式配置（只有默认值允许回退）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRoot {
    pub path: PathBuf,
    pub explicit: bool,
}

pub fn resolve_log_root(configured: Option<&Path>) -> Result<LogRoot> {
    match configured {
        Some(p) if !p.as_os_str().is_empty() => Ok(LogRoot {
            path: require_absolute(p, "log dir")?,
            explicit: true,
        }),
        _ => Ok(LogRoot {
            path: PathBuf::from(DEFAULT_LOG_DIR),
            explicit: false,
        }),
    }
}

fn require_absolute(path: &Path, label: &str) -> Result<PathBuf> {
    if !path.is_absolute() {
        return Err(DecomkError::Config(format!(
            "{label} must be an absolute path (got {:?})",
            path.display().to_string()
        )));
    }
    Ok(path.components().collect())
}

/// 确保目录存在
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| DecomkError::io(format!("mkdir {}", path.display()), e))
}
