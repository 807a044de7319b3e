//! decomk 错误类型与退出码
//!
//! 分类：配置错误 / 展开错误 / 并发（锁）错误 / 更新错误 / 执行引擎失败。
//! 全部为致命错误，不做自动重试；由 `exit_code` 映射为进程退出码。

use std::path::PathBuf;

use thiserror::Error;

/// 宏展开错误（环、深度超限、strict 模式下的未知 token）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    /// chain 为从种子到重复名字的完整引用链
    #[error("macro cycle detected: {}", .chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    #[error("max expansion depth exceeded ({limit}) while expanding {key:?}")]
    DepthExceeded { key: String, limit: usize },

    /// parent 为直接引用该 token 的键；种子中的 token 没有 parent
    #[error("unknown token {token:?}{} (unknown_tokens = strict)", .parent.as_ref().map(|p| format!(" in {p:?}")).unwrap_or_default())]
    UnknownToken {
        token: String,
        parent: Option<String>,
    },
}

/// decomk 运行过程中可能出现的错误
#[derive(Error, Debug)]
pub enum DecomkError {
    #[error("config error: {0}")]
    Config(String),

    #[error("context not found: {key:?}")]
    ContextNotFound { key: String },

    #[error("no config found; tried {}; set --config/DECOMK_CONFIG or --conf-repo/DECOMK_CONF_REPO", display_paths(.tried))]
    NoConfig { tried: Vec<PathBuf> },

    #[error("{}: line {line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{what} origin URL mismatch: want {want:?}, got {got:?} (dir {})", .dir.display())]
    OriginMismatch {
        what: &'static str,
        want: String,
        got: String,
        dir: PathBuf,
    },

    #[error(transparent)]
    Expand(#[from] ExpandError),

    #[error("lock {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("update failed: {0}")]
    Update(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// 执行引擎以非零状态退出；log 为本次运行日志（plan 模式下无）
    #[error("make failed (exit {code}){}", .log.as_ref().map(|p| format!("; log: {}", p.display())).unwrap_or_default())]
    Engine { code: i32, log: Option<PathBuf> },
}

impl DecomkError {
    /// 附带上下文的 IO 错误
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// 进程退出码：引擎失败透传其退出码，其余为 1（用法错误由 clap 以 2 退出）
    pub fn exit_code(&self) -> i32 {
        match self {
            DecomkError::Engine { code, .. } => *code,
            _ => 1,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T, E = DecomkError> = std::result::Result<T, E>;
