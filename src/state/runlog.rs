//! 每次运行的日志目录：`<log root>/<run id>/make.log`

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::core::{DecomkError, Result};
use crate::state::LogRoot;

pub const RUN_LOG_FILE: &str = "make.log";

/// 纳秒精度的 UTC 时间加 pid，几乎同时启动的两次运行也不会冲突
pub fn run_id(now: DateTime<Utc>, pid: u32) -> String {
    format!("{}-{pid}", now.format("%Y%m%dT%H%M%S%.9fZ"))
}

/// 创建 base；已存在时依次尝试 `base-2`、`base-3`…
pub fn create_unique_dir(base: &Path) -> std::io::Result<PathBuf> {
    if let Some(parent) = base.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut dir = base.to_path_buf();
    let mut n = 2;
    loop {
        match std::fs::create_dir(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let mut name = base.as_os_str().to_os_string();
                name.push(format!("-{n}"));
                dir = PathBuf::from(name);
                n += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// 创建运行日志目录与空的 make.log（独占创建），返回日志路径。
/// 仅当日志根是默认值时，失败后回退到 fallback_root。
pub fn create_run_log(log_root: &LogRoot, fallback_root: &Path, run_id: &str) -> Result<PathBuf> {
    let base = log_root.path.join(run_id);
    let dir = match create_unique_dir(&base) {
        Ok(dir) => dir,
        Err(e) if log_root.explicit => {
            return Err(DecomkError::io(format!("create run log dir {}", base.display()), e))
        }
        Err(e) => {
            let fallback_base = fallback_root.join(run_id);
            let dir = create_unique_dir(&fallback_base).map_err(|fe| {
                DecomkError::Config(format!(
                    "create run log dir: tried {}: {e}; fallback {}: {fe}",
                    base.display(),
                    fallback_base.display()
                ))
            })?;
            tracing::warn!(
                log_dir = %log_root.path.display(),
                fallback = %fallback_root.display(),
                "log dir not writable; falling back (set --log-dir or DECOMK_LOG_DIR to override)"
            );
            dir
        }
    };

    let log = dir.join(RUN_LOG_FILE);
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&log)
        .map_err(|e| DecomkError::io(format!("create {}", log.display()), e))?;
    Ok(log)
}
