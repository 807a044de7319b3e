//! 切换到新构建的二进制
//!
//! Unix 上用 exec(2) 原地替换当前进程（保留 pid、cwd 与环境）；
//! 其他平台启动子进程、等待其结束并以其状态退出。

use std::convert::Infallible;
use std::ffi::OsString;
use std::path::Path;

use crate::core::{DecomkError, Result};

/// args 不含 argv[0]；-C 需要事先改写为绝对路径
#[cfg(unix)]
pub fn restart(binary: &Path, args: &[OsString]) -> Result<Infallible> {
    use std::os::unix::process::CommandExt;

    let err = std::process::Command::new(binary).args(args).exec();
    Err(DecomkError::io(format!("exec {}", binary.display()), err))
}

#[cfg(not(unix))]
pub fn restart(binary: &Path, args: &[OsString]) -> Result<Infallible> {
    let status = std::process::Command::new(binary)
        .args(args)
        .status()
        .map_err(|e| DecomkError::io(format!("spawn {}", binary.display()), e))?;
    std::process::exit(status.code().unwrap_or(1))
}
