//! 执行引擎调用：组装 make argv 并运行
//!
//! argv 顺序：`[flags] [-f makefile] [配置元组] [计算元组] [目标]`。
//! 计算元组排在配置元组之后，make 以最后一次赋值为准，因此它们总是生效。

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;

use crate::core::{DecomkError, Result};

/// 未配置 DECOMK_MAKE 时的执行引擎
pub const DEFAULT_MAKE_PROGRAM: &str = "make";

/// 一次执行引擎调用
#[derive(Debug, Clone, Default)]
pub struct MakeInvocation {
    pub program: String,
    /// 如 plan 模式的 `-n`
    pub flags: Vec<String>,
    pub makefile: Option<PathBuf>,
    pub tuples: Vec<String>,
    /// (NAME, value)：既作为命令行元组，也写入子进程环境
    pub computed: Vec<(String, String)>,
    pub targets: Vec<String>,
    pub dir: PathBuf,
}

impl MakeInvocation {
    pub fn program(&self) -> &str {
        if self.program.is_empty() {
            DEFAULT_MAKE_PROGRAM
        } else {
            &self.program
        }
    }

    /// 不含程序名的参数列表
    pub fn args(&self) -> Vec<String> {
        let mut args = self.flags.clone();
        if let Some(makefile) = &self.makefile {
            args.push("-f".to_string());
            args.push(makefile.to_string_lossy().into_owned());
        }
        args.extend(self.tuples.iter().cloned());
        args.extend(self.computed.iter().map(|(k, v)| format!("{k}={v}")));
        args.extend(self.targets.iter().cloned());
        args
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(self.program());
        cmd.args(self.args())
            .current_dir(&self.dir)
            .envs(self.computed.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit());
        cmd
    }

    /// 运行并继承终端输出（plan 模式）
    pub async fn run(&self) -> Result<()> {
        tracing::debug!(program = %self.program(), args = ?self.args(), dir = %self.dir.display(), "exec");
        let status = self
            .command()
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| DecomkError::io(format!("spawn {}", self.program()), e))?;
        check_status(status, None)
    }

    /// 运行并把 stdout/stderr 同时写入终端与 log（追加到已存在的日志文件）
    pub async fn run_logged(&self, log: &Path) -> Result<()> {
        tracing::info!(program = %self.program(), args = ?self.args(), log = %log.display(), "exec");
        let mut child = self
            .command()
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DecomkError::io(format!("spawn {}", self.program()), e))?;

        let open_log = || async {
            tokio::fs::OpenOptions::new()
                .append(true)
                .open(log)
                .await
                .map_err(|e| DecomkError::io(format!("open {}", log.display()), e))
        };
        let out_log = open_log().await?;
        let err_log = open_log().await?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_task = tokio::spawn(async move {
            match stdout {
                Some(r) => tee(r, tokio::io::stdout(), out_log).await,
                None => Ok(()),
            }
        });
        let err_task = tokio::spawn(async move {
            match stderr {
                Some(r) => tee(r, tokio::io::stderr(), err_log).await,
                None => Ok(()),
            }
        });

        let status = child
            .wait()
            .await
            .map_err(|e| DecomkError::io(format!("wait {}", self.program()), e))?;
        for task in [out_task, err_task] {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "copying engine output failed"),
                Err(e) => tracing::warn!(error = %e, "output task panicked"),
            }
        }
        check_status(status, Some(log))
    }
}

fn check_status(status: std::process::ExitStatus, log: Option<&Path>) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    let code = status.code().filter(|c| *c != 0).unwrap_or(1);
    Err(DecomkError::Engine {
        code,
        log: log.map(Path::to_path_buf),
    })
}

/// 逐块复制 reader 到两个 writer
async fn tee<R, A, B>(mut reader: R, mut a: A, mut b: B) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    A: AsyncWrite + Unpin,
    B: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; 8192];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        a.write_all(&buf[..n]).await?;
        b.write_all(&buf[..n]).await?;
    }
    a.flush().await?;
    b.flush().await?;
    Ok(())
}
