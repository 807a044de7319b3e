//! plan / run 两种执行模式
//!
//! 两者共用：自更新 → 策略仓库 → 解析 Plan。差别只在副作用：
//!
//! | 模式 | env.sh | stamp 锁与 touch | 运行日志 | make |
//! |------|--------|------------------|----------|------|
//! | plan | 打印   | 否               | 否       | `-n` |
//! | run  | 写入   | 是               | 是       | 实际执行 |

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Utc;

use crate::config::Settings;
use crate::core::{DecomkError, Result};
use crate::exec::{ToolBuilder, VcsClient};
use crate::plan::{resolve_plan, Plan, PlanInputs};
use crate::state::{
    create_run_log, ensure_dir, run_id, touch_existing_stamps, write_env_export, write_env_file,
    FileLock, StateLayout,
};
use crate::update::{ensure_conf_repo, restart, SelfUpdater, UpdateOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Plan,
    /// 只打印 Plan 的 JSON，不运行 make
    PlanJson,
    Run,
}

/// 一次调用
#[derive(Debug, Clone)]
pub struct Invocation {
    pub mode: Mode,
    pub settings: Settings,
    pub action_args: Vec<String>,
    /// 重新执行时沿用的参数（不含 argv[0]，-C 已改写为绝对路径）
    pub restart_args: Vec<OsString>,
}

pub async fn execute(
    inv: &Invocation,
    vcs: &dyn VcsClient,
    builder: &dyn ToolBuilder,
) -> Result<()> {
    let inputs = PlanInputs::from_settings(&inv.settings, inv.action_args.clone())?;
    let layout = inputs.layout();

    if inv.settings.self_update {
        let updater = SelfUpdater {
            layout: &layout,
            workspaces_dir: &inputs.workspaces_dir,
            repo_url: inv.settings.tool_repo.as_deref().filter(|u| !u.is_empty()),
            vcs,
            builder,
            current_exe: None,
        };
        if let UpdateOutcome::Restart { binary } = updater.run().await? {
            match restart(&binary, &inv.restart_args)? {}
        }
    } else {
        tracing::debug!("self-update disabled");
    }

    ensure_conf_repo(&layout, inv.settings.conf_repo.as_deref(), vcs).await?;

    let plan = resolve_plan(&inputs, vcs).await?;
    match inv.mode {
        Mode::PlanJson => print_plan_json(&plan),
        Mode::Plan => dry_run(&plan, &inv.settings.make).await,
        Mode::Run => converge(&plan, &inv.settings.make).await,
    }
}

fn print_plan_json(plan: &Plan) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, plan)
        .map_err(|e| DecomkError::io("write plan", e.into()))?;
    writeln!(out).map_err(|e| DecomkError::io("write plan", e))
}

async fn dry_run(plan: &Plan, make: &str) -> Result<()> {
    print_dry_run(&mut std::io::stdout().lock(), plan)
        .map_err(|e| DecomkError::io("write plan", e))?;

    // make 需要工作目录存在；这里只创建目录，不动 stamp
    ensure_dir(&plan.stamp_dir)?;
    plan.make_invocation(make, &["-n"]).run().await
}

fn print_dry_run<W: Write>(w: &mut W, plan: &Plan) -> std::io::Result<()> {
    print_plan(w, plan)?;
    writeln!(w, "\nenv exports (dry-run; not written):")?;
    write_env_export(w, plan, Utc::now())?;
    writeln!(w, "\nmake -n output:")?;
    w.flush()
}

async fn converge(plan: &Plan, make: &str) -> Result<()> {
    let layout = StateLayout::new(&plan.home);
    ensure_dir(&plan.stamp_dir)?;
    let _stamps = FileLock::acquire(&layout.stamps_lock())?;
    touch_existing_stamps(&plan.stamp_dir, SystemTime::now())?;

    write_env_file(plan, Utc::now())?;

    let log = create_run_log(
        &plan.log_root,
        &layout.log_dir(),
        &run_id(Utc::now(), std::process::id()),
    )?;
    tracing::info!(
        targets = ?plan.selection.targets,
        source = %plan.selection.source,
        log = %log.display(),
        "running make"
    );
    plan.make_invocation(make, &[]).run_logged(&log).await
}

/// 人类可读的 Plan 摘要
pub fn print_plan<W: Write>(w: &mut W, plan: &Plan) -> std::io::Result<()> {
    writeln!(w, "home: {}", plan.home.display())?;
    if !plan.workspaces.is_empty() {
        writeln!(w, "workspaces: {}", plan.workspace_names().join(" "))?;
    }
    if !plan.context_keys.is_empty() {
        writeln!(w, "contexts: {}", plan.context_keys.join(" "))?;
    }
    let config: Vec<String> = plan
        .config_paths
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    writeln!(w, "config: {}", config.join(", "))?;
    writeln!(w, "env: {}", plan.env_file.display())?;
    writeln!(w, "stampDir: {}", plan.stamp_dir.display())?;
    if !plan.action_args.is_empty() {
        writeln!(w, "actionArgs: {}", plan.action_args.join(" "))?;
    }
    writeln!(w, "targetSource: {}", plan.selection.source)?;
    writeln!(w, "makefile: {}", plan.makefile.display())?;
    writeln!(w)?;

    writeln!(w, "tuples:")?;
    for t in &plan.tuples {
        writeln!(w, "  {t}")?;
    }
    writeln!(w, "targets:")?;
    if plan.selection.targets.is_empty() {
        writeln!(w, "  (none; make will use its default goal)")?;
    }
    for t in &plan.selection.targets {
        writeln!(w, "  {t}")?;
    }
    Ok(())
}

/// 切换到 -C 指定的目录，返回其绝对路径
pub fn apply_start_dir(dir: &Path) -> Result<PathBuf> {
    let abs = std::path::absolute(dir)
        .map_err(|e| DecomkError::io(format!("abs -C {}", dir.display()), e))?;
    std::env::set_current_dir(&abs)
        .map_err(|e| DecomkError::io(format!("chdir -C {}", dir.display()), e))?;
    Ok(abs)
}

/// 把参数中所有 `-C` / `--chdir` 的值改写为绝对路径，
/// 重新执行时 cwd 已经切换过，相对路径不能再应用一次
pub fn rewrite_start_dir_flag(args: &[OsString], abs: &Path) -> Vec<OsString> {
    let mut out = Vec::with_capacity(args.len());
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let text = arg.to_string_lossy();
        if text == "--" {
            out.push(arg.clone());
            out.extend(iter.by_ref().cloned());
            break;
        }
        if text == "-C" || text == "--chdir" {
            out.push(arg.clone());
            if iter.next().is_some() {
                out.push(abs.as_os_str().to_os_string());
            }
            continue;
        }
        let prefix = if text.starts_with("--chdir=") {
            Some("--chdir=")
        } else if text.starts_with("-C=") {
            Some("-C=")
        } else if text.starts_with("-C") {
            Some("-C")
        } else {
            None
        };
        match prefix {
            Some(prefix) => {
                let mut rewritten = OsString::from(prefix);
                rewritten.push(abs.as_os_str());
                out.push(rewritten);
            }
            None => out.push(arg.clone()),
        }
    }
    out
}
