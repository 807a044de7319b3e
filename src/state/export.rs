//! 变量导出文件 `<home>/env.sh`
//!
//! 内容是可直接 source 的 `export NAME='value'` 序列：先是配置元组，
//! 再是 decomk 计算的变量（同名时后者覆盖前者）。

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::core::{DecomkError, Result};
use crate::plan::Plan;
use crate::resolve::split_tuple;

/// 写出完整的导出内容
pub fn write_env_export<W: Write>(w: &mut W, plan: &Plan, now: DateTime<Utc>) -> std::io::Result<()> {
    writeln!(w, "# generated by decomk; do not edit")?;
    writeln!(w, "# time: {}", now.to_rfc3339_opts(SecondsFormat::Secs, true))?;
    if !plan.context_keys.is_empty() {
        writeln!(w, "# contexts: {}", plan.context_keys.join(" "))?;
    }
    if !plan.workspaces.is_empty() {
        writeln!(w, "# workspaces: {}", plan.workspace_names().join(" "))?;
    }
    let config: Vec<String> = plan
        .config_paths
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    writeln!(w, "# config: {}", config.join(", "))?;
    writeln!(w)?;

    for (name, value) in plan.tuples.iter().filter_map(|t| split_tuple(t)) {
        write_export(w, name, value)?;
    }
    for (name, value) in plan.computed_vars() {
        write_export(w, &name, &value)?;
    }
    Ok(())
}

/// 经同目录临时文件 + rename 写入 plan.env_file，读者不会看到半个文件
pub fn write_env_file(plan: &Plan, now: DateTime<Utc>) -> Result<()> {
    let path = &plan.env_file;
    let dir = path
        .parent()
        .ok_or_else(|| DecomkError::Config(format!("bad env file path {}", path.display())))?;
    std::fs::create_dir_all(dir).map_err(|e| DecomkError::io(format!("mkdir {}", dir.display()), e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| DecomkError::io(format!("create temp file in {}", dir.display()), e))?;
    write_env_export(&mut tmp, plan, now)
        .and_then(|_| tmp.flush())
        .map_err(|e| DecomkError::io(format!("write {}", tmp.path().display()), e))?;
    tmp.persist(path)
        .map_err(|e| DecomkError::io(format!("rename to {}", path.display()), e.error))?;
    tracing::debug!(path = %path.display(), "env exports written");
    Ok(())
}

fn write_export<W: Write>(w: &mut W, name: &str, value: &str) -> std::io::Result<()> {
    writeln!(w, "export {name}={}", shell_quote(value))
}

/// POSIX 单引号转义：内嵌的 `'` 写成 `'"'"'`
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    format!("'{}'", s.replace('\'', r#"'"'"'"#))
}
