//! 解析流水线：配置 → 上下文 → 宏展开 → 划分 → 目标选择
//!
//! 结果 Plan 构建后不再修改；plan 与 run 两种模式共用同一份 Plan，
//! 保证两者传给 make 的内容一致。

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Settings;
use crate::contexts::load_layers;
use crate::core::{DecomkError, Result};
use crate::exec::{MakeInvocation, VcsClient};
use crate::expand::{expand_tokens, ExpandOptions};
use crate::identity::{
    context_keys_for_workspaces, discover_workspaces, seed_tokens, select_explicit_context,
    WorkspaceRepo, DEFAULT_WORKSPACES_DIR,
};
use crate::resolve::{partition, select_targets, Selection};
use crate::state::{resolve_home, resolve_log_root, LogRoot, StateLayout};

/// 计算变量名，按写出顺序排列
pub const COMPUTED_VARS: [&str; 5] = [
    "DECOMK_HOME",
    "DECOMK_STAMPDIR",
    "DECOMK_WORKSPACES",
    "DECOMK_CONTEXTS",
    "DECOMK_PACKAGES",
];

/// 构建 Plan 所需的输入（已解析为绝对路径）
#[derive(Debug, Clone)]
pub struct PlanInputs {
    pub home: PathBuf,
    pub log_root: LogRoot,
    pub workspaces_dir: PathBuf,
    pub explicit_config: Option<PathBuf>,
    pub explicit_context: Option<String>,
    pub makefile: Option<PathBuf>,
    pub expand: ExpandOptions,
    pub action_args: Vec<String>,
}

impl PlanInputs {
    pub fn from_settings(settings: &Settings, action_args: Vec<String>) -> Result<Self> {
        let non_empty = |p: &Option<PathBuf>| p.clone().filter(|p| !p.as_os_str().is_empty());
        Ok(Self {
            home: resolve_home(settings.home.as_deref())?,
            log_root: resolve_log_root(settings.log_dir.as_deref())?,
            workspaces_dir: non_empty(&settings.workspaces_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSPACES_DIR)),
            explicit_config: non_empty(&settings.config).map(absolute).transpose()?,
            explicit_context: settings
                .context
                .clone()
                .filter(|c| !c.trim().is_empty()),
            makefile: non_empty(&settings.makefile).map(absolute).transpose()?,
            expand: ExpandOptions {
                max_depth: settings.max_expand_depth,
                unknown_tokens: settings.unknown_tokens,
            },
            action_args,
        })
    }

    pub fn layout(&self) -> StateLayout {
        StateLayout::new(&self.home)
    }
}

/// 一次调用的完整解析结果
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub home: PathBuf,
    pub log_root: LogRoot,
    pub workspaces_dir: PathBuf,
    pub workspaces: Vec<WorkspaceRepo>,
    /// 展开种子（DEFAULT 在前）
    pub context_keys: Vec<String>,
    /// 实际加载的配置来源，低优先级在前
    pub config_paths: Vec<PathBuf>,
    pub stamp_dir: PathBuf,
    pub env_file: PathBuf,
    pub makefile: PathBuf,
    /// 划分前的扁平展开结果
    pub expanded: Vec<String>,
    pub tuples: Vec<String>,
    /// 配置中的目标 token
    pub targets: Vec<String>,
    pub action_args: Vec<String>,
    pub selection: Selection,
}

impl Plan {
    pub fn workspace_names(&self) -> Vec<&str> {
        self.workspaces.iter().map(|w| w.name.as_str()).collect()
    }

    /// decomk 自己定义的变量；排在配置元组之后，保证不被配置覆盖
    pub fn computed_vars(&self) -> Vec<(String, String)> {
        let values = [
            self.home.display().to_string(),
            self.stamp_dir.display().to_string(),
            self.workspace_names().join(" "),
            self.context_keys.join(" "),
            self.selection.targets.join(" "),
        ];
        COMPUTED_VARS
            .iter()
            .zip(values)
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    /// 组装执行引擎调用（flags 如 plan 模式的 `-n`）
    pub fn make_invocation(&self, program: &str, flags: &[&str]) -> MakeInvocation {
        MakeInvocation {
            program: program.to_string(),
            flags: flags.iter().map(|f| f.to_string()).collect(),
            makefile: Some(self.makefile.clone()),
            tuples: self.tuples.clone(),
            computed: self.computed_vars(),
            targets: self.selection.targets.clone(),
            dir: self.stamp_dir.clone(),
        }
    }
}

/// 解析配置并构建 Plan；不做任何写操作
pub async fn resolve_plan(inputs: &PlanInputs, vcs: &dyn VcsClient) -> Result<Plan> {
    let layout = inputs.layout();

    let sources = config_sources(&layout, inputs.explicit_config.as_deref())?;
    let loaded = load_layers(&sources)?;
    let defs = &loaded.defs;

    let (workspaces, context_keys) = match inputs.explicit_context.as_deref() {
        Some(key) => (Vec::new(), vec![select_explicit_context(defs, key)?]),
        None => {
            let repos = discover_workspaces(&inputs.workspaces_dir, vcs).await?;
            let keys = context_keys_for_workspaces(defs, &repos);
            (repos, keys)
        }
    };

    let seed = seed_tokens(defs, &context_keys);
    let expanded = expand_tokens(defs, &seed, &inputs.expand)?;
    let parts = partition(&expanded);
    let selection = select_targets(&parts.targets, &parts.tuples, &inputs.action_args);
    let makefile = select_makefile(
        &layout,
        inputs.makefile.as_deref(),
        inputs.explicit_config.as_deref(),
    )?;

    tracing::debug!(
        contexts = ?seed,
        tuples = parts.tuples.len(),
        targets = ?selection.targets,
        source = %selection.source,
        "plan resolved"
    );

    Ok(Plan {
        home: inputs.home.clone(),
        log_root: inputs.log_root.clone(),
        workspaces_dir: inputs.workspaces_dir.clone(),
        workspaces,
        context_keys: seed,
        config_paths: loaded.paths,
        stamp_dir: layout.stamps_dir(),
        env_file: layout.env_file(),
        makefile,
        expanded,
        tuples: parts.tuples,
        targets: parts.targets,
        action_args: inputs.action_args.clone(),
        selection,
    })
}

/// 策略仓库的 decomk.conf（最低）< 显式配置（最高）
fn config_sources(layout: &StateLayout, explicit: Option<&Path>) -> Result<Vec<PathBuf>> {
    let repo_config = layout.conf_dir().join("decomk.conf");
    let mut sources = Vec::new();
    if repo_config.is_file() {
        sources.push(repo_config.clone());
    }
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(DecomkError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        sources.push(path.to_path_buf());
    }
    if sources.is_empty() {
        return Err(DecomkError::NoConfig {
            tried: vec![repo_config],
        });
    }
    Ok(sources)
}

/// --makefile > 显式配置同目录的 Makefile > `<home>/conf/Makefile`
fn select_makefile(
    layout: &StateLayout,
    explicit: Option<&Path>,
    explicit_config: Option<&Path>,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(DecomkError::Config(format!(
                "makefile not found: {}",
                path.display()
            )));
        }
        return Ok(path.to_path_buf());
    }
    let sibling = explicit_config
        .and_then(Path::parent)
        .map(|dir| dir.join("Makefile"));
    sibling
        .into_iter()
        .chain(std::iter::once(layout.conf_dir().join("Makefile")))
        .find(|p| p.is_file())
        .ok_or_else(|| {
            DecomkError::Config("no Makefile found; use --makefile to set an explicit path".into())
        })
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    std::path::absolute(&path)
        .map_err(|e| DecomkError::io(format!("absolute path of {}", path.display()), e))
}
