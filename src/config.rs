//! 运行设置：可选 TOML 文件、`DECOMK_*` 环境变量与命令行参数
//!
//! 优先级由低到高：内置默认值 < `--settings` 文件 < 环境变量 < 命令行。
//! 环境变量去掉 `DECOMK_` 前缀后即为键名（如 `DECOMK_LOG_DIR` → `log_dir`）；
//! 双下划线保留给嵌套键。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::exec::DEFAULT_MAKE_PROGRAM;
use crate::expand::UnknownTokens;

/// 合并后的设置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 状态根目录，未设置时为 /var/decomk
    pub home: Option<PathBuf>,
    /// 运行日志根目录，未设置时为 /var/log/decomk（不可写则回退到 `<home>/log`）
    pub log_dir: Option<PathBuf>,
    pub workspaces_dir: Option<PathBuf>,
    /// 显式上下文，设置后不扫描工作区
    pub context: Option<String>,
    /// 显式 decomk.conf，覆盖策略仓库中的同名键
    pub config: Option<PathBuf>,
    pub makefile: Option<PathBuf>,
    pub tool_repo: Option<String>,
    pub conf_repo: Option<String>,
    /// 执行引擎程序名
    #[serde(default = "default_make")]
    pub make: String,
    /// 0 表示默认深度
    pub max_expand_depth: usize,
    pub unknown_tokens: UnknownTokens,
    #[serde(default = "default_self_update")]
    pub self_update: bool,
}

fn default_make() -> String {
    DEFAULT_MAKE_PROGRAM.to_string()
}

fn default_self_update() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            home: None,
            log_dir: None,
            workspaces_dir: None,
            context: None,
            config: None,
            makefile: None,
            tool_repo: None,
            conf_repo: None,
            make: default_make(),
            max_expand_depth: 0,
            unknown_tokens: UnknownTokens::default(),
            self_update: default_self_update(),
        }
    }
}

/// 命令行给出的覆盖值（None 表示未指定）
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub home: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub workspaces_dir: Option<PathBuf>,
    pub context: Option<String>,
    pub config: Option<PathBuf>,
    pub makefile: Option<PathBuf>,
    pub tool_repo: Option<String>,
    pub conf_repo: Option<String>,
    pub max_expand_depth: Option<usize>,
    pub unknown_tokens: Option<UnknownTokens>,
    /// 仅 `--no-self-update` 时为 Some(false)
    pub self_update: Option<bool>,
}

/// 加载设置
///
/// env 为 None 时读取进程环境；测试可注入固定的变量表。
pub fn load_settings(
    settings_file: Option<&Path>,
    env: Option<HashMap<String, String>>,
    overrides: &SettingsOverrides,
) -> Result<Settings, config::ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = settings_file {
        builder = builder.add_source(
            config::File::from(path.to_path_buf())
                .format(config::FileFormat::Toml)
                .required(true),
        );
    }

    builder = builder.add_source(
        config::Environment::with_prefix("DECOMK")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env),
    );

    let path_str = |p: &Option<PathBuf>| p.as_ref().map(|p| p.to_string_lossy().into_owned());
    builder = builder
        .set_override_option("home", path_str(&overrides.home))?
        .set_override_option("log_dir", path_str(&overrides.log_dir))?
        .set_override_option("workspaces_dir", path_str(&overrides.workspaces_dir))?
        .set_override_option("context", overrides.context.clone())?
        .set_override_option("config", path_str(&overrides.config))?
        .set_override_option("makefile", path_str(&overrides.makefile))?
        .set_override_option("tool_repo", overrides.tool_repo.clone())?
        .set_override_option("conf_repo", overrides.conf_repo.clone())?
        .set_override_option(
            "max_expand_depth",
            overrides.max_expand_depth.map(|d| d as i64),
        )?
        .set_override_option(
            "unknown_tokens",
            overrides.unknown_tokens.map(|u| u.as_str().to_string()),
        )?
        .set_override_option("self_update", overrides.self_update)?;

    let c = builder.build()?;
    c.try_deserialize()
}
