//! 命令行定义
//!
//! ```text
//! decomk plan [flags] [ACTION...]   # 打印解析结果并运行 make -n，不写任何状态
//! decomk run  [flags] [ACTION...]   # 写 env.sh、刷新 stamp、运行 make 并记录日志
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::command::Mode;
use crate::config::SettingsOverrides;
use crate::expand::UnknownTokens;

#[derive(Parser, Debug)]
#[command(name = "decomk", version, about = "Resolve decomk.conf contexts and converge the container with make")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the resolved plan and env exports, then run `make -n`
    Plan {
        #[command(flatten)]
        common: CommonArgs,
        /// Print the plan as JSON and skip `make -n`
        #[arg(long)]
        json: bool,
        /// Action variables (e.g. INSTALL) or literal make targets
        #[arg(value_name = "ACTION")]
        action_args: Vec<String>,
    },
    /// Write env.sh, refresh stamps and run make in the stamp directory
    Run {
        #[command(flatten)]
        common: CommonArgs,
        /// Action variables (e.g. INSTALL) or literal make targets
        #[arg(value_name = "ACTION")]
        action_args: Vec<String>,
    },
}

/// plan 与 run 共用的参数
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Change to DIR before doing anything else
    #[arg(short = 'C', long = "chdir", value_name = "DIR")]
    pub start_dir: Option<PathBuf>,
    /// State root (env DECOMK_HOME, default /var/decomk)
    #[arg(long, value_name = "DIR")]
    pub home: Option<PathBuf>,
    /// Per-run log root (env DECOMK_LOG_DIR, default /var/log/decomk)
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
    /// Directory scanned for workspace checkouts (env DECOMK_WORKSPACES_DIR, default /workspaces)
    #[arg(long = "workspaces", value_name = "DIR")]
    pub workspaces_dir: Option<PathBuf>,
    /// Use this context instead of scanning workspaces (env DECOMK_CONTEXT)
    #[arg(long, value_name = "KEY")]
    pub context: Option<String>,
    /// Extra decomk.conf applied over the policy repo's (env DECOMK_CONFIG)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Makefile to run (default: next to --config, else <home>/conf/Makefile)
    #[arg(long, value_name = "FILE")]
    pub makefile: Option<PathBuf>,
    /// decomk source repo used for self-update (env DECOMK_TOOL_REPO)
    #[arg(long, value_name = "URL")]
    pub tool_repo: Option<String>,
    /// Policy repo cloned into <home>/conf (env DECOMK_CONF_REPO)
    #[arg(long, value_name = "URL")]
    pub conf_repo: Option<String>,
    /// TOML file with default settings
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
    /// Maximum macro expansion depth (0 = 64)
    #[arg(long, value_name = "N")]
    pub max_expand_depth: Option<usize>,
    /// How to treat tokens that are neither names nor NAME=value tuples
    #[arg(long, value_enum, value_name = "POLICY")]
    pub unknown_tokens: Option<UnknownTokens>,
    /// Skip updating and rebuilding decomk itself
    #[arg(long)]
    pub no_self_update: bool,
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommonArgs {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            home: self.home.clone(),
            log_dir: self.log_dir.clone(),
            workspaces_dir: self.workspaces_dir.clone(),
            context: self.context.clone(),
            config: self.config.clone(),
            makefile: self.makefile.clone(),
            tool_repo: self.tool_repo.clone(),
            conf_repo: self.conf_repo.clone(),
            max_expand_depth: self.max_expand_depth,
            unknown_tokens: self.unknown_tokens,
            self_update: self.no_self_update.then_some(false),
        }
    }
}

impl Cli {
    pub fn common(&self) -> &CommonArgs {
        match &self.command {
            Commands::Plan { common, .. } | Commands::Run { common, .. } => common,
        }
    }

    pub fn mode(&self) -> Mode {
        match &self.command {
            Commands::Plan { json: true, .. } => Mode::PlanJson,
            Commands::Plan { .. } => Mode::Plan,
            Commands::Run { .. } => Mode::Run,
        }
    }

    pub fn action_args(&self) -> &[String] {
        match &self.command {
            Commands::Plan { action_args, .. } | Commands::Run { action_args, .. } => action_args,
        }
    }
}
