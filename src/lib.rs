//! decomk：把声明式的 decomk.conf 解析为 make 调用，收敛开发容器的工具集
//!
//! 模块划分：
//! - **contexts**: decomk.conf 语法、叠加层加载与合并
//! - **expand**: isconf 风格宏展开（环检测、深度限制）
//! - **resolve**: 变量元组 / 目标划分与动作变量选择
//! - **identity**: 工作区发现与上下文键选择
//! - **state**: 磁盘布局、锁、stamp、env.sh、运行日志
//! - **exec**: git / cargo / make 进程边界
//! - **update**: 工具自更新与策略仓库
//! - **plan**: 解析流水线与不可变 Plan
//! - **command**: plan / run 执行模式
//! - **config**: 运行设置（TOML + 环境变量 + 命令行）

pub mod cli;
pub mod command;
pub mod config;
pub mod contexts;
pub mod core;
pub mod exec;
pub mod expand;
pub mod identity;
pub mod observability;
pub mod plan;
pub mod resolve;
pub mod state;
pub mod update;

pub use crate::core::{DecomkError, ExpandError, Result};
pub use plan::{resolve_plan, Plan, PlanInputs};
