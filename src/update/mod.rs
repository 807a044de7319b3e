//! 自更新：工具仓库、策略仓库与进程切换

pub mod handoff;
pub mod policy;
pub mod tool;

pub use handoff::restart;
pub use policy::ensure_conf_repo;
pub use tool::{SelfUpdater, UpdateOutcome, DEFAULT_TOOL_REPO_URL};
