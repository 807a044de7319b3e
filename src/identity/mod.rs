//! 容器身份：发现工作区、解析 origin、选出上下文键

pub mod remote;
pub mod select;
pub mod workspace;

pub use remote::{parse_owner_repo, RepoIdentity};
pub use select::{context_keys_for_workspaces, seed_tokens, select_explicit_context};
pub use workspace::{
    discover_workspaces, inspect_workspace, is_git_repo_root, WorkspaceRepo,
    DEFAULT_WORKSPACES_DIR,
};
