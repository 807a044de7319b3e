//! 外部进程边界：版本控制、工具构建、执行引擎

pub mod build;
pub mod git;
pub mod make;

#[cfg(test)]
pub mod fake;

pub use build::{install_binary, CargoBuilder, ToolBuilder, BINARY_NAME};
pub use git::{GitCli, VcsClient};
pub use make::{MakeInvocation, DEFAULT_MAKE_PROGRAM};
