//! 核心类型：错误分类与退出码

pub mod error;

pub use error::{DecomkError, ExpandError, Result};
