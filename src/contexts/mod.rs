//! 上下文定义（decomk.conf）
//!
//! 配置文件是「名字 → token 列表」的映射；token 之后会按宏名展开，
//! 再划分为 make 目标与 `NAME=value` 变量元组。

use std::collections::HashMap;

pub mod loader;
pub mod parser;

pub use loader::{load_file, load_layers, load_tree, merge, LoadedDefs};
pub use parser::{parse, ParseError};

/// 名字 → 有序 token 列表（键区分大小写）
pub type Defs = HashMap<String, Vec<String>>;

/// 始终最先应用的哨兵上下文
pub const DEFAULT_CONTEXT: &str = "DEFAULT";
