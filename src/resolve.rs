//! 展开结果的划分与目标选择
//!
//! - partition：把 token 分成 `NAME=value` 变量元组与 make 目标
//! - select_targets：isconf 风格的「动作变量」，由位置参数决定最终目标列表

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// 兜底的动作变量名
pub const INSTALL_VAR: &str = "INSTALL";

static TUPLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A([A-Za-z_][A-Za-z0-9_]*)=(.*)\z").expect("tuple pattern is valid")
});

/// 拆分 `NAME=value`；NAME 不是标识符时返回 None
pub fn split_tuple(token: &str) -> Option<(&str, &str)> {
    let caps = TUPLE_RE.captures(token)?;
    let name = caps.get(1)?.as_str();
    let value = caps.get(2).map_or("", |m| m.as_str());
    Some((name, value))
}

/// 划分结果；两类内部都保持原有相对顺序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Partitioned {
    pub tuples: Vec<String>,
    pub targets: Vec<String>,
}

/// 变量元组必须出现在 make argv 的目标之前，所以分开存放
pub fn partition(tokens: &[String]) -> Partitioned {
    let mut out = Partitioned::default();
    for tok in tokens {
        if split_tuple(tok).is_some() {
            out.tuples.push(tok.clone());
        } else {
            out.targets.push(tok.clone());
        }
    }
    out
}

/// 同名变量以最后一次赋值为准（与 make 命令行变量一致）
pub fn effective_tuple_values(tuples: &[String]) -> HashMap<String, String> {
    tuples
        .iter()
        .filter_map(|t| split_tuple(t))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// 最终目标列表由哪条规则产生
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TargetSource {
    #[serde(rename = "actionArgs")]
    ActionArgs,
    #[serde(rename = "configTargets")]
    ConfigTargets,
    #[serde(rename = "defaultINSTALL")]
    DefaultInstall,
    #[serde(rename = "makeDefaultGoal")]
    MakeDefaultGoal,
}

impl TargetSource {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetSource::ActionArgs => "actionArgs",
            TargetSource::ConfigTargets => "configTargets",
            TargetSource::DefaultInstall => "defaultINSTALL",
            TargetSource::MakeDefaultGoal => "makeDefaultGoal",
        }
    }
}

impl std::fmt::Display for TargetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 目标选择结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub targets: Vec<String>,
    pub source: TargetSource,
}

/// 选择传给 make 的目标（规则互斥，先命中者生效）：
/// 1. 有位置参数：参数是已知元组名则按空白拆分其值，否则作为字面量目标；忽略配置目标
/// 2. 配置中有目标：原样使用
/// 3. INSTALL 已定义且非空：拆分其值
/// 4. 空列表，交给 make 的默认目标
pub fn select_targets(
    config_targets: &[String],
    tuples: &[String],
    action_args: &[String],
) -> Selection {
    let effective = effective_tuple_values(tuples);

    if !action_args.is_empty() {
        let mut targets = Vec::new();
        for arg in action_args {
            match effective.get(arg) {
                Some(value) => targets.extend(split_target_list(value)),
                None => targets.push(arg.clone()),
            }
        }
        return Selection {
            targets,
            source: TargetSource::ActionArgs,
        };
    }

    if !config_targets.is_empty() {
        return Selection {
            targets: config_targets.to_vec(),
            source: TargetSource::ConfigTargets,
        };
    }

    if let Some(value) = effective.get(INSTALL_VAR) {
        let targets = split_target_list(value);
        if !targets.is_empty() {
            return Selection {
                targets,
                source: TargetSource::DefaultInstall,
            };
        }
    }

    Selection {
        targets: Vec::new(),
        source: TargetSource::MakeDefaultGoal,
    }
}

fn split_target_list(value: &str) -> Vec<String> {
    value.split_whitespace().map(String::from).collect()
}
