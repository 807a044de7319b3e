//! isconf 风格的宏展开
//!
//! 纯文本替换：token 恰好等于 Defs 中的键时，递归替换为该键的 token 列表；
//! 未知 token 原样保留。带环检测与最大深度限制，整个过程无副作用。

use std::collections::HashSet;

use serde::Deserialize;

use crate::contexts::Defs;
use crate::core::ExpandError;
use crate::resolve::split_tuple;

/// 未设置时的最大展开深度
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// 未知 token（既不是键也不是元组）的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTokens {
    /// 静默作为字面量目标
    #[default]
    Literal,
    /// 作为字面量目标，但记录 warn 日志（便于发现拼错的宏名）
    Warn,
    /// 直接报错；用于只由宏与元组组成、目标全部来自动作参数的配置
    Strict,
}

impl UnknownTokens {
    pub fn as_str(self) -> &'static str {
        match self {
            UnknownTokens::Literal => "literal",
            UnknownTokens::Warn => "warn",
            UnknownTokens::Strict => "strict",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExpandOptions {
    /// 0 表示使用 DEFAULT_MAX_DEPTH
    pub max_depth: usize,
    pub unknown_tokens: UnknownTokens,
}

impl ExpandOptions {
    fn limit(&self) -> usize {
        if self.max_depth == 0 {
            DEFAULT_MAX_DEPTH
        } else {
            self.max_depth
        }
    }
}

struct Expander<'a> {
    defs: &'a Defs,
    limit: usize,
    unknown_tokens: UnknownTokens,
    visiting: HashSet<&'a str>,
    stack: Vec<&'a str>,
    out: Vec<String>,
}

impl<'a> Expander<'a> {
    fn token(&mut self, tok: &'a str, depth: usize) -> Result<(), ExpandError> {
        if self.defs.contains_key(tok) {
            return self.key(tok, depth);
        }
        if split_tuple(tok).is_none() {
            match self.unknown_tokens {
                UnknownTokens::Literal => {}
                UnknownTokens::Warn => {
                    tracing::warn!(token = %tok, "token is not a defined name; passing it through as a target");
                }
                UnknownTokens::Strict => {
                    return Err(ExpandError::UnknownToken {
                        token: tok.to_string(),
                        parent: self.stack.last().map(|s| s.to_string()),
                    });
                }
            }
        }
        self.out.push(tok.to_string());
        Ok(())
    }

    fn key(&mut self, key: &'a str, depth: usize) -> Result<(), ExpandError> {
        if depth > self.limit {
            return Err(ExpandError::DepthExceeded {
                key: key.to_string(),
                limit: self.limit,
            });
        }
        if self.visiting.contains(key) {
            let mut chain: Vec<String> = self.stack.iter().map(|s| s.to_string()).collect();
            chain.push(key.to_string());
            return Err(ExpandError::Cycle { chain });
        }
        let Some(body) = self.defs.get(key) else {
            self.out.push(key.to_string());
            return Ok(());
        };

        self.visiting.insert(key);
        self.stack.push(key);
        for tok in body {
            self.token(tok, depth + 1)?;
        }
        self.stack.pop();
        self.visiting.remove(key);
        Ok(())
    }
}

/// 展开 tokens 中的宏引用，输出为先序遍历的扁平列表（保留重复与顺序）
pub fn expand_tokens<'a>(
    defs: &'a Defs,
    tokens: &'a [String],
    opts: &ExpandOptions,
) -> Result<Vec<String>, ExpandError> {
    let mut expander = Expander {
        defs,
        limit: opts.limit(),
        unknown_tokens: opts.unknown_tokens,
        visiting: HashSet::new(),
        stack: Vec::new(),
        out: Vec::new(),
    };
    for tok in tokens {
        expander.token(tok, 1)?;
    }
    Ok(expander.out)
}
