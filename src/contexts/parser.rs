//! decomk.conf 语法解析
//!
//! 语法刻意保持很小：不展开环境变量、不调用 shell、不解释 Makefile 语法。
//! - 整行注释以 `#` 开头
//! - 键行：`key: token token ...`（冒号后须为空白或行尾，键中不能含 `=`）
//! - 其它非空行为续行，追加到最近的键
//! - 单引号内原样保留（含空格），引号本身去掉；引号外反斜杠转义下一个字符

use super::Defs;

/// 行级解析错误（由 loader 补上文件路径）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// 解析 decomk.conf 内容
pub fn parse(content: &str) -> Result<Defs, ParseError> {
    let mut defs = Defs::new();
    let mut current_key: Option<String> = None;

    for (idx, raw) in content.lines().enumerate() {
        let line_num = idx + 1;
        let line = raw.trim_end_matches('\r').trim_start();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, rest)) = split_key_line(line) {
            let tokens = split_tokens(rest).map_err(|m| ParseError::new(line_num, m))?;
            // 同一文件内重复定义：后者整体替换前者
            defs.insert(key.to_string(), tokens);
            current_key = Some(key.to_string());
            continue;
        }

        let Some(key) = current_key.as_ref() else {
            return Err(ParseError::new(
                line_num,
                "continuation line without a preceding key",
            ));
        };
        let tokens = split_tokens(line).map_err(|m| ParseError::new(line_num, m))?;
        defs.entry(key.clone()).or_default().extend(tokens);
    }

    Ok(defs)
}

/// 识别 `key: rest` 键行；返回 None 表示按续行处理
///
/// `http://...`、`URL=https://...` 这类含冒号的 token 不能被当成键。
fn split_key_line(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    let after = &line[colon + 1..];
    if let Some(c) = after.chars().next() {
        if !is_space(c) {
            return None;
        }
    }
    let key = line[..colon].trim();
    if key.is_empty() || key.contains('=') {
        return None;
    }
    Some((key, after.trim()))
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// 按空白切分 token，支持单引号与反斜杠转义
fn split_tokens(s: &str) -> Result<Vec<String>, &'static str> {
    let mut tokens = Vec::new();
    let mut buf = String::new();
    let mut in_single = false;
    let mut escape = false;

    for c in s.chars() {
        if escape {
            buf.push(c);
            escape = false;
            continue;
        }
        if in_single {
            if c == '\'' {
                in_single = false;
            } else {
                buf.push(c);
            }
            continue;
        }
        match c {
            '\\' => escape = true,
            '\'' => in_single = true,
            c if is_space(c) => {
                if !buf.is_empty() {
                    tokens.push(std::mem::take(&mut buf));
                }
            }
            c => buf.push(c),
        }
    }

    if escape {
        return Err("dangling backslash escape");
    }
    if in_single {
        return Err("unterminated single-quoted string");
    }
    if !buf.is_empty() {
        tokens.push(buf);
    }
    Ok(tokens)
}
