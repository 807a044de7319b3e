//! 配置加载：单文件、`<stem>.d/*.conf` 叠加层、多来源按优先级合并

use std::path::{Path, PathBuf};

use crate::contexts::{parser, Defs};
use crate::core::{DecomkError, Result};

/// 合并后的配置及其来源路径（低优先级在前，供审计）
#[derive(Debug, Clone, Default)]
pub struct LoadedDefs {
    pub defs: Defs,
    pub paths: Vec<PathBuf>,
}

/// 加载并解析单个配置文件
pub fn load_file(path: &Path) -> Result<Defs> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| DecomkError::io(format!("open {}", path.display()), e))?;
    parser::parse(&content).map_err(|e| DecomkError::Parse {
        path: path.to_path_buf(),
        line: e.line,
        message: e.message,
    })
}

/// 加载基础文件及同目录 `<stem>.d/*.conf`（按文件名字典序，后者覆盖前者）
pub fn load_tree(path: &Path) -> Result<Defs> {
    let mut defs = load_file(path)?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let overlay_dir = dir.join(format!("{stem}.d"));

    match std::fs::metadata(&overlay_dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(DecomkError::Config(format!(
                "{} exists but is not a directory",
                overlay_dir.display()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(defs),
        Err(e) => return Err(DecomkError::io(format!("stat {}", overlay_dir.display()), e)),
    }

    for overlay in overlay_files(&overlay_dir)? {
        tracing::debug!(path = %overlay.display(), "loading config overlay");
        defs = merge(&defs, &load_file(&overlay)?);
    }
    Ok(defs)
}

/// 列出叠加目录下的 *.conf 普通文件，按文件名排序
fn overlay_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.conf", glob::Pattern::escape(&dir.to_string_lossy()));
    let paths = glob::glob(&pattern)
        .map_err(|e| DecomkError::Config(format!("bad overlay pattern {pattern}: {e}")))?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| {
            DecomkError::io(format!("read overlay dir {}", dir.display()), e.into())
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// 合并两份 Defs：overlay 中的键整体替换 base 中的同名键
pub fn merge(base: &Defs, overlay: &Defs) -> Defs {
    let mut out = base.clone();
    for (key, tokens) in overlay {
        out.insert(key.clone(), tokens.clone());
    }
    out
}

/// 按优先级（低 → 高）加载多个配置来源，每个来源都走 load_tree
pub fn load_layers(sources: &[PathBuf]) -> Result<LoadedDefs> {
    let mut loaded = LoadedDefs::default();
    for source in sources {
        let tree = load_tree(source)?;
        loaded.defs = merge(&loaded.defs, &tree);
        loaded.paths.push(source.clone());
    }
    tracing::debug!(sources = sources.len(), keys = loaded.defs.len(), "config loaded");
    Ok(loaded)
}
