//! stamp 时间戳归一化
//!
//! stamp 是 make 工作目录里的普通文件：存在即表示该单元已完成，删除即要求重跑。
//! 每次运行把现有 stamp 的 mtime 统一刷新为当前时间（相当于 `touch *`），
//! 避免 make 因时间戳比较意外重跑。

use std::fs::FileTimes;
use std::path::Path;
use std::time::SystemTime;

use crate::core::{DecomkError, Result};

/// 只处理顶层、非隐藏的普通文件；目录不存在时什么也不做
pub fn touch_existing_stamps(stamp_dir: &Path, now: SystemTime) -> Result<usize> {
    let entries = match std::fs::read_dir(stamp_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(DecomkError::io(format!("read {}", stamp_dir.display()), e)),
    };

    let times = FileTimes::new().set_accessed(now).set_modified(now);
    let mut touched = 0;
    for entry in entries {
        let entry = entry.map_err(|e| DecomkError::io(format!("read {}", stamp_dir.display()), e))?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let file_type = entry
            .file_type()
            .map_err(|e| DecomkError::io(format!("stat {}", entry.path().display()), e))?;
        if !file_type.is_file() {
            continue;
        }
        let path = entry.path();
        // 只读打开即可：修改时间戳只要求属主身份，不要求写权限
        let file = std::fs::File::open(&path)
            .map_err(|e| DecomkError::io(format!("open {}", path.display()), e))?;
        file.set_times(times)
            .map_err(|e| DecomkError::io(format!("touch {}", path.display()), e))?;
        touched += 1;
    }
    tracing::debug!(dir = %stamp_dir.display(), touched, "stamps touched");
    Ok(touched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    fn mtime(path: &Path) -> SystemTime {
        std::fs::metadata(path).unwrap().modified().unwrap()
    }

    #[test]
    fn test_touches_only_top_level_regular_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let old = UNIX_EPOCH + Duration::from_secs(1_000_000);
        let now = UNIX_EPOCH + Duration::from_secs(2_000_000);

        for name in ["Block00", "Block10", ".lock"] {
            let p = root.join(name);
            std::fs::write(&p, "").unwrap();
            std::fs::File::options()
                .write(true)
                .open(&p)
                .unwrap()
                .set_modified(old)
                .unwrap();
        }
        std::fs::create_dir(root.join("subdir")).unwrap();
        std::fs::write(root.join("subdir/inner"), "").unwrap();
        std::fs::File::options()
            .write(true)
            .open(root.join("subdir/inner"))
            .unwrap()
            .set_modified(old)
            .unwrap();

        let touched = touch_existing_stamps(root, now).unwrap();
        assert_eq!(touched, 2);
        assert_eq!(mtime(&root.join("Block00")), now);
        assert_eq!(mtime(&root.join("Block10")), now);
        assert_eq!(mtime(&root.join(".lock")), old);
        assert_eq!(mtime(&root.join("subdir/inner")), old);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_stamp_is_touched() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let stamp = dir.path().join("Block00");
        let old = UNIX_EPOCH + Duration::from_secs(1_000_000);
        let now = UNIX_EPOCH + Duration::from_secs(2_000_000);
        std::fs::write(&stamp, "").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&stamp)
            .unwrap()
            .set_modified(old)
            .unwrap();
        std::fs::set_permissions(&stamp, std::fs::Permissions::from_mode(0o444)).unwrap();

        assert_eq!(touch_existing_stamps(dir.path(), now).unwrap(), 1);
        assert_eq!(mtime(&stamp), now);
        assert_eq!(
            std::fs::metadata(&stamp).unwrap().permissions().mode() & 0o777,
            0o444
        );
    }

    #[test]
    fn test_missing_dir_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        assert_eq!(touch_existing_stamps(&dir.path().join("nope"), SystemTime::now()).unwrap(), 0);
    }
}
