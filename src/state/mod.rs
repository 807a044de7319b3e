//! 持久状态：磁盘布局、锁、stamp、变量导出、运行日志

pub mod export;
pub mod layout;
pub mod lock;
pub mod runlog;
pub mod stamps;

pub use export::{shell_quote, write_env_export, write_env_file};
pub use layout::{
    ensure_dir, resolve_home, resolve_log_root, LogRoot, StateLayout, DEFAULT_HOME,
    DEFAULT_LOG_DIR,
};
pub use lock::FileLock;
pub use runlog::{create_run_log, create_unique_dir, run_id, RUN_LOG_FILE};
pub use stamps::touch_existing_stamps;
