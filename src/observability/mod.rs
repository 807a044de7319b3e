//! 日志初始化
//!
//! 所有诊断输出走 stderr，stdout 只留给 plan 输出与 make 输出。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// RUST_LOG 优先；否则默认 info，verbose 时为 debug
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
