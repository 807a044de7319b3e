//! decomk 入口：解析参数、切换 -C、加载设置，在单线程 runtime 上执行

use std::ffi::OsString;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use decomk::cli::Cli;
use decomk::command::{self, Invocation};
use decomk::config::load_settings;
use decomk::exec::{CargoBuilder, GitCli};
use decomk::{observability, DecomkError};

fn main() -> ExitCode {
    let argv: Vec<OsString> = std::env::args_os().collect();
    let cli = match Cli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(2));
        }
    };

    observability::init(cli.common().verbose);

    match run(cli, argv) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<DecomkError>()
                .map_or(1, DecomkError::exit_code);
            eprintln!("decomk: {err:#}");
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(cli: Cli, argv: Vec<OsString>) -> anyhow::Result<()> {
    let common = cli.common();
    let mut restart_args: Vec<OsString> = argv.into_iter().skip(1).collect();
    if let Some(dir) = &common.start_dir {
        let abs = command::apply_start_dir(dir)?;
        restart_args = command::rewrite_start_dir_flag(&restart_args, &abs);
    }

    let settings = load_settings(common.settings.as_deref(), None, &common.overrides())
        .map_err(|e| DecomkError::Config(e.to_string()))?;

    let invocation = Invocation {
        mode: cli.mode(),
        settings,
        action_args: cli.action_args().to_vec(),
        restart_args,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    runtime.block_on(command::execute(
        &invocation,
        &GitCli::new(),
        &CargoBuilder::new(),
    ))?;
    Ok(())
}
