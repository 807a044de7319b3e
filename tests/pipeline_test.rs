//! 解析流水线与 run 模式集成测试

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use decomk::command::{execute, Invocation, Mode};
use decomk::config::Settings;
use decomk::exec::{ToolBuilder, VcsClient};
use decomk::resolve::TargetSource;
use decomk::state::{write_env_file, LogRoot, RUN_LOG_FILE};
use decomk::{resolve_plan, DecomkError, PlanInputs};
use tempfile::TempDir;

/// 工作区都不是 git 仓库
struct NoGit;

#[async_trait]
impl VcsClient for NoGit {
    async fn clone_repo(&self, _url: &str, _dest: &Path) -> decomk::Result<()> {
        Err(DecomkError::Update("clone not expected".into()))
    }

    async fn pull_ff_only(&self, _dir: &Path) -> decomk::Result<()> {
        Err(DecomkError::Update("pull not expected".into()))
    }

    async fn head_revision(&self, _dir: &Path) -> Option<String> {
        None
    }

    async fn origin_url(&self, _dir: &Path) -> Option<String> {
        None
    }

    async fn is_work_tree(&self, _dir: &Path) -> bool {
        false
    }
}

struct NoBuild;

#[async_trait]
impl ToolBuilder for NoBuild {
    async fn build(&self, _repo_dir: &Path) -> decomk::Result<PathBuf> {
        Err(DecomkError::Update("build not expected".into()))
    }
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(conf: &str, makefile: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let conf_dir = dir.path().join("home/conf");
        std::fs::create_dir_all(&conf_dir).unwrap();
        std::fs::write(conf_dir.join("decomk.conf"), conf).unwrap();
        std::fs::write(conf_dir.join("Makefile"), makefile).unwrap();
        std::fs::create_dir_all(dir.path().join("workspaces")).unwrap();
        Self { dir }
    }

    fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    fn add_workspace(&self, name: &str) {
        std::fs::create_dir_all(self.dir.path().join("workspaces").join(name)).unwrap();
    }

    fn inputs(&self, action_args: &[&str]) -> PlanInputs {
        PlanInputs {
            home: self.home(),
            log_root: LogRoot {
                path: self.dir.path().join("log"),
                explicit: true,
            },
            workspaces_dir: self.dir.path().join("workspaces"),
            explicit_config: None,
            explicit_context: None,
            makefile: None,
            expand: Default::default(),
            action_args: action_args.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn settings(&self, make: &str) -> Settings {
        Settings {
            home: Some(self.home()),
            log_dir: Some(self.dir.path().join("log")),
            workspaces_dir: Some(self.dir.path().join("workspaces")),
            make: make.to_string(),
            self_update: false,
            ..Default::default()
        }
    }
}

fn set_mtime(path: &Path, t: SystemTime) {
    std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(t)
        .unwrap();
}

fn mtime(path: &Path) -> SystemTime {
    std::fs::metadata(path).unwrap().modified().unwrap()
}

#[tokio::test]
async fn test_default_and_workspace_context_expand_in_order() {
    let fx = Fixture::new("DEFAULT: A B\nrepo1: DEFAULT C\n", "all:\n");
    fx.add_workspace("repo1");

    let plan = resolve_plan(&fx.inputs(&[]), &NoGit).await.unwrap();
    assert_eq!(plan.context_keys, vec!["DEFAULT", "repo1"]);
    assert_eq!(plan.expanded, vec!["A", "B", "A", "B", "C"]);
    assert_eq!(plan.selection.source, TargetSource::ConfigTargets);
    assert_eq!(plan.selection.targets, vec!["A", "B", "A", "B", "C"]);
}

#[tokio::test]
async fn test_action_args_select_install_targets() {
    let fx = Fixture::new(
        "DEFAULT: INSTALL='neovim ripgrep' Block00\nTOOLS: EXTRA=fd\n",
        "all:\n",
    );

    let plan = resolve_plan(&fx.inputs(&["INSTALL", "literal"]), &NoGit)
        .await
        .unwrap();
    assert_eq!(plan.tuples, vec!["INSTALL=neovim ripgrep"]);
    assert_eq!(plan.targets, vec!["Block00"]);
    assert_eq!(plan.selection.source, TargetSource::ActionArgs);
    assert_eq!(plan.selection.targets, vec!["neovim", "ripgrep", "literal"]);
}

#[tokio::test]
async fn test_env_file_rewrite_is_stable() {
    let fx = Fixture::new("DEFAULT: FOO='a b' Block00\n", "all:\n");
    let plan = resolve_plan(&fx.inputs(&[]), &NoGit).await.unwrap();
    let now = chrono::Utc::now();

    write_env_file(&plan, now).unwrap();
    let first = std::fs::read_to_string(&plan.env_file).unwrap();
    write_env_file(&plan, now).unwrap();
    let second = std::fs::read_to_string(&plan.env_file).unwrap();
    assert_eq!(first, second);
    assert!(first.contains("export FOO='a b'\n"));
    assert!(first.contains("export DECOMK_PACKAGES='Block00'\n"));
}

/// 用 `sh -f <Makefile>` 充当执行引擎：Makefile 内容是一段 shell 脚本
#[cfg(unix)]
#[tokio::test]
async fn test_run_mode_converges_and_logs() {
    let fx = Fixture::new("DEFAULT: FOO=bar Block00\n", "");
    let reference = fx.dir.path().join("reference");
    std::fs::write(&reference, "").unwrap();
    set_mtime(&reference, UNIX_EPOCH + Duration::from_secs(1_500_000));
    // 引擎启动时 Old 必须已比 reference 新
    std::fs::write(
        fx.home().join("conf/Makefile"),
        format!(
            "echo \"engine args: $*\"\necho \"home=$DECOMK_HOME\"\n\
             if [ Old -nt '{}' ]; then echo old-stamp-fresh; fi\ntouch Block00\n",
            reference.display()
        ),
    )
    .unwrap();

    let stamps = fx.home().join("stamps");
    std::fs::create_dir_all(&stamps).unwrap();
    let old = UNIX_EPOCH + Duration::from_secs(1_000_000);
    for name in ["Old", ".keep"] {
        std::fs::write(stamps.join(name), "").unwrap();
        set_mtime(&stamps.join(name), old);
    }

    let inv = Invocation {
        mode: Mode::Run,
        settings: fx.settings("sh"),
        action_args: Vec::new(),
        restart_args: Vec::new(),
    };
    execute(&inv, &NoGit, &NoBuild).await.unwrap();

    assert!(stamps.join("Block00").is_file());
    assert!(stamps.join(".lock").exists());
    assert!(mtime(&stamps.join("Old")) > UNIX_EPOCH + Duration::from_secs(1_500_000));
    assert_eq!(mtime(&stamps.join(".keep")), old);
    let env = std::fs::read_to_string(fx.home().join("env.sh")).unwrap();
    assert!(env.starts_with("# generated by decomk; do not edit\n"));

    let runs: Vec<_> = std::fs::read_dir(fx.dir.path().join("log"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(runs.len(), 1);
    let log = std::fs::read_to_string(runs[0].join(RUN_LOG_FILE)).unwrap();
    assert!(log.contains("engine args: FOO=bar"));
    assert!(log.contains(&format!("home={}", fx.home().display())));
    assert!(log.contains("old-stamp-fresh"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_engine_failure_surfaces_exit_code() {
    let fx = Fixture::new("DEFAULT: Block00\n", "exit 7\n");
    let inv = Invocation {
        mode: Mode::Run,
        settings: fx.settings("sh"),
        action_args: Vec::new(),
        restart_args: Vec::new(),
    };
    let err = execute(&inv, &NoGit, &NoBuild).await.unwrap_err();
    assert_eq!(err.exit_code(), 7);
    assert!(err.to_string().contains(RUN_LOG_FILE));
}
