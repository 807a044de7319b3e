//! 上下文选择：把工作区身份映射为 decomk.conf 中的上下文键

use crate::contexts::{Defs, DEFAULT_CONTEXT};
use crate::core::{DecomkError, Result};
use crate::identity::WorkspaceRepo;

/// 显式上下文（--context / DECOMK_CONTEXT）必须存在于 defs
pub fn select_explicit_context(defs: &Defs, key: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() {
        return Err(DecomkError::Config("context key is empty".to_string()));
    }
    if !defs.contains_key(key) {
        return Err(DecomkError::ContextNotFound {
            key: key.to_string(),
        });
    }
    Ok(key.to_string())
}

/// 每个工作区取第一个存在于 defs 的身份候选；DEFAULT 与重复项跳过
pub fn context_keys_for_workspaces(defs: &Defs, repos: &[WorkspaceRepo]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for repo in repos {
        let Some(key) = repo
            .identity_candidates()
            .into_iter()
            .find(|c| !c.is_empty() && defs.contains_key(*c))
        else {
            tracing::debug!(workspace = %repo.root.display(), "no context matches workspace");
            continue;
        };
        if key == DEFAULT_CONTEXT || keys.iter().any(|k| k == key) {
            continue;
        }
        tracing::debug!(workspace = %repo.root.display(), context = %key, "workspace context");
        keys.push(key.to_string());
    }
    keys
}

/// 展开种子：DEFAULT（若已定义）在前，随后是各上下文键，去重并保持首次出现顺序
pub fn seed_tokens(defs: &Defs, context_keys: &[String]) -> Vec<String> {
    let mut seed: Vec<String> = Vec::with_capacity(context_keys.len() + 1);
    if defs.contains_key(DEFAULT_CONTEXT) {
        seed.push(DEFAULT_CONTEXT.to_string());
    }
    for key in context_keys {
        if !seed.contains(key) {
            seed.push(key.clone());
        }
    }
    seed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn defs(keys: &[&str]) -> Defs {
        keys.iter().map(|k| (k.to_string(), Vec::new())).collect()
    }

    fn repo(name: &str, owner_repo: Option<&str>, repo_name: &str) -> WorkspaceRepo {
        WorkspaceRepo {
            root: PathBuf::from("/workspaces").join(name),
            name: name.to_string(),
            origin_url: owner_repo.map(|o| format!("https://github.com/{o}.git")),
            owner_repo: owner_repo.map(String::from),
            repo_name: repo_name.to_string(),
        }
    }

    #[test]
    fn test_explicit_context_must_exist() {
        let d = defs(&["DEFAULT", "grokker"]);
        assert_eq!(select_explicit_context(&d, " grokker ").unwrap(), "grokker");
        assert!(matches!(
            select_explicit_context(&d, "missing"),
            Err(DecomkError::ContextNotFound { key }) if key == "missing"
        ));
        assert!(matches!(
            select_explicit_context(&d, "  "),
            Err(DecomkError::Config(_))
        ));
    }

    #[test]
    fn test_candidate_priority() {
        let d = defs(&["stevegt/grokker", "grokker", "checkout"]);
        let repos = vec![repo("checkout", Some("stevegt/grokker"), "grokker")];
        assert_eq!(context_keys_for_workspaces(&d, &repos), vec!["stevegt/grokker"]);

        let d = defs(&["grokker", "checkout"]);
        assert_eq!(context_keys_for_workspaces(&d, &repos), vec!["grokker"]);

        let d = defs(&["checkout"]);
        assert_eq!(context_keys_for_workspaces(&d, &repos), vec!["checkout"]);
    }

    #[test]
    fn test_default_and_duplicates_skipped() {
        let d = defs(&["DEFAULT", "grokker"]);
        let repos = vec![
            repo("DEFAULT", None, "DEFAULT"),
            repo("a", None, "grokker"),
            repo("b", None, "grokker"),
            repo("unmatched", None, "unmatched"),
        ];
        assert_eq!(context_keys_for_workspaces(&d, &repos), vec!["grokker"]);
    }

    #[test]
    fn test_seed_tokens() {
        let keys = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert_eq!(seed_tokens(&defs(&["DEFAULT"]), &keys), vec!["DEFAULT", "a", "b"]);
        assert_eq!(seed_tokens(&defs(&[]), &keys), vec!["a", "b"]);
        assert!(seed_tokens(&defs(&[]), &[]).is_empty());
    }
}
