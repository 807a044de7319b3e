//! 从 git origin URL 推导 `owner/repo`

use url::Url;

/// 解析出的仓库身份
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoIdentity {
    /// `owner/repo`，路径少于两段时为 None
    pub owner_repo: Option<String>,
    pub repo_name: Option<String>,
}

/// 支持的形式：
/// - `https://host/owner/repo(.git)`、`ssh://git@host/owner/repo(.git)`
/// - `git@host:owner/repo(.git)`（scp 风格）
/// - `owner/repo(.git)`
/// - `/some/path/to/repo(.git)`（取最后两段）
pub fn parse_owner_repo(origin_url: &str) -> RepoIdentity {
    let s = origin_url.trim();
    let s = s.strip_suffix(".git").unwrap_or(s);
    if s.is_empty() {
        return RepoIdentity::default();
    }

    let path = if s.contains("://") {
        match Url::parse(s) {
            Ok(url) if !url.path().is_empty() => url.path().to_string(),
            _ => s.to_string(),
        }
    } else {
        match s.rfind(':') {
            Some(i) if i + 1 < s.len() && s[i + 1..].contains('/') => s[i + 1..].to_string(),
            _ => s.to_string(),
        }
    };

    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    let Some(repo) = parts.last() else {
        return RepoIdentity::default();
    };
    let owner_repo = (parts.len() >= 2).then(|| format!("{}/{}", parts[parts.len() - 2], repo));
    RepoIdentity {
        owner_repo,
        repo_name: Some(repo.to_string()),
    }
}
