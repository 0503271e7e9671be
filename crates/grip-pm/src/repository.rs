use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ResolverError, Result};

/// A source repository reference.
///
/// Identity is `(domain, owner, repo)` only: the original reference string
/// and any embedded auth token are carried along for fetching but never
/// participate in equality or hashing. Two references written differently
/// (`https://github.com/a/b.git` and `github.com/a/b`) are the same
/// repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// The reference exactly as it was written
    pub url: String,
    /// Host, lowercased (e.g. `github.com`)
    pub domain: String,
    /// Owner or organization segment
    pub owner: String,
    /// Repository name, without any `.git` suffix
    pub repo: String,
    /// Auth token embedded in the reference, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Repository {
    /// Parse a repository reference.
    ///
    /// Accepted forms:
    /// - `https://github.com/owner/repo[.git]` (any scheme `url` accepts)
    /// - `git@github.com:owner/repo[.git]`
    /// - `github.com/owner/repo`
    /// - `owner/repo` (defaults to `github.com`)
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(Self::invalid(reference, "empty reference"));
        }

        if reference.contains("://") {
            return Self::from_url(reference);
        }

        if let Some(rest) = reference.strip_prefix("git@") {
            return Self::from_scp(reference, rest);
        }

        let parts: Vec<&str> = reference.split('/').filter(|p| !p.is_empty()).collect();
        match parts.as_slice() {
            [owner, repo] => Ok(Self::build(reference, "github.com", owner, repo, None)),
            [domain, owner, repo] if domain.contains('.') => {
                Ok(Self::build(reference, domain, owner, repo, None))
            }
            _ => Err(Self::invalid(
                reference,
                "expected owner/repo, domain/owner/repo or a full URL",
            )),
        }
    }

    fn from_url(reference: &str) -> Result<Self> {
        let parsed = Url::parse(reference)
            .map_err(|e| Self::invalid(reference, &e.to_string()))?;
        let domain = parsed
            .host_str()
            .ok_or_else(|| Self::invalid(reference, "missing host"))?;

        let mut segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();
        if segments.len() != 2 {
            return Err(Self::invalid(reference, "expected exactly owner/repo in path"));
        }
        let repo = segments.pop().unwrap_or_default();
        let owner = segments.pop().unwrap_or_default();

        // Userinfo doubles as an access token for private hosts
        let token = match parsed.username() {
            "" => None,
            user => Some(user.to_string()),
        };

        Ok(Self::build(reference, domain, owner, repo, token))
    }

    fn from_scp(reference: &str, rest: &str) -> Result<Self> {
        let (domain, path) = rest
            .split_once(':')
            .ok_or_else(|| Self::invalid(reference, "expected git@host:owner/repo"))?;
        let (owner, repo) = path
            .split_once('/')
            .ok_or_else(|| Self::invalid(reference, "expected owner/repo after host"))?;
        Ok(Self::build(reference, domain, owner, repo, None))
    }

    fn build(reference: &str, domain: &str, owner: &str, repo: &str, token: Option<String>) -> Self {
        Self {
            url: reference.to_string(),
            domain: domain.to_lowercase(),
            owner: owner.to_string(),
            repo: repo.trim_end_matches(".git").to_string(),
            token,
        }
    }

    fn invalid(reference: &str, reason: &str) -> ResolverError {
        ResolverError::InvalidRepository {
            reference: reference.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Canonical `domain/owner/repo` string, usable as a map key.
    pub fn identity(&self) -> String {
        format!("{}/{}/{}", self.domain, self.owner, self.repo)
    }
}

impl PartialEq for Repository {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain && self.owner == other.owner && self.repo == other.repo
    }
}

impl Eq for Repository {}

impl Hash for Repository {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.domain.hash(state);
        self.owner.hash(state);
        self.repo.hash(state);
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https_url() {
        let repo = Repository::parse("https://github.com/acme/widgets.git").unwrap();
        assert_eq!(repo.domain, "github.com");
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.repo, "widgets");
        assert_eq!(repo.token, None);
    }

    #[test]
    fn test_parse_scp_form() {
        let repo = Repository::parse("git@gitlab.com:acme/widgets.git").unwrap();
        assert_eq!(repo.domain, "gitlab.com");
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.repo, "widgets");
    }

    #[test]
    fn test_parse_shorthand() {
        let repo = Repository::parse("acme/widgets").unwrap();
        assert_eq!(repo.domain, "github.com");

        let repo = Repository::parse("codeberg.org/acme/widgets").unwrap();
        assert_eq!(repo.domain, "codeberg.org");
    }

    #[test]
    fn test_parse_token_from_userinfo() {
        let repo = Repository::parse("https://s3cret@github.com/acme/widgets").unwrap();
        assert_eq!(repo.token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Repository::parse("").is_err());
        assert!(Repository::parse("just-a-name").is_err());
        assert!(Repository::parse("https://github.com/only-owner").is_err());
    }

    #[test]
    fn test_identity_ignores_url_and_token() {
        let a = Repository::parse("https://github.com/acme/widgets.git").unwrap();
        let b = Repository::parse("acme/widgets").unwrap();
        let c = Repository::parse("https://tok@github.com/acme/widgets").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.identity(), "github.com/acme/widgets");
    }

    #[test]
    fn test_domain_lowercased() {
        let a = Repository::parse("GitHub.com/acme/widgets").unwrap();
        let b = Repository::parse("github.com/acme/widgets").unwrap();
        assert_eq!(a, b);
    }
}
