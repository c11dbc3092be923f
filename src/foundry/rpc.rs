// src/foundry/rpc.rs

use std::path::PathBuf;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::Config;

/// Turns a user supplied endpoint (URL or alias) into the URL handed to the tools.
///
/// Resolution is best-effort: whatever goes wrong, the caller gets a string back.
#[derive(Debug, Clone)]
pub struct RpcResolver {
    default_url: String,
    config_path: PathBuf,
}

impl RpcResolver {
    pub fn new(default_url: impl Into<String>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            default_url: default_url.into(),
            config_path: config_path.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.default_rpc_url.clone(),
            config.foundry_config_path.clone(),
        )
    }

    pub fn default_url(&self) -> &str {
        &self.default_url
    }

    pub async fn resolve(&self, candidate: Option<&str>) -> String {
        let candidate = match candidate {
            Some(c) if !c.is_empty() => c,
            _ => return self.default_url.clone(),
        };

        if candidate.starts_with("http") {
            return candidate.to_string();
        }

        match tokio::fs::read_to_string(&self.config_path).await {
            Ok(content) => match lookup_alias(&content, candidate) {
                Some(url) => {
                    debug!("Resolved RPC alias '{}' to {}", candidate, url);
                    url
                }
                None => {
                    debug!(
                        "RPC alias '{}' not found in {}, using it verbatim",
                        candidate,
                        self.config_path.display()
                    );
                    candidate.to_string()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => candidate.to_string(),
            Err(e) => {
                warn!(
                    "Error resolving RPC alias '{}' from {}: {}",
                    candidate,
                    self.config_path.display(),
                    e
                );
                candidate.to_string()
            }
        }
    }
}

/// Finds `alias = "url"` somewhere after an `[rpc_endpoints]` header.
///
/// One regex over the whole file, not a TOML parse: the match is not bounded
/// by the end of the section, so a matching key in a later table resolves too.
pub fn lookup_alias(content: &str, alias: &str) -> Option<String> {
    let pattern = format!(
        r#"(?m)\[rpc_endpoints\][\s\S]*?^[ \t]*{}[ \t]*=[ \t]*["']([^"']+)["']"#,
        regex::escape(alias)
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const CONFIG: &str = r#"
[profile.default]
src = "src"

[rpc_endpoints]
zkmainnet = "https://zk.example"
mainnet = "https://x.example"
sepolia = 'https://sepolia.example'
"#;

    #[test]
    fn test_lookup_alias() {
        assert_eq!(lookup_alias(CONFIG, "mainnet").as_deref(), Some("https://x.example"));
        assert_eq!(
            lookup_alias(CONFIG, "sepolia").as_deref(),
            Some("https://sepolia.example")
        );
        assert_eq!(lookup_alias(CONFIG, "optimism"), None);
        assert_eq!(lookup_alias("mainnet = \"https://x\"", "mainnet"), None);
        // regex metacharacters in the alias are literal
        assert_eq!(lookup_alias(CONFIG, "main.et"), None);
    }

    #[test]
    fn test_lookup_alias_is_not_bounded_by_section() {
        let content = "[rpc_endpoints]\nlocal = \"http://127.0.0.1:8545\"\n\n[etherscan]\nmainnet = \"https://later.example\"\n";
        assert_eq!(
            lookup_alias(content, "mainnet").as_deref(),
            Some("https://later.example")
        );
        // keys before the header never match
        let content = "[profile.default]\nmainnet = \"https://earlier.example\"\n[rpc_endpoints]\n";
        assert_eq!(lookup_alias(content, "mainnet"), None);
    }

    #[tokio::test]
    async fn test_resolve_default_and_literal() {
        let dir = tempdir().unwrap();
        let resolver = RpcResolver::new("http://localhost:8545", dir.path().join("config.toml"));

        assert_eq!(resolver.resolve(None).await, "http://localhost:8545");
        assert_eq!(resolver.resolve(Some("")).await, "http://localhost:8545");
        assert_eq!(
            resolver.resolve(Some("https://rpc.example/v1")).await,
            "https://rpc.example/v1"
        );
        assert_eq!(resolver.resolve(Some("http://x")).await, "http://x");
    }

    #[tokio::test]
    async fn test_resolve_alias_from_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[rpc_endpoints]\nmainnet = \"https://x.example\"\n").unwrap();
        let resolver = RpcResolver::new("http://localhost:8545", &path);

        assert_eq!(resolver.resolve(Some("mainnet")).await, "https://x.example");
        assert_eq!(resolver.resolve(Some("unknown")).await, "unknown");
    }

    #[tokio::test]
    async fn test_resolve_missing_config_echoes_alias() {
        let dir = tempdir().unwrap();
        let resolver = RpcResolver::new("http://localhost:8545", dir.path().join("missing.toml"));

        assert_eq!(resolver.resolve(Some("mainnet")).await, "mainnet");
    }

    #[tokio::test]
    async fn test_resolve_unreadable_config_echoes_alias() {
        let dir = tempdir().unwrap();
        // a directory cannot be read as a file
        let resolver = RpcResolver::new("http://localhost:8545", dir.path());

        assert_eq!(resolver.resolve(Some("mainnet")).await, "mainnet");
    }
}
