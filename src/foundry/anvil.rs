//! Anvil liveness probing.
//!
//! The server has no IPC handle on an anvil node it did not start, so liveness is
//! observed from the outside: either by asking the node over JSON-RPC or by
//! scanning the OS process table.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::command::{CommandLine, CommandRunner};
use super::models::AnvilInfo;

pub const DEFAULT_ANVIL_PORT: &str = "8545";
pub const ANVIL_PROCESS_NAME: &str = "anvil";

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

lazy_static! {
    static ref PORT_FLAG: Regex = Regex::new(r"--port(?:\s+|=)(\d+)").expect("valid port regex");
}

/// How the probe decides whether anvil is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LivenessStrategy {
    /// Scan the process list for an `anvil` executable.
    ProcessTable,
    /// Send a JSON-RPC request to `endpoint`; fall back to the process table when it does not answer.
    RpcHealth { endpoint: String },
}

#[derive(Clone)]
pub struct AnvilProbe {
    runner: Arc<dyn CommandRunner>,
    strategy: LivenessStrategy,
    http: Client,
}

impl AnvilProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, strategy: LivenessStrategy) -> Self {
        let http = Client::builder()
            .timeout(HEALTH_CHECK_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            runner,
            strategy,
            http,
        }
    }

    pub fn strategy(&self) -> &LivenessStrategy {
        &self.strategy
    }

    /// Fresh snapshot, never cached.
    pub async fn status(&self) -> AnvilInfo {
        match &self.strategy {
            LivenessStrategy::ProcessTable => self.scan_process_table().await,
            LivenessStrategy::RpcHealth { endpoint } => match self.health_check(endpoint).await {
                Some(info) => info,
                None => self.scan_process_table().await,
            },
        }
    }

    async fn health_check(&self, endpoint: &str) -> Option<AnvilInfo> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": "web3_clientVersion",
            "params": [],
            "id": 1
        });
        let response = match self.http.post(endpoint).json(&payload).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!("Anvil health check to {} returned {}", endpoint, r.status());
                return None;
            }
            Err(e) => {
                debug!("Anvil health check to {} failed: {}", endpoint, e);
                return None;
            }
        };
        let body: Value = response.json().await.ok()?;
        body.get("result")?;

        let port = url::Url::parse(endpoint)
            .ok()
            .and_then(|u| u.port_or_known_default())
            .map(|p| p.to_string())
            .unwrap_or_else(|| DEFAULT_ANVIL_PORT.to_string());
        Some(AnvilInfo::running_on(port))
    }

    async fn scan_process_table(&self) -> AnvilInfo {
        let listing = self.runner.run(&process_listing_command()).await;
        if !listing.success {
            debug!("Process listing failed: {}", listing.message.trim());
            return AnvilInfo::stopped();
        }
        parse_process_list(&listing.message)
    }
}

#[cfg(not(windows))]
fn process_listing_command() -> CommandLine {
    CommandLine::new("ps").args(["-eo", "args="])
}

#[cfg(windows)]
fn process_listing_command() -> CommandLine {
    CommandLine::new("tasklist").args(["/FO", "CSV", "/NH", "/FI", "IMAGENAME eq anvil.exe"])
}

/// Extracts anvil status from a process listing, one process per line.
///
/// Only lines whose executable is `anvil` count, so a `grep anvil` or a
/// `pkill -x anvil` in the listing is not mistaken for the node.
pub fn parse_process_list(listing: &str) -> AnvilInfo {
    let matched = listing.lines().find(|line| is_anvil_line(line));
    match matched {
        None => AnvilInfo::stopped(),
        Some(line) => {
            let port = PORT_FLAG
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| DEFAULT_ANVIL_PORT.to_string());
            AnvilInfo::running_on(port)
        }
    }
}

fn is_anvil_line(line: &str) -> bool {
    let first = line
        .trim_start()
        .trim_start_matches('"')
        .split(|c: char| c.is_whitespace() || c == '"' || c == ',')
        .next()
        .unwrap_or("");
    let name = Path::new(first)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    name.eq_ignore_ascii_case(ANVIL_PROCESS_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedRunner;
    use crate::foundry::models::ExecutionResult;

    #[test]
    fn test_parse_running_with_port() {
        let listing = "/sbin/init\n\
                       /home/dev/.foundry/bin/anvil --port 9999 --block-time 2\n\
                       grep anvil\n";
        assert_eq!(parse_process_list(listing), AnvilInfo::running_on("9999"));
    }

    #[test]
    fn test_parse_running_default_port() {
        assert_eq!(
            parse_process_list("anvil --accounts 5\n"),
            AnvilInfo {
                running: true,
                port: Some("8545".into()),
                url: Some("http://localhost:8545".into()),
            }
        );
        assert_eq!(
            parse_process_list("anvil --port=1234\n"),
            AnvilInfo::running_on("1234")
        );
    }

    #[test]
    fn test_parse_not_running() {
        let listing = "/usr/bin/bash\ngrep anvil\npkill -x anvil\nvim anvil.md\n";
        assert_eq!(parse_process_list(listing), AnvilInfo::stopped());
        assert_eq!(parse_process_list(""), AnvilInfo::stopped());
    }

    #[test]
    fn test_parse_windows_tasklist() {
        let listing = "\"anvil.exe\",\"4242\",\"Console\",\"1\",\"12,000 K\"\n";
        assert_eq!(parse_process_list(listing), AnvilInfo::running_on("8545"));
    }

    #[tokio::test]
    async fn test_probe_uses_process_listing() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.respond(
            process_listing_command().program(),
            ExecutionResult::ok("/home/dev/.foundry/bin/anvil --port 9999\n"),
        );
        let probe = AnvilProbe::new(runner.clone(), LivenessStrategy::ProcessTable);

        assert_eq!(probe.status().await, AnvilInfo::running_on("9999"));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_probe_listing_failure_means_stopped() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.respond(
            process_listing_command().program(),
            ExecutionResult::failed("ps: not found"),
        );
        let probe = AnvilProbe::new(runner, LivenessStrategy::ProcessTable);

        assert_eq!(probe.status().await, AnvilInfo::stopped());
    }

    #[tokio::test]
    async fn test_rpc_health_check() {
        let _m = mockito::mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"anvil/v0.2.0"}"#)
            .create();

        let runner = Arc::new(ScriptedRunner::new());
        let endpoint = mockito::server_url();
        let expected_port = url::Url::parse(&endpoint)
            .unwrap()
            .port_or_known_default()
            .unwrap()
            .to_string();
        let probe = AnvilProbe::new(
            runner.clone(),
            LivenessStrategy::RpcHealth { endpoint },
        );

        assert_eq!(probe.status().await, AnvilInfo::running_on(expected_port));
        // the process table is not consulted when the endpoint answers
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rpc_health_falls_back_to_process_table() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.respond(
            process_listing_command().program(),
            ExecutionResult::ok("anvil --port 7777\n"),
        );
        // nothing listens on port 9 (discard) on a test machine
        let probe = AnvilProbe::new(
            runner.clone(),
            LivenessStrategy::RpcHealth {
                endpoint: "http://127.0.0.1:9".to_string(),
            },
        );

        assert_eq!(probe.status().await, AnvilInfo::running_on("7777"));
        assert_eq!(runner.calls().len(), 1);
    }
}
