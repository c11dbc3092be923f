// src/foundry/services/anvil.rs

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};
use validator::Validate;

use super::require_foundry;
use crate::foundry::anvil::{ANVIL_PROCESS_NAME, DEFAULT_ANVIL_PORT};
use crate::foundry::command::CommandLine;
use crate::foundry::models::ToolOutput;
use crate::AppState;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnvilStartParams {
    pub port: Option<u16>,
    pub block_time: Option<u64>,
    pub fork_url: Option<String>,
    pub fork_block_number: Option<u64>,
    pub accounts: Option<u32>,
    pub mnemonic: Option<String>,
    #[serde(default)]
    pub silent: bool,
}

pub async fn start(state: &AppState, params: AnvilStartParams) -> ToolOutput {
    if let Some(err) = require_foundry(state).await {
        return err;
    }

    let current = state.anvil.status().await;
    if current.running {
        return ToolOutput::error(format!(
            "Anvil is already running on port {}.",
            current.port.as_deref().unwrap_or(DEFAULT_ANVIL_PORT)
        ));
    }

    let port = params.port.unwrap_or(8545);
    let fork_url = match params.fork_url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => Some(state.rpc.resolve(Some(url)).await),
        None => None,
    };
    let fork_block = fork_url.as_ref().and(params.fork_block_number);

    let command = CommandLine::new(&state.paths.anvil)
        .opt("--port", Some(port))
        .opt("--block-time", params.block_time)
        .opt("--fork-url", fork_url)
        .opt("--fork-block-number", fork_block)
        .opt("--accounts", params.accounts)
        .opt("--mnemonic", params.mnemonic.filter(|m| !m.is_empty()));

    let pid = match state.runner.spawn(&command, params.silent).await {
        Ok(pid) => pid,
        Err(e) => {
            error!("Anvil error: {}", e);
            return ToolOutput::error(format!("Error starting Anvil: {}", e));
        }
    };

    tokio::time::sleep(Duration::from_millis(state.config.anvil_start_wait_ms)).await;

    if state.anvil.status().await.running {
        info!("Anvil started on port {}", port);
        let pid = pid
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        ToolOutput::success(format!(
            "Anvil started successfully on port {}. RPC URL: http://localhost:{}\nProcess ID: {}",
            port, port, pid
        ))
    } else {
        ToolOutput::error("Failed to start Anvil. Check system logs for details.")
    }
}

#[cfg(not(windows))]
fn kill_command() -> CommandLine {
    CommandLine::new("pkill").args(["-x", ANVIL_PROCESS_NAME])
}

#[cfg(windows)]
fn kill_command() -> CommandLine {
    CommandLine::new("taskkill").args(["/F", "/IM", "anvil.exe"])
}

pub async fn stop(state: &AppState) -> ToolOutput {
    let current = state.anvil.status().await;
    if !current.running {
        return ToolOutput::error("No Anvil instance is currently running.");
    }

    let result = state.runner.run(&kill_command()).await;
    if !result.success {
        return ToolOutput::error(format!("Error stopping Anvil: {}", result.message));
    }

    tokio::time::sleep(Duration::from_millis(state.config.anvil_stop_wait_ms)).await;

    if state.anvil.status().await.running {
        ToolOutput::error("Failed to stop Anvil. It may still be running.")
    } else {
        info!("Anvil stopped");
        ToolOutput::success("Anvil has been stopped successfully.")
    }
}

pub async fn status(state: &AppState) -> ToolOutput {
    let info = state.anvil.status().await;
    if info.running {
        ToolOutput::success(format!(
            "Anvil is running on port {}. RPC URL: {}",
            info.port.unwrap_or_default(),
            info.url.unwrap_or_default()
        ))
    } else {
        ToolOutput::success("Anvil is not currently running.")
    }
}
