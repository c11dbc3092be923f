//! Tool handlers.
//!
//! Every handler validates its parameters, checks the required toolkit, builds a
//! [`CommandLine`](super::command::CommandLine), runs it and turns the result into a
//! [`ToolOutput`](super::models::ToolOutput). Failures are never retried.

pub mod anvil;
pub mod cast;
pub mod files;
pub mod forge;
pub mod heimdall;
pub mod units;

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use super::command::{CommandLine, CommandRunner};
use super::models::ToolOutput;
use crate::AppState;

pub const FOUNDRY_NOT_INSTALLED_ERROR: &str = "Foundry tools are not installed. Please install Foundry: https://book.getfoundry.sh/getting-started/installation";
pub const HEIMDALL_NOT_INSTALLED_ERROR: &str = "Heimdall is not installed. Please install Heimdall: curl -L http://get.heimdall.rs | bash && bifrost";

/// Runs `<binary> --version`; the exit status is the only signal. Not cached.
pub async fn is_installed(runner: &dyn CommandRunner, binary: &Path) -> bool {
    let result = runner.run(&CommandLine::new(binary).arg("--version")).await;
    if !result.success {
        warn!("{} check failed: {}", binary.display(), result.message.trim());
    }
    result.success
}

/// `Some(error)` when forge cannot be run.
pub async fn require_foundry(state: &AppState) -> Option<ToolOutput> {
    if is_installed(state.runner.as_ref(), &state.paths.forge).await {
        None
    } else {
        Some(ToolOutput::error(FOUNDRY_NOT_INSTALLED_ERROR))
    }
}

/// `Some(error)` when heimdall cannot be run.
pub async fn require_heimdall(state: &AppState) -> Option<ToolOutput> {
    if is_installed(state.runner.as_ref(), &state.paths.heimdall).await {
        None
    } else {
        Some(ToolOutput::error(HEIMDALL_NOT_INSTALLED_ERROR))
    }
}

/// Output verbosity shared by the heimdall tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn flag(self) -> Option<&'static str> {
        match self {
            Verbosity::Quiet => Some("-q"),
            Verbosity::Normal => None,
            Verbosity::Verbose => Some("-v"),
        }
    }
}
