//! Shared helpers for the integration tests.

use std::sync::Arc;

use tempfile::TempDir;

use evm_foundry_mcp::{
    config::Config, foundry::ExecutionResult, test_support::ScriptedRunner, AppState,
};

/// App state in a throwaway home directory, with forge reported as installed.
///
/// The process listing is left unscripted, so anvil reads as stopped until a
/// test scripts `ps -eo args=`.
pub fn test_app() -> (TempDir, Arc<ScriptedRunner>, AppState) {
    let home = tempfile::tempdir().unwrap();
    let mut config = Config::with_home(home.path());
    config.anvil_start_wait_ms = 0;
    config.anvil_stop_wait_ms = 0;

    let runner = Arc::new(ScriptedRunner::new());
    let state = AppState::new(config, runner.clone());
    runner.respond(
        &format!("{} --version", state.paths.forge.display()),
        ExecutionResult::ok("forge 0.2.0 (abc 2024-01-01)"),
    );
    (home, runner, state)
}
