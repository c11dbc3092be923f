#![recursion_limit = "256"]
// src/lib.rs

use std::sync::Arc;

// Re-export modules
pub mod api;
pub mod config;
pub mod foundry;
pub mod mcp;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

use foundry::{
    anvil::AnvilProbe, command::CommandRunner, paths::BinaryPaths, rpc::RpcResolver,
    workspace::Workspace,
};

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::Config>,
    /// Resolved locations of cast, forge, anvil and heimdall
    pub paths: BinaryPaths,
    /// Runs every external command
    pub runner: Arc<dyn CommandRunner>,
    /// Resolves RPC URLs and aliases
    pub rpc: RpcResolver,
    /// Observes the local anvil node
    pub anvil: AnvilProbe,
    /// Persistent forge project for scripts and generated files
    pub workspace: Workspace,
}

impl AppState {
    pub fn new(config: config::Config, runner: Arc<dyn CommandRunner>) -> Self {
        let paths = BinaryPaths::from_config(&config);
        let rpc = RpcResolver::from_config(&config);
        let anvil = AnvilProbe::new(runner.clone(), config.liveness.clone());
        let workspace = Workspace::new(config.workspace_dir.clone(), paths.forge.clone(), runner.clone());

        Self {
            config: Arc::new(config),
            paths,
            runner,
            rpc,
            anvil,
            workspace,
        }
    }
}
