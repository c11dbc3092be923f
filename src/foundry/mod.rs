// src/foundry/mod.rs

pub mod anvil;
pub mod command;
pub mod models;
pub mod paths;
pub mod rpc;
pub mod services;
pub mod workspace;

// Re-export commonly used types
pub use command::{CommandLine, CommandRunner, ProcessRunner};
pub use models::{AnvilInfo, ExecutionResult, ToolOutput};
