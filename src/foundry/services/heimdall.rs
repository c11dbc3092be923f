//! Heimdall bytecode-analysis tools.
//!
//! Results are written by heimdall into an output directory (default
//! `<workspace>/heimdall-output`); decompile reads those files back into the
//! response, the other tools echo heimdall's own stdout.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;
use tracing::debug;
use validator::Validate;

use super::{require_heimdall, Verbosity};
use crate::foundry::command::CommandLine;
use crate::foundry::models::ToolOutput;
use crate::AppState;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DisassembleParams {
    #[validate(length(min = 1))]
    pub target: String,
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub decimal_counter: bool,
    pub file_name: Option<String>,
    pub verbosity: Option<Verbosity>,
    pub output_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DecodeParams {
    #[validate(length(min = 1))]
    pub target: String,
    pub rpc_url: Option<String>,
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub explain: bool,
    #[serde(default)]
    pub use_defaults: bool,
    #[serde(default)]
    pub truncate_calldata: bool,
    #[serde(default)]
    pub skip_resolving: bool,
    pub verbosity: Option<Verbosity>,
    /// Accepted for symmetry with the other tools; decode only prints to stdout.
    pub output_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DecompileParams {
    #[validate(length(min = 1))]
    pub target: String,
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub use_defaults: bool,
    #[serde(default)]
    pub skip_resolving: bool,
    #[serde(default)]
    pub include_sol: bool,
    #[serde(default)]
    pub include_yul: bool,
    pub file_name: Option<String>,
    pub timeout: Option<u64>,
    pub verbosity: Option<Verbosity>,
    pub output_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CfgParams {
    #[validate(length(min = 1))]
    pub target: String,
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub use_defaults: bool,
    #[serde(default)]
    pub color_edges: bool,
    pub file_name: Option<String>,
    pub timeout: Option<u64>,
    pub verbosity: Option<Verbosity>,
    pub output_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InspectParams {
    #[validate(length(min = 1))]
    pub target: String,
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub use_defaults: bool,
    pub transpose_api_key: Option<String>,
    pub file_name: Option<String>,
    #[serde(default)]
    pub skip_resolving: bool,
    pub verbosity: Option<Verbosity>,
    pub output_dir: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// API keys travel as secret tokens so command logs never show them.
fn api_key(value: Option<String>) -> Option<SecretString> {
    non_empty(value).map(SecretString::new)
}

/// Custom directory (with `~/` expanded) or the configured default.
fn output_dir(state: &AppState, custom: Option<&str>) -> PathBuf {
    match custom.filter(|d| !d.is_empty()) {
        Some(dir) => match dir.strip_prefix("~/") {
            Some(rest) => state.config.home_dir.join(rest),
            None if dir == "~" => state.config.home_dir.clone(),
            None => PathBuf::from(dir),
        },
        None => state.config.heimdall_output_dir.clone(),
    }
}

/// Heimdall takes an RPC only when asked; aliases still go through the resolver.
async fn rpc_flag(state: &AppState, rpc_url: Option<String>) -> Option<String> {
    match non_empty(rpc_url) {
        Some(url) => Some(state.rpc.resolve(Some(&url)).await),
        None => None,
    }
}

fn heimdall(state: &AppState, subcommand: &str, target: &str) -> CommandLine {
    CommandLine::new(&state.paths.heimdall).arg(subcommand).arg(target)
}

fn with_verbosity(command: CommandLine, verbosity: Option<Verbosity>) -> CommandLine {
    match verbosity.and_then(Verbosity::flag) {
        Some(flag) => command.arg(flag),
        None => command,
    }
}

pub async fn disassemble(state: &AppState, params: DisassembleParams) -> ToolOutput {
    if let Some(err) = require_heimdall(state).await {
        return err;
    }

    let out_dir = output_dir(state, params.output_dir.as_deref());
    let command = heimdall(state, "disassemble", &params.target)
        .opt("-r", rpc_flag(state, params.rpc_url).await)
        .flag_if("--decimal-counter", params.decimal_counter)
        .opt("-n", non_empty(params.file_name));
    let command = with_verbosity(command, params.verbosity).opt("-o", Some(out_dir.display()));

    let result = state.runner.run(&command).await;
    ToolOutput::from_execution(
        result,
        |out| {
            format!(
                "Disassembly for {} saved to: {}\n\n{}",
                params.target,
                out_dir.display(),
                out
            )
        },
        |err| format!("Heimdall disassemble failed: {}", err),
    )
}

pub async fn decode(state: &AppState, params: DecodeParams) -> ToolOutput {
    if let Some(err) = require_heimdall(state).await {
        return err;
    }

    let command = heimdall(state, "decode", &params.target)
        .opt("-r", rpc_flag(state, params.rpc_url).await)
        .secret_opt("--openai-api-key", api_key(params.openai_api_key).as_ref())
        .flag_if("--explain", params.explain)
        .flag_if("-d", params.use_defaults)
        .flag_if("--truncate-calldata", params.truncate_calldata)
        .flag_if("--skip-resolving", params.skip_resolving);
    let command = with_verbosity(command, params.verbosity);

    let result = state.runner.run(&command).await;
    ToolOutput::from_execution(
        result,
        |out| format!("Decoded calldata for {}:\n\n{}", params.target, out),
        |err| format!("Heimdall decode failed: {}", err),
    )
}

pub async fn decompile(state: &AppState, params: DecompileParams) -> ToolOutput {
    if let Some(err) = require_heimdall(state).await {
        return err;
    }

    let out_dir = output_dir(state, params.output_dir.as_deref());
    if let Err(e) = tokio::fs::create_dir_all(&out_dir).await {
        debug!("Could not create {}: {}", out_dir.display(), e);
    }

    let file_name = non_empty(params.file_name);
    let command = heimdall(state, "decompile", &params.target)
        .opt("-r", rpc_flag(state, params.rpc_url).await)
        .flag_if("-d", params.use_defaults)
        .flag_if("--skip-resolving", params.skip_resolving)
        .flag_if("--include-sol", params.include_sol)
        .flag_if("--include-yul", params.include_yul)
        .opt("-n", file_name.clone())
        .opt("-t", params.timeout.filter(|t| *t > 0));
    let command = with_verbosity(command, params.verbosity).opt("-o", Some(out_dir.display()));

    let result = state.runner.run(&command).await;
    if !result.success {
        return ToolOutput::error(format!("Heimdall decompile failed: {}", result.message));
    }

    let contents = read_output_files(&out_dir, file_name.as_deref()).await;
    ToolOutput::success(format!(
        "Decompiled contract {}:\nOutput directory: {}\n\n{}",
        params.target,
        out_dir.display(),
        contents
    ))
}

pub async fn cfg(state: &AppState, params: CfgParams) -> ToolOutput {
    if let Some(err) = require_heimdall(state).await {
        return err;
    }

    let out_dir = output_dir(state, params.output_dir.as_deref());
    let command = heimdall(state, "cfg", &params.target)
        .opt("-r", rpc_flag(state, params.rpc_url).await)
        .flag_if("-d", params.use_defaults)
        .flag_if("-c", params.color_edges)
        .opt("-n", non_empty(params.file_name))
        .opt("-t", params.timeout.filter(|t| *t > 0));
    let command = with_verbosity(command, params.verbosity).opt("-o", Some(out_dir.display()));

    let result = state.runner.run(&command).await;
    ToolOutput::from_execution(
        result,
        |out| {
            format!(
                "Control flow graph for {} saved to: {}\n\n{}",
                params.target,
                out_dir.display(),
                out
            )
        },
        |err| format!("Heimdall CFG generation failed: {}", err),
    )
}

pub async fn inspect(state: &AppState, params: InspectParams) -> ToolOutput {
    if let Some(err) = require_heimdall(state).await {
        return err;
    }

    let out_dir = output_dir(state, params.output_dir.as_deref());
    let command = heimdall(state, "inspect", &params.target)
        .opt("-r", rpc_flag(state, params.rpc_url).await)
        .flag_if("-d", params.use_defaults)
        .secret_opt("-t", api_key(params.transpose_api_key).as_ref())
        .opt("-n", non_empty(params.file_name))
        .flag_if("--skip-resolving", params.skip_resolving);
    let command = with_verbosity(command, params.verbosity).opt("-o", Some(out_dir.display()));

    let result = state.runner.run(&command).await;
    ToolOutput::from_execution(
        result,
        |out| {
            format!(
                "Transaction inspection for {} saved to: {}\n\n{}",
                params.target,
                out_dir.display(),
                out
            )
        },
        |err| format!("Heimdall transaction inspection failed: {}", err),
    )
}

/// Concatenates the regular files in `dir` (names containing `file_name`, if given), sorted by name.
pub async fn read_output_files(dir: &Path, file_name: Option<&str>) -> String {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => return format!("Error reading output files: {}", e),
    };

    let mut names = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => names.push(entry.file_name().to_string_lossy().into_owned()),
            Ok(None) => break,
            Err(e) => return format!("Error reading output files: {}", e),
        }
    }
    names.retain(|name| file_name.map_or(true, |f| name.contains(f)));
    names.sort();

    if names.is_empty() {
        return "No output files found in the directory.".to_string();
    }

    let mut content = String::new();
    for name in names {
        let path = dir.join(&name);
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => content.push_str(&format!("\n=== {} ===\n{}\n", name, text)),
            Err(e) => return format!("Error reading output files: {}", e),
        }
    }

    if content.is_empty() {
        "Output files are empty.".to_string()
    } else {
        content
    }
}
