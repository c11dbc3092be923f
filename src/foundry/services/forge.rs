// src/foundry/services/forge.rs

use serde::Deserialize;
use validator::Validate;

use super::files::resolve_in_workspace;
use super::require_foundry;
use crate::foundry::command::CommandLine;
use crate::foundry::models::ToolOutput;
use crate::AppState;

fn default_sig() -> String {
    "run()".to_string()
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForgeScriptParams {
    #[validate(length(min = 1))]
    pub script_path: String,
    #[serde(default = "default_sig")]
    pub sig: String,
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub broadcast: bool,
    #[serde(default)]
    pub verify: bool,
}

/// Runs a script that lives in the workspace, from inside the workspace.
pub async fn script(state: &AppState, params: ForgeScriptParams) -> ToolOutput {
    if let Some(err) = require_foundry(state).await {
        return err;
    }

    let workspace = match state.workspace.ensure_initialized().await {
        Ok(path) => path,
        Err(e) => return ToolOutput::error(format!("Error executing script: {}", e)),
    };

    let script_full_path = match resolve_in_workspace(&workspace, &params.script_path) {
        Ok(path) => path,
        Err(e) => return ToolOutput::error(format!("Error executing script: {}", e)),
    };
    if !tokio::fs::try_exists(&script_full_path).await.unwrap_or(false) {
        return ToolOutput::error(format!(
            "Script does not exist at {}",
            script_full_path.display()
        ));
    }

    let rpc_url = state.rpc.resolve(params.rpc_url.as_deref()).await;
    let command = CommandLine::new(&state.paths.forge)
        .arg("script")
        .arg(&params.script_path)
        .opt("--sig", Some(&params.sig))
        .opt("--rpc-url", Some(rpc_url))
        .flag_if("--broadcast", params.broadcast)
        .flag_if("--verify", params.verify)
        .current_dir(&workspace);

    let result = state.runner.run(&command).await;
    ToolOutput::from_execution(
        result,
        |out| format!("Script executed successfully:\n{}", out),
        |err| format!("Script execution failed: {}", err),
    )
}
