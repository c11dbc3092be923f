// src/foundry/services/files.rs

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::foundry::models::{FileToolError, ToolOutput};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSolidityFileParams {
    #[validate(length(min = 1))]
    pub file_path: String,
    pub content: String,
    #[serde(default)]
    pub overwrite: bool,
}

/// Joins `relative` onto `root`, refusing anything that would land outside it.
pub fn resolve_in_workspace(root: &Path, relative: &str) -> Result<PathBuf, FileToolError> {
    let path = Path::new(relative);
    let mut resolved = root.to_path_buf();
    for component in path.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => return Err(FileToolError::EscapesWorkspace(relative.to_string())),
            Component::RootDir | Component::Prefix(_) => {
                return Err(FileToolError::AbsolutePath(relative.to_string()))
            }
        }
    }
    Ok(resolved)
}

pub async fn create_solidity_file(state: &AppState, params: CreateSolidityFileParams) -> ToolOutput {
    match write_file(state, &params).await {
        Ok(output) => output,
        Err(e) => ToolOutput::error(format!("Error managing file: {}", e)),
    }
}

async fn write_file(state: &AppState, params: &CreateSolidityFileParams) -> Result<ToolOutput, FileToolError> {
    let workspace = state.workspace.ensure_initialized().await?;
    let full_path = resolve_in_workspace(&workspace, &params.file_path)?;

    let exists = tokio::fs::try_exists(&full_path).await.unwrap_or(false);
    if exists && !params.overwrite {
        return Ok(ToolOutput::error(format!(
            "File already exists at {}. Use overwrite=true to replace it.",
            full_path.display()
        )));
    }

    if let Some(parent) = full_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&full_path, &params.content).await?;

    let verb = if exists { "updated" } else { "created" };
    info!("File {} at {}", verb, full_path.display());
    Ok(ToolOutput::success(format!(
        "File {} successfully at {}",
        verb,
        full_path.display()
    )))
}
