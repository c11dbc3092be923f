// src/foundry/workspace.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use super::command::{CommandLine, CommandRunner};
use super::models::FoundryError;

/// Marker that identifies an initialized forge project.
pub const PROJECT_MARKER: &str = "foundry.toml";

/// The persistent forge project that scripts and generated files live in.
#[derive(Clone)]
pub struct Workspace {
    root: PathBuf,
    forge: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, forge: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            root: root.into(),
            forge: forge.into(),
            runner,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the directory and runs `forge init` once.
    ///
    /// Two concurrent first calls may both run `forge init`; nothing serializes them.
    pub async fn ensure_initialized(&self) -> Result<PathBuf, FoundryError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let marker = self.root.join(PROJECT_MARKER);
        if !tokio::fs::try_exists(&marker).await.unwrap_or(false) {
            info!("Initializing forge project in {}", self.root.display());
            let init = CommandLine::new(&self.forge)
                .args(["init", "--no-git"])
                .current_dir(&self.root);
            let result = self.runner.run(&init).await;
            if !result.success {
                warn!("forge init failed in {}: {}", self.root.display(), result.message.trim());
            }
        }

        Ok(self.root.clone())
    }
}
