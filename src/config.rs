// src/config.rs

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use secrecy::SecretString;

use crate::foundry::anvil::LivenessStrategy;

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";
pub const WORKSPACE_DIR_NAME: &str = ".mcp-foundry-workspace";

// A struct to hold all configuration, loaded once at startup from the environment / .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub port: u16,

    /// Home directory every default path below is derived from
    pub home_dir: PathBuf,

    // RPC settings
    pub default_rpc_url: String,
    /// Foundry config file consulted for `[rpc_endpoints]` aliases
    pub foundry_config_path: PathBuf,

    // Toolchain locations
    pub foundry_bin_dir: PathBuf,
    pub heimdall_bin: PathBuf,

    // Filesystem layout
    pub workspace_dir: PathBuf,
    pub heimdall_output_dir: PathBuf,

    // Transaction settings
    pub private_key: Option<SecretString>,

    // Anvil management
    pub liveness: LivenessStrategy,
    pub anvil_start_wait_ms: u64,
    pub anvil_stop_wait_ms: u64,
}

impl Config {
    /// Builds the default layout relative to `home_dir` without reading the environment.
    pub fn with_home(home_dir: impl AsRef<Path>) -> Self {
        let home_dir = home_dir.as_ref().to_path_buf();
        let foundry_dir = home_dir.join(".foundry");
        let workspace_dir = home_dir.join(WORKSPACE_DIR_NAME);

        Config {
            port: 8080,
            default_rpc_url: DEFAULT_RPC_URL.to_string(),
            foundry_config_path: foundry_dir.join("config.toml"),
            foundry_bin_dir: foundry_dir.join("bin"),
            heimdall_bin: PathBuf::from("heimdall"),
            heimdall_output_dir: workspace_dir.join("heimdall-output"),
            workspace_dir,
            private_key: None,
            liveness: LivenessStrategy::ProcessTable,
            anvil_start_wait_ms: 1000,
            anvil_stop_wait_ms: 500,
            home_dir,
        }
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let home_dir = dirs::home_dir().context("Could not determine the user's home directory")?;
        let mut config = Config::with_home(home_dir);

        if let Ok(port) = env::var("PORT") {
            config.port = port.parse().context("PORT must be a valid number")?;
        }
        if let Ok(url) = env::var("RPC_URL") {
            if !url.trim().is_empty() {
                config.default_rpc_url = url;
            }
        }
        if let Ok(path) = env::var("FOUNDRY_CONFIG") {
            config.foundry_config_path = PathBuf::from(path);
        }
        if let Ok(dir) = env::var("FOUNDRY_BIN_DIR") {
            config.foundry_bin_dir = PathBuf::from(dir);
        }
        if let Ok(bin) = env::var("HEIMDALL_PATH") {
            config.heimdall_bin = PathBuf::from(bin);
        }
        if let Ok(dir) = env::var("FOUNDRY_WORKSPACE") {
            config.workspace_dir = PathBuf::from(dir);
            config.heimdall_output_dir = config.workspace_dir.join("heimdall-output");
        }
        if let Ok(dir) = env::var("HEIMDALL_OUTPUT_DIR") {
            config.heimdall_output_dir = PathBuf::from(dir);
        }

        config.private_key = env::var("PRIVATE_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .map(SecretString::new);

        if let Ok(mode) = env::var("ANVIL_LIVENESS") {
            config.liveness = parse_liveness(&mode)?;
        }
        if let Ok(ms) = env::var("ANVIL_START_WAIT_MS") {
            config.anvil_start_wait_ms = ms
                .parse()
                .context("ANVIL_START_WAIT_MS must be a valid number")?;
        }
        if let Ok(ms) = env::var("ANVIL_STOP_WAIT_MS") {
            config.anvil_stop_wait_ms = ms
                .parse()
                .context("ANVIL_STOP_WAIT_MS must be a valid number")?;
        }

        Ok(config)
    }
}

fn parse_liveness(mode: &str) -> Result<LivenessStrategy> {
    match mode.trim().to_lowercase().as_str() {
        "" | "process" | "ps" => Ok(LivenessStrategy::ProcessTable),
        "rpc" | "health" => Ok(LivenessStrategy::RpcHealth {
            endpoint: DEFAULT_RPC_URL.to_string(),
        }),
        other => {
            // Anything else is taken as an explicit health-check endpoint
            if other.starts_with("http") {
                Ok(LivenessStrategy::RpcHealth {
                    endpoint: mode.trim().to_string(),
                })
            } else {
                bail!("ANVIL_LIVENESS must be 'process', 'rpc' or an http(s) URL, got '{}'", mode)
            }
        }
    }
}
