// src/foundry/paths.rs

use std::path::PathBuf;

use crate::config::Config;

/// Locations of the external executables, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPaths {
    pub cast: PathBuf,
    pub forge: PathBuf,
    pub anvil: PathBuf,
    /// Looked up through `PATH` unless `HEIMDALL_PATH` says otherwise
    pub heimdall: PathBuf,
}

impl BinaryPaths {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cast: config.foundry_bin_dir.join("cast"),
            forge: config.foundry_bin_dir.join("forge"),
            anvil: config.foundry_bin_dir.join("anvil"),
            heimdall: config.heimdall_bin.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_from_home() {
        let config = Config::with_home("/home/dev");
        let paths = BinaryPaths::from_config(&config);

        assert_eq!(paths.cast, PathBuf::from("/home/dev/.foundry/bin/cast"));
        assert_eq!(paths.forge, PathBuf::from("/home/dev/.foundry/bin/forge"));
        assert_eq!(paths.anvil, PathBuf::from("/home/dev/.foundry/bin/anvil"));
        assert_eq!(paths.heimdall, PathBuf::from("heimdall"));
    }
}
