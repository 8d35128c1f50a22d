use crate::utils::errors::{CaError, Result};
use std::path::PathBuf;

pub const PROGRAM_NAME: &str = "csr-signer";
const CONFIG_FILE_NAME: &str = "config.yaml";

pub struct SignerPaths;

impl SignerPaths {
    /// Get the config directory: ~/.config/csr-signer/
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(PROGRAM_NAME))
            .ok_or_else(|| CaError::Config("Cannot determine config directory".to_string()))
    }

    /// Get the default config file: ~/.config/csr-signer/config.yaml
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_location() {
        if let Ok(path) = SignerPaths::config_file() {
            assert!(path.ends_with("csr-signer/config.yaml"));
        }
    }
}
