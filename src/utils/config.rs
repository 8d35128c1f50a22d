use crate::cert::builder::DEFAULT_VALIDITY_DAYS;
use crate::cert::serial::{CounterSerial, FixedSerial, RandomSerial, SerialNumberSource};
use crate::cert::SerialNumber;
use crate::crypto::DigestAlgorithm;
use crate::utils::errors::{CaError, Result};
use crate::utils::paths::SignerPaths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How issued certificates get their serial numbers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum SerialPolicy {
    /// 128-bit random serials
    #[default]
    Random,
    /// In-process counter
    Counter {
        #[serde(default = "default_counter_start")]
        start: u64,
    },
    /// Same caller-supplied serial for every certificate
    Fixed { value: SerialNumber },
}

fn default_counter_start() -> u64 {
    1
}

impl SerialPolicy {
    pub fn to_source(&self) -> Box<dyn SerialNumberSource> {
        match self {
            SerialPolicy::Random => Box::new(RandomSerial),
            SerialPolicy::Counter { start } => Box::new(CounterSerial::starting_at(*start)),
            SerialPolicy::Fixed { value } => Box::new(FixedSerial::new(value.clone())),
        }
    }
}

/// Signing parameters. Every field is optional in YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Days between notBefore and notAfter
    pub validity_days: u32,
    pub digest: DigestAlgorithm,
    pub serial: SerialPolicy,
    /// Refuse to sign when the CA key does not belong to the CA certificate
    pub verify_ca_key_pair: bool,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            validity_days: DEFAULT_VALIDITY_DAYS,
            digest: DigestAlgorithm::default(),
            serial: SerialPolicy::default(),
            verify_ca_key_pair: true,
        }
    }
}

impl SignerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.validity_days == 0 {
            return Err(CaError::Config(
                "validity_days must be greater than zero".to_string(),
            ));
        }
        if let SerialPolicy::Fixed { value } = &self.serial {
            if value.is_zero() {
                tracing::warn!(
                    "Serial policy is fixed at zero; issued certificates will not have unique serials"
                );
            }
        }
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: SignerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CaError::Config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Self::from_yaml_str(&contents)
    }

    /// Load an explicit config file, else the default location if it exists,
    /// else built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match SignerPaths::config_file() {
            Ok(default_path) if default_path.exists() => Self::load(&default_path),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SignerConfig::default();
        assert_eq!(config.validity_days, 365);
        assert_eq!(config.digest, DigestAlgorithm::Sha256);
        assert_eq!(config.serial, SerialPolicy::Random);
        assert!(config.verify_ca_key_pair);
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = SignerConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, SignerConfig::default());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
validity_days: 90
digest: sha384
serial:
  policy: counter
  start: 1000
verify_ca_key_pair: false
"#;
        let config = SignerConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.validity_days, 90);
        assert_eq!(config.digest, DigestAlgorithm::Sha384);
        assert_eq!(config.serial, SerialPolicy::Counter { start: 1000 });
        assert!(!config.verify_ca_key_pair);
    }

    #[test]
    fn test_fixed_serial_yaml() {
        let yaml = "serial:\n  policy: fixed\n  value: \"0a:0b\"\n";
        let config = SignerConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.serial,
            SerialPolicy::Fixed {
                value: SerialNumber::from_bytes(&[0x0a, 0x0b])
            }
        );
        let source = config.serial.to_source();
        assert_eq!(source.next_serial().unwrap().as_hex(), "0a0b");
        assert_eq!(source.describe(), "fixed");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(SignerConfig::from_yaml_str("validity_days: 0").is_err());
        assert!(SignerConfig::from_yaml_str("digest: md5").is_err());
        assert!(SignerConfig::from_yaml_str("serial:\n  policy: fixed\n  value: zz\n").is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = SignerConfig::load(Path::new("/nonexistent/csr-signer.yaml")).unwrap_err();
        assert!(matches!(err, CaError::Config(_)));
    }
}
