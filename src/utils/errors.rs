use std::fmt;
use thiserror::Error;

/// Which PEM object a decode step was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    PrivateKey,
    Certificate,
    CertificateRequest,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::PrivateKey => "private key",
            ObjectKind::Certificate => "CA certificate",
            ObjectKind::CertificateRequest => "certificate request",
        };
        f.write_str(name)
    }
}

/// Certificate field whose assignment failed during building
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateField {
    Version,
    SerialNumber,
    Subject,
    Issuer,
    PublicKey,
    Validity,
}

impl fmt::Display for CertificateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CertificateField::Version => "version",
            CertificateField::SerialNumber => "serial number",
            CertificateField::Subject => "subject name",
            CertificateField::Issuer => "issuer name",
            CertificateField::PublicKey => "public key",
            CertificateField::Validity => "validity",
        };
        f.write_str(name)
    }
}

/// Coarse error classification handed back to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Parse,
    InvalidSignature,
    KeyMismatch,
    Build,
    Sign,
    Encode,
    NotInitialized,
    Config,
    Io,
}

#[derive(Error, Debug)]
pub enum CaError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Failed to parse {kind}: {reason}")]
    Parse { kind: ObjectKind, reason: String },

    #[error("Error verifying signature on request: {0}")]
    InvalidSignature(String),

    #[error("CA private key does not match the CA certificate public key")]
    KeyMismatch,

    #[error("Error setting {field} of certificate: {reason}")]
    Build {
        field: CertificateField,
        reason: String,
    },

    #[error("Error signing the new certificate: {0}")]
    Sign(String),

    #[error("Error encoding the signed certificate: {0}")]
    Encode(String),

    #[error("Cryptographic algorithms are not registered; call init_crypto() first")]
    NotInitialized,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CaError {
    pub fn parse(kind: ObjectKind, reason: impl Into<String>) -> Self {
        CaError::Parse {
            kind,
            reason: reason.into(),
        }
    }

    pub fn build(field: CertificateField, reason: impl Into<String>) -> Self {
        CaError::Build {
            field,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CaError::Input(_) => ErrorKind::Input,
            CaError::Parse { .. } => ErrorKind::Parse,
            CaError::InvalidSignature(_) => ErrorKind::InvalidSignature,
            CaError::KeyMismatch => ErrorKind::KeyMismatch,
            CaError::Build { .. } => ErrorKind::Build,
            CaError::Sign(_) => ErrorKind::Sign,
            CaError::Encode(_) => ErrorKind::Encode,
            CaError::NotInitialized => ErrorKind::NotInitialized,
            CaError::Config(_) | CaError::Yaml(_) => ErrorKind::Config,
            CaError::Io(_) | CaError::Json(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, CaError>;
