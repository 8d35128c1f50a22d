use crate::utils::errors::{CaError, Result};
use der::asn1::Any;
use der::oid::ObjectIdentifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use x509_cert::spki::AlgorithmIdentifierOwned;

static REGISTRY: OnceLock<AlgorithmRegistry> = OnceLock::new();

const SHA256_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");
const SHA384_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");
const SHA512_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");

/// Digest used when the CA signs a certificate
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    #[value(alias = "sha-256")]
    Sha256,
    #[value(alias = "sha-384")]
    Sha384,
    #[value(alias = "sha-512")]
    Sha512,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered certificate signature algorithm
#[derive(Debug, Clone)]
pub struct SignatureAlgorithm {
    name: &'static str,
    oid: ObjectIdentifier,
    digest: DigestAlgorithm,
}

impl SignatureAlgorithm {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// AlgorithmIdentifier with the explicit NULL parameters RSA requires
    pub fn identifier(&self) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: self.oid,
            parameters: Some(Any::null()),
        }
    }
}

/// Process-wide table of the algorithms this CA can sign with
#[derive(Debug)]
pub struct AlgorithmRegistry {
    signature_algorithms: Vec<SignatureAlgorithm>,
}

impl AlgorithmRegistry {
    fn builtin() -> Self {
        Self {
            signature_algorithms: vec![
                SignatureAlgorithm {
                    name: "sha256WithRSAEncryption",
                    oid: SHA256_WITH_RSA,
                    digest: DigestAlgorithm::Sha256,
                },
                SignatureAlgorithm {
                    name: "sha384WithRSAEncryption",
                    oid: SHA384_WITH_RSA,
                    digest: DigestAlgorithm::Sha384,
                },
                SignatureAlgorithm {
                    name: "sha512WithRSAEncryption",
                    oid: SHA512_WITH_RSA,
                    digest: DigestAlgorithm::Sha512,
                },
            ],
        }
    }

    /// Find the RSA signature algorithm for a digest
    pub fn signature_algorithm(&self, digest: DigestAlgorithm) -> Result<&SignatureAlgorithm> {
        self.signature_algorithms
            .iter()
            .find(|alg| alg.digest == digest)
            .ok_or_else(|| CaError::Config(format!("Digest {digest} is not registered")))
    }
}

/// Register the signing algorithms. Runs the registration once per process;
/// concurrent first callers wait for it and every later call is a no-op.
pub fn init_crypto() -> &'static AlgorithmRegistry {
    REGISTRY.get_or_init(|| {
        let registry = AlgorithmRegistry::builtin();
        tracing::debug!(
            "Registered {} signature algorithms",
            registry.signature_algorithms.len()
        );
        registry
    })
}

/// Get the registry, failing if `init_crypto` has not run yet
pub fn registry() -> Result<&'static AlgorithmRegistry> {
    REGISTRY.get().ok_or(CaError::NotInitialized)
}
