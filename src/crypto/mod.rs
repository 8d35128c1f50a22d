pub mod keys;
pub mod registry;

pub use keys::{CaPrivateKey, Passphrase};
pub use registry::{init_crypto, registry, AlgorithmRegistry, DigestAlgorithm, SignatureAlgorithm};
