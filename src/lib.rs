pub mod cert;
pub mod cli;
pub mod crypto;
pub mod utils;

pub use cert::{
    inspect_certificate, sign_certificate_request, CertificateParser, CertificateSummary,
    IssuedCertificate, RequestSummary, SerialNumber, SerialNumberSource, SigningRequest,
    SigningService,
};
pub use crypto::{init_crypto, DigestAlgorithm, Passphrase};
pub use utils::config::{SerialPolicy, SignerConfig};
pub use utils::errors::{CaError, ErrorKind, Result};

#[cfg(test)]
pub(crate) mod testdata {
    use crate::utils::errors::ObjectKind;
    use crate::utils::pem;
    use der::pem::{encode_string, LineEnding};

    pub const CA_KEY: &[u8] = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/ca.key"));
    pub const CA_KEY_PKCS8: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/ca.pkcs8.key"));
    pub const CA_KEY_ENCRYPTED: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/ca.encrypted.key"));
    pub const CA_KEY_LEGACY_ENCRYPTED: &[u8] = include_bytes!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/testdata/ca.legacy-encrypted.key"
    ));
    pub const CA_KEY_PASSPHRASE: &str = "correct-horse";
    pub const CA_CERT: &[u8] = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/ca.crt"));
    pub const LEAF_CSR: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/leaf.csr"));
    pub const EC_CSR: &[u8] = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/ec.csr"));
    pub const RSA1024_CSR: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/rsa1024.csr"));
    pub const SHA1_CSR: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/sha1.csr"));
    pub const OTHER_KEY: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/other.key"));

    /// leaf.csr with one bit of its signature flipped
    pub fn tampered_csr() -> String {
        let block = pem::decode_block(
            LEAF_CSR,
            ObjectKind::CertificateRequest,
            &["CERTIFICATE REQUEST"],
        )
        .unwrap();
        let mut der = block.contents().to_vec();
        let last = der.len() - 1;
        der[last] ^= 0x01;
        encode_string("CERTIFICATE REQUEST", LineEnding::LF, &der).unwrap()
    }
}
