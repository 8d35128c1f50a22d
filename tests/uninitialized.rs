//! Runs in its own process so the algorithm registry starts out empty.

use csr_signer::{init_crypto, sign_certificate_request, ErrorKind};

const CA_KEY: &[u8] = include_bytes!("../testdata/ca.key");
const CA_CERT: &[u8] = include_bytes!("../testdata/ca.crt");
const LEAF_CSR: &[u8] = include_bytes!("../testdata/leaf.csr");

#[test]
fn test_signing_requires_init_crypto() {
    let err = sign_certificate_request(CA_KEY, CA_CERT, LEAF_CSR).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotInitialized);

    init_crypto();
    let issued = sign_certificate_request(CA_KEY, CA_CERT, LEAF_CSR).unwrap();
    assert!(issued.starts_with(b"-----BEGIN CERTIFICATE-----"));
}
