use crate::cert::parser::{CaCertificate, CertificateRequest};
use crate::crypto::CaPrivateKey;
use crate::utils::errors::{CaError, Result};
use der::oid::AssociatedOid;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::oid_registry::{
    OID_PKCS1_RSAENCRYPTION, OID_PKCS1_SHA1WITHRSA, OID_PKCS1_SHA224WITHRSA,
    OID_PKCS1_SHA256WITHRSA, OID_PKCS1_SHA384WITHRSA, OID_PKCS1_SHA512WITHRSA,
};

/// Check the CSR's self-signature against the public key it carries.
///
/// This only proves the request is intact and that its author holds the
/// matching private key; it says nothing about whether the requester
/// should be trusted.
///
/// PKCS#1 v1.5 signatures from rsaEncryption keys are checked with the
/// `rsa` crate, which has no minimum modulus size. Other key types go
/// through x509-parser.
pub fn verify_request(csr: &CertificateRequest) -> Result<()> {
    let parsed = csr.parsed()?;

    let verified = if parsed.certification_request_info.subject_pki.algorithm.algorithm
        == OID_PKCS1_RSAENCRYPTION
    {
        verify_rsa_request(&parsed, csr.public_key_info_der())
    } else {
        None
    };

    match verified {
        Some(result) => result?,
        None => parsed
            .verify_signature()
            .map_err(|e| CaError::InvalidSignature(e.to_string()))?,
    }

    tracing::debug!("CSR signature verified for {}", csr.subject());
    Ok(())
}

/// `None` when the signature algorithm is not PKCS#1 v1.5
fn verify_rsa_request(
    csr: &X509CertificationRequest<'_>,
    public_key_info_der: &[u8],
) -> Option<Result<()>> {
    let algorithm = &csr.signature_algorithm.algorithm;
    let verify: fn(&RsaPublicKey, &[u8], &[u8]) -> Result<()> = if *algorithm == OID_PKCS1_SHA256WITHRSA {
        pkcs1v15_verify::<Sha256>
    } else if *algorithm == OID_PKCS1_SHA384WITHRSA {
        pkcs1v15_verify::<Sha384>
    } else if *algorithm == OID_PKCS1_SHA512WITHRSA {
        pkcs1v15_verify::<Sha512>
    } else if *algorithm == OID_PKCS1_SHA224WITHRSA {
        pkcs1v15_verify::<Sha224>
    } else if *algorithm == OID_PKCS1_SHA1WITHRSA {
        pkcs1v15_verify::<Sha1>
    } else {
        return None;
    };

    let result = RsaPublicKey::from_public_key_der(public_key_info_der)
        .map_err(|e| CaError::InvalidSignature(format!("unusable RSA public key: {e}")))
        .and_then(|key| {
            verify(
                &key,
                csr.certification_request_info.raw,
                &csr.signature_value.data,
            )
        });
    Some(result)
}

fn pkcs1v15_verify<D>(key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> Result<()>
where
    D: Digest + AssociatedOid,
{
    let hashed = D::digest(message);
    key.verify(Pkcs1v15Sign::new::<D>(), &hashed, signature)
        .map_err(|e| CaError::InvalidSignature(e.to_string()))
}

/// Ensure the CA key is the one the CA certificate was issued for
pub fn verify_ca_key_pair(key: &CaPrivateKey, ca: &CaCertificate) -> Result<()> {
    if !key.matches_public_key(ca.public_key_info_der())? {
        return Err(CaError::KeyMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::CertificateParser;
    use crate::testdata;
    use crate::utils::errors::ErrorKind;

    #[test]
    fn test_valid_rsa_request() {
        let csr = CertificateParser::parse_request(testdata::LEAF_CSR).unwrap();
        assert!(verify_request(&csr).is_ok());
    }

    #[test]
    fn test_valid_ec_request() {
        let csr = CertificateParser::parse_request(testdata::EC_CSR).unwrap();
        assert!(verify_request(&csr).is_ok());
    }

    #[test]
    fn test_valid_1024_bit_rsa_request() {
        let csr = CertificateParser::parse_request(testdata::RSA1024_CSR).unwrap();
        assert!(verify_request(&csr).is_ok());
    }

    #[test]
    fn test_valid_sha1_rsa_request() {
        let csr = CertificateParser::parse_request(testdata::SHA1_CSR).unwrap();
        assert_eq!(csr.summary().signature_algorithm, "sha1WithRSAEncryption");
        assert!(verify_request(&csr).is_ok());
    }

    #[test]
    fn test_tampered_request_rejected() {
        let tampered = testdata::tampered_csr();
        let csr = CertificateParser::parse_request(tampered.as_bytes()).unwrap();

        let err = verify_request(&csr).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSignature);
    }

    #[test]
    fn test_matching_ca_key_pair() {
        let key = CaPrivateKey::from_pem(testdata::CA_KEY, None).unwrap();
        let ca = CertificateParser::parse_ca_certificate(testdata::CA_CERT).unwrap();
        assert!(verify_ca_key_pair(&key, &ca).is_ok());
    }

    #[test]
    fn test_mismatched_ca_key_pair() {
        let key = CaPrivateKey::from_pem(testdata::OTHER_KEY, None).unwrap();
        let ca = CertificateParser::parse_ca_certificate(testdata::CA_CERT).unwrap();
        let err = verify_ca_key_pair(&key, &ca).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeyMismatch);
    }
}
