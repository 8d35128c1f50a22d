use crate::cert::builder::UnsignedCertificate;
use crate::crypto::{registry, CaPrivateKey, DigestAlgorithm};
use crate::utils::errors::{CaError, Result};
use der::asn1::BitString;
use der::oid::AssociatedOid;
use der::Encode;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest, Sha256, Sha384, Sha512};
use x509_cert::Certificate;

/// Sign an assembled certificate with the CA key.
///
/// The TBS `signature` field and the outer `signatureAlgorithm` always
/// carry the same identifier. No extensions are added.
pub fn sign_certificate(
    unsigned: UnsignedCertificate,
    key: &CaPrivateKey,
    digest: DigestAlgorithm,
) -> Result<Certificate> {
    let algorithm = registry()?.signature_algorithm(digest)?;
    let identifier = algorithm.identifier();

    let tbs_certificate = unsigned.into_tbs(identifier.clone());
    let tbs_der = tbs_certificate
        .to_der()
        .map_err(|e| CaError::Sign(format!("unable to encode TBSCertificate: {e}")))?;

    let signature = match digest {
        DigestAlgorithm::Sha256 => rsa_sign::<Sha256>(key.rsa(), &tbs_der)?,
        DigestAlgorithm::Sha384 => rsa_sign::<Sha384>(key.rsa(), &tbs_der)?,
        DigestAlgorithm::Sha512 => rsa_sign::<Sha512>(key.rsa(), &tbs_der)?,
    };

    let signature = BitString::from_bytes(&signature)
        .map_err(|e| CaError::Sign(format!("unable to encode signature: {e}")))?;

    tracing::debug!("Signed certificate with {}", algorithm.name());

    Ok(Certificate {
        tbs_certificate,
        signature_algorithm: identifier,
        signature,
    })
}

fn rsa_sign<D>(key: &RsaPrivateKey, message: &[u8]) -> Result<Vec<u8>>
where
    D: Digest + AssociatedOid,
{
    let hashed = D::digest(message);
    key.sign(Pkcs1v15Sign::new::<D>(), &hashed)
        .map_err(|e| CaError::Sign(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::builder::{build_certificate, ValidityWindow};
    use crate::cert::{CertificateParser, SerialNumber};
    use crate::crypto::init_crypto;
    use crate::testdata;
    use x509_parser::prelude::*;

    fn signed_with(digest: DigestAlgorithm) -> Vec<u8> {
        init_crypto();
        let key = CaPrivateKey::from_pem(testdata::CA_KEY, None).unwrap();
        let csr = CertificateParser::parse_request(testdata::LEAF_CSR).unwrap();
        let ca = CertificateParser::parse_ca_certificate(testdata::CA_CERT).unwrap();
        let window = ValidityWindow::starting_now(30).unwrap();

        let unsigned = build_certificate(&csr, &ca, &SerialNumber::from_u64(42), &window).unwrap();
        sign_certificate(unsigned, &key, digest)
            .unwrap()
            .to_der()
            .unwrap()
    }

    #[test]
    fn test_signature_verifies_against_ca_key() {
        let ca_block = crate::utils::pem::decode_block(
            testdata::CA_CERT,
            crate::utils::errors::ObjectKind::Certificate,
            &["CERTIFICATE"],
        )
        .unwrap();
        let (_, ca_cert) = X509Certificate::from_der(ca_block.contents()).unwrap();

        for digest in [
            DigestAlgorithm::Sha256,
            DigestAlgorithm::Sha384,
            DigestAlgorithm::Sha512,
        ] {
            let der = signed_with(digest);
            let (_, cert) = X509Certificate::from_der(&der).unwrap();
            assert!(cert.verify_signature(Some(ca_cert.public_key())).is_ok());
            assert_eq!(
                cert.signature_algorithm.algorithm,
                cert.tbs_certificate.signature.algorithm
            );
        }
    }

    #[test]
    fn test_no_extensions_are_added() {
        let der = signed_with(DigestAlgorithm::Sha256);
        let (_, cert) = X509Certificate::from_der(&der).unwrap();
        assert!(cert.extensions().is_empty());
        assert_eq!(cert.version(), X509Version::V3);
    }

    #[test]
    fn test_signing_is_deterministic() {
        init_crypto();
        let key = CaPrivateKey::from_pem(testdata::CA_KEY, None).unwrap();
        let first = rsa_sign::<Sha256>(key.rsa(), b"tbs").unwrap();
        let second = rsa_sign::<Sha256>(key.rsa(), b"tbs").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), key.bits() / 8);
    }
}
