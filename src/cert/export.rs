use crate::utils::errors::{CaError, Result};
use der::pem::{self, LineEnding, PemLabel};
use der::Encode;
use x509_cert::Certificate;

/// Serialize a signed certificate to PEM armor.
///
/// The returned buffer is exactly the armored text; no NUL or other
/// terminator byte is appended.
pub fn encode_certificate(certificate: &Certificate) -> Result<Vec<u8>> {
    let der = certificate
        .to_der()
        .map_err(|e| CaError::Encode(format!("DER encoding failed: {e}")))?;

    if der.is_empty() {
        return Err(CaError::Encode("DER encoding produced no bytes".to_string()));
    }

    let pem = pem::encode_string(Certificate::PEM_LABEL, LineEnding::LF, &der)
        .map_err(|e| CaError::Encode(format!("PEM encoding failed: {e}")))?;
    Ok(pem.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::builder::{build_certificate, ValidityWindow};
    use crate::cert::sign::sign_certificate;
    use crate::cert::{CertificateParser, SerialNumber};
    use crate::crypto::{init_crypto, CaPrivateKey, DigestAlgorithm};
    use crate::testdata;

    fn signed() -> Certificate {
        init_crypto();
        let key = CaPrivateKey::from_pem(testdata::CA_KEY, None).unwrap();
        let csr = CertificateParser::parse_request(testdata::LEAF_CSR).unwrap();
        let ca = CertificateParser::parse_ca_certificate(testdata::CA_CERT).unwrap();
        let window = ValidityWindow::starting_now(365).unwrap();
        let unsigned = build_certificate(&csr, &ca, &SerialNumber::from_u64(1), &window).unwrap();
        sign_certificate(unsigned, &key, DigestAlgorithm::Sha256).unwrap()
    }

    #[test]
    fn test_output_is_exact_pem() {
        let pem = encode_certificate(&signed()).unwrap();
        let text = String::from_utf8(pem.clone()).unwrap();

        assert!(text.starts_with("-----BEGIN CERTIFICATE-----\n"));
        assert!(text.ends_with("-----END CERTIFICATE-----\n"));
        assert_eq!(pem.last(), Some(&b'\n'));
        assert!(!pem.contains(&0));
        for line in text.lines() {
            assert!(line.len() <= 64, "{line}");
        }
    }

    #[test]
    fn test_output_parses_back() {
        let pem = encode_certificate(&signed()).unwrap();
        let summary = CertificateParser::parse_summary(&pem).unwrap();
        assert_eq!(summary.serial.as_hex(), "01");
        assert_eq!(summary.version, 3);
    }
}
