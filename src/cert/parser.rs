use crate::cert::metadata::{CertificateSummary, RequestSummary};
use crate::cert::SerialNumber;
use crate::utils::errors::{CaError, ObjectKind, Result};
use crate::utils::pem;
use chrono::{DateTime, Utc};
use x509_parser::der_parser::oid;
use x509_parser::objects::{oid2sn, oid_registry};
use x509_parser::prelude::*;

const BASIC_CONSTRAINTS_OID: oid::Oid = oid!(2.5.29 .19);

const CERTIFICATE_LABELS: &[&str] = &["CERTIFICATE"];
const REQUEST_LABELS: &[&str] = &["CERTIFICATE REQUEST", "NEW CERTIFICATE REQUEST"];

/// The issuing CA's certificate, parsed read-only
#[derive(Debug)]
pub struct CaCertificate {
    subject_der: Vec<u8>,
    subject: String,
    public_key_info_der: Vec<u8>,
    is_ca: bool,
    not_after: DateTime<Utc>,
}

impl CaCertificate {
    /// DER encoding of the subject name, copied verbatim into issued certificates
    pub fn subject_der(&self) -> &[u8] {
        &self.subject_der
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn public_key_info_der(&self) -> &[u8] {
        &self.public_key_info_der
    }

    /// Whether basicConstraints marks this certificate as a CA
    pub fn is_ca(&self) -> bool {
        self.is_ca
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.not_after
    }
}

/// A parsed certificate signing request
#[derive(Debug)]
pub struct CertificateRequest {
    der: Vec<u8>,
    subject_der: Vec<u8>,
    subject: String,
    public_key_info_der: Vec<u8>,
    public_key_algorithm: String,
    signature_algorithm: String,
}

impl CertificateRequest {
    /// DER encoding of the requested subject name
    pub fn subject_der(&self) -> &[u8] {
        &self.subject_der
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// DER SubjectPublicKeyInfo embedded in the request
    pub fn public_key_info_der(&self) -> &[u8] {
        &self.public_key_info_der
    }

    pub fn summary(&self) -> RequestSummary {
        RequestSummary {
            subject: self.subject.clone(),
            public_key_algorithm: self.public_key_algorithm.clone(),
            signature_algorithm: self.signature_algorithm.clone(),
        }
    }

    /// Re-parse the stored DER for signature checks
    pub(crate) fn parsed(&self) -> Result<X509CertificationRequest<'_>> {
        let (_, csr) = X509CertificationRequest::from_der(&self.der).map_err(|e| {
            CaError::parse(ObjectKind::CertificateRequest, format!("DER parsing error: {e}"))
        })?;
        Ok(csr)
    }
}

pub struct CertificateParser;

impl CertificateParser {
    /// Parse the PEM-encoded CA certificate
    pub fn parse_ca_certificate(input: &[u8]) -> Result<CaCertificate> {
        let block = pem::decode_block(input, ObjectKind::Certificate, CERTIFICATE_LABELS)?;
        let (_, cert) = X509Certificate::from_der(block.contents()).map_err(|e| {
            CaError::parse(ObjectKind::Certificate, format!("DER parsing error: {e}"))
        })?;

        let not_after = utc_time(&cert.validity().not_after, ObjectKind::Certificate)?;

        Ok(CaCertificate {
            subject_der: cert.subject().as_raw().to_vec(),
            subject: cert.subject().to_string(),
            public_key_info_der: cert.public_key().raw.to_vec(),
            is_ca: Self::is_ca(&cert),
            not_after,
        })
    }

    /// Parse the PEM-encoded certificate signing request
    pub fn parse_request(input: &[u8]) -> Result<CertificateRequest> {
        let block = pem::decode_block(input, ObjectKind::CertificateRequest, REQUEST_LABELS)?;
        let der = block.contents().to_vec();

        let (_, csr) = X509CertificationRequest::from_der(&der).map_err(|e| {
            CaError::parse(ObjectKind::CertificateRequest, format!("DER parsing error: {e}"))
        })?;
        let info = &csr.certification_request_info;

        let subject_der = info.subject.as_raw().to_vec();
        let subject = info.subject.to_string();
        let public_key_info_der = info.subject_pki.raw.to_vec();
        let public_key_algorithm = algorithm_name(&info.subject_pki.algorithm.algorithm);
        let signature_algorithm = algorithm_name(&csr.signature_algorithm.algorithm);

        Ok(CertificateRequest {
            der,
            subject_der,
            subject,
            public_key_info_der,
            public_key_algorithm,
            signature_algorithm,
        })
    }

    /// Parse an issued certificate back into a summary
    pub fn parse_summary(input: &[u8]) -> Result<CertificateSummary> {
        let block = pem::decode_block(input, ObjectKind::Certificate, CERTIFICATE_LABELS)?;
        let (_, cert) = X509Certificate::from_der(block.contents()).map_err(|e| {
            CaError::parse(ObjectKind::Certificate, format!("DER parsing error: {e}"))
        })?;

        Self::extract_summary(&cert)
    }

    fn extract_summary(cert: &X509Certificate) -> Result<CertificateSummary> {
        // DER sign padding is dropped
        let serial = SerialNumber::from_bytes(cert.raw_serial());

        let not_before = utc_time(&cert.validity().not_before, ObjectKind::Certificate)?;
        let not_after = utc_time(&cert.validity().not_after, ObjectKind::Certificate)?;

        Ok(CertificateSummary {
            serial,
            version: cert.version().0 + 1,
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            not_before,
            not_after,
            public_key_algorithm: algorithm_name(&cert.public_key().algorithm.algorithm),
            signature_algorithm: algorithm_name(&cert.signature_algorithm.algorithm),
            extension_count: cert.extensions().len(),
            is_ca: Self::is_ca(cert),
        })
    }

    fn is_ca(cert: &X509Certificate) -> bool {
        let mut is_ca = false;
        for ext in cert.extensions() {
            if ext.oid == BASIC_CONSTRAINTS_OID {
                if let Ok((_rem, bc)) = BasicConstraints::from_der(ext.value) {
                    is_ca = bc.ca;
                }
                break;
            }
        }
        is_ca
    }
}

fn utc_time(time: &ASN1Time, kind: ObjectKind) -> Result<DateTime<Utc>> {
    utc_from_timestamp(time.timestamp(), kind)
}

fn utc_from_timestamp(timestamp: i64, kind: ObjectKind) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp, 0).ok_or_else(|| {
        CaError::parse(kind, format!("validity time {timestamp} is out of range"))
    })
}

/// Short name for an algorithm OID, falling back to dotted form
fn algorithm_name(oid: &oid::Oid) -> String {
    oid2sn(oid, oid_registry())
        .map(str::to_string)
        .unwrap_or_else(|_| oid.to_id_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata;
    use crate::utils::errors::ErrorKind;

    #[test]
    fn test_parse_ca_certificate() {
        let ca = CertificateParser::parse_ca_certificate(testdata::CA_CERT).unwrap();
        assert!(ca.subject().contains("CN=Example Root CA"));
        assert!(ca.is_ca());
        assert!(!ca.is_expired());
        assert!(!ca.subject_der().is_empty());
    }

    #[test]
    fn test_parse_request() {
        let csr = CertificateParser::parse_request(testdata::LEAF_CSR).unwrap();
        assert!(csr.subject().contains("CN=service.example.internal"));
        assert!(csr.subject().contains("OU=Operations"));

        let summary = csr.summary();
        assert_eq!(summary.public_key_algorithm, "rsaEncryption");
        assert_eq!(summary.signature_algorithm, "sha256WithRSAEncryption");
    }

    #[test]
    fn test_parse_ec_request() {
        let csr = CertificateParser::parse_request(testdata::EC_CSR).unwrap();
        assert!(csr.subject().contains("CN=ec.example.internal"));
        assert_ne!(csr.summary().public_key_algorithm, "rsaEncryption");
    }

    #[test]
    fn test_request_is_not_a_certificate() {
        let err = CertificateParser::parse_ca_certificate(testdata::LEAF_CSR).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = CertificateParser::parse_request(testdata::CA_CERT).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_corrupt_der_is_parse_error() {
        let pem = der::pem::encode_string(
            "CERTIFICATE REQUEST",
            der::pem::LineEnding::LF,
            b"\x30\x03\x02\x01",
        )
        .unwrap();
        let err = CertificateParser::parse_request(pem.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_out_of_range_validity_is_parse_error() {
        let err = utc_from_timestamp(i64::MAX, ObjectKind::Certificate).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("out of range"));

        let time = utc_from_timestamp(0, ObjectKind::Certificate).unwrap();
        assert_eq!(time.timestamp(), 0);
    }

    #[test]
    fn test_summary_of_ca_certificate() {
        let summary = CertificateParser::parse_summary(testdata::CA_CERT).unwrap();
        assert_eq!(summary.version, 3);
        assert_eq!(summary.subject, summary.issuer);
        assert!(summary.is_ca);
    }
}
