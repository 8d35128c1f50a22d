use crate::cert::builder::{build_certificate, ValidityWindow};
use crate::cert::export::encode_certificate;
use crate::cert::metadata::{CertificateSummary, RequestSummary};
use crate::cert::serial::SerialNumberSource;
use crate::cert::sign::sign_certificate;
use crate::cert::validate::{verify_ca_key_pair, verify_request};
use crate::cert::{CertificateParser, SerialNumber};
use crate::crypto::{registry, CaPrivateKey, Passphrase};
use crate::utils::config::SignerConfig;
use crate::utils::errors::{CaError, ObjectKind, Result};

/// The three PEM inputs of one signing operation
#[derive(Debug, Clone, Copy)]
pub struct SigningRequest<'a> {
    pub private_key_pem: &'a [u8],
    pub ca_certificate_pem: &'a [u8],
    pub csr_pem: &'a [u8],
    pub passphrase: Option<&'a Passphrase>,
}

impl<'a> SigningRequest<'a> {
    pub fn new(private_key_pem: &'a [u8], ca_certificate_pem: &'a [u8], csr_pem: &'a [u8]) -> Self {
        Self {
            private_key_pem,
            ca_certificate_pem,
            csr_pem,
            passphrase: None,
        }
    }

    pub fn with_passphrase(mut self, passphrase: &'a Passphrase) -> Self {
        self.passphrase = Some(passphrase);
        self
    }

    fn check_inputs(&self) -> Result<()> {
        let inputs = [
            (ObjectKind::PrivateKey, self.private_key_pem),
            (ObjectKind::Certificate, self.ca_certificate_pem),
            (ObjectKind::CertificateRequest, self.csr_pem),
        ];
        for (kind, input) in inputs {
            if input.is_empty() {
                return Err(CaError::Input(format!("{kind} input is empty")));
            }
        }
        Ok(())
    }
}

/// A freshly issued certificate and what went into it
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pem: Vec<u8>,
    serial: SerialNumber,
    subject: String,
    issuer: String,
    validity: ValidityWindow,
}

impl IssuedCertificate {
    /// PEM text, exactly as long as the armor itself
    pub fn pem(&self) -> &[u8] {
        &self.pem
    }

    pub fn into_pem(self) -> Vec<u8> {
        self.pem
    }

    pub fn serial(&self) -> &SerialNumber {
        &self.serial
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn validity(&self) -> &ValidityWindow {
        &self.validity
    }
}

/// Runs the decode, validate, build, sign and encode pipeline.
///
/// Holds no state between calls apart from the serial source, so one
/// service can be shared across threads.
pub struct SigningService {
    config: SignerConfig,
    serials: Box<dyn SerialNumberSource>,
}

impl SigningService {
    pub fn new(config: SignerConfig) -> Result<Self> {
        config.validate()?;
        let serials = config.serial.to_source();
        Ok(Self { config, serials })
    }

    /// Replace the configured serial policy
    pub fn with_serial_source(mut self, serials: Box<dyn SerialNumberSource>) -> Self {
        self.serials = serials;
        self
    }

    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    pub fn sign_request(&self, request: SigningRequest<'_>) -> Result<IssuedCertificate> {
        self.issue(request)
            .inspect_err(|e| tracing::warn!("Certificate issuance failed: {e}"))
    }

    fn issue(&self, request: SigningRequest<'_>) -> Result<IssuedCertificate> {
        request.check_inputs()?;
        let algorithm = registry()?.signature_algorithm(self.config.digest)?;

        tracing::debug!("Decoding CA private key");
        let key = CaPrivateKey::from_pem(request.private_key_pem, request.passphrase)?;

        tracing::debug!("Decoding CA certificate");
        let ca = CertificateParser::parse_ca_certificate(request.ca_certificate_pem)?;
        if !ca.is_ca() {
            tracing::warn!("Issuer certificate {} is not marked as a CA", ca.subject());
        }
        if ca.is_expired() {
            tracing::warn!("Issuer certificate {} has expired", ca.subject());
        }
        if self.config.verify_ca_key_pair {
            verify_ca_key_pair(&key, &ca)?;
        }

        tracing::debug!("Decoding certificate request");
        let csr = CertificateParser::parse_request(request.csr_pem)?;
        verify_request(&csr)?;

        let serial = self.serials.next_serial()?;
        tracing::debug!(
            "Using {} serial number {}",
            self.serials.describe(),
            serial.as_colon_hex()
        );

        let window = ValidityWindow::starting_now(self.config.validity_days)?;
        let unsigned = build_certificate(&csr, &ca, &serial, &window)?;
        let certificate = sign_certificate(unsigned, &key, self.config.digest)?;
        let pem = encode_certificate(&certificate)?;

        tracing::info!(
            "Issued certificate {} for {} ({}, valid until {})",
            serial.as_colon_hex(),
            csr.subject(),
            algorithm.name(),
            window.not_after().format("%Y-%m-%d %H:%M:%S UTC")
        );

        Ok(IssuedCertificate {
            pem,
            serial,
            subject: csr.subject().to_string(),
            issuer: ca.subject().to_string(),
            validity: window,
        })
    }

    /// Decode a CSR and check its self-signature without issuing anything
    pub fn verify_request(&self, csr_pem: &[u8]) -> Result<RequestSummary> {
        if csr_pem.is_empty() {
            return Err(CaError::Input(format!(
                "{} input is empty",
                ObjectKind::CertificateRequest
            )));
        }
        let csr = CertificateParser::parse_request(csr_pem)?;
        verify_request(&csr)?;
        Ok(csr.summary())
    }
}

impl Default for SigningService {
    fn default() -> Self {
        let config = SignerConfig::default();
        let serials = config.serial.to_source();
        Self { config, serials }
    }
}

/// Sign `csr_pem` with the CA key and certificate using default settings.
///
/// Returns the PEM-encoded certificate. [`crate::init_crypto`] must have
/// been called first.
pub fn sign_certificate_request(
    private_key_pem: &[u8],
    ca_certificate_pem: &[u8],
    csr_pem: &[u8],
) -> Result<Vec<u8>> {
    SigningService::default()
        .sign_request(SigningRequest::new(
            private_key_pem,
            ca_certificate_pem,
            csr_pem,
        ))
        .map(IssuedCertificate::into_pem)
}

/// Summarize a PEM certificate, typically one this crate issued
pub fn inspect_certificate(pem: &[u8]) -> Result<CertificateSummary> {
    if pem.is_empty() {
        return Err(CaError::Input(format!(
            "{} input is empty",
            ObjectKind::Certificate
        )));
    }
    CertificateParser::parse_summary(pem)
}
