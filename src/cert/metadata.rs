use crate::cert::SerialNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Human-facing view of an issued (or any) certificate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateSummary {
    pub serial: SerialNumber,
    pub version: u32,
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub public_key_algorithm: String,
    pub signature_algorithm: String,
    pub extension_count: usize,
    pub is_ca: bool,
}

/// What a CSR asks for, as shown by `verify-csr`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSummary {
    pub subject: String,
    pub public_key_algorithm: String,
    pub signature_algorithm: String,
}

impl CertificateSummary {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.not_after
    }

    /// Key/value rows for table output
    pub fn rows(&self) -> Vec<(String, String)> {
        vec![
            ("Serial".to_string(), self.serial.as_colon_hex()),
            ("Version".to_string(), self.version.to_string()),
            ("Subject".to_string(), self.subject.clone()),
            ("Issuer".to_string(), self.issuer.clone()),
            (
                "Not Before".to_string(),
                self.not_before.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ),
            (
                "Not After".to_string(),
                self.not_after.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ),
            ("Public Key".to_string(), self.public_key_algorithm.clone()),
            ("Signature".to_string(), self.signature_algorithm.clone()),
            ("Extensions".to_string(), self.extension_count.to_string()),
            (
                "CA".to_string(),
                if self.is_ca { "yes" } else { "no" }.to_string(),
            ),
            (
                "Expired".to_string(),
                if self.is_expired() { "yes" } else { "no" }.to_string(),
            ),
        ]
    }
}

impl RequestSummary {
    pub fn rows(&self) -> Vec<(String, String)> {
        vec![
            ("Subject".to_string(), self.subject.clone()),
            ("Public Key".to_string(), self.public_key_algorithm.clone()),
            ("Signature".to_string(), self.signature_algorithm.clone()),
        ]
    }
}

impl fmt::Display for CertificateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Subject: {}, Serial: {}, Expires: {}",
            self.subject,
            self.serial,
            self.not_after.format("%Y-%m-%d %H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(not_after: DateTime<Utc>) -> CertificateSummary {
        CertificateSummary {
            serial: SerialNumber::from_bytes(&[0x0a, 0x0b]),
            version: 3,
            subject: "CN=leaf".to_string(),
            issuer: "CN=root".to_string(),
            not_before: not_after - chrono::Duration::days(365),
            not_after,
            public_key_algorithm: "rsaEncryption".to_string(),
            signature_algorithm: "sha256WithRSAEncryption".to_string(),
            extension_count: 0,
            is_ca: false,
        }
    }

    #[test]
    fn test_expiry_checks() {
        let live = summary(Utc::now() + chrono::Duration::days(10));
        assert!(!live.is_expired());

        let dead = summary(Utc::now() - chrono::Duration::days(1));
        assert!(dead.is_expired());
    }

    #[test]
    fn test_rows_use_colon_serial() {
        let rows = summary(Utc::now()).rows();
        assert_eq!(rows[0], ("Serial".to_string(), "0a:0b".to_string()));
    }

    #[test]
    fn test_json_serialization() {
        let json = serde_json::to_value(summary(Utc::now())).unwrap();
        assert_eq!(json["serial"], "0a:0b");
        assert_eq!(json["version"], 3);
    }
}
