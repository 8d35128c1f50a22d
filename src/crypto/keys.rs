use crate::utils::errors::{CaError, ObjectKind, Result};
use crate::utils::pem;
use der::Decode;
use pkcs8::DecodePrivateKey;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use x509_cert::spki::SubjectPublicKeyInfoRef;
use zeroize::Zeroizing;

const PKCS1_LABEL: &str = "RSA PRIVATE KEY";
const PKCS8_LABEL: &str = "PRIVATE KEY";
const ENCRYPTED_PKCS8_LABEL: &str = "ENCRYPTED PRIVATE KEY";

const KEY_LABELS: &[&str] = &[PKCS1_LABEL, PKCS8_LABEL, ENCRYPTED_PKCS8_LABEL];

/// Credential used to decrypt an encrypted CA key. Wiped on drop.
#[derive(Clone)]
pub struct Passphrase(Zeroizing<Vec<u8>>);

impl Passphrase {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Passphrase {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<String> for Passphrase {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(***)")
    }
}

/// The CA's RSA signing key, scoped to a single signing call
pub struct CaPrivateKey {
    key: RsaPrivateKey,
}

impl CaPrivateKey {
    /// Decode a PKCS#1, PKCS#8 or encrypted PKCS#8 RSA key from PEM
    pub fn from_pem(input: &[u8], passphrase: Option<&Passphrase>) -> Result<Self> {
        let (label, text) = pem::key_document(input, KEY_LABELS)?;

        let key = match label {
            PKCS1_LABEL => {
                ignore_passphrase(passphrase);
                RsaPrivateKey::from_pkcs1_pem(text)
                    .map_err(|e| key_error(format!("not a valid RSA PKCS#1 key: {e}")))?
            }
            PKCS8_LABEL => {
                ignore_passphrase(passphrase);
                RsaPrivateKey::from_pkcs8_pem(text)
                    .map_err(|e| key_error(format!("not a valid RSA PKCS#8 key: {e}")))?
            }
            _ => {
                let passphrase = passphrase
                    .ok_or_else(|| key_error("key is encrypted but no passphrase was given"))?;
                RsaPrivateKey::from_pkcs8_encrypted_pem(text, passphrase.as_bytes())
                    .map_err(|_| key_error("unable to decrypt key (wrong passphrase?)"))?
            }
        };

        key.validate()
            .map_err(|e| key_error(format!("RSA key failed consistency check: {e}")))?;

        tracing::debug!("Loaded {}-bit RSA CA key ({label})", key.size() * 8);
        Ok(Self { key })
    }

    /// Check the key against the SubjectPublicKeyInfo of a certificate.
    ///
    /// Only the modulus and exponent are compared, so an RSASSA-PSS labelled
    /// key matches its rsaEncryption twin.
    pub fn matches_public_key(&self, public_key_info_der: &[u8]) -> Result<bool> {
        let spki = SubjectPublicKeyInfoRef::from_der(public_key_info_der).map_err(|e| {
            CaError::parse(
                ObjectKind::Certificate,
                format!("malformed SubjectPublicKeyInfo: {e}"),
            )
        })?;

        let Some(bits) = spki.subject_public_key.as_bytes() else {
            return Ok(false);
        };
        match RsaPublicKey::from_pkcs1_der(bits) {
            Ok(public) => Ok(public.n() == self.key.n() && public.e() == self.key.e()),
            Err(_) => Ok(false),
        }
    }

    pub fn bits(&self) -> usize {
        self.key.size() * 8
    }

    pub(crate) fn rsa(&self) -> &RsaPrivateKey {
        &self.key
    }
}

impl fmt::Debug for CaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CaPrivateKey({} bits)", self.bits())
    }
}

fn ignore_passphrase(passphrase: Option<&Passphrase>) {
    if passphrase.is_some() {
        tracing::debug!("Ignoring passphrase for unencrypted private key");
    }
}

fn key_error(reason: impl Into<String>) -> CaError {
    CaError::parse(ObjectKind::PrivateKey, reason)
}
