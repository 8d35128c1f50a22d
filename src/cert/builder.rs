use crate::cert::parser::{CaCertificate, CertificateRequest};
use crate::cert::SerialNumber;
use crate::utils::errors::{CaError, CertificateField, Result};
use chrono::{DateTime, Datelike, Duration, Utc};
use der::asn1::{GeneralizedTime, UtcTime};
use der::{Decode, Encode};
use x509_cert::certificate::{TbsCertificate, Version};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber as DerSerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::{Time, Validity};

/// Default lifetime of an issued certificate
pub const DEFAULT_VALIDITY_DAYS: u32 = 365;

/// First year that must be encoded as GeneralizedTime (RFC 5280 4.1.2.5)
const GENERALIZED_TIME_FROM_YEAR: i32 = 2050;

/// notBefore/notAfter pair, whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl ValidityWindow {
    pub fn starting_now(days: u32) -> Result<Self> {
        Self::starting_at(Utc::now(), days)
    }

    pub fn starting_at(start: DateTime<Utc>, days: u32) -> Result<Self> {
        if days == 0 {
            return Err(CaError::build(
                CertificateField::Validity,
                "validity period must be at least one day",
            ));
        }

        let not_before = DateTime::from_timestamp(start.timestamp(), 0).ok_or_else(|| {
            CaError::build(CertificateField::Validity, "start time out of range")
        })?;
        let not_after = not_before
            .checked_add_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| CaError::build(CertificateField::Validity, "end time out of range"))?;

        Ok(Self {
            not_before,
            not_after,
        })
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    fn to_x509(self) -> Result<Validity> {
        Ok(Validity {
            not_before: x509_time(self.not_before)?,
            not_after: x509_time(self.not_after)?,
        })
    }
}

fn x509_time(time: DateTime<Utc>) -> Result<Time> {
    let seconds = u64::try_from(time.timestamp()).map_err(|_| {
        CaError::build(CertificateField::Validity, "time before the Unix epoch")
    })?;
    let since_epoch = std::time::Duration::from_secs(seconds);

    let encoded = if time.year() < GENERALIZED_TIME_FROM_YEAR {
        UtcTime::from_unix_duration(since_epoch).map(Time::UtcTime)
    } else {
        GeneralizedTime::from_unix_duration(since_epoch).map(Time::GeneralTime)
    };
    encoded.map_err(|e| CaError::build(CertificateField::Validity, e.to_string()))
}

/// Certificate contents before the CA signature is applied
#[derive(Debug, Clone)]
pub struct UnsignedCertificate {
    version: Version,
    serial_number: DerSerialNumber,
    serial: SerialNumber,
    issuer: Name,
    subject: Name,
    validity: Validity,
    public_key: SubjectPublicKeyInfoOwned,
}

impl UnsignedCertificate {
    pub fn serial(&self) -> &SerialNumber {
        &self.serial
    }

    pub fn subject(&self) -> &Name {
        &self.subject
    }

    pub fn issuer(&self) -> &Name {
        &self.issuer
    }

    /// Attach the signature algorithm, yielding the TBSCertificate to sign
    pub(crate) fn into_tbs(self, signature: AlgorithmIdentifierOwned) -> TbsCertificate {
        TbsCertificate {
            version: self.version,
            serial_number: self.serial_number,
            signature,
            issuer: self.issuer,
            validity: self.validity,
            subject: self.subject,
            subject_public_key_info: self.public_key,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: None,
        }
    }
}

/// Field-by-field certificate assembly. Every setter can fail and names
/// the field it was setting.
#[derive(Debug, Default)]
pub struct CertificateBuilder {
    version: Option<Version>,
    serial: Option<(SerialNumber, DerSerialNumber)>,
    issuer: Option<Name>,
    subject: Option<Name>,
    validity: Option<Validity>,
    public_key: Option<SubjectPublicKeyInfoOwned>,
}

impl CertificateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the version from its encoded (zero-indexed) value; 2 means v3
    pub fn version(mut self, encoded: u8) -> Result<Self> {
        let version = match encoded {
            0 => Version::V1,
            1 => Version::V2,
            2 => Version::V3,
            other => {
                return Err(CaError::build(
                    CertificateField::Version,
                    format!("unsupported version value {other}"),
                ))
            }
        };
        self.version = Some(version);
        Ok(self)
    }

    pub fn serial_number(mut self, serial: &SerialNumber) -> Result<Self> {
        let bytes = serial
            .to_bytes()
            .map_err(|e| CaError::build(CertificateField::SerialNumber, e.to_string()))?;
        let encoded = DerSerialNumber::new(&bytes)
            .map_err(|e| CaError::build(CertificateField::SerialNumber, e.to_string()))?;
        self.serial = Some((serial.clone(), encoded));
        Ok(self)
    }

    /// Set the subject from the DER bytes of a Name
    pub fn subject(mut self, name_der: &[u8]) -> Result<Self> {
        self.subject = Some(decode_exact::<Name>(name_der, CertificateField::Subject)?);
        Ok(self)
    }

    /// Set the issuer from the DER bytes of a Name
    pub fn issuer(mut self, name_der: &[u8]) -> Result<Self> {
        self.issuer = Some(decode_exact::<Name>(name_der, CertificateField::Issuer)?);
        Ok(self)
    }

    /// Set the public key from DER SubjectPublicKeyInfo
    pub fn public_key(mut self, spki_der: &[u8]) -> Result<Self> {
        self.public_key = Some(decode_exact::<SubjectPublicKeyInfoOwned>(
            spki_der,
            CertificateField::PublicKey,
        )?);
        Ok(self)
    }

    pub fn validity(mut self, window: &ValidityWindow) -> Result<Self> {
        self.validity = Some(window.to_x509()?);
        Ok(self)
    }

    pub fn build(self) -> Result<UnsignedCertificate> {
        let version = self.version.ok_or_else(|| unset(CertificateField::Version))?;
        let (serial, serial_number) =
            self.serial.ok_or_else(|| unset(CertificateField::SerialNumber))?;
        let issuer = self.issuer.ok_or_else(|| unset(CertificateField::Issuer))?;
        let subject = self.subject.ok_or_else(|| unset(CertificateField::Subject))?;
        let validity = self.validity.ok_or_else(|| unset(CertificateField::Validity))?;
        let public_key = self
            .public_key
            .ok_or_else(|| unset(CertificateField::PublicKey))?;

        Ok(UnsignedCertificate {
            version,
            serial_number,
            serial,
            issuer,
            subject,
            validity,
            public_key,
        })
    }
}

/// Assemble a v3 certificate for `csr`, issued by `ca`
pub fn build_certificate(
    csr: &CertificateRequest,
    ca: &CaCertificate,
    serial: &SerialNumber,
    window: &ValidityWindow,
) -> Result<UnsignedCertificate> {
    CertificateBuilder::new()
        .version(2)?
        .public_key(csr.public_key_info_der())?
        .serial_number(serial)?
        .subject(csr.subject_der())?
        .issuer(ca.subject_der())?
        .validity(window)?
        .build()
}

/// Decode DER and insist that re-encoding reproduces the input byte for byte
fn decode_exact<T>(der: &[u8], field: CertificateField) -> Result<T>
where
    T: for<'a> Decode<'a> + Encode,
{
    let value = T::from_der(der).map_err(|e| CaError::build(field, e.to_string()))?;
    let reencoded = value
        .to_der()
        .map_err(|e| CaError::build(field, e.to_string()))?;
    if reencoded != der {
        return Err(CaError::build(
            field,
            "encoding is not canonical DER and cannot be copied verbatim",
        ));
    }
    Ok(value)
}

fn unset(field: CertificateField) -> CaError {
    CaError::build(field, "field was never set")
}
