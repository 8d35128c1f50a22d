use crate::utils::errors::{CaError, CertificateField, Result as CaResult};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// RFC 5280 caps serial numbers at 20 octets
pub const MAX_SERIAL_OCTETS: usize = 20;

/// Octets drawn for a random serial
const RANDOM_SERIAL_OCTETS: usize = 16;

/// Certificate serial number as a minimal big-endian magnitude
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SerialNumber {
    octets: Vec<u8>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SerialNumberParseError {
    #[error("Invalid hex character: {0}")]
    InvalidHexCharacter(char),

    #[error("Empty string provided")]
    EmptyString,

    #[error("Invalid length: expected even number of hex characters")]
    InvalidLength,

    #[error("Serial number longer than {MAX_SERIAL_OCTETS} octets")]
    TooLong,
}

pub type Result<T> = std::result::Result<T, SerialNumberParseError>;

impl SerialNumber {
    /// Build from big-endian magnitude bytes, dropping redundant leading zeros
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let octets = match bytes.iter().position(|&b| b != 0) {
            Some(index) => bytes[index..].to_vec(),
            None => vec![0],
        };
        Self { octets }
    }

    pub fn from_u64(value: u64) -> Self {
        Self::from_bytes(&value.to_be_bytes())
    }

    /// The all-zero serial
    pub fn zero() -> Self {
        Self::from_bytes(&[])
    }

    /// Parse hex, with or without colons between octets
    pub fn parse(identifier: &str) -> Result<Self> {
        let cleaned: String = identifier.chars().filter(|&ch| ch != ':').collect();
        if cleaned.is_empty() {
            return Err(SerialNumberParseError::EmptyString);
        }
        if let Some(bad) = cleaned.chars().find(|ch| !ch.is_ascii_hexdigit()) {
            return Err(SerialNumberParseError::InvalidHexCharacter(bad));
        }
        if cleaned.len() % 2 != 0 {
            return Err(SerialNumberParseError::InvalidLength);
        }

        let bytes = hex::decode(&cleaned).map_err(|_| SerialNumberParseError::InvalidLength)?;
        let serial = Self::from_bytes(&bytes);
        if serial.octets.len() > MAX_SERIAL_OCTETS {
            return Err(SerialNumberParseError::TooLong);
        }
        Ok(serial)
    }

    /// Magnitude bytes for DER encoding
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.octets.len() > MAX_SERIAL_OCTETS {
            return Err(SerialNumberParseError::TooLong);
        }
        Ok(self.octets.clone())
    }

    pub fn is_zero(&self) -> bool {
        self.octets.iter().all(|&b| b == 0)
    }

    /// Lowercase hex, no separators
    pub fn as_hex(&self) -> String {
        hex::encode(&self.octets)
    }

    /// Lowercase hex with a colon between octets, as OpenSSL prints it
    pub fn as_colon_hex(&self) -> String {
        self.octets
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_hex())
    }
}

impl FromStr for SerialNumber {
    type Err = SerialNumberParseError;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for SerialNumber {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.as_colon_hex())
    }
}

impl<'de> Deserialize<'de> for SerialNumber {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Assigns serial numbers to newly issued certificates
pub trait SerialNumberSource: Send + Sync {
    fn next_serial(&self) -> CaResult<SerialNumber>;

    /// Short policy name for logs
    fn describe(&self) -> &'static str;
}

/// Caller-supplied serial, reused for every certificate
#[derive(Debug, Clone)]
pub struct FixedSerial {
    serial: SerialNumber,
}

impl FixedSerial {
    pub fn new(serial: SerialNumber) -> Self {
        Self { serial }
    }

    /// Serial zero for every certificate. Breaks per-issuer uniqueness.
    pub fn zero() -> Self {
        Self::new(SerialNumber::zero())
    }
}

impl SerialNumberSource for FixedSerial {
    fn next_serial(&self) -> CaResult<SerialNumber> {
        Ok(self.serial.clone())
    }

    fn describe(&self) -> &'static str {
        "fixed"
    }
}

/// Monotonic in-process counter
#[derive(Debug)]
pub struct CounterSerial {
    next: AtomicU64,
}

impl CounterSerial {
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl SerialNumberSource for CounterSerial {
    fn next_serial(&self) -> CaResult<SerialNumber> {
        let value = self
            .next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_add(1))
            .map_err(|_| {
                CaError::build(CertificateField::SerialNumber, "serial counter exhausted")
            })?;
        Ok(SerialNumber::from_u64(value))
    }

    fn describe(&self) -> &'static str {
        "counter"
    }
}

/// Unpredictable positive 128-bit serials
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSerial;

impl SerialNumberSource for RandomSerial {
    fn next_serial(&self) -> CaResult<SerialNumber> {
        let mut bytes = [0u8; RANDOM_SERIAL_OCTETS];
        rand::rng().fill_bytes(&mut bytes);
        // Positive, and no leading zero octet so the DER form keeps all 16 octets
        bytes[0] = (bytes[0] & 0x7f) | 0x40;
        Ok(SerialNumber::from_bytes(&bytes))
    }

    fn describe(&self) -> &'static str {
        "random"
    }
}
