pub mod builder;
pub mod export;
pub mod metadata;
pub mod parser;
pub mod serial;
pub mod service;
pub mod sign;
pub mod validate;

pub use builder::{CertificateBuilder, UnsignedCertificate, ValidityWindow, DEFAULT_VALIDITY_DAYS};
pub use export::encode_certificate;
pub use metadata::{CertificateSummary, RequestSummary};
pub use parser::{CaCertificate, CertificateParser, CertificateRequest};
pub use serial::{
    CounterSerial, FixedSerial, RandomSerial, SerialNumber, SerialNumberParseError,
    SerialNumberSource,
};
pub use service::{
    inspect_certificate, sign_certificate_request, IssuedCertificate, SigningRequest,
    SigningService,
};
pub use sign::sign_certificate;
