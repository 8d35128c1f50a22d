use crate::utils::errors::{CaError, ObjectKind, Result};
use x509_parser::pem::Pem;

/// One decoded PEM block of public material (certificate or CSR)
#[derive(Debug)]
pub struct PemBlock {
    label: String,
    contents: Vec<u8>,
}

impl PemBlock {
    /// Get the label from the BEGIN line (e.g. "CERTIFICATE")
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Get the decoded DER bytes
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }
}

/// Decode the first PEM block in `input` whose label is one of `labels`.
///
/// Text before a block (e.g. `openssl x509 -text` dumps) and blocks with
/// other labels are skipped.
pub fn decode_block(input: &[u8], kind: ObjectKind, labels: &[&str]) -> Result<PemBlock> {
    ensure_not_empty(input, kind)?;

    let mut seen_labels = Vec::new();
    for pem in Pem::iter_from_buffer(input) {
        let pem = pem.map_err(|e| CaError::parse(kind, format!("invalid PEM: {e}")))?;
        if !labels.contains(&pem.label.as_str()) {
            seen_labels.push(pem.label);
            continue;
        }
        if pem.contents.is_empty() {
            return Err(CaError::parse(kind, "PEM block has no content"));
        }
        return Ok(PemBlock {
            label: pem.label,
            contents: pem.contents,
        });
    }

    Err(label_error(kind, labels, &seen_labels))
}

/// Check the label of the PEM document holding a private key and return
/// the input as text.
///
/// The key must be the only block in the input. Legacy OpenSSL header
/// encryption (`Proc-Type: 4,ENCRYPTED`) is reported with a conversion hint.
pub fn key_document<'a>(input: &'a [u8], labels: &[&str]) -> Result<(&'a str, &'a str)> {
    let kind = ObjectKind::PrivateKey;
    ensure_not_empty(input, kind)?;

    let text =
        std::str::from_utf8(input).map_err(|_| CaError::parse(kind, "input is not PEM text"))?;
    if is_legacy_encrypted(text) {
        return Err(CaError::parse(
            kind,
            "legacy OpenSSL-encrypted PEM is not supported; convert it with \
             `openssl pkcs8 -topk8 -v2 aes-256-cbc`",
        ));
    }

    let label = der::pem::decode_label(input)
        .map_err(|e| CaError::parse(kind, format!("invalid PEM: {e}")))?;
    if !labels.contains(&label) {
        return Err(label_error(kind, labels, &[label.to_string()]));
    }
    Ok((label, text))
}

fn is_legacy_encrypted(text: &str) -> bool {
    text.lines()
        .filter_map(|line| line.trim().strip_prefix("Proc-Type:"))
        .any(|value| value.contains("ENCRYPTED"))
}

fn ensure_not_empty(input: &[u8], kind: ObjectKind) -> Result<()> {
    if input.is_empty() {
        return Err(CaError::Input(format!(
            "{kind} length should be greater than zero"
        )));
    }
    Ok(())
}

fn label_error(kind: ObjectKind, labels: &[&str], seen: &[String]) -> CaError {
    if seen.is_empty() {
        CaError::parse(kind, "no PEM block found")
    } else {
        CaError::parse(
            kind,
            format!("expected {}, found {}", labels.join(" or "), seen.join(", ")),
        )
    }
}
