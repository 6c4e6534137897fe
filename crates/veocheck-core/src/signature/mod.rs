//! Signature files (`VEOContentSignature*.xml`, `VEOHistorySignature*.xml`).
//!
//! Each signature file signs one companion file (the manifest or the
//! history) and carries the certificate chain of the signer, end-entity
//! first and self-signed root last. Parsing records structural problems;
//! [`Signature::verify`] then checks the signature bytes and the chain.

pub mod algorithm;
pub mod verify;

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub use algorithm::SignatureAlgorithm;
pub use algorithm::VerifyFailure;

use crate::IssueId;
use crate::Ledger;
use crate::Validated;
use crate::datetime::is_vers_date;
use crate::manifest::VERS_VERSION;
use crate::xml::Document;
use crate::xml::Schema;

const WRONG_ROOT: IssueId = IssueId::new("Signature", "parse", 1);
const UNEXPECTED_VERSION: IssueId = IssueId::new("Signature", "parse", 2);
const UNKNOWN_ALGORITHM: IssueId = IssueId::new("Signature", "parse", 3);
const BAD_TIMESTAMP: IssueId = IssueId::new("Signature", "parse", 4);
const MISSING_SIGNER: IssueId = IssueId::new("Signature", "parse", 5);
const BAD_SIGNATURE_ENCODING: IssueId = IssueId::new("Signature", "parse", 6);
const BAD_CERTIFICATE_ENCODING: IssueId = IssueId::new("Signature", "parse", 7);

/// Which companion file a signature signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedFile {
    /// `VEOContent.xml`
    Content,
    /// `VEOHistory.xml`
    History,
}

impl SignedFile {
    /// Classifies a top-level file name, e.g. `VEOContentSignature1.xml`.
    #[must_use]
    pub fn classify(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(".xml")?;
        let (kind, number) = if let Some(n) = stem.strip_prefix("VEOContentSignature") {
            (Self::Content, n)
        } else if let Some(n) = stem.strip_prefix("VEOHistorySignature") {
            (Self::History, n)
        } else {
            return None;
        };
        (!number.is_empty() && number.bytes().all(|b| b.is_ascii_digit())).then_some(kind)
    }

    /// Name of the companion file.
    #[must_use]
    pub const fn companion(self) -> &'static str {
        match self {
            Self::Content => "VEOContent.xml",
            Self::History => "VEOHistory.xml",
        }
    }
}

/// A parsed signature file.
#[derive(Debug)]
pub struct Signature {
    /// Declared `Version`.
    pub version: Option<String>,
    /// Declared algorithm identifier, as written.
    pub algorithm_id: Option<String>,
    /// Resolved algorithm, if on the allow-list.
    pub algorithm: Option<SignatureAlgorithm>,
    /// Declared `SignatureDateTime`.
    pub timestamp: Option<String>,
    /// Declared `Signer`.
    pub signer: Option<String>,
    /// Decoded signature bytes.
    pub signature: Option<Vec<u8>>,
    /// Decoded DER certificates; end-entity first. An entry that is not
    /// valid base64 keeps its position as `None`.
    pub certificates: Vec<Option<Vec<u8>>>,
    document: Ledger,
    ledger: Ledger,
}

impl Signature {
    fn empty(location: &str) -> Self {
        Self {
            version: None,
            algorithm_id: None,
            algorithm: None,
            timestamp: None,
            signer: None,
            signature: None,
            certificates: Vec::new(),
            document: Ledger::new(location),
            ledger: Ledger::new(location),
        }
    }

    /// Parses the signature file at `path`; `location` names it in issues.
    #[must_use]
    pub fn parse(path: &Path, location: &str, schema: &Schema) -> Self {
        let mut doc = Document::new(location);
        let parsed = doc.parse(path, schema);
        Self::from_document(doc, parsed, location)
    }

    /// Parses signature text already in memory.
    #[must_use]
    pub fn parse_str(text: &str, location: &str, schema: &Schema) -> Self {
        let mut doc = Document::new(location);
        let parsed = doc.parse_str(text, schema);
        Self::from_document(doc, parsed, location)
    }

    fn from_document(mut doc: Document, parsed: bool, location: &str) -> Self {
        let mut signature = Self::empty(location);
        if parsed {
            signature.read(&mut doc);
            signature.check_fields();
        }
        signature.document = doc.into_ledger();
        signature
    }

    fn read(&mut self, doc: &mut Document) {
        if !doc.tag_name_is("VEOSignatureBlock") {
            self.ledger
                .error(WRONG_ROOT, "root element is not vers:VEOSignatureBlock");
            return;
        }
        let mut encoded_signature = None;
        let mut encoded_certificates = Vec::new();

        while doc.advance() {
            let Some(element) = doc.current_element() else {
                break;
            };
            let text = element.text.clone();
            match element.name.as_str() {
                "Version" => self.version = text,
                "SignatureDateTime" => self.timestamp = text,
                "Signer" => self.signer = text,
                "AlgorithmIdentifier" => self.algorithm_id = text,
                "Signature" => encoded_signature = text,
                "Certificate" => encoded_certificates.push(text.unwrap_or_default()),
                _ => {}
            }
        }

        if let Some(encoded) = encoded_signature {
            match decode(&encoded) {
                Ok(bytes) => self.signature = Some(bytes),
                Err(e) => self.ledger.error(
                    BAD_SIGNATURE_ENCODING,
                    format!("signature is not valid base64: {e}"),
                ),
            }
        } else {
            self.ledger
                .error(BAD_SIGNATURE_ENCODING, "vers:Signature is missing");
        }

        for (i, encoded) in encoded_certificates.iter().enumerate() {
            match decode(encoded) {
                Ok(der) => self.certificates.push(Some(der)),
                Err(e) => {
                    self.ledger.error(
                        BAD_CERTIFICATE_ENCODING,
                        format!("certificate {} is not valid base64: {e}", i + 1),
                    );
                    self.certificates.push(None);
                }
            }
        }
    }

    fn check_fields(&mut self) {
        match self.version.as_deref() {
            Some(VERS_VERSION) => {}
            other => self.ledger.warning(
                UNEXPECTED_VERSION,
                format!(
                    "vers:Version is '{}', expected '{VERS_VERSION}'",
                    other.unwrap_or_default()
                ),
            ),
        }

        let id = self.algorithm_id.clone().unwrap_or_default();
        self.algorithm = SignatureAlgorithm::from_identifier(&id);
        if self.algorithm.is_none() {
            self.ledger.error(
                UNKNOWN_ALGORITHM,
                format!("signature algorithm '{id}' is not supported"),
            );
        }

        let timestamp = self.timestamp.clone().unwrap_or_default();
        if !is_vers_date(&timestamp) {
            self.ledger.error(
                BAD_TIMESTAMP,
                format!("SignatureDateTime '{timestamp}' is not a valid date"),
            );
        }

        if self.signer.as_deref().is_none_or(str::is_empty) {
            self.ledger.error(MISSING_SIGNER, "vers:Signer is missing or empty");
        }
    }

    /// Where issues for this signature are recorded.
    #[must_use]
    pub fn location(&self) -> &str {
        self.ledger.location()
    }
}

impl Validated for Signature {
    fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn children(&self) -> Vec<&dyn Validated> {
        vec![&self.document as &dyn Validated]
    }
}

/// Decodes base64 that may be wrapped over several lines.
fn decode(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = encoded.split_whitespace().collect();
    STANDARD.decode(compact)
}
