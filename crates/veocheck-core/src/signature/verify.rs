//! Cryptographic checks: the signature over its companion file, and the
//! certificate chain behind it.

use std::path::Path;

use tracing::debug;
use x509_parser::certificate::X509Certificate;
use x509_parser::parse_x509_certificate;
use x509_parser::public_key::PublicKey;

use super::Signature;
use super::VerifyFailure;
use crate::IssueId;
use crate::Ledger;
use crate::VeoError;
use crate::VeoResult;

const NO_SIGNATURE: IssueId = IssueId::new("Signature", "verify", 1);
const NO_CERTIFICATE: IssueId = IssueId::new("Signature", "verify", 2);
const BAD_CERTIFICATE: IssueId = IssueId::new("Signature", "verify", 3);
const UNSUPPORTED: IssueId = IssueId::new("Signature", "verify", 4);
const MISMATCH: IssueId = IssueId::new("Signature", "verify", 5);

const CHAIN_EMPTY: IssueId = IssueId::new("Signature", "chain", 1);
const CHAIN_UNPARSEABLE: IssueId = IssueId::new("Signature", "chain", 2);
const CHAIN_LINK_FAILED: IssueId = IssueId::new("Signature", "chain", 3);
const CHAIN_NOT_SELF_SIGNED: IssueId = IssueId::new("Signature", "chain", 4);
const CHAIN_BAD_SELF_SIGNATURE: IssueId = IssueId::new("Signature", "chain", 5);

impl Signature {
    /// Verifies the signature over `companion` and the certificate chain.
    ///
    /// Both checks always run; failures are recorded on this signature.
    /// Returns whether both passed. The companion is read into memory
    /// whole, as verification is one-shot.
    ///
    /// # Errors
    ///
    /// Returns `VeoError::Companion` if the companion file cannot be read.
    pub fn verify(&mut self, companion: &Path) -> VeoResult<bool> {
        let data = std::fs::read(companion).map_err(|source| VeoError::Companion {
            path: companion.to_path_buf(),
            source,
        })?;
        let signature_ok = self.verify_bytes(&data);
        let chain_ok = self.verify_chain();
        debug!(
            location = self.location(),
            signature_ok, chain_ok, "verified signature"
        );
        Ok(signature_ok && chain_ok)
    }

    /// Verifies the signature over `data` with the end-entity certificate.
    ///
    /// Skipped, returning `false`, when the algorithm was not recognised;
    /// that was already recorded while parsing.
    pub fn verify_bytes(&mut self, data: &[u8]) -> bool {
        let Some(algorithm) = self.algorithm else {
            return false;
        };
        let Some(signature) = self.signature.as_deref() else {
            self.ledger
                .error(NO_SIGNATURE, "no decodable signature to verify");
            return false;
        };
        let der = match self.certificates.first() {
            Some(Some(der)) => der,
            Some(None) => {
                self.ledger.error(
                    BAD_CERTIFICATE,
                    "signer's certificate is not valid base64; signature not checked",
                );
                return false;
            }
            None => {
                self.ledger
                    .error(NO_CERTIFICATE, "no certificate to verify the signature with");
                return false;
            }
        };
        let certificate = match parse_x509_certificate(der) {
            Ok((_, certificate)) => certificate,
            Err(e) => {
                self.ledger.error(
                    BAD_CERTIFICATE,
                    format!("signer's certificate cannot be decoded: {e}"),
                );
                return false;
            }
        };

        let key = certificate.public_key();
        let key_fits = match key.parsed() {
            Ok(PublicKey::RSA(rsa)) => algorithm.check_rsa_modulus(rsa.key_size()),
            _ => Ok(()),
        };
        match key_fits.and_then(|()| algorithm.verify(&key.subject_public_key.data, data, signature)) {
            Ok(()) => true,
            Err(VerifyFailure::Unsupported(what)) => {
                self.ledger.error(
                    UNSUPPORTED,
                    format!("{what} signatures cannot be verified by this build"),
                );
                false
            }
            Err(VerifyFailure::Mismatch) => {
                self.ledger.error(
                    MISMATCH,
                    format!("{algorithm} signature does not match the signed file"),
                );
                false
            }
        }
    }

    /// Verifies each certificate with the next one's key, then the last
    /// certificate with its own.
    ///
    /// Every failing link is recorded separately and the walk continues.
    pub fn verify_chain(&mut self) -> bool {
        let Self {
            certificates,
            ledger,
            ..
        } = self;
        check_chain(certificates, ledger)
    }
}

/// Entries that were not valid base64 (`None`) were reported while parsing;
/// they fail the chain and every link that touches them is skipped.
fn check_chain(certificates: &[Option<Vec<u8>>], ledger: &mut Ledger) -> bool {
    if certificates.is_empty() {
        ledger.error(CHAIN_EMPTY, "signature has no certificate chain");
        return false;
    }

    let mut parsed: Vec<Option<X509Certificate<'_>>> = Vec::with_capacity(certificates.len());
    for (i, der) in certificates.iter().enumerate() {
        let Some(der) = der else {
            parsed.push(None);
            continue;
        };
        match parse_x509_certificate(der) {
            Ok((_, certificate)) => parsed.push(Some(certificate)),
            Err(e) => {
                ledger.error(
                    CHAIN_UNPARSEABLE,
                    format!("certificate {} cannot be decoded: {e}", i + 1),
                );
                parsed.push(None);
            }
        }
    }
    let mut ok = parsed.iter().all(Option::is_some);

    for (i, pair) in parsed.windows(2).enumerate() {
        let (Some(subject), Some(issuer)) = (&pair[0], &pair[1]) else {
            continue;
        };
        if let Err(e) = subject.verify_signature(Some(issuer.public_key())) {
            ok = false;
            ledger.error(
                CHAIN_LINK_FAILED,
                format!(
                    "certificate {} is not signed by certificate {}: {e}",
                    i + 1,
                    i + 2
                ),
            );
        }
    }

    if let Some(Some(root)) = parsed.last() {
        let self_issued = root.subject().as_raw() == root.issuer().as_raw();
        if !self_issued {
            ok = false;
            ledger.error(
                CHAIN_NOT_SELF_SIGNED,
                format!(
                    "last certificate is not self-signed (subject '{}', issuer '{}')",
                    root.subject(),
                    root.issuer()
                ),
            );
        } else if let Err(e) = root.verify_signature(None) {
            ok = false;
            ledger.error(
                CHAIN_BAD_SELF_SIGNATURE,
                format!("last certificate's self-signature is invalid: {e}"),
            );
        }
    }
    ok
}
