//! Test utilities for building VEO packages.
//!
//! This module provides reusable helpers for creating in-memory ZIP
//! archives, VERS XML documents and complete, correctly signed packages,
//! so unit and integration tests share one definition of a "good" VEO.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O or signing errors since
//! they are designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io::Cursor;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ring::rand::SystemRandom;
use ring::signature::ECDSA_P256_SHA256_ASN1_SIGNING;
use ring::signature::EcdsaKeyPair;

use crate::manifest::HashFunction;

const VERS_OPEN: &str = r#"xmlns:vers="http://www.prov.vic.gov.au/VERS""#;

/// PKCS#8 key of the bundled self-signed test signer (ECDSA P-256).
const SIGNER_KEY: &[u8] = include_bytes!("../fixtures/signer.pk8");

/// DER certificate of the bundled test signer.
const SIGNER_CERTIFICATE: &[u8] = include_bytes!("../fixtures/signer.der");

/// Signature time written into generated signature files.
pub const SIGNATURE_TIME: &str = "2014-09-09T10:30:00+10:00";

/// Creates an in-memory ZIP archive from a list of entries.
///
/// Each entry is a tuple of (path, content), stored uncompressed.
///
/// # Examples
///
/// ```
/// use veocheck_core::test_utils::create_test_zip;
///
/// let zip_data = create_test_zip(vec![("R-1.veo/VEOReadme.txt", b"hello".as_slice())]);
/// ```
#[must_use]
pub fn create_test_zip(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    use zip::write::SimpleFileOptions;
    use zip::write::ZipWriter;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .unix_permissions(0o644);

    for (path, data) in entries {
        zip.start_file(path, options).unwrap();
        zip.write_all(data).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// Base64 SHA-256 digest, as written in `HashValue`.
#[must_use]
pub fn sha256_base64(data: &[u8]) -> String {
    let digest = HashFunction::Sha256.digest_reader(&mut &data[..]).unwrap();
    STANDARD.encode(digest)
}

/// Builder for `VEOContent.xml` documents.
///
/// Every object built with [`ManifestBuilder::object`] carries an AGLS
/// metadata package, so a manifest of such objects is valid as long as
/// the depths are.
///
/// # Examples
///
/// ```
/// use veocheck_core::test_utils::ManifestBuilder;
///
/// let xml = ManifestBuilder::new()
///     .object(1, &[("S-1/doc.txt", "AAAA")])
///     .object(2, &[])
///     .build();
/// assert!(xml.contains("<vers:InformationObjectDepth>2</vers:InformationObjectDepth>"));
/// ```
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    hash_function: String,
    objects: Vec<String>,
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestBuilder {
    /// Creates a builder for a SHA-256 manifest with no objects.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hash_function: "SHA-256".to_string(),
            objects: Vec::new(),
        }
    }

    /// Overrides the declared hash function.
    #[must_use]
    pub fn hash_function(mut self, name: &str) -> Self {
        self.hash_function = name.to_string();
        self
    }

    /// Appends an object at `depth` with one piece holding `files`
    /// (`(PathName, HashValue)` pairs); no piece when `files` is empty.
    #[must_use]
    pub fn object(mut self, depth: usize, files: &[(&str, &str)]) -> Self {
        let mut xml = format!(
            "<vers:InformationObject>\
             <vers:InformationObjectType>Record</vers:InformationObjectType>\
             <vers:InformationObjectDepth>{depth}</vers:InformationObjectDepth>\
             <vers:MetadataPackage \
               vers:syntax=\"http://www.w3.org/1999/02/22-rdf-syntax-ns\" \
               vers:schema=\"http://www.vic.gov.au/blogs/other/AGLS\">\
             <rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\
             <rdf:Description>Test record</rdf:Description>\
             </rdf:RDF>\
             </vers:MetadataPackage>"
        );
        if !files.is_empty() {
            xml.push_str("<vers:InformationPiece><vers:Label>Content</vers:Label>");
            for (path, hash) in files {
                write!(
                    xml,
                    "<vers:ContentFile><vers:PathName>{path}</vers:PathName>\
                     <vers:HashValue>{hash}</vers:HashValue></vers:ContentFile>"
                )
                .unwrap();
            }
            xml.push_str("</vers:InformationPiece>");
        }
        xml.push_str("</vers:InformationObject>");
        self.objects.push(xml);
        self
    }

    /// Appends an object given as literal XML.
    #[must_use]
    pub fn raw_object(mut self, xml: &str) -> Self {
        self.objects.push(xml.to_string());
        self
    }

    /// Renders the document.
    #[must_use]
    pub fn build(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <vers:VEO {VERS_OPEN}>\
             <vers:Version>3.0</vers:Version>\
             <vers:HashFunction>{}</vers:HashFunction>\
             {}\
             </vers:VEO>",
            self.hash_function,
            self.objects.concat()
        )
    }
}

/// Renders a `VEOHistory.xml` with one event per date.
#[must_use]
pub fn history_xml(dates: &[&str]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <vers:VEOHistory {VERS_OPEN}><vers:Version>3.0</vers:Version>"
    );
    for date in dates {
        write!(
            xml,
            "<vers:Event>\
             <vers:EventDateTime>{date}</vers:EventDateTime>\
             <vers:EventType>Created</vers:EventType>\
             <vers:Initiator>Test Initiator</vers:Initiator>\
             <vers:Description>Package created for testing</vers:Description>\
             </vers:Event>"
        )
        .unwrap();
    }
    xml.push_str("</vers:VEOHistory>");
    xml
}

/// Renders a signature file.
#[must_use]
pub fn signature_xml(algorithm: &str, timestamp: &str, signature: &[u8], certificates: &[&[u8]]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <vers:VEOSignatureBlock {VERS_OPEN}>\
         <vers:Version>3.0</vers:Version>\
         <vers:SignatureDateTime>{timestamp}</vers:SignatureDateTime>\
         <vers:Signer>Test Signer</vers:Signer>\
         <vers:SignatureAlgorithm>\
         <vers:AlgorithmIdentifier>{algorithm}</vers:AlgorithmIdentifier>\
         </vers:SignatureAlgorithm>\
         <vers:Signature>{}</vers:Signature>\
         <vers:CertificateChain>",
        STANDARD.encode(signature)
    );
    for der in certificates {
        write!(xml, "<vers:Certificate>{}</vers:Certificate>", STANDARD.encode(der)).unwrap();
    }
    xml.push_str("</vers:CertificateChain></vers:VEOSignatureBlock>");
    xml
}

/// An ECDSA P-256 signer with its certificate chain.
pub struct TestSigner {
    key: EcdsaKeyPair,
    chain: Vec<Vec<u8>>,
    rng: SystemRandom,
}

impl TestSigner {
    /// The bundled self-signed signer.
    #[must_use]
    pub fn fixture() -> Self {
        Self::from_pkcs8(SIGNER_KEY, vec![SIGNER_CERTIFICATE.to_vec()])
    }

    /// A signer from a PKCS#8 P-256 key and its chain (end-entity first).
    #[must_use]
    pub fn from_pkcs8(pkcs8: &[u8], chain: Vec<Vec<u8>>) -> Self {
        let rng = SystemRandom::new();
        let key = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8, &rng).unwrap();
        Self { key, chain, rng }
    }

    /// DER signature over `data`.
    #[must_use]
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        self.key.sign(&self.rng, data).unwrap().as_ref().to_vec()
    }

    /// The certificate chain, end-entity first.
    #[must_use]
    pub fn chain(&self) -> &[Vec<u8>] {
        &self.chain
    }

    /// Renders a complete signature file over `data`.
    #[must_use]
    pub fn signature_file(&self, data: &[u8]) -> String {
        let chain: Vec<&[u8]> = self.chain.iter().map(Vec::as_slice).collect();
        signature_xml("1.2.840.10045.4.3.2", SIGNATURE_TIME, &self.sign(data), &chain)
    }
}

const CONTENT_PATH: &str = "S-1/doc.txt";

/// Builder for complete, signed VEO archives.
///
/// By default the package is conformant: one information object pointing
/// at `S-1/doc.txt` with the right digest, a one-event history, a readme,
/// and content and history signatures by [`TestSigner::fixture`].
/// Signatures are computed at build time over the final companion files
/// unless a signature file was set or removed explicitly.
///
/// # Examples
///
/// ```
/// use veocheck_core::test_utils::VeoZipBuilder;
///
/// let temp = tempfile::TempDir::new().unwrap();
/// let archive = VeoZipBuilder::new("R-1.veo")
///     .file("S-1/extra.txt", b"unreferenced")
///     .write_to(temp.path());
/// assert!(archive.ends_with("R-1.veo.zip"));
/// ```
pub struct VeoZipBuilder {
    name: String,
    entry_root: String,
    files: BTreeMap<String, Vec<u8>>,
    removed: BTreeSet<String>,
    corrupted: BTreeSet<String>,
    manifest: Option<String>,
    signer: TestSigner,
}

impl VeoZipBuilder {
    /// Starts a conformant package called `canonical_name`.
    #[must_use]
    pub fn new(canonical_name: &str) -> Self {
        let mut files = BTreeMap::new();
        files.insert(CONTENT_PATH.to_string(), b"The content of the record.\n".to_vec());
        files.insert(
            "VEOHistory.xml".to_string(),
            history_xml(&[SIGNATURE_TIME]).into_bytes(),
        );
        files.insert(
            "VEOReadme.txt".to_string(),
            b"This is a VERS Encapsulated Object.\n".to_vec(),
        );
        Self {
            name: canonical_name.to_string(),
            entry_root: canonical_name.to_string(),
            files,
            removed: BTreeSet::new(),
            corrupted: BTreeSet::new(),
            manifest: None,
            signer: TestSigner::fixture(),
        }
    }

    /// Adds or replaces a file (path relative to the package root).
    #[must_use]
    pub fn file(mut self, path: &str, data: &[u8]) -> Self {
        self.removed.remove(path);
        self.files.insert(path.to_string(), data.to_vec());
        self
    }

    /// Leaves a file out, including generated ones.
    #[must_use]
    pub fn without(mut self, path: &str) -> Self {
        self.files.remove(path);
        self.removed.insert(path.to_string());
        self
    }

    /// Uses `xml` as `VEOContent.xml` instead of the generated manifest.
    #[must_use]
    pub fn manifest(mut self, xml: &str) -> Self {
        self.manifest = Some(xml.to_string());
        self
    }

    /// Stores entries under `root/` instead of the canonical name, as if
    /// the archive had been renamed.
    #[must_use]
    pub fn entry_root(mut self, root: &str) -> Self {
        self.entry_root = root.to_string();
        self
    }

    /// Signs with `signer` instead of the bundled one.
    #[must_use]
    pub fn signer(mut self, signer: TestSigner) -> Self {
        self.signer = signer;
        self
    }

    /// Flips one byte of `path` after signatures and digests are computed.
    #[must_use]
    pub fn corrupt(mut self, path: &str) -> Self {
        self.corrupted.insert(path.to_string());
        self
    }

    /// Final file set, relative to the package root.
    #[must_use]
    pub fn files(&self) -> BTreeMap<String, Vec<u8>> {
        let mut files = self.files.clone();

        if !self.removed.contains("VEOContent.xml") {
            let manifest = self.manifest.clone().unwrap_or_else(|| {
                let digests: Vec<(&str, String)> = files
                    .get(CONTENT_PATH)
                    .map(|data| vec![(CONTENT_PATH, sha256_base64(data))])
                    .unwrap_or_default();
                let refs: Vec<(&str, &str)> = digests.iter().map(|(p, h)| (*p, h.as_str())).collect();
                ManifestBuilder::new().object(1, &refs).build()
            });
            files.insert("VEOContent.xml".to_string(), manifest.into_bytes());
        }

        for (signature, companion) in [
            ("VEOContentSignature1.xml", "VEOContent.xml"),
            ("VEOHistorySignature1.xml", "VEOHistory.xml"),
        ] {
            if self.removed.contains(signature) || files.contains_key(signature) {
                continue;
            }
            if let Some(data) = files.get(companion) {
                let xml = self.signer.signature_file(data);
                files.insert(signature.to_string(), xml.into_bytes());
            }
        }

        for path in &self.corrupted {
            if let Some(data) = files.get_mut(path)
                && let Some(byte) = data.last_mut()
            {
                *byte ^= 0x01;
            }
        }
        files
    }

    /// Builds the archive bytes.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let files = self.files();
        let entries: Vec<(String, &[u8])> = files
            .iter()
            .map(|(path, data)| (format!("{}/{path}", self.entry_root), data.as_slice()))
            .collect();
        create_test_zip(entries.iter().map(|(p, d)| (p.as_str(), *d)).collect())
    }

    /// Writes `dir/<canonical name>.zip` and returns its path.
    pub fn write_to(&self, dir: &Path) -> PathBuf {
        let path = dir.join(format!("{}.zip", self.name));
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_package_files() {
        let files = VeoZipBuilder::new("R-1.veo").files();
        let names: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            [
                "S-1/doc.txt",
                "VEOContent.xml",
                "VEOContentSignature1.xml",
                "VEOHistory.xml",
                "VEOHistorySignature1.xml",
                "VEOReadme.txt",
            ]
        );
    }

    #[test]
    fn test_without_suppresses_generated_files() {
        let files = VeoZipBuilder::new("R-1.veo")
            .without("VEOContent.xml")
            .without("VEOHistorySignature1.xml")
            .files();
        assert!(!files.contains_key("VEOContent.xml"));
        assert!(!files.contains_key("VEOContentSignature1.xml"));
        assert!(!files.contains_key("VEOHistorySignature1.xml"));
    }

    #[test]
    fn test_fixture_signer_loads() {
        let signer = TestSigner::fixture();
        assert_eq!(signer.chain().len(), 1);
        assert!(!signer.sign(b"data").is_empty());
    }
}
