//! The content manifest (`VEOContent.xml`).
//!
//! Parsing is a recursive descent over the document cursor. Strictly-typed
//! VERS elements are read field by field; metadata packages, whose content
//! is in arbitrary foreign schemas, are jumped over with the cursor's skip
//! primitives. After parsing, the information objects are linked into a
//! forest (see [`tree`]) and their content references checked against the
//! extracted package (see [`content`]).

pub mod content;
pub mod object;
pub mod tree;

use std::path::Path;

use tracing::debug;

pub use content::HashFunction;
pub use object::ContentFile;
pub use object::InformationObject;
pub use object::InformationPiece;
pub use object::MetadataPackage;
pub use tree::TreeMode;

use crate::IssueId;
use crate::Ledger;
use crate::Validated;
use crate::xml::Document;
use crate::xml::Schema;

const WRONG_ROOT: IssueId = IssueId::new("Manifest", "parse", 1);
const MISSING_VERSION: IssueId = IssueId::new("Manifest", "parse", 2);
const UNEXPECTED_VERSION: IssueId = IssueId::new("Manifest", "parse", 3);
const BAD_HASH_FUNCTION: IssueId = IssueId::new("Manifest", "parse", 4);
const UNEXPECTED_ELEMENT: IssueId = IssueId::new("Manifest", "parse", 5);
const NO_OBJECTS: IssueId = IssueId::new("Manifest", "parse", 6);
const NO_BASELINE_METADATA: IssueId = IssueId::new("Manifest", "parse", 7);
const MISSING_HASH_FUNCTION: IssueId = IssueId::new("Manifest", "parse", 8);

const OBJECT_MISSING_TYPE: IssueId = IssueId::new("InformationObject", "parse", 1);
const OBJECT_BAD_DEPTH: IssueId = IssueId::new("InformationObject", "parse", 2);
const OBJECT_UNEXPECTED: IssueId = IssueId::new("InformationObject", "parse", 3);
const METADATA_MISSING_ATTR: IssueId = IssueId::new("MetadataPackage", "parse", 1);
const METADATA_EMPTY: IssueId = IssueId::new("MetadataPackage", "parse", 2);
const PIECE_NO_FILES: IssueId = IssueId::new("InformationPiece", "parse", 1);
const PIECE_UNEXPECTED: IssueId = IssueId::new("InformationPiece", "parse", 2);

/// Version every VERS V3 document declares.
pub const VERS_VERSION: &str = "3.0";

const LOCATION: &str = "VEOContent.xml";

/// A parsed content manifest.
#[derive(Debug)]
pub struct Manifest {
    /// Declared `Version`.
    pub version: Option<String>,
    /// Declared `HashFunction`, if recognised.
    pub hash_function: Option<HashFunction>,
    /// Information objects in document order; parent/child links index
    /// into this list.
    pub objects: Vec<InformationObject>,
    /// Shape chosen by the first object, once linked.
    pub mode: Option<TreeMode>,
    document: Ledger,
    ledger: Ledger,
}

impl Manifest {
    fn empty() -> Self {
        Self {
            version: None,
            hash_function: None,
            objects: Vec::new(),
            mode: None,
            document: Ledger::new(LOCATION),
            ledger: Ledger::new(LOCATION),
        }
    }

    /// Parses `path` against `schema` and links the object tree.
    ///
    /// Never fails: an unreadable or malformed document yields a manifest
    /// with no objects and the reason on its ledger.
    #[must_use]
    pub fn parse(path: &Path, schema: &Schema) -> Self {
        let mut doc = Document::new(LOCATION);
        let parsed = doc.parse(path, schema);
        Self::from_document(doc, parsed)
    }

    /// Parses manifest text already in memory.
    #[must_use]
    pub fn parse_str(text: &str, schema: &Schema) -> Self {
        let mut doc = Document::new(LOCATION);
        let parsed = doc.parse_str(text, schema);
        Self::from_document(doc, parsed)
    }

    fn from_document(mut doc: Document, parsed: bool) -> Self {
        let mut manifest = Self::empty();
        if parsed {
            manifest.read(&mut doc);
            manifest.mode = tree::reconstruct(&mut manifest.objects);
            manifest.check_baseline_metadata();
        }
        manifest.document = doc.into_ledger();
        debug!(
            objects = manifest.objects.len(),
            mode = ?manifest.mode,
            "parsed manifest"
        );
        manifest
    }

    fn read(&mut self, doc: &mut Document) {
        if !doc.tag_name_is("VEO") {
            self.ledger
                .error(WRONG_ROOT, "root element is not vers:VEO; manifest not read");
            return;
        }
        doc.advance();
        let mut has_hash_function = false;

        while let Some(element) = doc.current_element() {
            match element.name.as_str() {
                "Version" => {
                    self.version = element.text.clone();
                    skip_element(doc);
                }
                "HashFunction" => {
                    has_hash_function = true;
                    let name = element.text.clone().unwrap_or_default();
                    self.hash_function = HashFunction::from_name(&name);
                    if self.hash_function.is_none() {
                        self.ledger.error(
                            BAD_HASH_FUNCTION,
                            format!("HashFunction '{name}' is not SHA-1, SHA-256, SHA-384 or SHA-512"),
                        );
                    }
                    skip_element(doc);
                }
                "InformationObject" => {
                    let object = read_object(doc, self.objects.len() + 1);
                    self.objects.push(object);
                }
                other => {
                    self.ledger.error(
                        UNEXPECTED_ELEMENT,
                        format!("unexpected element '{other}' (line {}) in vers:VEO", element.line),
                    );
                    skip_element(doc);
                }
            }
        }

        match self.version.as_deref() {
            None => self.ledger.error(MISSING_VERSION, "vers:Version is missing"),
            Some(VERS_VERSION) => {}
            Some(v) => self.ledger.warning(
                UNEXPECTED_VERSION,
                format!("vers:Version is '{v}', expected '{VERS_VERSION}'"),
            ),
        }
        if !has_hash_function {
            self.ledger.error(
                MISSING_HASH_FUNCTION,
                "vers:HashFunction is missing; content digests cannot be checked",
            );
        }
        if self.objects.is_empty() {
            self.ledger
                .error(NO_OBJECTS, "manifest contains no information objects");
        }
    }

    fn check_baseline_metadata(&mut self) {
        if let Some(first) = self.objects.first_mut()
            && !first.metadata.iter().any(MetadataPackage::is_baseline)
        {
            first.ledger.error(
                NO_BASELINE_METADATA,
                "first information object has no AGLS or ANZS5478 metadata package",
            );
        }
    }

    /// Indices of objects without a parent.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.parent.is_none())
            .map(|(i, _)| i)
    }

    /// Checks every content reference against the extracted package.
    pub fn check_content(&mut self, root: &Path, verify_hashes: bool) {
        let hash = self.hash_function.filter(|_| verify_hashes);
        content::check_references(&mut self.objects, root, hash, &mut self.ledger);
    }
}

impl Validated for Manifest {
    fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn children(&self) -> Vec<&dyn Validated> {
        std::iter::once(&self.document as &dyn Validated)
            .chain(self.objects.iter().map(|o| o as &dyn Validated))
            .collect()
    }
}

/// Moves past the current element: to its next sibling if it has one,
/// otherwise out to the next element after its parent.
fn skip_element(doc: &mut Document) {
    if !doc.skip_to_sibling() {
        doc.skip_to_parent_sibling();
    }
}

/// Digits only: no sign, no whitespace.
fn parse_depth(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn read_object(doc: &mut Document, seq: usize) -> InformationObject {
    let mut object = InformationObject::new(seq);
    let Some(depth) = doc.current_element().map(|e| e.depth) else {
        return object;
    };
    let mut unexpected_reported = false;
    let mut has_type = false;
    let mut has_depth = false;

    doc.advance();
    while let Some(element) = doc.current_element() {
        if element.depth <= depth {
            break;
        }
        match element.name.as_str() {
            "InformationObjectType" => {
                has_type = true;
                object.object_type = element.text.clone();
                skip_element(doc);
            }
            "InformationObjectDepth" => {
                has_depth = true;
                let text = element.text.clone().unwrap_or_default();
                match parse_depth(&text) {
                    Some(d) => object.depth = Some(d),
                    None => object.ledger.error(
                        OBJECT_BAD_DEPTH,
                        format!("InformationObjectDepth '{text}' is not a non-negative integer"),
                    ),
                }
                skip_element(doc);
            }
            "MetadataPackage" => {
                let location = format!("{}/MP[{}]", object.location(), object.metadata.len() + 1);
                object.metadata.push(read_metadata(doc, location));
            }
            "InformationPiece" => {
                let location = format!("{}/IP[{}]", object.location(), object.pieces.len() + 1);
                object.pieces.push(read_piece(doc, location));
            }
            other => {
                if !unexpected_reported {
                    unexpected_reported = true;
                    object.ledger.error(
                        OBJECT_UNEXPECTED,
                        format!("unexpected element '{other}' (line {})", element.line),
                    );
                }
                skip_element(doc);
            }
        }
    }

    if !has_type || object.object_type.as_deref().is_some_and(str::is_empty) {
        object
            .ledger
            .error(OBJECT_MISSING_TYPE, "InformationObjectType is missing or empty");
    }
    if !has_depth {
        object
            .ledger
            .error(OBJECT_BAD_DEPTH, "InformationObjectDepth is missing");
    }
    object
}

fn read_metadata(doc: &mut Document, location: String) -> MetadataPackage {
    let mut package = MetadataPackage::new(location);
    package.syntax = doc.attribute("syntax").map(str::to_string);
    package.schema = doc.attribute("schema").map(str::to_string);
    package.element_count = doc.subtree().len();

    let missing: Vec<&str> = [("vers:syntax", &package.syntax), ("vers:schema", &package.schema)]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
        .map(|(attr, _)| attr)
        .collect();
    for attr in missing {
        package
            .ledger
            .error(METADATA_MISSING_ATTR, format!("{attr} attribute is missing"));
    }
    if package.element_count == 0 {
        package
            .ledger
            .error(METADATA_EMPTY, "metadata package has no content");
    }

    skip_element(doc);
    package
}

fn read_piece(doc: &mut Document, location: String) -> InformationPiece {
    let mut piece = InformationPiece::new(location);
    let Some(depth) = doc.current_element().map(|e| e.depth) else {
        return piece;
    };

    let mut file: Option<ContentFile> = None;
    for element in doc.subtree() {
        if element.depth == depth + 1 {
            if let Some(done) = file.take() {
                piece.content_files.push(done);
            }
            match element.name.as_str() {
                "Label" => piece.label = element.text.clone(),
                "ContentFile" => {
                    let n = piece.content_files.len() + 1;
                    file = Some(ContentFile::new(format!(
                        "{}/ContentFile[{n}]",
                        piece.ledger.location()
                    )));
                }
                other => piece.ledger.error(
                    PIECE_UNEXPECTED,
                    format!("unexpected element '{other}' (line {})", element.line),
                ),
            }
        } else if element.depth == depth + 2
            && let Some(current) = file.as_mut()
        {
            match element.name.as_str() {
                "PathName" => current.path_name = element.text.clone(),
                "HashValue" => current.hash_value = element.text.clone(),
                _ => {}
            }
        }
    }
    if let Some(done) = file {
        piece.content_files.push(done);
    }
    if piece.content_files.is_empty() {
        piece
            .ledger
            .error(PIECE_NO_FILES, "information piece has no content files");
    }

    skip_element(doc);
    piece
}
