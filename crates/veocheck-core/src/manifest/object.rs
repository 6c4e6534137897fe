//! Information objects and what they own.

use crate::Ledger;
use crate::Validated;

/// A metadata package attached to an information object.
///
/// Its content is in a foreign schema and is not interpreted here; only the
/// identifying attributes and the presence of content are kept.
#[derive(Debug, Clone)]
pub struct MetadataPackage {
    /// Value of `vers:syntax`.
    pub syntax: Option<String>,
    /// Value of `vers:schema`.
    pub schema: Option<String>,
    /// Number of elements below the package element.
    pub element_count: usize,
    pub(crate) ledger: Ledger,
}

impl MetadataPackage {
    pub(crate) fn new(location: String) -> Self {
        Self {
            syntax: None,
            schema: None,
            element_count: 0,
            ledger: Ledger::new(location),
        }
    }

    /// Whether the schema identifier names a baseline metadata standard.
    #[must_use]
    pub fn is_baseline(&self) -> bool {
        self.schema.as_deref().is_some_and(|s| {
            let s = s.to_ascii_lowercase();
            s.contains("agls") || s.contains("5478")
        })
    }
}

impl Validated for MetadataPackage {
    fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}

/// One content file reference.
#[derive(Debug, Clone)]
pub struct ContentFile {
    /// Path relative to the package root, as written.
    pub path_name: Option<String>,
    /// Base64 digest, as written.
    pub hash_value: Option<String>,
    pub(crate) ledger: Ledger,
}

impl ContentFile {
    pub(crate) fn new(location: String) -> Self {
        Self {
            path_name: None,
            hash_value: None,
            ledger: Ledger::new(location),
        }
    }
}

impl Validated for ContentFile {
    fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}

/// A labelled group of content files.
#[derive(Debug, Clone)]
pub struct InformationPiece {
    /// Optional label.
    pub label: Option<String>,
    /// Content files in document order.
    pub content_files: Vec<ContentFile>,
    pub(crate) ledger: Ledger,
}

impl InformationPiece {
    pub(crate) fn new(location: String) -> Self {
        Self {
            label: None,
            content_files: Vec::new(),
            ledger: Ledger::new(location),
        }
    }
}

impl Validated for InformationPiece {
    fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn children(&self) -> Vec<&dyn Validated> {
        self.content_files
            .iter()
            .map(|c| c as &dyn Validated)
            .collect()
    }
}

/// One information object of the manifest.
///
/// Objects are stored in an arena in document order; `parent` and
/// `children` are indices into that arena.
#[derive(Debug, Clone)]
pub struct InformationObject {
    /// 1-based position in the manifest.
    pub seq: usize,
    /// Declared `InformationObjectType`.
    pub object_type: Option<String>,
    /// Declared depth, if it parsed as a non-negative integer.
    pub depth: Option<usize>,
    /// Metadata packages in document order.
    pub metadata: Vec<MetadataPackage>,
    /// Information pieces in document order.
    pub pieces: Vec<InformationPiece>,
    /// Index of the parent object.
    pub parent: Option<usize>,
    /// Indices of child objects, in document order.
    pub children: Vec<usize>,
    pub(crate) ledger: Ledger,
}

impl InformationObject {
    /// Creates an empty object at position `seq`.
    #[must_use]
    pub fn new(seq: usize) -> Self {
        Self {
            seq,
            object_type: None,
            depth: None,
            metadata: Vec::new(),
            pieces: Vec::new(),
            parent: None,
            children: Vec::new(),
            ledger: Ledger::new(format!("VEOContent.xml/IO[{seq}]")),
        }
    }

    /// Creates an object with a known depth.
    #[must_use]
    pub fn with_depth(seq: usize, depth: usize) -> Self {
        Self {
            depth: Some(depth),
            ..Self::new(seq)
        }
    }

    /// Location prefix used by owned sub-structures.
    #[must_use]
    pub fn location(&self) -> &str {
        self.ledger.location()
    }

    /// Content files across every piece, in document order.
    pub fn content_files(&self) -> impl Iterator<Item = &ContentFile> {
        self.pieces.iter().flat_map(|p| p.content_files.iter())
    }
}

impl Validated for InformationObject {
    fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn children(&self) -> Vec<&dyn Validated> {
        self.metadata
            .iter()
            .map(|m| m as &dyn Validated)
            .chain(self.pieces.iter().map(|p| p as &dyn Validated))
            .collect()
    }
}
