//! Element-vocabulary checking against an XML Schema.
//!
//! Only the part of XSD that the VERS schemas rely on for structure is
//! honoured: the set of declared element names in the target namespace,
//! which of them may be the document root, and whether `xs:any` wildcards
//! admit elements from other namespaces. Content-model ordering and simple
//! type facets are left to the manifest parsers, which report them with
//! specific messages.

use std::collections::HashSet;
use std::path::Path;

use roxmltree::Node;

use super::document::Element;
use crate::IssueId;
use crate::Ledger;
use crate::VeoError;
use crate::VeoResult;

/// Namespace of the VERS V3 vocabulary.
pub const VERS_NAMESPACE: &str = "http://www.prov.vic.gov.au/VERS";

const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

const ROOT_NOT_DECLARED: IssueId = IssueId::new("XMLDocument", "validate", 1);
const ELEMENT_NOT_DECLARED: IssueId = IssueId::new("XMLDocument", "validate", 2);
const FOREIGN_NOT_PERMITTED: IssueId = IssueId::new("XMLDocument", "validate", 3);

/// The three VERS document kinds a package carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// `VEOContent.xml`
    Content,
    /// `VEOHistory.xml`
    History,
    /// `VEOContentSignature*.xml` and `VEOHistorySignature*.xml`
    Signature,
}

impl SchemaKind {
    /// File name of the schema inside a schema directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Content => "VEOContent.xsd",
            Self::History => "VEOHistory.xsd",
            Self::Signature => "VEOSignature.xsd",
        }
    }

    const fn builtin_text(self) -> &'static str {
        match self {
            Self::Content => include_str!("../../schemas/VEOContent.xsd"),
            Self::History => include_str!("../../schemas/VEOHistory.xsd"),
            Self::Signature => include_str!("../../schemas/VEOSignature.xsd"),
        }
    }
}

/// A compiled element vocabulary.
#[derive(Debug, Clone)]
pub struct Schema {
    target_namespace: Option<String>,
    roots: HashSet<String>,
    declared: HashSet<String>,
    allows_foreign: bool,
    permissive: bool,
}

impl Schema {
    /// A schema that accepts any well-formed document.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            target_namespace: None,
            roots: HashSet::new(),
            declared: HashSet::new(),
            allows_foreign: true,
            permissive: true,
        }
    }

    /// Loads the schema for `kind`, from `schema_dir` when given.
    ///
    /// # Errors
    ///
    /// Returns `VeoError::Schema` if the file cannot be read or is not a
    /// usable XML Schema.
    pub fn for_kind(kind: SchemaKind, schema_dir: Option<&Path>) -> VeoResult<Self> {
        match schema_dir {
            Some(dir) => Self::load(&dir.join(kind.file_name())),
            None => Self::from_xsd(kind.builtin_text(), Path::new(kind.file_name())),
        }
    }

    /// Loads a schema from disk.
    ///
    /// # Errors
    ///
    /// Returns `VeoError::Schema` if the file cannot be read or is not a
    /// usable XML Schema.
    pub fn load(path: &Path) -> VeoResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| VeoError::Schema {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_xsd(&text, path)
    }

    /// Compiles schema text; `origin` names it in errors.
    ///
    /// # Errors
    ///
    /// Returns `VeoError::Schema` if the text is not well-formed or its
    /// root is not `xs:schema`.
    pub fn from_xsd(text: &str, origin: &Path) -> VeoResult<Self> {
        let invalid = |reason: String| VeoError::Schema {
            path: origin.to_path_buf(),
            reason,
        };
        let doc = roxmltree::Document::parse(text).map_err(|e| invalid(e.to_string()))?;
        let root = doc.root_element();
        if !is_xsd(root, "schema") {
            return Err(invalid("root element is not xs:schema".to_string()));
        }

        let mut schema = Self {
            target_namespace: root.attribute("targetNamespace").map(str::to_string),
            roots: HashSet::new(),
            declared: HashSet::new(),
            allows_foreign: false,
            permissive: false,
        };

        for node in root.descendants().filter(Node::is_element) {
            if is_xsd(node, "any") {
                schema.allows_foreign = true;
            } else if is_xsd(node, "element") {
                if let Some(name) = node.attribute("name") {
                    schema.declared.insert(name.to_string());
                    if node.parent_element() == Some(root) {
                        schema.roots.insert(name.to_string());
                    }
                }
            }
        }

        if schema.roots.is_empty() {
            return Err(invalid("no global element declarations".to_string()));
        }
        Ok(schema)
    }

    fn in_target(&self, element: &Element) -> bool {
        element.namespace.as_deref() == self.target_namespace.as_deref()
    }

    /// Records a violation for every element the vocabulary does not admit.
    pub(crate) fn check(&self, elements: &[Element], ledger: &mut Ledger) {
        if self.permissive {
            return;
        }
        let Some(root) = elements.first() else {
            return;
        };
        if !self.in_target(root) || !self.roots.contains(&root.name) {
            ledger.error(
                ROOT_NOT_DECLARED,
                format!(
                    "root element {} (line {}) is not declared by the schema",
                    root.qualified_name(),
                    root.line
                ),
            );
            return;
        }

        // Elements below a foreign element are the foreign schema's business.
        let mut foreign = vec![false; elements.len()];
        for (i, element) in elements.iter().enumerate() {
            let parent_foreign = element.parent.is_some_and(|p| foreign[p]);
            if parent_foreign {
                foreign[i] = true;
                continue;
            }
            if !self.in_target(element) {
                foreign[i] = true;
                if !self.allows_foreign {
                    ledger.error(
                        FOREIGN_NOT_PERMITTED,
                        format!(
                            "element {} (line {}) is not permitted here",
                            element.qualified_name(),
                            element.line
                        ),
                    );
                }
                continue;
            }
            if !self.declared.contains(&element.name) {
                ledger.error(
                    ELEMENT_NOT_DECLARED,
                    format!(
                        "element {} (line {}) is not declared by the schema",
                        element.qualified_name(),
                        element.line
                    ),
                );
            }
        }
    }
}

fn is_xsd(node: Node<'_, '_>, local: &str) -> bool {
    let tag = node.tag_name();
    tag.namespace() == Some(XSD_NAMESPACE) && tag.name() == local
}
