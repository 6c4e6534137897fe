//! Flattened XML document with a forward cursor.
//!
//! VEO files interleave strictly-typed VERS elements with metadata in
//! arbitrary foreign schemas. Rather than teach the parser every foreign
//! shape, the whole document is flattened once into a document-order list
//! of elements; the parser walks that list with an integer cursor and jumps
//! over foreign subtrees with [`Document::skip_to_sibling`] and
//! [`Document::skip_to_parent_sibling`], which are plain scans on element
//! depth.

use std::path::Path;

use roxmltree::Node;
use tracing::debug;

use super::schema::Schema;
use crate::IssueId;
use crate::Ledger;
use crate::Validated;

const READ_FAILED: IssueId = IssueId::new("XMLDocument", "parse", 1);
const NOT_WELL_FORMED: IssueId = IssueId::new("XMLDocument", "parse", 2);
const EMPTY_DOCUMENT: IssueId = IssueId::new("XMLDocument", "parse", 3);

/// One attribute of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Namespace URI, if qualified.
    pub namespace: Option<String>,
    /// Local name.
    pub name: String,
    /// Attribute value.
    pub value: String,
}

/// One element of the flattened document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Local name.
    pub name: String,
    /// Namespace URI, if any.
    pub namespace: Option<String>,
    /// Attributes in document order.
    pub attributes: Vec<Attribute>,
    /// Trimmed text of the first text child.
    pub text: Option<String>,
    /// Nesting depth; the root element is 0.
    pub depth: usize,
    /// Index of the parent element in the flattened list.
    pub parent: Option<usize>,
    /// 1-based source line.
    pub line: u32,
}

impl Element {
    /// Looks up an attribute by local name, ignoring its namespace.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Returns `prefix`-free display form `{namespace}name`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{{{ns}}}{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A parsed, schema-checked XML document and its cursor.
///
/// Not reentrant: one consumer drives the cursor at a time.
#[derive(Debug)]
pub struct Document {
    elements: Vec<Element>,
    cursor: usize,
    valid: bool,
    ledger: Ledger,
}

impl Document {
    /// Creates an empty, invalid document owning a ledger at `location`.
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            elements: Vec::new(),
            cursor: 0,
            valid: false,
            ledger: Ledger::new(location),
        }
    }

    /// Reads, parses and schema-checks `xml_path`.
    ///
    /// Returns `false` if the file cannot be read or is not well-formed; the
    /// reason is recorded as an error and every cursor operation then
    /// reports "at end". Schema violations are recorded as errors but leave
    /// the document usable.
    pub fn parse(&mut self, xml_path: &Path, schema: &Schema) -> bool {
        match std::fs::read_to_string(xml_path) {
            Ok(text) => self.parse_str(&text, schema),
            Err(e) => {
                self.ledger.error(
                    READ_FAILED,
                    format!("cannot read {}: {e}", xml_path.display()),
                );
                self.reset(false);
                false
            }
        }
    }

    /// Parses and schema-checks XML held in memory.
    pub fn parse_str(&mut self, text: &str, schema: &Schema) -> bool {
        let doc = match roxmltree::Document::parse(text) {
            Ok(doc) => doc,
            Err(e) => {
                self.ledger
                    .error(NOT_WELL_FORMED, format!("document is not well-formed: {e}"));
                self.reset(false);
                return false;
            }
        };

        self.elements = flatten(&doc);
        self.cursor = 0;
        if self.elements.is_empty() {
            self.ledger.error(EMPTY_DOCUMENT, "document has no elements");
            self.valid = false;
            return false;
        }

        schema.check(&self.elements, &mut self.ledger);
        debug!(
            location = self.ledger.location(),
            elements = self.elements.len(),
            "parsed document"
        );
        self.valid = true;
        true
    }

    fn reset(&mut self, valid: bool) {
        self.elements.clear();
        self.cursor = 0;
        self.valid = valid;
    }

    /// Whether parsing succeeded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The element under the cursor.
    #[must_use]
    pub fn current_element(&self) -> Option<&Element> {
        if self.valid {
            self.elements.get(self.cursor)
        } else {
            None
        }
    }

    /// Whether the cursor has run off the end of the document.
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.current_element().is_none()
    }

    /// Whether the current element's local name is `name`.
    #[must_use]
    pub fn tag_name_is(&self, name: &str) -> bool {
        self.current_element().is_some_and(|e| e.name == name)
    }

    /// An attribute of the current element, by local name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.current_element().and_then(|e| e.attribute(name))
    }

    /// Trimmed text of the current element's first text child.
    #[must_use]
    pub fn text_value(&self) -> Option<&str> {
        self.current_element().and_then(|e| e.text.as_deref())
    }

    /// Index of the cursor in document order.
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Moves to the next element in document order (children first).
    ///
    /// Returns `false` once the cursor is past the last element.
    pub fn advance(&mut self) -> bool {
        if self.at_end() {
            return false;
        }
        self.cursor += 1;
        !self.at_end()
    }

    /// Skips the current element's subtree if a DOM sibling follows it.
    ///
    /// Returns `false`, leaving the cursor untouched, when the current
    /// element is the last child of its parent.
    pub fn skip_to_sibling(&mut self) -> bool {
        let Some(current) = self.current_element() else {
            return false;
        };
        let parent = current.parent;
        let next = self.subtree_end(self.cursor);
        match self.elements.get(next) {
            Some(candidate) if candidate.parent == parent => {
                self.cursor = next;
                true
            }
            _ => false,
        }
    }

    /// Skips the rest of the current element's parent, landing on the first
    /// following element that is a sibling of some ancestor.
    ///
    /// Returns `false` and leaves the cursor at the end when the document
    /// is exhausted.
    pub fn skip_to_parent_sibling(&mut self) -> bool {
        let Some(current) = self.current_element() else {
            return false;
        };
        // The root has no parent; skipping past it exhausts the document.
        let from = current.parent.unwrap_or(self.cursor);
        self.cursor = self.subtree_end(from);
        !self.at_end()
    }

    /// First index after the subtree rooted at `index`.
    fn subtree_end(&self, index: usize) -> usize {
        let depth = self.elements[index].depth;
        let mut next = index + 1;
        while next < self.elements.len() && self.elements[next].depth > depth {
            next += 1;
        }
        next
    }

    /// The current element's descendants, in document order.
    #[must_use]
    pub fn subtree(&self) -> &[Element] {
        if self.at_end() {
            return &[];
        }
        &self.elements[self.cursor + 1..self.subtree_end(self.cursor)]
    }

    /// Records an error against this document.
    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// Drops the element list and keeps only the recorded issues.
    #[must_use]
    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }
}

impl Validated for Document {
    fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}

/// Flattens every element into document order, recording depth and parent.
fn flatten(doc: &roxmltree::Document<'_>) -> Vec<Element> {
    let mut elements = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    flatten_into(doc, doc.root(), &mut elements, &mut open);
    elements
}

/// Pre-order walk over element children, pushing on open and popping on close.
fn flatten_into(
    doc: &roxmltree::Document<'_>,
    node: Node<'_, '_>,
    elements: &mut Vec<Element>,
    open: &mut Vec<usize>,
) {
    for child in node.children().filter(Node::is_element) {
        let index = elements.len();
        elements.push(element_of(doc, child, open.len(), open.last().copied()));
        open.push(index);
        flatten_into(doc, child, elements, open);
        open.pop();
    }
}

fn element_of(
    doc: &roxmltree::Document<'_>,
    node: Node<'_, '_>,
    depth: usize,
    parent: Option<usize>,
) -> Element {
    let tag = node.tag_name();
    Element {
        name: tag.name().to_string(),
        namespace: tag.namespace().map(str::to_string),
        attributes: node
            .attributes()
            .map(|a| Attribute {
                namespace: a.namespace().map(str::to_string),
                name: a.name().to_string(),
                value: a.value().to_string(),
            })
            .collect(),
        text: node
            .children()
            .find(Node::is_text)
            .and_then(|t| t.text())
            .map(|t| t.trim().to_string()),
        depth,
        parent,
        line: doc.text_pos_at(node.range().start).row,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<root>
  <a><a1/><a2><deep/></a2></a>
  <b>  text  </b>
  <c x="1"><c1/></c>
</root>"#;

    fn parsed(text: &str) -> Document {
        let mut doc = Document::new("sample.xml");
        assert!(doc.parse_str(text, &Schema::permissive()));
        doc
    }

    fn name(doc: &Document) -> &str {
        doc.current_element().map_or("<end>", |e| e.name.as_str())
    }

    #[test]
    fn test_advance_is_preorder() {
        let mut doc = parsed(SAMPLE);
        let mut seen = vec![name(&doc).to_string()];
        while doc.advance() {
            seen.push(name(&doc).to_string());
        }
        assert_eq!(
            seen,
            ["root", "a", "a1", "a2", "deep", "b", "c", "c1"]
        );
        assert!(doc.at_end());
        assert!(!doc.advance());
    }

    #[test]
    fn test_text_and_attributes() {
        let mut doc = parsed(SAMPLE);
        while !doc.tag_name_is("b") {
            doc.advance();
        }
        assert_eq!(doc.text_value(), Some("text"));
        doc.advance();
        assert_eq!(doc.attribute("x"), Some("1"));
        assert_eq!(doc.attribute("y"), None);
    }

    #[test]
    fn test_skip_to_sibling_jumps_subtree() {
        let mut doc = parsed(SAMPLE);
        doc.advance(); // a
        assert!(doc.skip_to_sibling());
        assert_eq!(name(&doc), "b");
        assert!(doc.skip_to_sibling());
        assert_eq!(name(&doc), "c");
        assert!(!doc.skip_to_sibling());
        assert_eq!(name(&doc), "c");
    }

    #[test]
    fn test_skip_to_sibling_on_last_child_keeps_cursor() {
        let mut doc = parsed(SAMPLE);
        doc.advance(); // a
        doc.advance(); // a1
        doc.advance(); // a2
        let before = doc.position();
        assert!(!doc.skip_to_sibling());
        assert_eq!(doc.position(), before);

        assert!(doc.skip_to_parent_sibling());
        assert_eq!(name(&doc), "b");
    }

    #[test]
    fn test_skip_to_parent_sibling_climbs_several_levels() {
        let mut doc = parsed(SAMPLE);
        while !doc.tag_name_is("deep") {
            doc.advance();
        }
        // deep's parent a2 has no sibling after it; a's sibling b follows.
        assert!(doc.skip_to_parent_sibling());
        assert_eq!(name(&doc), "b");
    }

    #[test]
    fn test_skip_to_parent_sibling_exhausts() {
        let mut doc = parsed(SAMPLE);
        while !doc.tag_name_is("c1") {
            doc.advance();
        }
        assert!(!doc.skip_to_parent_sibling());
        assert!(doc.at_end());
    }

    #[test]
    fn test_subtree() {
        let mut doc = parsed(SAMPLE);
        doc.advance(); // a
        let names: Vec<&str> = doc.subtree().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a1", "a2", "deep"]);
    }

    #[test]
    fn test_parent_and_depth() {
        let doc = parsed(SAMPLE);
        let deep = doc.elements.iter().position(|e| e.name == "deep").unwrap();
        assert_eq!(doc.elements[deep].depth, 3);
        let parent = doc.elements[deep].parent.unwrap();
        assert_eq!(doc.elements[parent].name, "a2");
        assert_eq!(doc.elements[0].parent, None);
    }

    #[test]
    fn test_malformed_document_is_invalid() {
        let mut doc = Document::new("bad.xml");
        assert!(!doc.parse_str("<root><open></root>", &Schema::permissive()));
        assert!(!doc.is_valid());
        assert!(doc.at_end());
        assert!(!doc.advance());
        assert!(!doc.skip_to_sibling());
        assert!(doc.has_errors());
    }

    #[test]
    fn test_dtd_rejected() {
        let text = r#"<!DOCTYPE root [<!ENTITY x SYSTEM "file:///etc/passwd">]><root>&x;</root>"#;
        let mut doc = Document::new("xxe.xml");
        assert!(!doc.parse_str(text, &Schema::permissive()));
    }

    #[test]
    fn test_missing_file() {
        let mut doc = Document::new("missing.xml");
        assert!(!doc.parse(Path::new("/nonexistent/missing.xml"), &Schema::permissive()));
        assert_eq!(doc.ledger().errors()[0].id, READ_FAILED);
    }

    #[test]
    fn test_namespaces_resolved() {
        let doc = parsed(r#"<v:VEO xmlns:v="urn:x"><v:Version>3.0</v:Version></v:VEO>"#);
        let root = doc.current_element().unwrap();
        assert_eq!(root.name, "VEO");
        assert_eq!(root.namespace.as_deref(), Some("urn:x"));
        assert_eq!(root.qualified_name(), "{urn:x}VEO");
    }
}
