//! Error and warning collection for validated objects.
//!
//! Every validated object owns a [`Ledger`]. Problems are appended at the
//! moment they are detected and never modified afterwards. Aggregation is
//! done by walking the ownership tree through [`Validated::children`], never
//! by copying issues into an ancestor's ledger, so a child that gains an
//! error after its parent's checks ran is still reported.

use std::fmt;

/// Severity of a recorded issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Makes the package non-conformant.
    Error,
    /// Recorded but does not affect conformance.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// Stable `(component, method, code)` identifier of an issue.
///
/// External tooling classifies packages by these triples, so existing
/// identifiers must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IssueId {
    /// Component that detected the problem.
    pub component: &'static str,
    /// Method within the component.
    pub method: &'static str,
    /// Numeric code, unique within `(component, method)`.
    pub code: u32,
}

impl IssueId {
    /// Creates an identifier.
    #[must_use]
    pub const fn new(component: &'static str, method: &'static str, code: u32) -> Self {
        Self {
            component,
            method,
            code,
        }
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({})", self.component, self.method, self.code)
    }
}

/// A single recorded error or warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Stable identifier.
    pub id: IssueId,
    /// Error or warning.
    pub severity: Severity,
    /// VEO-relative location of the owning object.
    pub location: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}]: {}",
            self.severity, self.id, self.location, self.message
        )
    }
}

/// Ordered errors and warnings owned by one object.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    location: String,
    errors: Vec<Issue>,
    warnings: Vec<Issue>,
}

impl Ledger {
    /// Creates an empty ledger for the object at `location`.
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Returns the owning object's location.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Records an error.
    pub fn error(&mut self, id: IssueId, message: impl Into<String>) {
        let issue = self.issue(id, Severity::Error, message.into());
        self.errors.push(issue);
    }

    /// Records a warning.
    pub fn warning(&mut self, id: IssueId, message: impl Into<String>) {
        let issue = self.issue(id, Severity::Warning, message.into());
        self.warnings.push(issue);
    }

    fn issue(&self, id: IssueId, severity: Severity, message: String) -> Issue {
        Issue {
            id,
            severity,
            location: self.location.clone(),
            message,
        }
    }

    /// Moves every issue of `other` into this ledger, keeping their
    /// original locations.
    pub fn absorb(&mut self, other: Self) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Errors recorded directly on this object.
    #[must_use]
    pub fn errors(&self) -> &[Issue] {
        &self.errors
    }

    /// Warnings recorded directly on this object.
    #[must_use]
    pub fn warnings(&self) -> &[Issue] {
        &self.warnings
    }

    /// Issues of one severity recorded directly on this object.
    #[must_use]
    pub fn issues(&self, severity: Severity) -> &[Issue] {
        match severity {
            Severity::Error => &self.errors,
            Severity::Warning => &self.warnings,
        }
    }
}

/// An object that owns a ledger and, possibly, validated children.
pub trait Validated {
    /// The object's own ledger.
    fn ledger(&self) -> &Ledger;

    /// Owned validated children.
    fn children(&self) -> Vec<&dyn Validated> {
        Vec::new()
    }

    /// Whether this object or any descendant recorded an error.
    ///
    /// Recomputed on every call.
    fn has_errors(&self) -> bool {
        !self.ledger().errors().is_empty() || self.children().iter().any(|c| c.has_errors())
    }

    /// Whether this object or any descendant recorded a warning.
    fn has_warnings(&self) -> bool {
        !self.ledger().warnings().is_empty() || self.children().iter().any(|c| c.has_warnings())
    }

    /// Appends this subtree's issues of `severity` to `out`, parents first.
    fn collect_into<'a>(&'a self, severity: Severity, out: &mut Vec<&'a Issue>) {
        out.extend(self.ledger().issues(severity));
        for child in self.children() {
            child.collect_into(severity, out);
        }
    }

    /// Flattens this subtree's issues of `severity`.
    fn collect(&self, severity: Severity) -> Vec<&Issue> {
        let mut out = Vec::new();
        self.collect_into(severity, &mut out);
        out
    }
}

impl Validated for Ledger {
    fn ledger(&self) -> &Ledger {
        self
    }
}
