//! XML documents: flattening, cursor navigation and vocabulary checks.

pub mod document;
pub mod schema;

pub use document::Attribute;
pub use document::Document;
pub use document::Element;
pub use schema::Schema;
pub use schema::SchemaKind;
pub use schema::VERS_NAMESPACE;
