//! Secure archive extraction.

pub mod atomic;
pub mod engine;
pub mod entry;

pub use atomic::CleanupGuard;
pub use engine::canonical_name;
pub use engine::extract_archive;
pub use entry::ArchiveEntry;
