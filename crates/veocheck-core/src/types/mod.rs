//! Type-safe wrappers for extraction.
//!
//! Entry placements can only be built through validation, so an unchecked
//! entry name cannot reach the filesystem.

pub mod dest_dir;
pub mod safe_path;

pub use dest_dir::DestDir;
pub use safe_path::SafePath;
