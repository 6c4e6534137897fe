//! Content file references: location and digest checks.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha1::Sha1;
use sha2::Digest;
use sha2::Sha256;
use sha2::Sha384;
use sha2::Sha512;
use tracing::debug;
use walkdir::WalkDir;

use super::object::ContentFile;
use super::object::InformationObject;
use crate::IssueId;
use crate::Ledger;

const MISSING_PATH: IssueId = IssueId::new("ContentFile", "check", 1);
const UNSAFE_PATH: IssueId = IssueId::new("ContentFile", "check", 2);
const FILE_NOT_FOUND: IssueId = IssueId::new("ContentFile", "check", 3);
const MISSING_HASH: IssueId = IssueId::new("ContentFile", "check", 4);
const BAD_HASH_ENCODING: IssueId = IssueId::new("ContentFile", "check", 5);
const HASH_MISMATCH: IssueId = IssueId::new("ContentFile", "check", 6);
const UNREADABLE: IssueId = IssueId::new("ContentFile", "check", 7);
const UNREFERENCED: IssueId = IssueId::new("Manifest", "content", 1);

/// Digest algorithm named by the manifest's `HashFunction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFunction {
    /// SHA-1
    Sha1,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl HashFunction {
    /// Parses a VERS hash function name (`SHA-256`, `SHA256`, any case).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().replace('-', "").as_str() {
            "SHA1" => Some(Self::Sha1),
            "SHA256" => Some(Self::Sha256),
            "SHA384" => Some(Self::Sha384),
            "SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Digests everything `reader` yields.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub fn digest_reader<R: Read>(self, reader: &mut R) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Sha1 => digest_with::<Sha1, R>(reader),
            Self::Sha256 => digest_with::<Sha256, R>(reader),
            Self::Sha384 => digest_with::<Sha384, R>(reader),
            Self::Sha512 => digest_with::<Sha512, R>(reader),
        }
    }
}

impl std::fmt::Display for HashFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        };
        f.write_str(s)
    }
}

fn digest_with<D: Digest + Write, R: Read>(reader: &mut R) -> std::io::Result<Vec<u8>> {
    let mut hasher = D::new();
    std::io::copy(reader, &mut hasher)?;
    Ok(hasher.finalize().to_vec())
}

/// Normalizes a manifest path name, rejecting anything that could leave
/// the package root.
fn relative_path(path_name: &str) -> Option<PathBuf> {
    let normalized = path_name.trim().replace('\\', "/");
    if normalized.is_empty()
        || normalized.starts_with('/')
        || normalized.as_bytes().get(1) == Some(&b':')
        || normalized.contains('\0')
    {
        return None;
    }
    let mut path = PathBuf::new();
    for segment in normalized.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s => path.push(s),
        }
    }
    (!path.as_os_str().is_empty()).then_some(path)
}

/// Checks one content file against the extracted tree, returning the
/// resolved relative path when the file exists.
fn check_file(
    file: &mut ContentFile,
    root: &Path,
    hash: Option<HashFunction>,
) -> Option<PathBuf> {
    let Some(path_name) = file.path_name.clone() else {
        file.ledger.error(MISSING_PATH, "content file has no PathName");
        return None;
    };
    let Some(relative) = relative_path(&path_name) else {
        file.ledger.error(
            UNSAFE_PATH,
            format!("PathName '{path_name}' is not a relative path inside the package"),
        );
        return None;
    };
    let full = root.join(&relative);
    if !full.is_file() {
        file.ledger.error(
            FILE_NOT_FOUND,
            format!("PathName '{path_name}' does not name a file in the package"),
        );
        return None;
    }

    if let Some(hash) = hash {
        verify_digest(file, &full, hash);
    }
    Some(relative)
}

fn verify_digest(file: &mut ContentFile, full: &Path, hash: HashFunction) {
    let Some(encoded) = file.hash_value.as_deref() else {
        file.ledger.error(MISSING_HASH, "content file has no HashValue");
        return;
    };
    let compact: String = encoded.split_whitespace().collect();
    let expected = match STANDARD.decode(compact) {
        Ok(bytes) => bytes,
        Err(e) => {
            file.ledger
                .error(BAD_HASH_ENCODING, format!("HashValue is not valid base64: {e}"));
            return;
        }
    };
    let actual = match File::open(full).and_then(|mut f| hash.digest_reader(&mut f)) {
        Ok(digest) => digest,
        Err(e) => {
            file.ledger
                .error(UNREADABLE, format!("cannot read {}: {e}", full.display()));
            return;
        }
    };
    if actual != expected {
        file.ledger.error(
            HASH_MISMATCH,
            format!("{hash} digest of '{}' does not match HashValue", full.display()),
        );
    }
}

/// Checks every content reference and warns about content files nothing
/// references.
///
/// `hash` is `None` when digest checking is disabled or the manifest's hash
/// function was unusable. Top-level files are the package layout's
/// business and are not considered here.
pub fn check_references(
    objects: &mut [InformationObject],
    root: &Path,
    hash: Option<HashFunction>,
    ledger: &mut Ledger,
) {
    let mut referenced = HashSet::new();
    for object in objects.iter_mut() {
        for piece in &mut object.pieces {
            for file in &mut piece.content_files {
                if let Some(path) = check_file(file, root, hash) {
                    referenced.insert(path);
                }
            }
        }
    }
    debug!(referenced = referenced.len(), "checked content references");

    for entry in WalkDir::new(root)
        .min_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        if let Ok(relative) = entry.path().strip_prefix(root)
            && !referenced.contains(relative)
        {
            ledger.warning(
                UNREFERENCED,
                format!(
                    "content file '{}' is not referenced by any information object",
                    relative.display()
                ),
            );
        }
    }
}
