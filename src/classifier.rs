//! File classification by extension.
//!
//! This module derives the extension of a candidate file, applies the
//! include/exclude extension filters and the size bounds, and decides which
//! bucket the file belongs to.
//!
//! # Examples
//!
//! ```
//! use organize::classifier::{ClassifyResult, FileCandidate, classify};
//! use std::collections::HashSet;
//! use std::path::PathBuf;
//!
//! let candidate = FileCandidate::new(PathBuf::from("/tmp/photo.JPG"), 1024);
//! let result = classify(&candidate, &HashSet::new(), &HashSet::new(), 0, 0);
//! assert_eq!(result, ClassifyResult::Accepted("JPG".to_string()));
//! ```

use crate::file_organizer::{OrganizeError, OrganizeResult};
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A file under consideration for classification and relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    /// Full path to the file.
    pub path: PathBuf,
    /// The file name component of `path`, byte for byte.
    pub filename: OsString,
    /// The file name without its final `.ext` part.
    pub base_name: OsString,
    /// Lowercased extension used for filtering and bucket names, `None` when
    /// the name has no usable extension.
    pub extension: Option<String>,
    /// File size in bytes at the time the candidate was read.
    pub size: u64,
}

impl FileCandidate {
    /// Builds a candidate from a path and an already known size.
    pub fn new(path: PathBuf, size: u64) -> Self {
        let filename = path.file_name().map(OsStr::to_os_string).unwrap_or_default();
        let (base_name, extension) = split_extension(&filename);
        let base_name = base_name.to_os_string();
        let extension = extension.map(|ext| ext.to_string_lossy().to_lowercase());

        Self {
            path,
            filename,
            base_name,
            extension,
            size,
        }
    }

    /// Reads the size of `path` from its metadata and builds a candidate.
    pub fn from_path(path: &Path) -> OrganizeResult<Self> {
        let metadata = fs::metadata(path).map_err(|e| OrganizeError::MetadataFailure {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::new(path.to_path_buf(), metadata.len()))
    }

    /// The extension written into numbered names.
    pub fn suffix_extension(&self) -> OsString {
        suffix_extension(split_extension(&self.filename).1)
    }
}

/// Splits a file name at its last `.` into `(base, extension)`.
///
/// A name without a dot, whose dot is the last character, or whose only dot
/// is the leading one has no extension.
///
/// ```
/// use organize::classifier::split_extension;
/// use std::ffi::OsStr;
///
/// let (base, ext) = split_extension(OsStr::new("archive.tar.gz"));
/// assert_eq!(base, "archive.tar");
/// assert_eq!(ext, Some(OsStr::new("gz")));
///
/// assert_eq!(split_extension(OsStr::new("readme")).1, None);
/// assert_eq!(split_extension(OsStr::new("notes.")), (OsStr::new("notes"), None));
/// ```
pub fn split_extension(filename: &OsStr) -> (&OsStr, Option<&OsStr>) {
    let path = Path::new(filename);
    let base = path.file_stem().unwrap_or(filename);
    let extension = path.extension().filter(|ext| !ext.is_empty());
    (base, extension)
}

/// Lowercases an extension for a numbered name. Extensions that are not valid
/// UTF-8 are kept as they are.
pub(crate) fn suffix_extension(extension: Option<&OsStr>) -> OsString {
    match extension {
        Some(ext) => match ext.to_str() {
            Some(ext) => OsString::from(ext.to_lowercase()),
            None => ext.to_os_string(),
        },
        None => OsString::new(),
    }
}

/// Why a file was routed to quarantine instead of a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuarantineReason {
    /// The file name has no extension.
    NoExtension,
    /// The extension is excluded, or missing from a non-empty include list.
    ExcludedExtension(String),
    /// The file size is outside the configured bounds.
    SizeOutOfRange { size: u64, min: u64, max: u64 },
    /// A filesystem operation failed while handling the file.
    IoFailure(String),
}

impl QuarantineReason {
    /// Short machine-readable code for this reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoExtension => "NoExtension",
            Self::ExcludedExtension(_) => "ExcludedExtension",
            Self::SizeOutOfRange { .. } => "SizeOutOfRange",
            Self::IoFailure(_) => "IOFailure",
        }
    }
}

impl fmt::Display for QuarantineReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoExtension => write!(f, "file has no extension"),
            Self::ExcludedExtension(ext) => write!(f, "extension '.{}' is filtered out", ext),
            Self::SizeOutOfRange { size, min, max } => {
                let bound = |b: &u64| {
                    if *b == 0 {
                        "unbounded".to_string()
                    } else {
                        b.to_string()
                    }
                };
                write!(
                    f,
                    "size {} bytes outside allowed range [{}, {}]",
                    size,
                    bound(min),
                    bound(max)
                )
            }
            Self::IoFailure(msg) => write!(f, "I/O failure: {}", msg),
        }
    }
}

/// Outcome of classifying a single candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyResult {
    /// The file is organizable; carries the uppercased extension.
    Accepted(String),
    /// The file must be quarantined for the given reason.
    Rejected(QuarantineReason),
}

/// Classifies a candidate against the extension filters and size bounds.
///
/// The exclude set is consulted first. The include set is only consulted when
/// it is non-empty; an empty include set accepts every extension. Both sets
/// must hold lowercase extensions without a leading dot. A bound of `0`
/// leaves that side of the size range open.
pub fn classify(
    candidate: &FileCandidate,
    include: &HashSet<String>,
    exclude: &HashSet<String>,
    min_size: u64,
    max_size: u64,
) -> ClassifyResult {
    let Some(ext) = candidate.extension.as_deref() else {
        return ClassifyResult::Rejected(QuarantineReason::NoExtension);
    };

    if exclude.contains(ext) {
        return ClassifyResult::Rejected(QuarantineReason::ExcludedExtension(ext.to_string()));
    }

    if !include.is_empty() && !include.contains(ext) {
        return ClassifyResult::Rejected(QuarantineReason::ExcludedExtension(ext.to_string()));
    }

    let too_small = min_size > 0 && candidate.size < min_size;
    let too_large = max_size > 0 && candidate.size > max_size;
    if too_small || too_large {
        return ClassifyResult::Rejected(QuarantineReason::SizeOutOfRange {
            size: candidate.size,
            min: min_size,
            max: max_size,
        });
    }

    ClassifyResult::Accepted(ext.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn candidate(name: &str, size: u64) -> FileCandidate {
        FileCandidate::new(PathBuf::from("/data").join(name), size)
    }

    #[test]
    fn test_candidate_fields() {
        let c = candidate("Holiday.Photo.JPG", 42);
        assert_eq!(c.filename, "Holiday.Photo.JPG");
        assert_eq!(c.base_name, "Holiday.Photo");
        assert_eq!(c.extension.as_deref(), Some("jpg"));
        assert_eq!(c.suffix_extension(), "jpg");
        assert_eq!(c.size, 42);
    }

    #[cfg(unix)]
    #[test]
    fn test_candidate_keeps_non_utf8_name_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let name = OsStr::from_bytes(b"caf\xe9.TXT");
        let c = FileCandidate::new(PathBuf::from("/data").join(name), 3);
        assert_eq!(c.filename, name);
        assert_eq!(c.base_name, OsStr::from_bytes(b"caf\xe9"));
        assert_eq!(c.extension.as_deref(), Some("txt"));

        let raw_path = PathBuf::from("/data").join(OsStr::from_bytes(b"a.T\xff"));
        let raw_ext = FileCandidate::new(raw_path, 1);
        assert_eq!(raw_ext.suffix_extension(), OsStr::from_bytes(b"T\xff"));
    }

    #[test]
    fn test_no_extension_rejected() {
        let result = classify(&candidate("readme", 10), &set(&[]), &set(&[]), 0, 0);
        assert_eq!(result, ClassifyResult::Rejected(QuarantineReason::NoExtension));
    }

    #[test]
    fn test_trailing_dot_has_no_extension() {
        let result = classify(&candidate("notes.", 10), &set(&[]), &set(&[]), 0, 0);
        assert_eq!(result, ClassifyResult::Rejected(QuarantineReason::NoExtension));
    }

    #[test]
    fn test_accepts_uppercased_extension() {
        let lower = classify(&candidate("photo.jpg", 10), &set(&[]), &set(&[]), 0, 0);
        let upper = classify(&candidate("photo.JPG", 10), &set(&[]), &set(&[]), 0, 0);
        assert_eq!(lower, ClassifyResult::Accepted("JPG".to_string()));
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_exclude_checked_before_include() {
        let include = set(&["tmp"]);
        let exclude = set(&["tmp"]);
        let result = classify(&candidate("scratch.TMP", 10), &include, &exclude, 0, 0);
        assert_eq!(
            result,
            ClassifyResult::Rejected(QuarantineReason::ExcludedExtension("tmp".to_string()))
        );
    }

    #[test]
    fn test_include_set_restricts_extensions() {
        let include = set(&["pdf"]);
        assert_eq!(
            classify(&candidate("a.pdf", 1), &include, &set(&[]), 0, 0),
            ClassifyResult::Accepted("PDF".to_string())
        );
        assert!(matches!(
            classify(&candidate("a.png", 1), &include, &set(&[]), 0, 0),
            ClassifyResult::Rejected(QuarantineReason::ExcludedExtension(_))
        ));
    }

    #[test]
    fn test_size_bounds() {
        let none = set(&[]);
        assert!(matches!(
            classify(&candidate("a.txt", 5), &none, &none, 10, 0),
            ClassifyResult::Rejected(QuarantineReason::SizeOutOfRange { size: 5, .. })
        ));
        assert!(matches!(
            classify(&candidate("a.txt", 500), &none, &none, 0, 100),
            ClassifyResult::Rejected(QuarantineReason::SizeOutOfRange { size: 500, .. })
        ));
        // Bounds are inclusive
        assert_eq!(
            classify(&candidate("a.txt", 10), &none, &none, 10, 10),
            ClassifyResult::Accepted("TXT".to_string())
        );
        // Zero means unbounded, even for empty files
        assert_eq!(
            classify(&candidate("a.txt", 0), &none, &none, 0, 0),
            ClassifyResult::Accepted("TXT".to_string())
        );
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(QuarantineReason::NoExtension.code(), "NoExtension");
        assert_eq!(
            QuarantineReason::IoFailure("boom".to_string()).code(),
            "IOFailure"
        );
        assert!(
            QuarantineReason::SizeOutOfRange {
                size: 3,
                min: 0,
                max: 2
            }
            .to_string()
            .contains("unbounded")
        );
    }
}
