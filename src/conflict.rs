//! Destination conflict resolution.
//!
//! Given a candidate and the bucket it belongs to, [`ConflictResolver`]
//! decides whether the file is moved as-is, moved under a numbered name,
//! dropped as a duplicate, or parked in the existing-conflict subtree.
//!
//! Size is compared before content: a hash is only computed when two files
//! share both a name and a size.

use crate::classifier::FileCandidate;
use crate::file_organizer::{OrganizeError, OrganizeResult};
use crate::hasher::{self, ContentDigest};
use log::debug;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Terminal outcome of resolving one candidate.
#[derive(Debug)]
pub enum Disposition {
    /// Moved into the bucket under its own name.
    Moved(PathBuf),
    /// Moved into the bucket under a numbered name (sizes differed).
    Renamed(PathBuf),
    /// Deleted because an identical file already exists.
    DuplicateRemoved {
        /// The surviving file the candidate duplicated.
        duplicate_of: PathBuf,
    },
    /// Moved into the existing-conflict subtree (same name and size, other content).
    QuarantinedExisting(PathBuf),
    /// A filesystem operation failed; the candidate was left where it was.
    Error(OrganizeError),
}

/// Builds `{base}_{n}.{ext}`, or `{base}_{n}` when `ext` is empty.
///
/// ```
/// use organize::conflict::numbered_name;
///
/// assert_eq!(numbered_name("photo", 2, "jpg"), "photo_2.jpg");
/// assert_eq!(numbered_name("readme", 1, ""), "readme_1");
/// ```
pub fn numbered_name(base: impl AsRef<OsStr>, n: u32, ext: impl AsRef<OsStr>) -> OsString {
    let ext = ext.as_ref();
    let mut name = base.as_ref().to_os_string();
    name.push(format!("_{}", n));
    if !ext.is_empty() {
        name.push(".");
        name.push(ext);
    }
    name
}

/// Returns the lowest `n >= 1` such that `dir/{base}_{n}.{ext}` does not exist.
///
/// The scan is sequential from 1, so a number already present in `dir` is
/// never handed out. Errors if an existence check itself fails.
pub fn next_available_suffix(
    dir: &Path,
    base: impl AsRef<OsStr>,
    ext: impl AsRef<OsStr>,
) -> io::Result<u32> {
    let (base, ext) = (base.as_ref(), ext.as_ref());
    let mut n = 1;
    while dir.join(numbered_name(base, n, ext)).try_exists()? {
        n += 1;
    }
    Ok(n)
}

/// Moves `from` to `to`, falling back to copy-then-delete when a rename is
/// not possible (for example across filesystems).
pub(crate) fn move_file(from: &Path, to: &Path) -> OrganizeResult<()> {
    let move_error = |e: io::Error| OrganizeError::FileMoveFailure {
        source: from.to_path_buf(),
        destination: to.to_path_buf(),
        source_error: e,
    };

    if let Err(rename_err) = fs::rename(from, to) {
        debug!(
            "rename {} -> {} failed ({}), trying copy",
            from.display(),
            to.display(),
            rename_err
        );
        fs::copy(from, to).map_err(move_error)?;
        if let Err(e) = fs::remove_file(from) {
            // Keep a single copy of the file
            let _ = fs::remove_file(to);
            return Err(move_error(e));
        }
    }
    Ok(())
}

pub(crate) fn path_exists(path: &Path) -> OrganizeResult<bool> {
    path.try_exists()
        .map_err(|e| OrganizeError::MetadataFailure {
            path: path.to_path_buf(),
            source: e,
        })
}

fn remove_duplicate(path: &Path) -> OrganizeResult<()> {
    fs::remove_file(path).map_err(|e| OrganizeError::FileRemoveFailure {
        path: path.to_path_buf(),
        source: e,
    })
}

fn suffix_for(dir: &Path, candidate: &FileCandidate) -> OrganizeResult<PathBuf> {
    let ext = candidate.suffix_extension();
    let n = next_available_suffix(dir, &candidate.base_name, &ext).map_err(|e| {
        OrganizeError::MetadataFailure {
            path: dir.to_path_buf(),
            source: e,
        }
    })?;
    Ok(dir.join(numbered_name(&candidate.base_name, n, &ext)))
}

/// Resolves name collisions between a candidate and its bucket.
pub struct ConflictResolver;

impl ConflictResolver {
    /// Resolves `candidate` against `dest_dir` and performs the resulting
    /// filesystem operation.
    ///
    /// `existing_dir` is the root of the existing-conflict subtree; content
    /// conflicts land in `existing_dir/<name of dest_dir>/`. `dest_dir` must
    /// already exist.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use organize::classifier::FileCandidate;
    /// use organize::conflict::{ConflictResolver, Disposition};
    /// use std::path::Path;
    ///
    /// let candidate = FileCandidate::from_path(Path::new("/data/a.jpg")).unwrap();
    /// let disposition = ConflictResolver::resolve(
    ///     &candidate,
    ///     Path::new("/data/Extension_JPG"),
    ///     Path::new("/data/Extension_EXISTING"),
    /// );
    /// if let Disposition::Moved(dest) = disposition {
    ///     println!("moved to {}", dest.display());
    /// }
    /// ```
    pub fn resolve(
        candidate: &FileCandidate,
        dest_dir: &Path,
        existing_dir: &Path,
    ) -> Disposition {
        match Self::try_resolve(candidate, dest_dir, existing_dir) {
            Ok(disposition) => disposition,
            Err(e) => Disposition::Error(e),
        }
    }

    fn try_resolve(
        candidate: &FileCandidate,
        dest_dir: &Path,
        existing_dir: &Path,
    ) -> OrganizeResult<Disposition> {
        let dest_file = dest_dir.join(&candidate.filename);

        if !path_exists(&dest_file)? {
            move_file(&candidate.path, &dest_file)?;
            return Ok(Disposition::Moved(dest_file));
        }

        let existing_size = fs::metadata(&dest_file)
            .map_err(|e| OrganizeError::MetadataFailure {
                path: dest_file.clone(),
                source: e,
            })?
            .len();

        if existing_size != candidate.size {
            debug!(
                "{}: size {} differs from existing {}",
                candidate.path.display(),
                candidate.size,
                existing_size
            );
            let target = suffix_for(dest_dir, candidate)?;
            move_file(&candidate.path, &target)?;
            return Ok(Disposition::Renamed(target));
        }

        let candidate_digest = hasher::digest(&candidate.path)?;
        if candidate_digest == hasher::digest(&dest_file)? {
            remove_duplicate(&candidate.path)?;
            return Ok(Disposition::DuplicateRemoved {
                duplicate_of: dest_file,
            });
        }

        let bucket_name = dest_dir.file_name().unwrap_or_default();
        let existing_subdir = existing_dir.join(bucket_name);
        Self::resolve_existing(candidate, &candidate_digest, &existing_subdir)
    }

    /// Places a content conflict in the existing-conflict subtree, dropping it
    /// if an identical numbered entry is already there.
    fn resolve_existing(
        candidate: &FileCandidate,
        candidate_digest: &ContentDigest,
        existing_subdir: &Path,
    ) -> OrganizeResult<Disposition> {
        fs::create_dir_all(existing_subdir).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: existing_subdir.to_path_buf(),
            source: e,
        })?;

        let first_slot = existing_subdir.join(&candidate.filename);
        if !path_exists(&first_slot)? {
            move_file(&candidate.path, &first_slot)?;
            return Ok(Disposition::QuarantinedExisting(first_slot));
        }

        let ext = candidate.suffix_extension();
        let mut n = 1;
        loop {
            let numbered = existing_subdir.join(numbered_name(&candidate.base_name, n, &ext));
            if !path_exists(&numbered)? {
                move_file(&candidate.path, &numbered)?;
                return Ok(Disposition::QuarantinedExisting(numbered));
            }
            if hasher::digest(&numbered)? == *candidate_digest {
                remove_duplicate(&candidate.path)?;
                return Ok(Disposition::DuplicateRemoved {
                    duplicate_of: numbered,
                });
            }
            n += 1;
        }
    }
}
