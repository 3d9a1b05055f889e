/// Extension bucket organization.
///
/// This module walks a root directory, classifies every regular file by its
/// extension and hands it to the conflict resolver, which moves it into an
/// `Extension_<EXT>` bucket under the root. Files that fail validation are
/// moved into the quarantine directory instead. Each processed file produces
/// exactly one [`FileEvent`] for the reporter.
use crate::classifier::{
    ClassifyResult, FileCandidate, QuarantineReason, classify, split_extension, suffix_extension,
};
use crate::config::OrganizeSettings;
use crate::conflict::{
    ConflictResolver, Disposition, move_file, next_available_suffix, numbered_name, path_exists,
};
use crate::reporter::{FileEvent, Outcome, Reporter};
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use walkdir::{DirEntry, WalkDir};

/// Prefix shared by every directory the organizer creates.
pub const BUCKET_PREFIX: &str = "Extension_";
/// Directory holding files that failed validation.
pub const QUARANTINE_DIR: &str = "Extension_QUARANTINE";
/// Directory holding same-name, same-size files with different content.
pub const EXISTING_DIR: &str = "Extension_EXISTING";

/// Errors that can occur during file organization operations.
#[derive(Debug)]
pub enum OrganizeError {
    /// Failed to create a bucket or reserved directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to move a file to its destination.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// Failed to delete a duplicate file.
    FileRemoveFailure {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read file metadata or check for existence.
    MetadataFailure {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read a file while hashing it.
    HashFailure {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The base directory path is invalid or doesn't exist.
    InvalidBasePath {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to open or write the run log.
    LogWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The bucket date format could not be rendered.
    InvalidDateFormat { format: String },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::FileRemoveFailure { path, source } => {
                write!(f, "Failed to remove {}: {}", path.display(), source)
            }
            Self::MetadataFailure { path, source } => {
                write!(f, "Failed to read metadata of {}: {}", path.display(), source)
            }
            Self::HashFailure { path, source } => {
                write!(f, "Failed to hash {}: {}", path.display(), source)
            }
            Self::InvalidBasePath { path, source } => {
                write!(f, "Invalid base path {}: {}", path.display(), source)
            }
            Self::LogWriteFailed { path, source } => {
                write!(f, "Failed to write log file {}: {}", path.display(), source)
            }
            Self::InvalidDateFormat { format } => {
                write!(f, "Invalid bucket date format '{}'", format)
            }
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DirectoryCreationFailed { source, .. }
            | Self::FileRemoveFailure { source, .. }
            | Self::MetadataFailure { source, .. }
            | Self::HashFailure { source, .. }
            | Self::InvalidBasePath { source, .. }
            | Self::LogWriteFailed { source, .. } => Some(source),
            Self::FileMoveFailure { source_error, .. } => Some(source_error),
            Self::InvalidDateFormat { .. } => None,
        }
    }
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Counters accumulated over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    /// Files considered by the run.
    pub total_files: usize,
    /// Files relocated into a bucket or the existing-conflict subtree.
    pub moved: usize,
    /// Of `moved`, files that needed a numbered name.
    pub renamed: usize,
    /// Of `moved`, files placed in the existing-conflict subtree.
    pub conflicts: usize,
    /// Files deleted as exact duplicates.
    pub duplicates_removed: usize,
    /// Files quarantined or left in place after a failure.
    pub errors: usize,
    /// Whether the run stopped early on a shutdown request.
    pub cancelled: bool,
}

/// Returns the bucket directory name for an uppercased extension.
///
/// ```
/// use organize::file_organizer::bucket_dir_name;
///
/// assert_eq!(bucket_dir_name("JPG", None), "Extension_JPG");
/// assert_eq!(bucket_dir_name("PDF", Some("2024-05-01")), "Extension_PDF_2024-05-01");
/// ```
pub fn bucket_dir_name(extension: &str, stamp: Option<&str>) -> String {
    match stamp {
        Some(stamp) => format!("{}{}_{}", BUCKET_PREFIX, extension, stamp),
        None => format!("{}{}", BUCKET_PREFIX, extension),
    }
}

/// Renders the current local date with `format` for a bucket name suffix.
fn bucket_stamp(format: &str) -> OrganizeResult<String> {
    let mut stamp = String::new();
    write!(stamp, "{}", chrono::Local::now().format(format)).map_err(|_| {
        OrganizeError::InvalidDateFormat {
            format: format.to_string(),
        }
    })?;
    Ok(stamp)
}

/// Organizes files under a root directory into extension buckets.
///
/// Processing is strictly sequential: each file is classified, resolved and
/// moved before the next one is looked at, since suffix allocation reads the
/// live directory state.
pub struct FileOrganizer {
    settings: OrganizeSettings,
    shutdown_signal: Arc<AtomicBool>,
    excluded_files: Vec<PathBuf>,
}

impl FileOrganizer {
    /// Creates an organizer that can only be stopped by dropping it.
    pub fn new(settings: OrganizeSettings) -> Self {
        Self::with_shutdown_signal(settings, Arc::new(AtomicBool::new(false)))
    }

    /// Creates an organizer that stops between files once `shutdown_signal` is set.
    pub fn with_shutdown_signal(
        settings: OrganizeSettings,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            settings,
            shutdown_signal,
            excluded_files: Vec::new(),
        }
    }

    /// Leaves `path` alone even when it lies under the root, as a run log
    /// written during the run does.
    pub fn exclude_file(mut self, path: &Path) -> Self {
        self.excluded_files.push(path.to_path_buf());
        self
    }

    /// The settings this organizer was built with.
    pub fn settings(&self) -> &OrganizeSettings {
        &self.settings
    }

    /// Organizes every eligible file under `root_dir`.
    ///
    /// The file list is snapshotted before anything is moved, so buckets
    /// created during the run are never walked. Per-file failures are counted
    /// and reported; only an invalid root aborts the run.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use organize::config::OrganizeSettings;
    /// use organize::file_organizer::FileOrganizer;
    /// use organize::reporter::RecordingReporter;
    /// use std::path::Path;
    ///
    /// let organizer = FileOrganizer::new(OrganizeSettings::default());
    /// let mut reporter = RecordingReporter::default();
    /// let stats = organizer.run(Path::new("/home/user/Downloads"), &mut reporter).unwrap();
    /// println!("moved {} files", stats.moved);
    /// ```
    pub fn run(
        &self,
        root_dir: &Path,
        reporter: &mut dyn Reporter,
    ) -> OrganizeResult<RunStatistics> {
        let root = Self::validate_root(root_dir)?;
        info!("Organizing {}", root.display());

        let stamp = if self.settings.use_timestamped_buckets() {
            Some(bucket_stamp(self.settings.date_format())?)
        } else {
            None
        };

        let files = self.collect_files(&root);
        reporter.start(files.len());

        let mut stats = RunStatistics::default();
        for path in files {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                warn!("Shutdown requested, stopping before {}", path.display());
                stats.cancelled = true;
                break;
            }

            stats.total_files += 1;
            let event = self.process_file(&root, &path, stamp.as_deref(), &mut stats);
            reporter.report(&event);
        }

        info!(
            "Finished {}: {} files, {} moved, {} duplicates removed, {} errors",
            root.display(),
            stats.total_files,
            stats.moved,
            stats.duplicates_removed,
            stats.errors
        );
        reporter.finish(&stats);
        Ok(stats)
    }

    fn validate_root(root_dir: &Path) -> OrganizeResult<PathBuf> {
        let invalid = |source: std::io::Error| OrganizeError::InvalidBasePath {
            path: root_dir.to_path_buf(),
            source,
        };

        let metadata = fs::metadata(root_dir).map_err(invalid)?;
        if !metadata.is_dir() {
            return Err(invalid(std::io::Error::other("not a directory")));
        }
        fs::canonicalize(root_dir).map_err(invalid)
    }

    /// Lists the files to organize, in lexicographic order per directory.
    fn collect_files(&self, root: &Path) -> Vec<PathBuf> {
        let excluded: Vec<PathBuf> = self
            .excluded_files
            .iter()
            .map(|p| fs::canonicalize(p).unwrap_or_else(|_| p.clone()))
            .collect();
        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_skipped_dir(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with('.') {
                debug!("Skipping hidden file {}", entry.path().display());
                continue;
            }
            if excluded.iter().any(|p| p == entry.path()) {
                debug!("Skipping excluded file {}", entry.path().display());
                continue;
            }
            files.push(entry.into_path());
        }
        files
    }

    /// True for top-level directories owned by the organizer or ignored by
    /// configuration.
    fn is_skipped_dir(&self, entry: &DirEntry) -> bool {
        if entry.depth() != 1 || !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        let skipped = name.starts_with(BUCKET_PREFIX)
            || self.settings.ignore_folders().contains(&name.to_lowercase());
        if skipped {
            debug!("Skipping folder {}", entry.path().display());
        }
        skipped
    }

    fn process_file(
        &self,
        root: &Path,
        path: &Path,
        stamp: Option<&str>,
        stats: &mut RunStatistics,
    ) -> FileEvent {
        let candidate = match FileCandidate::from_path(path) {
            Ok(candidate) => candidate,
            Err(e) => {
                let reason = QuarantineReason::IoFailure(e.to_string());
                return Self::quarantine_event(root, path, reason, stats);
            }
        };

        let classification = classify(
            &candidate,
            self.settings.include_extensions(),
            self.settings.exclude_extensions(),
            self.settings.min_file_size(),
            self.settings.max_file_size(),
        );
        let extension = match classification {
            ClassifyResult::Accepted(extension) => extension,
            ClassifyResult::Rejected(reason) => {
                return Self::quarantine_event(root, path, reason, stats);
            }
        };

        let dest_dir = root.join(bucket_dir_name(&extension, stamp));
        if let Err(e) = fs::create_dir_all(&dest_dir) {
            let error = OrganizeError::DirectoryCreationFailed {
                path: dest_dir,
                source: e,
            };
            let reason = QuarantineReason::IoFailure(error.to_string());
            return Self::quarantine_event(root, path, reason, stats);
        }

        let existing_dir = root.join(EXISTING_DIR);
        let disposition = ConflictResolver::resolve(&candidate, &dest_dir, &existing_dir);
        debug!("{} -> {:?}", path.display(), disposition);

        match disposition {
            Disposition::Moved(dest) => {
                stats.moved += 1;
                FileEvent::new(path, Outcome::Moved, format!("moved to {}", dest.display()))
            }
            Disposition::Renamed(dest) => {
                stats.moved += 1;
                stats.renamed += 1;
                FileEvent::new(
                    path,
                    Outcome::Renamed,
                    format!("different size, renamed to {}", dest.display()),
                )
            }
            Disposition::DuplicateRemoved { duplicate_of } => {
                stats.duplicates_removed += 1;
                FileEvent::new(
                    path,
                    Outcome::Duplicate,
                    format!("exact duplicate of {}, removed", duplicate_of.display()),
                )
            }
            Disposition::QuarantinedExisting(dest) => {
                stats.moved += 1;
                stats.conflicts += 1;
                FileEvent::new(
                    path,
                    Outcome::Conflict,
                    format!("different content, moved to {}", dest.display()),
                )
            }
            Disposition::Error(e) => {
                let reason = QuarantineReason::IoFailure(e.to_string());
                Self::quarantine_event(root, path, reason, stats)
            }
        }
    }

    fn quarantine_event(
        root: &Path,
        path: &Path,
        reason: QuarantineReason,
        stats: &mut RunStatistics,
    ) -> FileEvent {
        stats.errors += 1;
        match quarantine(root, path) {
            Ok(dest) => FileEvent::new(
                path,
                Outcome::Quarantined,
                format!("{}: {}, moved to {}", reason.code(), reason, dest.display()),
            ),
            Err(e) => {
                warn!("Could not quarantine {}: {}", path.display(), e);
                FileEvent::new(
                    path,
                    Outcome::Failed,
                    format!("{}: {}; quarantine failed: {}", reason.code(), reason, e),
                )
            }
        }
    }
}

/// Moves `path` into the quarantine directory under `root`.
///
/// The file keeps its name when free; otherwise it gets the lowest unused
/// numbered name within the quarantine directory.
pub fn quarantine(root: &Path, path: &Path) -> OrganizeResult<PathBuf> {
    let quarantine_dir = root.join(QUARANTINE_DIR);
    fs::create_dir_all(&quarantine_dir).map_err(|e| OrganizeError::DirectoryCreationFailed {
        path: quarantine_dir.clone(),
        source: e,
    })?;

    let filename = path.file_name().ok_or_else(|| OrganizeError::FileMoveFailure {
            source: path.to_path_buf(),
            destination: quarantine_dir.clone(),
            source_error: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "file has no name component",
            ),
        })?;

    let mut destination = quarantine_dir.join(filename);
    if path_exists(&destination)? {
        let (base, ext) = split_extension(filename);
        let ext = suffix_extension(ext);
        let n = next_available_suffix(&quarantine_dir, base, &ext).map_err(|e| {
            OrganizeError::MetadataFailure {
                path: quarantine_dir.clone(),
                source: e,
            }
        })?;
        destination = quarantine_dir.join(numbered_name(base, n, &ext));
    }

    move_file(path, &destination)?;
    Ok(destination)
}
