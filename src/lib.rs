//! organize - sort a directory tree into per-extension buckets
//!
//! This library classifies files by extension, moves them into
//! `Extension_<EXT>` folders under the organized root, removes exact
//! duplicates by content hash, keeps same-name files with different content
//! side by side, and quarantines files that fail validation.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod conflict;
pub mod file_organizer;
pub mod hasher;
pub mod output;
pub mod reporter;
pub mod signal;

pub use classifier::{ClassifyResult, FileCandidate, QuarantineReason, classify};
pub use config::{ConfigError, OrganizeConfig, OrganizeSettings};
pub use conflict::{ConflictResolver, Disposition, next_available_suffix};
pub use file_organizer::{FileOrganizer, OrganizeError, RunStatistics};
pub use hasher::{ContentDigest, digest};
pub use reporter::{FileEvent, Outcome, Reporter};

pub use cli::{Cli, run_cli};
