//! Command-line interface module for organize.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Merging command-line overrides into the loaded configuration
//! - Wiring the console and log-file reporters to the organizer

use crate::config::{OrganizeConfig, OrganizeSettings, parse_extension_list, parse_folder_list};
use crate::file_organizer::{FileOrganizer, RunStatistics};
use crate::output::OutputFormatter;
use crate::reporter::{ConsoleReporter, DEFAULT_LOG_FILE, JsonLogReporter, Reporters};
use clap::Parser;
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Sort files into per-extension folders, removing exact duplicates.
#[derive(Parser, Debug, Clone)]
#[command(name = "organize", version, about, long_about = None)]
pub struct Cli {
    /// Directory to organize
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Comma-separated top-level folders to leave untouched (replaces the defaults)
    pub ignore_folders: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Comma-separated extensions to organize; all others are quarantined
    #[arg(long)]
    pub include: Option<String>,

    /// Comma-separated extensions to quarantine (replaces the configured list)
    #[arg(long)]
    pub exclude: Option<String>,

    /// Minimum file size in bytes (0 = no limit)
    #[arg(long)]
    pub min_size: Option<u64>,

    /// Maximum file size in bytes (0 = no limit)
    #[arg(long)]
    pub max_size: Option<u64>,

    /// Append the run date to bucket folder names
    #[arg(long)]
    pub timestamped: bool,

    /// strftime format used with --timestamped
    #[arg(long)]
    pub date_format: Option<String>,

    /// Where to append the JSON-lines run log (default: <root>/.organize_log.jsonl)
    #[arg(long, conflicts_with = "no_log")]
    pub log_file: Option<PathBuf>,

    /// Do not write a run log
    #[arg(long)]
    pub no_log: bool,

    /// Only print problems and the final summary
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Loads the configuration and applies command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns a message if the configuration cannot be loaded or is invalid.
    pub fn settings(&self) -> Result<OrganizeSettings, String> {
        let mut config = OrganizeConfig::load(self.config.as_deref())
            .map_err(|e| format!("Error loading configuration: {}", e))?;
        let options = &mut config.organize;

        if let Some(list) = &self.ignore_folders {
            options.ignore_folders = parse_folder_list(list).into_iter().collect();
        }
        if let Some(list) = &self.include {
            options.include_extensions = parse_extension_list(list).into_iter().collect();
        }
        if let Some(list) = &self.exclude {
            options.exclude_extensions = parse_extension_list(list).into_iter().collect();
        }
        if let Some(min) = self.min_size {
            options.min_file_size = min;
        }
        if let Some(max) = self.max_size {
            options.max_file_size = max;
        }
        if self.timestamped {
            options.use_timestamped_buckets = true;
        }
        if let Some(format) = &self.date_format {
            options.date_format = format.clone();
        }

        config
            .compile()
            .map_err(|e| format!("Error in configuration: {}", e))
    }

    fn log_path(&self) -> Option<PathBuf> {
        if self.no_log {
            return None;
        }
        Some(
            self.log_file
                .clone()
                .unwrap_or_else(|| self.root.join(DEFAULT_LOG_FILE)),
        )
    }
}

/// Runs the CLI application with the parsed arguments.
///
/// Per-file problems are counted in the returned statistics; only an invalid
/// root or configuration produces an error.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use organize::cli::{Cli, run_cli};
/// use std::sync::Arc;
/// use std::sync::atomic::AtomicBool;
///
/// let cli = Cli::parse_from(["organize", "/home/user/Downloads"]);
/// match run_cli(&cli, Arc::new(AtomicBool::new(false))) {
///     Ok(stats) => println!("{} files moved", stats.moved),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli, shutdown_signal: Arc<AtomicBool>) -> Result<RunStatistics, String> {
    let settings = cli.settings()?;
    organize_directory(
        &cli.root,
        settings,
        cli.log_path().as_deref(),
        cli.quiet,
        shutdown_signal,
    )
}

/// Organizes `root` with the given settings, reporting to the console and,
/// when `log_path` is set, to a JSON-lines log.
pub fn organize_directory(
    root: &Path,
    settings: OrganizeSettings,
    log_path: Option<&Path>,
    quiet: bool,
    shutdown_signal: Arc<AtomicBool>,
) -> Result<RunStatistics, String> {
    if !root.is_dir() {
        return Err(format!(
            "Invalid base path {}: not an existing directory",
            root.display()
        ));
    }

    if !quiet {
        OutputFormatter::info(&format!("Organizing contents of: {}", root.display()));
    }

    let mut organizer = FileOrganizer::with_shutdown_signal(settings, shutdown_signal);
    let mut reporters = Reporters::new();
    reporters.push(Box::new(ConsoleReporter::new(quiet)));
    if let Some(path) = log_path {
        match JsonLogReporter::open(path) {
            Ok(reporter) => {
                reporters.push(Box::new(reporter));
                organizer = organizer.exclude_file(path);
            }
            Err(e) => {
                warn!("Run log disabled: {}", e);
                OutputFormatter::warning(&format!("Run log disabled: {}", e));
            }
        }
    }

    organizer
        .run(root, &mut reporters)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["organize"]);
        assert_eq!(cli.root, PathBuf::from("."));
        assert!(cli.ignore_folders.is_none());
        assert!(!cli.timestamped);
        assert_eq!(cli.log_path(), Some(PathBuf::from(".").join(DEFAULT_LOG_FILE)));
    }

    #[test]
    fn test_positional_ignore_folders() {
        let cli = Cli::parse_from(["organize", "/data", "Photos, Keep"]);
        assert_eq!(cli.root, PathBuf::from("/data"));
        assert_eq!(cli.ignore_folders.as_deref(), Some("Photos, Keep"));
    }

    #[test]
    fn test_no_log_conflicts_with_log_file() {
        let result = Cli::try_parse_from(["organize", "--no-log", "--log-file", "x.jsonl"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_log_disables_log_path() {
        let cli = Cli::parse_from(["organize", "--no-log"]);
        assert_eq!(cli.log_path(), None);
    }
}
