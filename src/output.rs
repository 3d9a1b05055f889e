//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored output,
//! progress tracking, and the run summary table.

use crate::file_organizer::RunStatistics;
use crate::reporter::{FileEvent, Outcome};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Per-file event lines
/// - Progress bars for a run
/// - The summary table with run statistics
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use organize::output::OutputFormatter;
    /// OutputFormatter::error("Root directory does not exist");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Formats one processed file as a single styled line.
    pub fn event_line(event: &FileEvent) -> String {
        let (marker, label) = match event.outcome {
            Outcome::Moved => ("✓".green(), "Moved".green()),
            Outcome::Renamed => ("✓".green(), "Renamed".green()),
            Outcome::Duplicate => ("−".blue(), "Duplicate".blue()),
            Outcome::Conflict => ("↻".yellow(), "Conflict".yellow()),
            Outcome::Quarantined => ("⚠".yellow(), "Quarantined".yellow()),
            Outcome::Failed => ("✗".red(), "Failed".red()),
        };
        format!(
            "{} {:<11} {} {}",
            marker,
            label,
            event.path.display(),
            format!("({})", event.reason).dimmed()
        )
    }

    /// Creates and returns a progress bar for file operations.
    ///
    /// # Arguments
    ///
    /// * `total` - Total number of items to process
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the summary table for a finished run.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use organize::file_organizer::RunStatistics;
    /// use organize::output::OutputFormatter;
    ///
    /// let stats = RunStatistics { total_files: 3, moved: 2, errors: 1, ..Default::default() };
    /// OutputFormatter::summary_table(&stats);
    /// ```
    pub fn summary_table(stats: &RunStatistics) {
        Self::header("SUMMARY");

        let rows = [
            ("Total", stats.total_files.to_string().bold()),
            ("Moved", stats.moved.to_string().green()),
            ("  renamed", stats.renamed.to_string().normal()),
            ("  conflicts", stats.conflicts.to_string().normal()),
            ("Duplicates removed", stats.duplicates_removed.to_string().blue()),
            (
                "Errors",
                if stats.errors > 0 {
                    stats.errors.to_string().red().bold()
                } else {
                    stats.errors.to_string().normal()
                },
            ),
        ];

        let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        println!("{}", "-".repeat(width + 10));
        for (name, value) in &rows {
            println!("{:<width$} | {}", name, value, width = width);
        }
        println!("{}", "-".repeat(width + 10));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_event_line_contains_path_and_reason() {
        colored::control::set_override(false);
        let event = FileEvent::new(
            Path::new("/data/a.jpg"),
            Outcome::Renamed,
            "different size".to_string(),
        );
        let line = OutputFormatter::event_line(&event);
        assert!(line.contains("Renamed"));
        assert!(line.contains("/data/a.jpg"));
        assert!(line.contains("(different size)"));
    }

    #[test]
    fn test_progress_bar_length() {
        let pb = OutputFormatter::create_progress_bar(7);
        assert_eq!(pb.length(), Some(7));
    }
}
