//! Run reporting.
//!
//! The organizer emits one [`FileEvent`] per processed file and knows nothing
//! about how those events are rendered. Implementations of [`Reporter`] turn
//! them into console output, a persistent JSON-lines log, or an in-memory
//! record.

use crate::file_organizer::{OrganizeError, OrganizeResult, RunStatistics};
use crate::output::OutputFormatter;
use indicatif::ProgressBar;
use log::warn;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Name of the default run log, created inside the organized root.
pub const DEFAULT_LOG_FILE: &str = ".organize_log.jsonl";

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Moved,
    Renamed,
    Duplicate,
    Conflict,
    Quarantined,
    Failed,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Moved => "moved",
            Outcome::Renamed => "renamed",
            Outcome::Duplicate => "duplicate",
            Outcome::Conflict => "conflict",
            Outcome::Quarantined => "quarantined",
            Outcome::Failed => "failed",
        }
    }
}

/// One processed file, as seen by reporters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// The original path of the file.
    pub path: PathBuf,
    pub outcome: Outcome,
    /// Human-readable explanation of the outcome.
    pub reason: String,
}

impl FileEvent {
    pub fn new(path: &Path, outcome: Outcome, reason: String) -> Self {
        Self {
            path: path.to_path_buf(),
            outcome,
            reason,
        }
    }
}

/// Receives the events of one organizer run.
pub trait Reporter {
    /// Called once with the number of files about to be processed.
    fn start(&mut self, _total: usize) {}

    /// Called once per processed file.
    fn report(&mut self, event: &FileEvent);

    /// Called once with the final statistics.
    fn finish(&mut self, _stats: &RunStatistics) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<FileEvent>,
    pub summary: Option<RunStatistics>,
}

impl Reporter for RecordingReporter {
    fn report(&mut self, event: &FileEvent) {
        self.events.push(event.clone());
    }

    fn finish(&mut self, stats: &RunStatistics) {
        self.summary = Some(*stats);
    }
}

/// Forwards every call to each contained reporter in order.
#[derive(Default)]
pub struct Reporters {
    inner: Vec<Box<dyn Reporter>>,
}

impl Reporters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reporter: Box<dyn Reporter>) {
        self.inner.push(reporter);
    }
}

impl Reporter for Reporters {
    fn start(&mut self, total: usize) {
        for reporter in &mut self.inner {
            reporter.start(total);
        }
    }

    fn report(&mut self, event: &FileEvent) {
        for reporter in &mut self.inner {
            reporter.report(event);
        }
    }

    fn finish(&mut self, stats: &RunStatistics) {
        for reporter in &mut self.inner {
            reporter.finish(stats);
        }
    }
}

/// Prints colored progress lines and a final summary table.
pub struct ConsoleReporter {
    quiet: bool,
    progress: Option<ProgressBar>,
}

impl ConsoleReporter {
    /// With `quiet`, only failures and the summary are printed.
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            progress: None,
        }
    }

    fn print_line(&self, line: String, is_error: bool) {
        match &self.progress {
            Some(pb) => pb.suspend(|| {
                if is_error {
                    eprintln!("{}", line);
                } else {
                    println!("{}", line);
                }
            }),
            None if is_error => eprintln!("{}", line),
            None => println!("{}", line),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn start(&mut self, total: usize) {
        if total > 0 {
            self.progress = Some(OutputFormatter::create_progress_bar(total as u64));
        }
    }

    fn report(&mut self, event: &FileEvent) {
        let is_error = matches!(event.outcome, Outcome::Quarantined | Outcome::Failed);
        if !self.quiet || is_error {
            self.print_line(OutputFormatter::event_line(event), is_error);
        }
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
    }

    fn finish(&mut self, stats: &RunStatistics) {
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
        if stats.cancelled {
            OutputFormatter::warning("Run interrupted; files already moved stay where they are.");
        }
        OutputFormatter::summary_table(stats);
    }
}

#[derive(Serialize)]
struct EventRecord<'a> {
    timestamp: String,
    path: String,
    outcome: Outcome,
    reason: &'a str,
}

#[derive(Serialize)]
struct SummaryRecord<'a> {
    timestamp: String,
    summary: &'a RunStatistics,
}

/// Appends one JSON object per event to a log file.
pub struct JsonLogReporter {
    path: PathBuf,
    writer: BufWriter<File>,
    write_failed: bool,
}

impl JsonLogReporter {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> OrganizeResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| OrganizeError::LogWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            write_failed: false,
        })
    }

    fn write_record<T: Serialize>(&mut self, record: &T) {
        if self.write_failed {
            return;
        }
        let result = serde_json::to_string(record)
            .map_err(std::io::Error::from)
            .and_then(|line| writeln!(self.writer, "{}", line));
        if let Err(e) = result {
            // Warn once, then stop trying
            warn!("Could not write log file {}: {}", self.path.display(), e);
            self.write_failed = true;
        }
    }
}

impl Reporter for JsonLogReporter {
    fn report(&mut self, event: &FileEvent) {
        let record = EventRecord {
            timestamp: chrono::Local::now().to_rfc3339(),
            path: event.path.to_string_lossy().into_owned(),
            outcome: event.outcome,
            reason: &event.reason,
        };
        self.write_record(&record);
    }

    fn finish(&mut self, stats: &RunStatistics) {
        let record = SummaryRecord {
            timestamp: chrono::Local::now().to_rfc3339(),
            summary: stats,
        };
        self.write_record(&record);
        if let Err(e) = self.writer.flush() {
            warn!("Could not flush log file {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    fn event(name: &str, outcome: Outcome) -> FileEvent {
        FileEvent::new(Path::new(name), outcome, format!("{} happened", outcome.label()))
    }

    #[test]
    fn test_recording_reporter_keeps_events() {
        let mut reporter = RecordingReporter::default();
        reporter.report(&event("a.jpg", Outcome::Moved));
        reporter.finish(&RunStatistics::default());

        assert_eq!(reporter.events.len(), 1);
        assert_eq!(reporter.summary, Some(RunStatistics::default()));
    }

    #[test]
    fn test_json_log_appends_lines() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log_path = temp_dir.path().join("run.jsonl");

        for _ in 0..2 {
            let mut reporter = JsonLogReporter::open(&log_path).unwrap();
            reporter.report(&event("a.jpg", Outcome::Duplicate));
            reporter.finish(&RunStatistics {
                total_files: 1,
                duplicates_removed: 1,
                ..RunStatistics::default()
            });
        }

        let content = fs::read_to_string(&log_path).unwrap();
        let lines: Vec<Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).expect("Each line should be JSON"))
            .collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["outcome"], "duplicate");
        assert_eq!(lines[0]["path"], "a.jpg");
        assert_eq!(lines[0]["reason"], "duplicate happened");
        assert!(lines[0]["timestamp"].is_string());
        assert_eq!(lines[1]["summary"]["duplicates_removed"], 1);
    }

    #[test]
    fn test_json_log_open_fails_for_missing_directory() {
        let result = JsonLogReporter::open(Path::new("/non/existent/dir/run.jsonl"));
        assert!(matches!(result, Err(OrganizeError::LogWriteFailed { .. })));
    }

    #[test]
    fn test_reporters_fan_out() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log_path = temp_dir.path().join("run.jsonl");

        let mut reporters = Reporters::new();
        reporters.push(Box::new(JsonLogReporter::open(&log_path).unwrap()));
        reporters.push(Box::new(JsonLogReporter::open(&log_path).unwrap()));
        reporters.report(&event("b.txt", Outcome::Moved));
        reporters.finish(&RunStatistics::default());

        let content = fs::read_to_string(&log_path).unwrap();
        assert_eq!(content.lines().filter(|l| l.contains("b.txt")).count(), 2);
    }
}
