//! Organizer configuration.
//!
//! This module loads the organizer options from TOML configuration files and
//! compiles them into an immutable [`OrganizeSettings`] value that is handed
//! to the organizer. Comma-separated lists coming from the command line are
//! normalized by the pure parsing functions [`parse_extension_list`] and
//! [`parse_folder_list`].
//!
//! # Configuration File Format
//!
//! ```toml
//! [organize]
//! include_extensions = []
//! exclude_extensions = ["tmp", "log", "bak"]
//! min_file_size = 0
//! max_file_size = 0
//! use_timestamped_buckets = false
//! date_format = "%Y-%m-%d"
//! ignore_folders = [".git", "node_modules"]
//! ```

use chrono::format::{Item, StrftimeItems};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions that would produce a bucket named like a reserved directory.
pub const RESERVED_EXTENSIONS: &[&str] = &["existing", "quarantine"];

const DEFAULT_EXCLUDE_EXTENSIONS: &[&str] =
    &["tmp", "temp", "log", "bak", "swp", "part", "crdownload"];

const DEFAULT_IGNORE_FOLDERS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "__pycache__",
    "venv",
    ".venv",
];

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// The bucket date format is not a usable strftime string.
    InvalidDateFormat(String),
    /// The size bounds contradict each other.
    InvalidSizeRange { min: u64, max: u64 },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidDateFormat(format) => {
                write!(
                    f,
                    "Invalid date format '{}': expected strftime items without path separators",
                    format
                )
            }
            ConfigError::InvalidSizeRange { min, max } => {
                write!(
                    f,
                    "Invalid size range: min_file_size {} is larger than max_file_size {}",
                    min, max
                )
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parses a comma-separated extension list into a normalized set.
///
/// Entries are trimmed, lowercased and stripped of a leading dot; empty
/// entries are dropped. Only the text after a file name's last dot is ever
/// matched, so entries that still contain a dot are dropped with a warning.
///
/// ```
/// use organize::config::parse_extension_list;
///
/// let set = parse_extension_list(" .JPG, png,,Tar.GZ ");
/// assert!(set.contains("jpg"));
/// assert!(set.contains("png"));
/// assert!(!set.contains("tar.gz"));
/// assert_eq!(set.len(), 2);
/// ```
pub fn parse_extension_list(list: &str) -> HashSet<String> {
    normalize_extensions(list.split(','))
}

/// Parses a comma-separated folder list into a lowercase set.
pub fn parse_folder_list(list: &str) -> HashSet<String> {
    normalize_folders(list.split(','))
}

fn normalize_extensions<I, S>(items: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .filter(|s| {
            if s.contains('.') {
                warn!("Ignoring extension '{}': only the part after the last dot is matched", s);
                return false;
            }
            true
        })
        .collect()
}

fn normalize_folders<I, S>(items: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().trim_end_matches(['/', '\\']).to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Configuration as read from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizeConfig {
    #[serde(default)]
    pub organize: OrganizeOptions,
}

/// The `[organize]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeOptions {
    /// Extensions to organize; empty means every extension.
    #[serde(default)]
    pub include_extensions: Vec<String>,

    /// Extensions that are always quarantined.
    #[serde(default = "default_exclude_extensions")]
    pub exclude_extensions: Vec<String>,

    /// Minimum file size in bytes, 0 for no lower bound.
    #[serde(default)]
    pub min_file_size: u64,

    /// Maximum file size in bytes, 0 for no upper bound.
    #[serde(default)]
    pub max_file_size: u64,

    /// Append the run date to every bucket name.
    #[serde(default)]
    pub use_timestamped_buckets: bool,

    /// strftime format of the bucket date suffix.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Top-level folders that are never walked.
    #[serde(default = "default_ignore_folders")]
    pub ignore_folders: Vec<String>,
}

fn default_exclude_extensions() -> Vec<String> {
    DEFAULT_EXCLUDE_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_ignore_folders() -> Vec<String> {
    DEFAULT_IGNORE_FOLDERS.iter().map(|s| s.to_string()).collect()
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        Self {
            include_extensions: Vec::new(),
            exclude_extensions: default_exclude_extensions(),
            min_file_size: 0,
            max_file_size: 0,
            use_timestamped_buckets: false,
            date_format: default_date_format(),
            ignore_folders: default_ignore_folders(),
        }
    }
}

impl OrganizeConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.organizerc.toml` in the current directory
    /// 3. Look for `~/.config/organize/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any file found cannot be parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".organizerc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("organize")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Validate and normalize into the settings used for a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the date format is unusable or the size bounds
    /// are inverted.
    pub fn compile(self) -> Result<OrganizeSettings, ConfigError> {
        OrganizeSettings::new(self.organize)
    }
}

/// Immutable, normalized options for one organizer run.
///
/// Only built through [`OrganizeSettings::new`] (or `Default`), so the date
/// format is always renderable and the reserved extensions always excluded.
#[derive(Debug, Clone)]
pub struct OrganizeSettings {
    include_extensions: HashSet<String>,
    exclude_extensions: HashSet<String>,
    min_file_size: u64,
    max_file_size: u64,
    use_timestamped_buckets: bool,
    date_format: String,
    ignore_folders: HashSet<String>,
}

impl OrganizeSettings {
    /// Validates and normalizes raw options.
    ///
    /// # Errors
    ///
    /// Returns an error if the date format is unusable or the size bounds
    /// are inverted.
    ///
    /// ```
    /// use organize::config::{OrganizeOptions, OrganizeSettings};
    ///
    /// let options = OrganizeOptions {
    ///     date_format: "%Q".to_string(),
    ///     ..OrganizeOptions::default()
    /// };
    /// assert!(OrganizeSettings::new(options).is_err());
    /// ```
    pub fn new(options: OrganizeOptions) -> Result<Self, ConfigError> {
        validate_date_format(&options.date_format)?;

        if options.min_file_size > 0
            && options.max_file_size > 0
            && options.min_file_size > options.max_file_size
        {
            return Err(ConfigError::InvalidSizeRange {
                min: options.min_file_size,
                max: options.max_file_size,
            });
        }

        let mut exclude_extensions = normalize_extensions(&options.exclude_extensions);
        exclude_extensions.extend(RESERVED_EXTENSIONS.iter().map(|s| s.to_string()));

        Ok(Self {
            include_extensions: normalize_extensions(&options.include_extensions),
            exclude_extensions,
            min_file_size: options.min_file_size,
            max_file_size: options.max_file_size,
            use_timestamped_buckets: options.use_timestamped_buckets,
            date_format: options.date_format,
            ignore_folders: normalize_folders(&options.ignore_folders),
        })
    }

    /// Lowercase extensions to organize; empty means every extension.
    pub fn include_extensions(&self) -> &HashSet<String> {
        &self.include_extensions
    }

    /// Lowercase extensions that are always quarantined, reserved ones included.
    pub fn exclude_extensions(&self) -> &HashSet<String> {
        &self.exclude_extensions
    }

    pub fn min_file_size(&self) -> u64 {
        self.min_file_size
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn use_timestamped_buckets(&self) -> bool {
        self.use_timestamped_buckets
    }

    /// strftime format of the bucket date suffix.
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Lowercase names of top-level folders that are never walked.
    pub fn ignore_folders(&self) -> &HashSet<String> {
        &self.ignore_folders
    }
}

impl Default for OrganizeSettings {
    fn default() -> Self {
        let options = OrganizeOptions::default();
        let mut exclude_extensions = normalize_extensions(&options.exclude_extensions);
        exclude_extensions.extend(RESERVED_EXTENSIONS.iter().map(|s| s.to_string()));

        Self {
            include_extensions: HashSet::new(),
            exclude_extensions,
            min_file_size: 0,
            max_file_size: 0,
            use_timestamped_buckets: false,
            date_format: options.date_format,
            ignore_folders: normalize_folders(&options.ignore_folders),
        }
    }
}

fn validate_date_format(format: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidDateFormat(format.to_string());

    if format.is_empty() || format.contains(['/', '\\']) {
        return Err(invalid());
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_compiles() {
        let settings = OrganizeConfig::default().compile().unwrap();
        assert!(settings.include_extensions().is_empty());
        assert!(settings.exclude_extensions().contains("tmp"));
        assert!(settings.exclude_extensions().contains("log"));
        assert!(settings.ignore_folders().contains("node_modules"));
        assert_eq!(settings.min_file_size(), 0);
        assert_eq!(settings.max_file_size(), 0);
        assert!(!settings.use_timestamped_buckets());
    }

    #[test]
    fn test_reserved_extensions_always_excluded() {
        let config = OrganizeConfig::from_toml_str(
            r#"
            [organize]
            exclude_extensions = []
            "#,
        )
        .unwrap();
        let settings = config.compile().unwrap();
        assert!(settings.exclude_extensions().contains("existing"));
        assert!(settings.exclude_extensions().contains("quarantine"));
        assert_eq!(settings.exclude_extensions().len(), 2);
    }

    #[test]
    fn test_parse_extension_list() {
        let set = parse_extension_list("JPG, .png ,  ,mp4, tar.gz");
        let expected: HashSet<String> =
            ["jpg", "png", "mp4"].iter().map(|s| s.to_string()).collect();
        assert_eq!(set, expected);
        assert!(parse_extension_list("").is_empty());
    }

    #[test]
    fn test_parse_folder_list() {
        let set = parse_folder_list("Photos/, node_modules,Backup");
        assert!(set.contains("photos"));
        assert!(set.contains("node_modules"));
        assert!(set.contains("backup"));
    }

    #[test]
    fn test_toml_values_are_normalized() {
        let config = OrganizeConfig::from_toml_str(
            r#"
            [organize]
            include_extensions = [".JPG", "Png"]
            min_file_size = 10
            max_file_size = 1000
            use_timestamped_buckets = true
            date_format = "%Y%m%d"
            ignore_folders = ["Keep"]
            "#,
        )
        .unwrap();
        let settings = config.compile().unwrap();

        assert!(settings.include_extensions().contains("jpg"));
        assert!(settings.include_extensions().contains("png"));
        assert_eq!(settings.min_file_size(), 10);
        assert_eq!(settings.max_file_size(), 1000);
        assert!(settings.use_timestamped_buckets());
        assert_eq!(settings.date_format(), "%Y%m%d");
        assert!(settings.ignore_folders().contains("keep"));
        // Missing keys keep their defaults
        assert!(settings.exclude_extensions().contains("bak"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = OrganizeConfig::from_toml_str("").unwrap();
        assert_eq!(config.organize.date_format, "%Y-%m-%d");
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = OrganizeConfig::from_toml_str("[organize\nmin_file_size = ");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_invalid_date_format_returns_error() {
        for format in ["%Q", "%Y/%m/%d", ""] {
            let mut config = OrganizeConfig::default();
            config.organize.date_format = format.to_string();
            assert!(
                matches!(config.compile(), Err(ConfigError::InvalidDateFormat(_))),
                "format {:?} should be rejected",
                format
            );
        }
    }

    #[test]
    fn test_inverted_size_range_returns_error() {
        let mut config = OrganizeConfig::default();
        config.organize.min_file_size = 100;
        config.organize.max_file_size = 10;
        assert!(matches!(
            config.compile(),
            Err(ConfigError::InvalidSizeRange { min: 100, max: 10 })
        ));
    }

    #[test]
    fn test_dotted_extensions_from_toml_are_dropped() {
        let config = OrganizeConfig::from_toml_str(
            r#"
            [organize]
            include_extensions = ["tar.gz", "gz"]
            "#,
        )
        .unwrap();
        let settings = config.compile().unwrap();
        assert_eq!(settings.include_extensions().len(), 1);
        assert!(settings.include_extensions().contains("gz"));
    }

    #[test]
    fn test_settings_constructor_validates_options() {
        let options = OrganizeOptions {
            use_timestamped_buckets: true,
            date_format: "%Q".to_string(),
            ..OrganizeOptions::default()
        };
        assert!(matches!(
            OrganizeSettings::new(options),
            Err(ConfigError::InvalidDateFormat(_))
        ));

        let options = OrganizeOptions {
            exclude_extensions: Vec::new(),
            ..OrganizeOptions::default()
        };
        let settings = OrganizeSettings::new(options).unwrap();
        assert!(settings.exclude_extensions().contains("existing"));
    }

    #[test]
    fn test_default_settings_match_compiled_defaults() {
        let compiled = OrganizeConfig::default().compile().unwrap();
        let default = OrganizeSettings::default();
        assert_eq!(compiled.exclude_extensions(), default.exclude_extensions());
        assert_eq!(compiled.ignore_folders(), default.ignore_folders());
        assert_eq!(compiled.date_format(), default.date_format());
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let result = OrganizeConfig::load(Some(Path::new("/non/existent/organize.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }
}
