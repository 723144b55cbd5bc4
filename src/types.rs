//! Configuration of the three sources a [`Collector`](crate::Collector) reads.
//!
//! Each source has its own config struct with defaults and a `disabled`
//! switch. The collector exposes them through builder setters, but they can
//! also be built directly and assigned to the collector's public fields.

use std::path::PathBuf;

/// Where to search for config files.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    /// Requires an app name.
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".myapp")`.
    Home(&'static str),
    /// Current working directory.
    Cwd,
    /// An explicit directory.
    Path(PathBuf),
    /// The current working directory and its parents, shallowest first.
    Ancestors(Boundary),
}

/// How far [`SearchPath::Ancestors`] walks up from the working directory.
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    /// Walk up to the filesystem root.
    Root,
    /// Stop (inclusive) at the first directory containing an entry with this name.
    Marker(&'static str),
}

/// Config file discovery and decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct FilesConfig {
    /// Directories to scan, in order. Later matches overwrite earlier ones.
    pub locations: Vec<SearchPath>,
    /// File name without extension; `config` matches `config.yaml`, `config.json`, ...
    pub base_name: String,
    /// Separator of nested keys in `file=` annotations and path lookups.
    pub separator: String,
    /// Needed by [`SearchPath::Platform`].
    pub app_name: Option<String>,
    pub disabled: bool,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            locations: vec![SearchPath::Cwd],
            base_name: "config".to_string(),
            separator: ".".to_string(),
            app_name: None,
            disabled: false,
        }
    }
}

/// Environment variable lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvConfig {
    /// Prepended (with the separator) to computed variable names.
    /// Explicit `env=` names are never prefixed.
    pub prefix: Option<String>,
    pub separator: String,
    pub disabled: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            separator: "_".to_string(),
            disabled: false,
        }
    }
}

/// Command-line flag parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagsConfig {
    /// Joins the path segments of a field into its specific flag name.
    pub separator: String,
    pub disabled: bool,
}

impl Default for FlagsConfig {
    fn default() -> Self {
        Self {
            separator: "-".to_string(),
            disabled: false,
        }
    }
}
