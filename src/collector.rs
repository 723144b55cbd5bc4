use tracing::debug;

use crate::catalog;
use crate::env;
use crate::error::LayerfigError;
use crate::file;
use crate::flags::FlagRegistry;
use crate::setting::Settings;
use crate::types::{EnvConfig, FilesConfig, FlagsConfig, SearchPath};

/// Environment variables and command-line arguments to merge from.
///
/// [`Collector::get`] takes them from the process; tests and embedders pass
/// their own to [`Collector::get_with`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sources {
    pub env_vars: Vec<(String, String)>,
    /// Arguments without the binary name.
    pub args: Vec<String>,
}

impl Sources {
    /// The current process environment and arguments. Non-UTF-8 names and
    /// values are converted lossily.
    pub fn process() -> Self {
        Self {
            env_vars: std::env::vars_os()
                .map(|(k, v)| {
                    (
                        k.to_string_lossy().into_owned(),
                        v.to_string_lossy().into_owned(),
                    )
                })
                .collect(),
            args: std::env::args_os()
                .skip(1)
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
        }
    }

    pub fn env_var(mut self, name: &str, value: &str) -> Self {
        self.env_vars.push((name.to_string(), value.to_string()));
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Merges files, environment variables and flags into a settings value.
///
/// Sources are applied in a fixed order, each overwriting what the previous
/// one set:
///
/// ```text
/// Struct defaults      whatever the value held before the call
///        ↑ overridden by
/// Config files         search paths in order, later paths win
///        ↑ overridden by
/// Environment vars     env= name, then [PREFIX_]PATH
///        ↑ overridden by
/// Flags                --default-name / -s, then --full-path
/// ```
///
/// Every source is sparse: a field is only written when the source names it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collector {
    pub files: FilesConfig,
    pub env: EnvConfig,
    pub flags: FlagsConfig,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default search paths (`[Cwd]`) entirely.
    ///
    /// Paths are applied in order: a file found in a later path overrides
    /// values from earlier ones.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.files.locations = paths;
        self
    }

    /// Append a search path to the current list.
    pub fn add_search_path(mut self, path: SearchPath) -> Self {
        self.files.locations.push(path);
        self
    }

    /// Override the config file base name (default: `"config"`).
    pub fn base_name(mut self, name: &str) -> Self {
        self.files.base_name = name.to_string();
        self
    }

    /// Override the nested key separator in files (default: `"."`).
    pub fn file_separator(mut self, separator: &str) -> Self {
        self.files.separator = separator.to_string();
        self
    }

    /// Set the application name, required by [`SearchPath::Platform`].
    pub fn app_name(mut self, name: &str) -> Self {
        self.files.app_name = Some(name.to_string());
        self
    }

    /// Disable config file loading entirely.
    pub fn no_files(mut self) -> Self {
        self.files.disabled = true;
        self
    }

    /// Prefix computed environment variable names with `{prefix}{separator}`.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env.prefix = Some(prefix.to_string());
        self
    }

    /// Override the environment variable separator (default: `"_"`).
    pub fn env_separator(mut self, separator: &str) -> Self {
        self.env.separator = separator.to_string();
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env.disabled = true;
        self
    }

    /// Override the separator of specific flag names (default: `"-"`).
    pub fn flag_separator(mut self, separator: &str) -> Self {
        self.flags.separator = separator.to_string();
        self
    }

    /// Disable flag parsing entirely.
    pub fn no_flags(mut self) -> Self {
        self.flags.disabled = true;
        self
    }

    /// Merge the process environment and arguments into `target`.
    pub fn get<T: Settings>(&self, target: &mut T) -> Result<(), LayerfigError> {
        self.get_with(target, Sources::process())
    }

    /// Merge `sources` into `target`.
    ///
    /// Annotation and flag alias errors are reported before any source is
    /// read. Any later error aborts the merge, but fields written before it
    /// keep their new values.
    pub fn get_with<T: Settings>(
        &self,
        target: &mut T,
        sources: Sources,
    ) -> Result<(), LayerfigError> {
        let fields = catalog::build(target)?;
        let registry = if self.flags.disabled {
            None
        } else {
            Some(FlagRegistry::build(&fields, &self.flags)?)
        };
        debug!(event = "layerfig.collect.started", fields = fields.len());

        if self.files.disabled {
            debug!(event = "layerfig.collect.files_skipped");
        } else {
            match file::read_files(target, &fields, &self.files) {
                Ok(()) => {}
                Err(e) if e.is_soft() => {
                    debug!(event = "layerfig.collect.no_file_found", base_name = %self.files.base_name);
                }
                Err(e) => return Err(e),
            }
        }

        if self.env.disabled {
            debug!(event = "layerfig.collect.env_skipped");
        } else {
            env::read_env(target, &fields, &self.env, sources.env_vars)?;
        }

        match &registry {
            Some(registry) => registry.read_flags(target, &fields, &sources.args)?,
            None => debug!(event = "layerfig.collect.flags_skipped"),
        }

        debug!(event = "layerfig.collect.completed");
        Ok(())
    }
}

/// Merge the process environment and arguments into `target` with the
/// default [`Collector`].
pub fn get<T: Settings>(target: &mut T) -> Result<(), LayerfigError> {
    Collector::default().get(target)
}
