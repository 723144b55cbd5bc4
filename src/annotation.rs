//! Parser for per-field `#[setting("...")]` annotations.
//!
//! Grammar: a comma separated list of `key=value` pairs where the key is one
//! of `env`, `file` or `flag`:
//!
//! ```text
//! env=DATABASE_URL,file=db.url,flag=u url
//! ```
//!
//! `flag` takes up to two space separated tokens in any order: a single
//! character short alias and a long name.

use thiserror::Error;

const ENV_KEY: &str = "env";
const FILE_KEY: &str = "file";
const FLAG_KEY: &str = "flag";
const FLAG_SPEC_SEPARATOR: char = ' ';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("annotation entry '{0}' is not in key=value form")]
    MissingValue(String),

    #[error("annotation entry '{0}' has an empty key or value")]
    EmptyPart(String),

    #[error("unknown annotation key '{0}' (expected env, file or flag)")]
    UnknownKey(String),

    #[error("malformed flag spec '{spec}': {reason}")]
    MalformedFlag { spec: String, reason: &'static str },
}

/// Parsed per-source naming metadata of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterConfig {
    /// Explicit key to look up in config files, in addition to the field path.
    pub default_file_field: Option<String>,
    /// Explicit environment variable name, used without prefix.
    pub default_env_name: Option<String>,
    pub flag: FlagSpec,
}

/// The `flag=` part of an annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSpec {
    /// Long flag name, possibly shared by several fields.
    pub default_name: Option<String>,
    pub short: Option<char>,
}

/// Parse an annotation string. The empty string yields the empty config.
pub fn parse(annotation: &str) -> Result<ParameterConfig, AnnotationError> {
    let mut config = ParameterConfig::default();
    if annotation.is_empty() {
        return Ok(config);
    }

    for entry in annotation.split(',') {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| AnnotationError::MissingValue(entry.to_string()))?;
        if key.is_empty() || value.is_empty() {
            return Err(AnnotationError::EmptyPart(entry.to_string()));
        }

        match key {
            ENV_KEY => config.default_env_name = Some(value.to_string()),
            FILE_KEY => config.default_file_field = Some(value.to_string()),
            FLAG_KEY => config.flag = parse_flag(value)?,
            other => return Err(AnnotationError::UnknownKey(other.to_string())),
        }
    }

    Ok(config)
}

fn parse_flag(spec: &str) -> Result<FlagSpec, AnnotationError> {
    let malformed = |reason| AnnotationError::MalformedFlag {
        spec: spec.to_string(),
        reason,
    };

    let tokens: Vec<&str> = spec.split(FLAG_SPEC_SEPARATOR).collect();
    if tokens.len() > 2 {
        return Err(malformed("more than two tokens"));
    }

    let mut flag = FlagSpec::default();
    for token in tokens {
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (None, _) => return Err(malformed("empty token")),
            (Some(short), None) => {
                if short == '-' {
                    return Err(malformed("'-' cannot be a short alias"));
                }
                if flag.short.replace(short).is_some() {
                    return Err(malformed("two short aliases"));
                }
            }
            (Some(_), Some(_)) => {
                if token.starts_with('-') || token.contains('=') {
                    return Err(malformed("long names cannot start with '-' or contain '='"));
                }
                if flag.default_name.replace(token.to_string()).is_some() {
                    return Err(malformed("two long names"));
                }
            }
        }
    }

    Ok(flag)
}
