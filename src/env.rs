use std::collections::BTreeMap;

use tracing::trace;

use crate::catalog::Field;
use crate::coerce::coerce;
use crate::error::LayerfigError;
use crate::setting::Settings;
use crate::types::EnvConfig;

const ORIGIN: &str = "environment";

/// Apply environment variables to `root`.
///
/// Every field is looked up under two names, in order:
///
/// 1. its `env=` name, uppercased, never prefixed;
/// 2. its full path joined by the separator, behind `PREFIX<sep>` when a
///    prefix is set, uppercased (`MYAPP_DATABASE_URL`).
///
/// Both are applied when present, so the computed name wins.
/// Variable names are matched ignoring case.
///
/// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
pub fn read_env(
    root: &mut dyn Settings,
    fields: &[Field],
    config: &EnvConfig,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Result<(), LayerfigError> {
    let index = index_vars(vars);

    for field in fields {
        for name in env_names(field, config) {
            let Some(value) = index.get(&name) else {
                continue;
            };
            let slot = field.slot(root)?;
            coerce(slot, value).map_err(|source| LayerfigError::InvalidValue {
                key: name.clone(),
                origin: ORIGIN.to_string(),
                source,
            })?;
            trace!(event = "layerfig.env.applied", field = %field.path(), var = %name);
        }
    }
    Ok(())
}

/// Candidate variable names for `field`, uppercased, in application order.
pub fn env_names(field: &Field, config: &EnvConfig) -> Vec<String> {
    let mut names = Vec::with_capacity(2);
    if let Some(name) = &field.config.default_env_name {
        names.push(name.to_uppercase());
    }
    let path = field.full_name(&config.separator);
    let distinct = match &config.prefix {
        Some(prefix) => format!("{prefix}{}{path}", config.separator),
        None => path,
    };
    names.push(distinct.to_uppercase());
    names
}

/// Index variables by their uppercased name.
///
/// When several names collapse to the same key, a name that is already
/// uppercase wins; otherwise the lexicographically greatest name wins.
fn index_vars(vars: impl IntoIterator<Item = (String, String)>) -> BTreeMap<String, String> {
    let mut ranked: BTreeMap<String, (String, String)> = BTreeMap::new();
    for (name, value) in vars {
        let upper = name.to_uppercase();
        let replace = match ranked.get(&upper) {
            Some((existing, _)) => rank(&name, &upper) > rank(existing, &upper),
            None => true,
        };
        if replace {
            ranked.insert(upper, (name, value));
        }
    }
    ranked
        .into_iter()
        .map(|(upper, (_, value))| (upper, value))
        .collect()
}

fn rank<'a>(name: &'a str, upper: &str) -> (bool, &'a str) {
    (name == upper, name)
}
