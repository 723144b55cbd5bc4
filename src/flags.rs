//! Command-line flag reader.
//!
//! Every field is reachable through up to two flag identities:
//!
//! - its **default** identity, the long name from `flag=` (shared by every
//!   field that names it);
//! - its **specific** identity, the lowercased full path joined by the flag
//!   separator (`--database-pool_size`). When that equals an identity that is
//!   already registered, the two are one flag.
//!
//! A short alias belongs to the default identity when the annotation names
//! one, otherwise to the specific identity. Two identities may not share an
//! alias.
//!
//! ```text
//! #[setting("flag=verbose v")] verbose         --verbose, -v
//! #[setting("flag=verbose")]   database.verbose --verbose, --database-verbose
//! ```
//!
//! Arguments are filtered down to tokens that address a registered identity
//! before clap sees them: unknown flags and positionals are ignored, `--`
//! ends flag parsing. Repeating a flag (under any of its spellings) keeps the
//! last value.

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::{debug, trace};

use crate::catalog::Field;
use crate::coerce::coerce;
use crate::error::LayerfigError;
use crate::setting::Settings;
use crate::types::FlagsConfig;

/// Parsed state of one flag identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagInfo {
    pub raw_value: String,
    /// `true` only when the flag was present on the command line. A flag
    /// given as `--name=` is changed with an empty value.
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Identity {
    long: String,
    shorts: Vec<char>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldFlags {
    default: Option<usize>,
    specific: usize,
}

/// The flag identities of a field catalog.
///
/// Built once per merge, before any source is read, so alias conflicts are
/// reported without touching the settings value.
#[derive(Debug, Clone, Default)]
pub struct FlagRegistry {
    identities: Vec<Identity>,
    /// Parallel to the catalog the registry was built from.
    fields: Vec<FieldFlags>,
}

impl FlagRegistry {
    pub fn build(fields: &[Field], config: &FlagsConfig) -> Result<Self, LayerfigError> {
        let mut registry = FlagRegistry::default();
        for field in fields {
            let default = field
                .config
                .flag
                .default_name
                .as_deref()
                .map(|name| registry.intern(name));
            let specific = registry.intern(&field.full_name(&config.separator).to_lowercase());
            if let Some(short) = field.config.flag.short {
                registry.attach_short(default.unwrap_or(specific), short)?;
            }
            registry.fields.push(FieldFlags { default, specific });
        }
        debug!(
            event = "layerfig.flags.registry_built",
            fields = fields.len(),
            identities = registry.identities.len()
        );
        Ok(registry)
    }

    /// Long names of all identities, in registration order.
    pub fn long_names(&self) -> impl Iterator<Item = &str> {
        self.identities.iter().map(|id| id.long.as_str())
    }

    /// Long name of the identity that owns `short`, if any.
    pub fn long_for_short(&self, short: char) -> Option<&str> {
        self.identities
            .iter()
            .find(|id| id.shorts.contains(&short))
            .map(|id| id.long.as_str())
    }

    fn intern(&mut self, long: &str) -> usize {
        if let Some(i) = self.position(long) {
            return i;
        }
        self.identities.push(Identity {
            long: long.to_string(),
            shorts: Vec::new(),
        });
        self.identities.len() - 1
    }

    fn position(&self, long: &str) -> Option<usize> {
        self.identities.iter().position(|id| id.long == long)
    }

    fn attach_short(&mut self, target: usize, short: char) -> Result<(), LayerfigError> {
        if let Some(owner) = self.identities.iter().position(|id| id.shorts.contains(&short)) {
            if owner == target {
                return Ok(());
            }
            return Err(LayerfigError::DuplicateShortFlag {
                short,
                first: self.identities[owner].long.clone(),
                second: self.identities[target].long.clone(),
            });
        }
        self.identities[target].shorts.push(short);
        Ok(())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("layerfig")
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .args_override_self(true);
        for id in &self.identities {
            let mut arg = Arg::new(id.long.clone())
                .long(id.long.clone())
                .action(ArgAction::Set)
                .num_args(1)
                .allow_hyphen_values(true)
                .value_parser(clap::value_parser!(String));
            if let Some((first, rest)) = id.shorts.split_first() {
                arg = arg.short(*first).short_aliases(rest.iter().copied());
            }
            cmd = cmd.arg(arg);
        }
        cmd
    }

    /// Keep only the tokens that address a registered identity, plus the
    /// value token that follows a flag given without an inline value.
    fn prefilter(&self, args: &[String]) -> Vec<String> {
        let mut kept = Vec::new();
        let mut tokens = args.iter();
        while let Some(token) = tokens.next() {
            if token == "--" {
                break;
            }
            let takes_next = if let Some(rest) = token.strip_prefix("--") {
                let (name, inline) = match rest.split_once('=') {
                    Some((name, _)) => (name, true),
                    None => (rest, false),
                };
                if self.position(name).is_none() {
                    continue;
                }
                !inline
            } else if let Some(rest) = token.strip_prefix('-') {
                let mut chars = rest.chars();
                let Some(short) = chars.next() else {
                    continue;
                };
                if self.long_for_short(short).is_none() {
                    continue;
                }
                chars.as_str().is_empty()
            } else {
                continue;
            };

            kept.push(token.clone());
            if takes_next && let Some(value) = tokens.next() {
                kept.push(value.clone());
            }
        }
        kept
    }

    /// Parse `args` into one [`FlagInfo`] per identity.
    pub fn parse(&self, args: &[String]) -> Result<Vec<FlagInfo>, LayerfigError> {
        let filtered = self.prefilter(args);
        let matches = self.command().try_get_matches_from(filtered)?;
        Ok(self
            .identities
            .iter()
            .map(|id| flag_info(&matches, &id.long))
            .collect())
    }

    /// Apply `args` to `root`. `fields` must be the catalog the registry was
    /// built from.
    pub fn read_flags(
        &self,
        root: &mut dyn Settings,
        fields: &[Field],
        args: &[String],
    ) -> Result<(), LayerfigError> {
        let infos = self.parse(args)?;

        for (field, flags) in fields.iter().zip(&self.fields) {
            let specific = Some(flags.specific).filter(|s| flags.default != Some(*s));
            for index in flags.default.into_iter().chain(specific) {
                let info = &infos[index];
                if !info.changed {
                    continue;
                }
                let long = &self.identities[index].long;
                let slot = field.slot(root)?;
                coerce(slot, &info.raw_value).map_err(|source| LayerfigError::InvalidValue {
                    key: format!("--{long}"),
                    origin: "flags".to_string(),
                    source,
                })?;
                trace!(event = "layerfig.flags.applied", field = %field.path(), flag = %long);
            }
        }
        Ok(())
    }
}

fn flag_info(matches: &ArgMatches, id: &str) -> FlagInfo {
    FlagInfo {
        raw_value: matches.get_one::<String>(id).cloned().unwrap_or_default(),
        changed: matches.value_source(id) == Some(ValueSource::CommandLine),
    }
}
