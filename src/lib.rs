//! Typed settings merged from defaults, config files, environment variables
//! and command-line flags.
//!
//! Layerfig fills a settings struct you already own. The struct's current
//! values are the defaults; every source then overwrites only the fields it
//! names, in a fixed order.
//!
//! ```ignore
//! use layerfig::Settings;
//!
//! #[derive(Settings)]
//! struct Server {
//!     #[setting("env=PORT,flag=p port")]
//!     port: u16,
//!     database: Database,
//! }
//!
//! #[derive(Settings)]
//! struct Database {
//!     url: String,
//!     pool_size: u32,
//! }
//!
//! let mut server = Server { port: 3000, database: Database::default() };
//! layerfig::get(&mut server)?;
//! ```
//!
//! That single call reads `config.*` from the working directory, the
//! `PORT` and `DATABASE_URL` style environment variables, and flags such as
//! `--port`, `-p` and `--database-pool_size`.
//!
//! # Layer precedence
//!
//! ```text
//! Struct defaults       the values held before the call
//!        ↑ overridden by
//! Config files          search paths in order, later paths win
//!        ↑ overridden by
//! Environment vars      NAME from env=, then [PREFIX_]DATABASE_URL
//!        ↑ overridden by
//! Flags                 --name / -n from flag=, then --database-url
//! ```
//!
//! Every layer is **sparse**. Only fields a source names are written; the
//! rest fall through to the layer below. The merge is not transactional: if a
//! value fails to parse, the error is returned and fields written before it
//! keep their new values.
//!
//! # Settings structs
//!
//! `#[derive(Settings)]` works on structs with named fields. A field can be
//! any type implementing [`Setting`]:
//!
//! - integers, floats, `bool`, `String`, `PathBuf`;
//! - `num_complex::Complex<f32>` / `Complex<f64>` (`1+2i`);
//! - `std::time::Duration` (`10s`, `1h30m`);
//! - `chrono::DateTime<Utc>` / `DateTime<FixedOffset>` (RFC 3339);
//! - `Vec<String>` (`a,b,c`) and `HashMap` / `BTreeMap<String, String>`
//!   (`k1=v1,k2=v2`);
//! - `Option<T>` of any of the above, and `tracing::Level`;
//! - any `FromStr + Default` type registered with [`text_setting!`];
//! - another `#[derive(Settings)]` struct, which nests;
//! - `Box<T>` of any of the above.
//!
//! A nested struct inside `Some` or a `Box` is filled field by field like a
//! plain one. An optional nested struct must implement `Default`; while it is
//! `None` its fields are not visited.
//!
//! `#[setting(skip)]` leaves a field out of every source.
//!
//! # Annotations
//!
//! `#[setting("...")]` takes a comma separated list of `key=value` pairs:
//!
//! | Key | Effect |
//! |-----|--------|
//! | `file=db.url` | look up this key in config files before the field path |
//! | `env=DATABASE_URL` | read this variable (never prefixed) before the computed one |
//! | `flag=u url` | long name and/or one-character short alias |
//!
//! Malformed annotations are reported as [`LayerfigError::Annotation`]
//! before any source is read.
//!
//! # Config files
//!
//! [`Collector::search_paths`] takes a list of [`SearchPath`] variants
//! scanned in order:
//!
//! - **`Cwd`** (default), **`Path(dir)`**, **`Home(".myapp")`**;
//! - **`Platform`**, the OS config directory, which needs
//!   [`Collector::app_name`];
//! - **`Ancestors(boundary)`**, the working directory and its parents,
//!   nearest last. `Boundary::Marker(".git")` stops at the repository root.
//!
//! In each directory, every file whose name minus extension is the base name
//! (`config` by default) is decoded as YAML, JSON or TOML, whichever accepts
//! it. Keys match field paths ignoring case. Having no file at all is fine.
//!
//! # Environment variables
//!
//! | Field | Env var | With `env_prefix("MYAPP")` |
//! |-------|---------|------------------------------|
//! | `host` | `HOST` | `MYAPP_HOST` |
//! | `database.url` | `DATABASE_URL` | `MYAPP_DATABASE_URL` |
//!
//! Names are matched ignoring case. Values are parsed according to the
//! field's type; an empty value resets the field to its zero value.
//!
//! # Flags
//!
//! Each field gets a flag named after its lowercased path joined with `-`
//! (`--database-pool_size`), plus the long name and short alias from its
//! `flag=` annotation. Several fields can share a `flag=` name; passing it
//! sets all of them, and a field's own path flag still wins. Unknown flags and
//! positional arguments are ignored, so the same argv can be handed to your
//! own CLI parser.
//!
//! `--name=` (an empty value) resets the field; leaving the flag out leaves
//! the field alone.
//!
//! # Error handling
//!
//! All fallible operations return [`LayerfigError`]. See the [`error`]
//! module for the full set.
//!
//! # Logging
//!
//! Layerfig emits `tracing` events (`layerfig.*`) at `debug` and `trace`
//! level: what was searched, which files were loaded and which field came from
//! which variable or flag. Values are never logged.

extern crate self as layerfig;

pub mod error;
pub mod types;

mod annotation;
mod catalog;
mod cimap;
mod coerce;
mod collector;
mod env;
mod file;
mod flags;
mod setting;

#[cfg(test)]
mod fixtures;

pub use annotation::{AnnotationError, FlagSpec, ParameterConfig};
pub use catalog::Field;
pub use cimap::{CiMap, Node};
pub use coerce::{CoerceError, FromText, coerce};
pub use collector::{Collector, Sources, get};
pub use error::LayerfigError;
pub use flags::{FlagInfo, FlagRegistry};
pub use layerfig_derive::Settings;
pub use setting::{FieldSlot, Kind, Setting, Settings};
pub use types::{Boundary, EnvConfig, FilesConfig, FlagsConfig, SearchPath};
