//! File discovery and the file source reader.
//!
//! # Discovery
//!
//! Each [`SearchPath`] variant is resolved to one or more concrete directories:
//!
//! - `Platform`, `Home`, `Cwd`, `Path` resolve to a single directory.
//! - `Ancestors(boundary)` expands inline into multiple directories by walking
//!   from the current working directory up toward the filesystem root.
//!   Directories are emitted **shallowest first** so the directory closest to
//!   CWD is applied last and wins.
//!
//! Every directory is then scanned for regular files whose name, minus the
//! last extension, equals the configured base name. With base name `config`,
//! `config.yaml`, `config.json` and `config.toml` all match; matches within a
//! directory are taken in file name order.
//!
//! # Decoding
//!
//! The format is not taken from the extension. Content is decoded as YAML,
//! then JSON, then TOML, and the first decoder that accepts it wins.
//!
//! # Application
//!
//! For every catalog field, the explicit `file=` key is looked up first and
//! the field's full path second; only the first hit is applied. A `null`
//! value resets the field to its zero value. A value that does not decode
//! structurally but is a string (`timeout: "10s"`) is retried as text.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::catalog::Field;
use crate::cimap::{CiMap, Node};
use crate::coerce::coerce;
use crate::error::LayerfigError;
use crate::setting::{Kind, Settings};
use crate::types::{Boundary, FilesConfig, SearchPath};

/// Resolve a single-directory [`SearchPath`] to a concrete path.
///
/// `app_name` is used by `SearchPath::Platform` to construct the platform-specific
/// config directory (e.g. `~/.config/{app_name}/` on Linux).
///
/// Returns `Ok(None)` if the path cannot be resolved (e.g. no home directory
/// found), and for `Ancestors`, which expands to many (see [`expand_ancestors`]).
pub fn resolve_search_path(
    sp: &SearchPath,
    app_name: Option<&str>,
) -> Result<Option<PathBuf>, LayerfigError> {
    let dir = match sp {
        SearchPath::Platform => {
            let app_name = app_name.ok_or(LayerfigError::AppNameRequired)?;
            directories::ProjectDirs::from("", "", app_name).map(|p| p.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => {
            directories::UserDirs::new().map(|user| user.home_dir().join(subdir))
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
        SearchPath::Ancestors(_) => None,
    };
    Ok(dir)
}

/// Expand an [`Ancestors`](SearchPath::Ancestors) variant into concrete directories.
///
/// Walks from the current working directory toward the filesystem root, collecting
/// directories in **shallowest-first** order (root end first, CWD last).
///
/// The [`Boundary`] controls where the walk ends:
/// - [`Root`](Boundary::Root) continues to the filesystem root.
/// - [`Marker(name)`](Boundary::Marker) stops (inclusive) at the first directory
///   containing a file or subdirectory named `name`. Falls back to root if the
///   marker is never found.
pub fn expand_ancestors(boundary: &Boundary) -> Vec<PathBuf> {
    let Ok(cwd) = std::env::current_dir() else {
        return vec![];
    };
    expand_ancestors_from(cwd, boundary)
}

/// Like [`expand_ancestors`] but starting from an explicit directory instead of CWD.
pub fn expand_ancestors_from(start: PathBuf, boundary: &Boundary) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let mut current = start.as_path();

    loop {
        dirs.push(current.to_path_buf());

        if let Boundary::Marker(name) = boundary
            && current.join(name).exists()
        {
            break;
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => break, // reached root
        }
    }

    // shallowest first, CWD last
    dirs.reverse();
    dirs
}

/// Expand all search paths into a flat, ordered list of concrete directories.
pub fn expand_search_paths(
    search_paths: &[SearchPath],
    app_name: Option<&str>,
) -> Result<Vec<PathBuf>, LayerfigError> {
    expand_search_paths_from(search_paths, app_name, None)
}

/// Like [`expand_search_paths`] but with an optional explicit start directory for
/// `Ancestors` expansion (instead of CWD). Used in tests.
pub fn expand_search_paths_from(
    search_paths: &[SearchPath],
    app_name: Option<&str>,
    ancestors_start: Option<&Path>,
) -> Result<Vec<PathBuf>, LayerfigError> {
    let mut dirs = Vec::new();
    for sp in search_paths {
        match sp {
            SearchPath::Ancestors(boundary) => {
                let expanded = match ancestors_start {
                    Some(start) => expand_ancestors_from(start.to_path_buf(), boundary),
                    None => expand_ancestors(boundary),
                };
                dirs.extend(expanded);
            }
            other => {
                if let Some(dir) = resolve_search_path(other, app_name)? {
                    dirs.push(dir);
                }
            }
        }
    }
    Ok(dirs)
}

/// List the files in `dirs` whose stem is `base_name`, in application order.
///
/// Directories that do not exist or cannot be listed are skipped.
pub fn find_config_files(dirs: &[PathBuf], base_name: &str) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for dir in dirs {
        let Ok(entries) = std::fs::read_dir(dir) else {
            trace!(event = "layerfig.file.dir_skipped", dir = %dir.display());
            continue;
        };
        let mut matches: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.file_stem().is_some_and(|stem| stem == base_name))
            .collect();
        matches.sort();
        found.extend(matches);
    }
    found
}

/// Decode file content as YAML, JSON or TOML, in that order.
pub fn decode(path: &Path, bytes: &[u8]) -> Result<CiMap, LayerfigError> {
    if let Ok(map) = serde_yaml::from_slice::<CiMap>(bytes) {
        return Ok(map);
    }
    if let Ok(map) = serde_json::from_slice::<CiMap>(bytes) {
        return Ok(map);
    }
    if let Ok(text) = std::str::from_utf8(bytes)
        && let Ok(map) = toml::from_str::<CiMap>(text)
    {
        return Ok(map);
    }
    Err(LayerfigError::UnsupportedFileType {
        path: path.to_path_buf(),
    })
}

/// Apply every matching config file to `root`.
///
/// Returns [`LayerfigError::NoFileFound`] when no location holds a matching
/// file; callers treat that as soft (see [`LayerfigError::is_soft`]).
pub fn read_files(
    root: &mut dyn Settings,
    fields: &[Field],
    config: &FilesConfig,
) -> Result<(), LayerfigError> {
    let dirs = expand_search_paths(&config.locations, config.app_name.as_deref())?;
    let files = find_config_files(&dirs, &config.base_name);
    debug!(
        event = "layerfig.file.search_completed",
        dirs = dirs.len(),
        found = files.len(),
        base_name = %config.base_name
    );

    if files.is_empty() {
        return Err(LayerfigError::NoFileFound {
            base_name: config.base_name.clone(),
        });
    }

    for path in files {
        let bytes = std::fs::read(&path).map_err(|source| LayerfigError::IoError {
            path: path.clone(),
            source,
        })?;
        let map = decode(&path, &bytes)?.with_separator(&config.separator);
        debug!(event = "layerfig.file.loaded", path = %path.display(), keys = map.len());
        apply_map(root, fields, &map, &path)?;
    }
    Ok(())
}

/// Apply one decoded file to `root`.
pub fn apply_map(
    root: &mut dyn Settings,
    fields: &[Field],
    map: &CiMap,
    origin: &Path,
) -> Result<(), LayerfigError> {
    for field in fields {
        let Some((key, node)) = lookup(field, map) else {
            continue;
        };
        let slot = field.slot(root)?;
        let invalid = |source| LayerfigError::InvalidValue {
            key: key.clone(),
            origin: origin.display().to_string(),
            source,
        };

        if node.is_null() {
            slot.reset();
        } else if let Err(err) = slot.set_node(node) {
            match node.as_str() {
                Some(text) => coerce(slot, text).map_err(invalid)?,
                None if field.kind == Kind::Struct => continue,
                None => return Err(invalid(err)),
            }
        }
        trace!(event = "layerfig.file.applied", field = %field.path(), key = %key);
    }
    Ok(())
}

fn lookup<'m>(field: &Field, map: &'m CiMap) -> Option<(String, &'m Node)> {
    if let Some(key) = field.config.default_file_field.as_deref()
        && let Some(node) = map.get(key)
    {
        return Some((key.to_string(), node));
    }
    let full = field.full_name(map.separator());
    map.get(&full).map(|node| (full, node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::fixtures::test::{IndirectSettings, ServerSettings};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config_in(dir: &Path) -> FilesConfig {
        FilesConfig {
            locations: vec![SearchPath::Path(dir.to_path_buf())],
            ..FilesConfig::default()
        }
    }

    fn read_into(settings: &mut ServerSettings, config: &FilesConfig) -> Result<(), LayerfigError> {
        let fields = catalog::build(settings)?;
        read_files(settings, &fields, config)
    }

    #[test]
    fn resolve_explicit_path() {
        let p = PathBuf::from("/tmp/myapp");
        let resolved = resolve_search_path(&SearchPath::Path(p.clone()), None).unwrap();
        assert_eq!(resolved, Some(p));
    }

    #[test]
    fn platform_requires_app_name() {
        assert!(matches!(
            resolve_search_path(&SearchPath::Platform, None),
            Err(LayerfigError::AppNameRequired)
        ));
    }

    // --- discovery ---

    #[test]
    fn finds_any_extension_with_matching_stem() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yaml"), "a: 1\n").unwrap();
        fs::write(dir.path().join("config.json"), "{}").unwrap();
        fs::write(dir.path().join("other.yaml"), "a: 1\n").unwrap();
        fs::write(dir.path().join("config.yaml.bak"), "a: 1\n").unwrap();
        fs::create_dir(dir.path().join("config.d")).unwrap();

        let files = find_config_files(&[dir.path().to_path_buf()], "config");
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["config.json", "config.yaml"]);
    }

    #[test]
    fn missing_directory_silently_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "port = 1\n").unwrap();
        let dirs = vec![dir.path().join("nope"), dir.path().to_path_buf()];
        assert_eq!(find_config_files(&dirs, "config").len(), 1);
    }

    #[test]
    fn no_files_is_soft_error() {
        let dir = TempDir::new().unwrap();
        let mut settings = ServerSettings::default();
        let err = read_into(&mut settings, &config_in(dir.path())).unwrap_err();
        assert!(err.is_soft());
        assert_eq!(settings, ServerSettings::default());
    }

    // --- decoding ---

    #[test]
    fn decodes_each_format() {
        let p = Path::new("config");
        let yaml = decode(p, b"server:\n  port: 1\n").unwrap();
        let json = decode(p, br#"{"server": {"port": 1}}"#).unwrap();
        let toml = decode(p, b"[server]\nport = 1\n").unwrap();
        assert_eq!(yaml.get("server.port"), json.get("server.port"));
        assert_eq!(json.get("server.port"), toml.get("server.port"));
    }

    #[test]
    fn undecodable_content_is_unsupported() {
        let err = decode(Path::new("config.bin"), &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, LayerfigError::UnsupportedFileType { .. }));

        let err = decode(Path::new("config.txt"), b"just some words").unwrap_err();
        assert!(matches!(err, LayerfigError::UnsupportedFileType { .. }));
    }

    // --- application ---

    #[test]
    fn applies_nested_values_ignoring_case() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "Port: 8080\nHOST: example.org\ndatabase:\n  Pool_Size: 20\ntags: [a, b]\n",
        )
        .unwrap();

        let mut settings = ServerSettings::default();
        read_into(&mut settings, &config_in(dir.path())).unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.host, "example.org");
        assert_eq!(settings.database.pool_size, 20);
        assert_eq!(settings.tags, vec!["a", "b"]);
        // untouched
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }

    #[test]
    fn string_values_are_coerced() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"timeout": "1m", "port": "9000", "mode": "slow", "labels": {"team": "core"}}"#,
        )
        .unwrap();

        let mut settings = ServerSettings::default();
        read_into(&mut settings, &config_in(dir.path())).unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(60));
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.mode, crate::fixtures::test::Mode::Slow);
        assert_eq!(settings.labels["team"], "core");
    }

    #[test]
    fn explicit_file_key_wins_over_path() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "db_url = \"pg://explicit\"\n[database]\nurl = \"pg://path\"\n",
        )
        .unwrap();

        let mut settings = ServerSettings::default();
        read_into(&mut settings, &config_in(dir.path())).unwrap();
        assert_eq!(settings.database.url, "pg://explicit");
    }

    #[test]
    fn null_resets_to_zero_value() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yaml"), "host: ~\ntoken: ~\n").unwrap();

        let mut settings = ServerSettings {
            token: Some("secret".into()),
            ..ServerSettings::default()
        };
        read_into(&mut settings, &config_in(dir.path())).unwrap();
        assert_eq!(settings.host, "");
        assert_eq!(settings.token, None);
    }

    #[test]
    fn custom_separator_for_paths() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yaml"), "database:\n  pool_size: 3\n").unwrap();

        let config = FilesConfig {
            separator: "/".into(),
            ..config_in(dir.path())
        };
        let mut settings = ServerSettings::default();
        read_into(&mut settings, &config).unwrap();
        assert_eq!(settings.database.pool_size, 3);
    }

    #[test]
    fn wrong_typed_value_is_invalid() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yaml"), "port: [1, 2]\n").unwrap();

        let mut settings = ServerSettings::default();
        let err = read_into(&mut settings, &config_in(dir.path())).unwrap_err();
        match err {
            LayerfigError::InvalidValue { key, origin, .. } => {
                assert_eq!(key, "port");
                assert!(origin.ends_with("config.yaml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_finite_floats_are_applied() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yaml"), "limit: .inf\nscale: .nan\n").unwrap();

        let mut settings = IndirectSettings {
            limit: 1.5,
            scale: 2.0,
            ..IndirectSettings::default()
        };
        let fields = catalog::build(&mut settings).unwrap();
        read_files(&mut settings, &fields, &config_in(dir.path())).unwrap();
        assert_eq!(settings.limit, f64::INFINITY);
        assert!(settings.scale.is_nan());
    }

    #[test]
    fn unparseable_string_is_invalid() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yaml"), "port: http\n").unwrap();

        let mut settings = ServerSettings::default();
        let err = read_into(&mut settings, &config_in(dir.path())).unwrap_err();
        assert!(matches!(err, LayerfigError::InvalidValue { .. }));
    }

    #[test]
    fn later_locations_override_earlier() {
        let low = TempDir::new().unwrap();
        let high = TempDir::new().unwrap();
        fs::write(low.path().join("config.yaml"), "host: low\nport: 1\n").unwrap();
        fs::write(high.path().join("config.toml"), "host = \"high\"\n").unwrap();

        let config = FilesConfig {
            locations: vec![
                SearchPath::Path(low.path().to_path_buf()),
                SearchPath::Path(high.path().to_path_buf()),
            ],
            ..FilesConfig::default()
        };
        let mut settings = ServerSettings::default();
        read_into(&mut settings, &config).unwrap();
        assert_eq!(settings.host, "high");
        assert_eq!(settings.port, 1);
    }

    #[test]
    fn custom_base_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yaml"), "port: 1\n").unwrap();
        fs::write(dir.path().join("server.yaml"), "port: 2\n").unwrap();

        let config = FilesConfig {
            base_name: "server".into(),
            ..config_in(dir.path())
        };
        let mut settings = ServerSettings::default();
        read_into(&mut settings, &config).unwrap();
        assert_eq!(settings.port, 2);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_returns_io_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("config.yaml");
        fs::write(&file_path, "port: 1\n").unwrap();
        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o000)).unwrap();

        // root can read anything; nothing to assert in that case
        let readable = fs::read(&file_path).is_ok();
        let mut settings = ServerSettings::default();
        let result = read_into(&mut settings, &config_in(dir.path()));
        if !readable {
            assert!(matches!(result, Err(LayerfigError::IoError { .. })));
        }

        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o644)).unwrap();
    }

    // --- Ancestors expansion ---

    #[test]
    fn expand_ancestors_root_includes_cwd() {
        let dirs = expand_ancestors(&Boundary::Root);
        assert!(!dirs.is_empty());
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(dirs.last().unwrap(), &cwd);
    }

    #[test]
    fn expand_ancestors_marker_stops_at_marker() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("a").join("b").join("c");
        fs::create_dir_all(&deep).unwrap();
        fs::create_dir(dir.path().join("a").join(".git")).unwrap();

        let dirs = expand_ancestors_from(deep.clone(), &Boundary::Marker(".git"));

        assert_eq!(
            dirs,
            vec![
                dir.path().join("a"),
                dir.path().join("a").join("b"),
                deep.clone(),
            ]
        );
    }

    #[test]
    fn expand_ancestors_marker_missing_walks_to_root() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("x").join("y");
        fs::create_dir_all(&deep).unwrap();

        let dirs = expand_ancestors_from(deep.clone(), &Boundary::Marker(".nonexistent"));

        assert!(dirs.contains(&dir.path().to_path_buf()));
        assert_eq!(dirs.last(), Some(&deep));
    }

    #[test]
    fn expand_search_paths_mixes_single_and_ancestors() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("a").join("b");
        fs::create_dir_all(&deep).unwrap();
        fs::create_dir(dir.path().join("a").join(".marker")).unwrap();

        let explicit = TempDir::new().unwrap();

        let paths = vec![
            SearchPath::Path(explicit.path().to_path_buf()),
            SearchPath::Ancestors(Boundary::Marker(".marker")),
        ];

        let dirs = expand_search_paths_from(&paths, None, Some(&deep)).unwrap();
        assert_eq!(
            dirs,
            vec![
                explicit.path().to_path_buf(),
                dir.path().join("a"),
                deep.clone(),
            ]
        );
    }

    #[test]
    fn ancestors_nearest_file_applied_last() {
        let root = TempDir::new().unwrap();
        let mid = root.path().join("mid");
        let deep = mid.join("deep");
        fs::create_dir_all(&deep).unwrap();
        fs::write(root.path().join("config.yaml"), "host: root\nport: 1\n").unwrap();
        fs::write(mid.join("config.yaml"), "host: mid\n").unwrap();
        fs::create_dir(root.path().join(".marker")).unwrap();

        let dirs = expand_ancestors_from(deep, &Boundary::Marker(".marker"));
        let files = find_config_files(&dirs, "config");
        assert_eq!(files.len(), 2);
        assert!(files[1].starts_with(&mid));
    }
}
