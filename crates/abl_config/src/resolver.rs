//! Filesystem-backed config resolution.

use crate::config::{parse_config, AblConfig};
use crate::error::{Error, Result};
use crate::module_args::ConfigResolver;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loads `config=` paths from disk.
///
/// Relative paths are resolved against the optional base directory.
#[derive(Debug, Clone, Default)]
pub struct FsResolver {
    base: Option<PathBuf>,
}

impl FsResolver {
    /// Creates a resolver that uses paths as given.
    #[must_use]
    pub const fn new() -> Self {
        Self { base: None }
    }

    /// Resolves relative paths against `base`.
    #[must_use]
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        match &self.base {
            Some(base) if Path::new(path).is_relative() => base.join(path),
            _ => PathBuf::from(path),
        }
    }
}

impl ConfigResolver for FsResolver {
    fn resolve(&self, path: &str) -> Result<AblConfig> {
        let full = self.full_path(path);
        debug!(path = %full.display(), "reading config file");

        let text = fs::read_to_string(&full).map_err(|e| Error::Resource {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let config = parse_config(&text)?;

        info!(path = %full.display(), "loaded config file");
        Ok(config)
    }
}

/// Reads and parses a config file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and
/// [`Error::Config`] if its content is invalid.
pub fn load_config(path: impl AsRef<Path>) -> Result<AblConfig> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_config(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_args::{parse_module_args, ModuleAction};
    use std::io::Write;

    #[test]
    fn missing_file_fails_module_args() {
        let tokens = [
            "debug",
            "log_both",
            "config=/non-existing-dir/foobar_vnfitri5948sj",
            "log_both",
        ];
        let err = parse_module_args(&tokens, &FsResolver::new()).unwrap_err();
        assert!(
            matches!(&err, Error::Resource { path, .. } if path == "/non-existing-dir/foobar_vnfitri5948sj")
        );
    }

    #[test]
    fn existing_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host_purge = 1d").unwrap();
        writeln!(file, "host_blk_cmd = [block] [%h]").unwrap();

        let token = format!("config={}", file.path().display());
        let args = parse_module_args(&["check_host", token.as_str()], &FsResolver::new()).unwrap();

        assert_eq!(args.actions, ModuleAction::CHECK_HOST);
        let config = args.config.unwrap();
        assert_eq!(config.host.purge.unwrap().as_secs(), 86_400);
        assert_eq!(config.host.block_cmd.program(), Some("block"));
    }

    #[test]
    fn relative_paths_use_base() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("abl.conf"), "user_db = users.db\n").unwrap();

        let resolver = FsResolver::with_base(dir.path());
        let config = resolver.resolve("abl.conf").unwrap();
        assert_eq!(config.user.db.as_deref(), Some("users.db"));

        assert!(FsResolver::new().resolve("abl.conf").is_err());
    }

    #[test]
    fn invalid_file_content_is_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.conf");
        fs::write(&path, "no_such_key = 1\n").unwrap();

        let token = format!("config={}", path.display());
        let err = parse_module_args(&[token], &FsResolver::new()).unwrap_err();
        assert!(matches!(err, Error::Resource { ref reason, .. } if reason.contains("line 1")));
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abl.conf");
        fs::write(&path, "debug\n").unwrap();
        assert!(load_config(&path).unwrap().debug);
        assert!(matches!(load_config(dir.path().join("missing")), Err(Error::Io(_))));
    }
}
