//! XDG-compliant path resolution for eunoia.
//!
//! Configuration lives under `$XDG_CONFIG_HOME/eunoia/` and the session
//! database under `$XDG_DATA_HOME/eunoia/`. Logs go to stderr.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(eunoia::paths::no_home),
        help("Set the HOME environment variable, or pass explicit --config and --db paths.")
    )]
    NoHome,

    #[error("failed to create directory: {path}")]
    #[diagnostic(
        code(eunoia::paths::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Global directories for eunoia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EunoiaPaths {
    /// `$XDG_CONFIG_HOME/eunoia/`
    pub config_dir: PathBuf,
    /// `$XDG_DATA_HOME/eunoia/`
    pub data_dir: PathBuf,
}

impl EunoiaPaths {
    /// Resolve directories from the XDG variables with the standard fallbacks.
    pub fn resolve() -> PathResult<Self> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| PathError::NoHome)?;
        Ok(Self::from_home(
            &home,
            std::env::var("XDG_CONFIG_HOME").ok().map(PathBuf::from),
            std::env::var("XDG_DATA_HOME").ok().map(PathBuf::from),
        ))
    }

    /// Resolve against an explicit home and optional XDG overrides.
    pub fn from_home(
        home: &std::path::Path,
        config_home: Option<PathBuf>,
        data_home: Option<PathBuf>,
    ) -> Self {
        Self {
            config_dir: config_home
                .unwrap_or_else(|| home.join(".config"))
                .join("eunoia"),
            data_dir: data_home
                .unwrap_or_else(|| home.join(".local/share"))
                .join("eunoia"),
        }
    }

    /// Create all base directories. Idempotent.
    pub fn ensure_dirs(&self) -> PathResult<()> {
        for dir in [&self.config_dir, &self.data_dir] {
            std::fs::create_dir_all(dir).map_err(|e| PathError::CreateDir {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// `config_dir/config.toml`
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// `data_dir/sessions.redb`
    pub fn sessions_db(&self) -> PathBuf {
        self.data_dir.join("sessions.redb")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn defaults_follow_xdg_layout() {
        let paths = EunoiaPaths::from_home(Path::new("/home/u"), None, None);
        assert_eq!(paths.config_dir, PathBuf::from("/home/u/.config/eunoia"));
        assert_eq!(paths.data_dir, PathBuf::from("/home/u/.local/share/eunoia"));
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/home/u/.config/eunoia/config.toml")
        );
        assert_eq!(
            paths.sessions_db(),
            PathBuf::from("/home/u/.local/share/eunoia/sessions.redb")
        );
    }

    #[test]
    fn overrides_take_precedence() {
        let paths = EunoiaPaths::from_home(
            Path::new("/home/u"),
            Some(PathBuf::from("/cfg")),
            Some(PathBuf::from("/data")),
        );
        assert_eq!(paths.config_dir, PathBuf::from("/cfg/eunoia"));
        assert_eq!(paths.data_dir, PathBuf::from("/data/eunoia"));
    }

    #[test]
    fn ensure_dirs_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = EunoiaPaths::from_home(dir.path(), None, None);
        paths.ensure_dirs().unwrap();
        paths.ensure_dirs().unwrap();
        assert!(paths.config_dir.is_dir());
        assert!(paths.data_dir.is_dir());
        // Only the config and data roots are created.
        let created = std::fs::read_dir(dir.path().join(".local")).unwrap().count();
        assert_eq!(created, 1);
    }
}
