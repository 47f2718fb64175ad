// src/browser/discover.rs

//! Locating a Chrome/Chromium executable.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::BrowserConfig;

/// Environment variable that overrides the search.
pub const CHROME_PATH_ENV: &str = "CHROME_PATH";

/// Find the browser executable for `config`.
///
/// Order: `browser.executable`, `$CHROME_PATH`, `browser.search_paths`,
/// then the browser library's own lookup.
pub fn find_executable(config: &BrowserConfig) -> Result<PathBuf> {
    let from_env = env::var_os(CHROME_PATH_ENV).map(PathBuf::from);
    let found = find_executable_in(
        config.executable.as_deref(),
        from_env.as_deref(),
        &config.search_paths,
    );
    match found {
        Err(_) if config.executable.is_none() => library_default(),
        other => other,
    }
}

/// Resolve from explicit candidates only.
///
/// An explicit executable that does not exist is an error, not a fallthrough.
pub fn find_executable_in(
    explicit: Option<&Path>,
    from_env: Option<&Path>,
    search_paths: &[PathBuf],
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(AppError::browser(format!(
                "configured browser {} does not exist",
                path.display()
            )))
        };
    }

    from_env
        .into_iter()
        .chain(search_paths.iter().map(PathBuf::as_path))
        .find(|p| p.is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| AppError::browser("no Chrome/Chromium executable found"))
}

#[cfg(feature = "browser")]
fn library_default() -> Result<PathBuf> {
    headless_chrome::browser::default_executable().map_err(AppError::browser)
}

#[cfg(not(feature = "browser"))]
fn library_default() -> Result<PathBuf> {
    Err(AppError::browser("no Chrome/Chromium executable found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("chrome");
        std::fs::write(&exe, b"").unwrap();
        let other = dir.path().join("chromium");
        std::fs::write(&other, b"").unwrap();

        let found = find_executable_in(Some(exe.as_path()), Some(other.as_path()), &[other.clone()]).unwrap();
        assert_eq!(found, exe);
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join("chromium");
        std::fs::write(&fallback, b"").unwrap();

        let missing = dir.path().join("nope");
        assert!(find_executable_in(Some(missing.as_path()), None, &[fallback]).is_err());
    }

    #[test]
    fn test_search_paths_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("google-chrome");
        let second = dir.path().join("chromium");
        let third = dir.path().join("chromium-browser");
        std::fs::write(&second, b"").unwrap();
        std::fs::write(&third, b"").unwrap();

        let found = find_executable_in(None, None, &[absent, second.clone(), third]).unwrap();
        assert_eq!(found, second);
    }

    #[test]
    fn test_env_before_search_paths() {
        let dir = tempfile::tempdir().unwrap();
        let env_exe = dir.path().join("env-chrome");
        let listed = dir.path().join("chromium");
        std::fs::write(&env_exe, b"").unwrap();
        std::fs::write(&listed, b"").unwrap();

        let found = find_executable_in(None, Some(env_exe.as_path()), &[listed]).unwrap();
        assert_eq!(found, env_exe);
    }

    #[test]
    fn test_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_executable_in(None, None, &[dir.path().join("none")]).is_err());
    }
}
