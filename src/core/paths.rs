use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Base deckhand config directory (universal ~/.config/deckhand/ on all platforms)
pub fn deckhand() -> Result<PathBuf> {
    if let Ok(dir) = env::var("DECKHAND_CONFIG_DIR") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected("APPDATA environment variable not set on Windows".to_string())
        })?;
        Ok(PathBuf::from(appdata).join("deckhand"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected(
                "HOME environment variable not set on Unix-like system".to_string(),
            )
        })?;
        Ok(PathBuf::from(home).join(".config").join("deckhand"))
    }
}

/// Projects directory
pub fn projects() -> Result<PathBuf> {
    Ok(deckhand()?.join("projects"))
}

/// Servers directory
pub fn servers() -> Result<PathBuf> {
    Ok(deckhand()?.join("servers"))
}

/// Project config file path
pub fn project(id: &str) -> Result<PathBuf> {
    Ok(projects()?.join(format!("{}.json", id)))
}

/// Server config file path
pub fn server(id: &str) -> Result<PathBuf> {
    Ok(servers()?.join(format!("{}.json", id)))
}

/// Create the config directory tree when missing.
pub fn ensure_config_dirs() -> Result<()> {
    for dir in [projects()?, servers()?] {
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("create {}", dir.display())))
        })?;
    }
    Ok(())
}
