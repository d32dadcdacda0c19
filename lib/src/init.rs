//! Startup procedures.
//!
//! Makes sure the local environment is in a usable state before any request
//! gets served.

use crate::{staging, Config, Result};

/// Prepares the staging directory. Files left there by a previous run were
/// never committed and get removed.
pub fn initialize(config: &Config) -> Result<()> {
    let dir = &config.upload.staging_dir;
    std::fs::create_dir_all(dir)?;

    let removed = staging::sweep(dir)?;
    if removed > 0 {
        tracing::warn!(
            removed,
            dir = %dir.display(),
            "removed leftover staged uploads from a previous run"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_and_sweeps_staging_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.upload.staging_dir = dir.path().join("uploads");

        initialize(&config).unwrap();
        assert!(config.upload.staging_dir.is_dir());

        let stale = config
            .upload
            .staging_dir
            .join(format!("{}.png", uuid::Uuid::now_v7()));
        let notes = config.upload.staging_dir.join("operator-notes.txt");
        std::fs::write(&stale, b"x").unwrap();
        std::fs::write(&notes, b"keep").unwrap();

        initialize(&config).unwrap();
        assert!(!stale.exists());
        assert!(notes.exists());
    }
}
