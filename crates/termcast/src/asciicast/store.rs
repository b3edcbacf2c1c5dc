//! Persisting documents.

use std::fs;
use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use super::Asciicast;
use crate::error::{CastError, Result};

/// Somewhere documents can be saved to and read back from.
pub trait DocumentStore {
    /// Save `cast` at `path`, replacing any existing document.
    fn save(&self, cast: &Asciicast, path: &Path) -> Result<()>;

    /// Read the document at `path`.
    fn load(&self, path: &Path) -> Result<Asciicast>;
}

/// Stores documents as pretty-printed JSON files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl FsStore {
    /// Create a filesystem store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DocumentStore for FsStore {
    fn save(&self, cast: &Asciicast, path: &Path) -> Result<()> {
        let file = CastError::with_io_context(
            fs::File::create(path),
            format!("creating {}", path.display()),
        )?;
        let mut writer = BufWriter::new(file);
        cast.to_writer(&mut writer)?;
        let file = writer
            .into_inner()
            .map_err(|e| CastError::io_context(format!("writing {}", path.display()), e.into_error()))?;
        CastError::with_io_context(file.sync_all(), format!("syncing {}", path.display()))?;
        debug!(path = %path.display(), frames = cast.frames.len(), "saved asciicast");
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<Asciicast> {
        let bytes = CastError::with_io_context(fs::read(path), format!("reading {}", path.display()))?;
        Asciicast::decode(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asciicast::{Env, Frame};

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");
        let cast = Asciicast::new(100, 40, vec![Frame::new(0.5, b"$ ls\r\n".to_vec())])
            .with_title("demo")
            .with_env(Env::new("xterm", "/bin/zsh"));

        let store = FsStore::new();
        store.save(&cast, &path).unwrap();
        let loaded = store.load(&path).unwrap();

        assert_eq!(loaded.title, "demo");
        assert_eq!(loaded.frames, cast.frames);
        assert!((loaded.duration - 0.5).abs() < 1e-9);
    }

    #[test]
    fn save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");
        fs::write(&path, "stale contents that are much longer than nothing").unwrap();

        FsStore::new().save(&Asciicast::new(1, 1, Vec::new()), &path).unwrap();
        assert!(FsStore::new().load(&path).unwrap().frames.is_empty());
    }

    #[test]
    fn missing_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsStore::new().load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CastError::IoWithContext { .. }));
        assert!(err.to_string().contains("absent.json"));
    }
}
