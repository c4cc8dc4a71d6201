use std::io::{self, Write};
use std::path::{Path, PathBuf};

use autodocs_core::{DiffId, DiffKind};

/// Directory of `<kind>_<id>.diff` files. Blobs are never overwritten.
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: DiffKind, id: DiffId) -> PathBuf {
        self.dir.join(format!("{kind}_{id}.diff"))
    }

    /// Write a new blob. Fails if one already exists for `kind`/`id`.
    pub fn write(&self, kind: DiffKind, id: DiffId, text: &str) -> io::Result<PathBuf> {
        let path = self.path_for(kind, id);
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        file.write_all(text.as_bytes())?;
        file.sync_all()?;
        Ok(path)
    }

    /// Raw blob bytes, or `None` if nothing was stored under `kind`/`id`.
    pub fn read(&self, kind: DiffKind, id: DiffId) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(self.path_for(kind, id)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
