//! Durable storage for the configuration record.
//!
//! A store only moves bytes. Parsing, defaults and corruption recovery belong
//! to the state machine.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub trait ConfigStore: Send {
    /// Raw bytes of the stored record, `None` if nothing was stored yet
    fn read(&self) -> io::Result<Option<Vec<u8>>>;

    /// Replace the stored record in full
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// JSON file on disk, replaced atomically on every write
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for FileStore {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        replace_file(&self.path, bytes)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Replace the file at `path` with `data`.
///
/// The bytes go to a sibling `<name>.partial` file, are synced, and the
/// sibling is renamed over `path`. Readers see the old record or the new
/// one, never a prefix of it.
pub fn replace_file(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let partial = partial_path(path);
    let staged = File::create(&partial).and_then(|mut file| {
        file.write_all(data)?;
        file.sync_all()
    });

    match staged.and_then(|()| fs::rename(&partial, path)) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&partial);
            Err(e)
        }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// In-process store, used by tests and ephemeral deployments
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    bytes: Option<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with raw bytes, valid or not
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Some(bytes.into()),
        }
    }
}

impl ConfigStore for MemoryStore {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.bytes.clone())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.bytes = Some(bytes.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
