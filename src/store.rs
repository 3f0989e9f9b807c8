use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Filesystem access for the `/files/` route, rooted at the configured
/// data directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        FileStore { root }
    }

    /// Reads `name` from the data directory. `Ok(None)` when the file
    /// does not exist or the name would escape the directory.
    pub fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        let path = match self.resolve(name) {
            Some(path) => path,
            None => return Ok(None),
        };
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Writes `bytes` to `name` in the data directory, creating or
    /// overwriting. Names that would escape the directory are refused.
    pub fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.resolve(name).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing filename: {:?}", name),
            )
        })?;
        fs::write(path, bytes)
    }

    /// Maps a client-supplied filename onto the data directory. Only
    /// plain path components are accepted: empty names, absolute paths,
    /// `.`/`..` segments and backslashes all resolve to `None`.
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name.contains('\\') {
            return None;
        }
        let relative = Path::new(name);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            log::warn!("Rejecting path escaping the data directory: {:?}", name);
            return None;
        }
        Some(self.root.join(relative))
    }
}
