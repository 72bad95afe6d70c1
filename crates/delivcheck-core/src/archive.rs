use std::io::{Cursor, Read};

use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{Error, Result};

/// One entry listed by an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Archive-relative path, `/`-separated.
    pub path: String,
    /// True for explicit directory entries (paths ending with `/`).
    pub is_dir: bool,
}

impl ArchiveEntry {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let is_dir = path.ends_with('/');
        Self { path, is_dir }
    }

    /// Final non-empty path segment.
    pub fn basename(&self) -> &str {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("")
    }
}

/// Read-only view over an uploaded deliverable archive.
pub trait Archive {
    /// Entries in archive order, directories included.
    fn entries(&self) -> &[ArchiveEntry];

    /// Raw bytes of the file stored at exactly `path`, if any. Directory
    /// entries have no content and yield `None`.
    fn read_bytes(&mut self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Entry content decoded as UTF-8, replacing invalid sequences.
    fn read_text(&mut self, path: &str) -> Result<Option<String>> {
        Ok(self
            .read_bytes(path)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Paths of every non-directory entry.
    fn file_paths(&self) -> Vec<String> {
        self.entries()
            .iter()
            .filter(|entry| !entry.is_dir)
            .map(|entry| entry.path.clone())
            .collect()
    }
}

/// Zip archive backed by an in-memory buffer.
pub struct ZipBundle<'a> {
    zip: ZipArchive<Cursor<&'a [u8]>>,
    entries: Vec<ArchiveEntry>,
}

impl<'a> ZipBundle<'a> {
    /// Parse the central directory of `bytes`.
    pub fn open(bytes: &'a [u8]) -> Result<Self> {
        let zip = ZipArchive::new(Cursor::new(bytes))?;
        let entries = zip.file_names().map(ArchiveEntry::new).collect();
        Ok(Self { zip, entries })
    }
}

impl std::fmt::Debug for ZipBundle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipBundle")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl Archive for ZipBundle<'_> {
    fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    fn read_bytes(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        let mut file = match self.zip.by_name(path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(Error::from(err)),
        };
        if file.is_dir() {
            return Ok(None);
        }
        let mut out = Vec::new();
        file.read_to_end(&mut out)?;
        Ok(Some(out))
    }
}

/// In-memory archive, mostly useful for tests and previews.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    entries: Vec<ArchiveEntry>,
    contents: Vec<Option<Vec<u8>>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file entry.
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.entries.push(ArchiveEntry {
            path: path.into(),
            is_dir: false,
        });
        self.contents.push(Some(content.into()));
        self
    }

    /// Add an explicit directory entry; a trailing `/` is appended if missing.
    pub fn with_dir(mut self, path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.ends_with('/') {
            path.push('/');
        }
        self.entries.push(ArchiveEntry { path, is_dir: true });
        self.contents.push(None);
        self
    }
}

impl Archive for MemoryArchive {
    fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    fn read_bytes(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        let found = self
            .entries
            .iter()
            .zip(&self.contents)
            .find(|(entry, _)| entry.path == path)
            .and_then(|(_, content)| content.clone());
        Ok(found)
    }
}
