use std::{
    fs::{File, Metadata},
    io,
    path::Path,
};

use crate::error::{Error, Result};

/// The opened upload source together with the metadata read from the handle.
#[derive(Debug)]
pub struct LocalFile {
    file: File,
    metadata: Metadata,
}

impl LocalFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(Error::FileOpen)?;
        let metadata = file.metadata().map_err(Error::FileStat)?;

        if !metadata.is_file() {
            return Err(Error::FileStat(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            )));
        }

        Ok(Self { file, metadata })
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn size(&self) -> u64 {
        self.metadata.len()
    }

    /// Permission bits (`rwxrwxrwx`) of the file.
    #[cfg(unix)]
    pub fn mode(&self) -> u32 {
        use std::os::unix::fs::PermissionsExt;

        self.metadata.permissions().mode() & 0o777
    }

    #[cfg(not(unix))]
    pub fn mode(&self) -> u32 {
        if self.metadata.permissions().readonly() {
            0o444
        } else {
            0o644
        }
    }
}
