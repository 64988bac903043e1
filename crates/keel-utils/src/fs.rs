use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::{FileSystemError, FileSystemResult};

pub trait FileSystemProvider {
    /// Creates a directory structure if it doesn't exist.
    ///
    /// If the directory already exists, this function does nothing. If the path exists but is
    /// not a directory, this function returns an error.
    ///
    /// # Errors
    ///
    /// * [`FileSystemError::Directory`] if the directory could not be created.
    /// * [`FileSystemError::NotADirectory`] if the path exists but is not a directory.
    fn ensure_dir_exists<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()>;

    /// Lists the subdirectories of `path`, sorted by file name.
    ///
    /// Plain files and entries that cannot be inspected are skipped. Symlinks to
    /// directories are followed.
    ///
    /// # Errors
    ///
    /// * [`FileSystemError::Directory`] if `path` cannot be read.
    /// * [`FileSystemError::NotADirectory`] if `path` is not a directory.
    fn sorted_subdirs<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<Vec<PathBuf>>;

    /// Writes `contents` to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// * [`FileSystemError::File`] if the file could not be written.
    fn write_file<P: AsRef<Path>>(&self, path: P, contents: &str) -> FileSystemResult<()>;
}

#[derive(Default, Clone)]
pub struct StandardFileSystemProvider;

impl FileSystemProvider for StandardFileSystemProvider {
    fn ensure_dir_exists<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).map_err(|err| FileSystemError::Directory {
                path: path.to_path_buf(),
                action: "create",
                source: err,
            })?;
        } else if !path.is_dir() {
            return Err(FileSystemError::NotADirectory {
                path: path.to_path_buf(),
            });
        }

        Ok(())
    }

    fn sorted_subdirs<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<Vec<PathBuf>> {
        let path = path.as_ref();
        if path.exists() && !path.is_dir() {
            return Err(FileSystemError::NotADirectory {
                path: path.to_path_buf(),
            });
        }

        let entries = fs::read_dir(path).map_err(|err| FileSystemError::Directory {
            path: path.to_path_buf(),
            action: "list",
            source: err,
        })?;

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|entry| entry.is_dir())
            .collect();
        dirs.sort();

        Ok(dirs)
    }

    fn write_file<P: AsRef<Path>>(&self, path: P, contents: &str) -> FileSystemResult<()> {
        let path = path.as_ref();
        fs::write(path, contents).map_err(|err| FileSystemError::File {
            path: path.to_path_buf(),
            action: "write",
            source: err,
        })
    }
}

/// Creates a directory structure if it doesn't exist.
///
/// See [`FileSystemProvider::ensure_dir_exists`] for detailed documentation.
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    StandardFileSystemProvider.ensure_dir_exists(path)
}

/// Lists the subdirectories of `path` in name order.
///
/// See [`FileSystemProvider::sorted_subdirs`] for detailed documentation.
pub fn sorted_subdirs<P: AsRef<Path>>(path: P) -> FileSystemResult<Vec<PathBuf>> {
    StandardFileSystemProvider.sorted_subdirs(path)
}

/// Writes `contents` to `path`.
///
/// See [`FileSystemProvider::write_file`] for detailed documentation.
pub fn write_file<P: AsRef<Path>>(path: P, contents: &str) -> FileSystemResult<()> {
    StandardFileSystemProvider.write_file(path, contents)
}
