//! Filesystem-backed storage.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use crate::error::{ArnicaError, Result};
use crate::storage::{Storage, StorageInput, StorageOutput};

/// Configuration for [`FileStorage`].
#[derive(Debug, Clone)]
pub struct FileStorageConfig {
    pub root: PathBuf,
}

impl FileStorageConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Storage rooted at a directory on the local filesystem.
///
/// The root directory is created on construction. Relative paths are
/// resolved under the root; `..` components are rejected so a worker can
/// never write outside its assigned directory.
#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(config: FileStorageConfig) -> Result<Self> {
        fs::create_dir_all(&config.root)?;
        Ok(Self { root: config.root })
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let rel = Path::new(path);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(ArnicaError::invalid_argument(format!(
                "storage path must be relative and must not escape the root: {path}"
            )));
        }
        Ok(self.root.join(rel))
    }
}

impl Storage for FileStorage {
    fn open_input(&self, path: &str) -> Result<Box<dyn StorageInput>> {
        let full = self.resolve(path)?;
        let file = File::open(&full)
            .map_err(|e| ArnicaError::storage(format!("cannot open {}: {e}", full.display())))?;
        Ok(Box::new(file))
    }

    fn create_output(&self, path: &str) -> Result<Box<dyn StorageOutput>> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&full)
            .map_err(|e| ArnicaError::storage(format!("cannot create {}: {e}", full.display())))?;
        Ok(Box::new(FileOutput {
            writer: BufWriter::new(file),
        }))
    }

    fn file_exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }

    fn delete_file(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        fs::remove_file(&full)
            .map_err(|e| ArnicaError::storage(format!("cannot delete {}: {e}", full.display())))
    }

    fn rename_file(&self, from: &str, to: &str) -> Result<()> {
        let from_full = self.resolve(from)?;
        let to_full = self.resolve(to)?;
        if let Some(parent) = to_full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&from_full, &to_full).map_err(|e| {
            ArnicaError::storage(format!(
                "cannot rename {} to {}: {e}",
                from_full.display(),
                to_full.display()
            ))
        })
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        let mut stack = vec![self.root.clone()];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if let Ok(rel) = path.strip_prefix(&self.root) {
                    files.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

struct FileOutput {
    writer: BufWriter<File>,
}

impl Write for FileOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl StorageOutput for FileOutput {
    fn flush_and_sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }
}
