//! Photo storage on the local filesystem.

use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::{PhotoKind, PhotoStore};

/// Writes photos under an upload directory.
///
/// Returned paths have the form `/uploads/<kind dir>/<uuid><ext>`, with
/// `/uploads` standing for the configured root.
#[derive(Debug, Clone)]
pub struct LocalPhotoStore {
    root: PathBuf,
}

impl LocalPhotoStore {
    /// Creates a store rooted at `root`. The directory is created lazily.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = path.strip_prefix("/uploads/")?;
        if relative.split('/').any(|part| part == ".." || part.is_empty()) {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl PhotoStore for LocalPhotoStore {
    fn save(&self, kind: PhotoKind, extension: &str, content: &[u8]) -> EngineResult<String> {
        let dir = self.root.join(kind.directory());
        fs::create_dir_all(&dir)
            .map_err(|e| EngineError::storage(format!("create {}: {}", dir.display(), e)))?;

        let file_name = format!("{}{}", Uuid::new_v4(), extension);
        let target = dir.join(&file_name);
        fs::write(&target, content)
            .map_err(|e| EngineError::storage(format!("write {}: {}", target.display(), e)))?;

        Ok(format!("/uploads/{}/{}", kind.directory(), file_name))
    }

    fn remove(&self, path: &str) -> EngineResult<()> {
        let Some(target) = self.resolve(path) else {
            return Ok(());
        };
        match fs::remove_file(&target) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EngineError::storage(format!(
                "remove {}: {}",
                target.display(),
                e
            ))),
        }
    }
}
