//! Clearing the files cmake generates into the build folder.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::platform::Platform;
use crate::project::ProjectStore;
use crate::resolve::ConfigResolver;

/// Removed besides everything under `CMakeFiles`.
const TRY_TO_REMOVE: &[&str] = &["CMakeCache.txt", "cmake_install.cmake"];

/// Clearing only makes sense once cmake has written a cache.
pub fn has_cache(build_folder: &Path) -> bool {
    build_folder.join("CMakeCache.txt").is_file()
}

/// The cache files of an already configured project. The project is only
/// read, so a project without a `build_folder` is left as it is. `None` when
/// there is no cache to clear.
pub fn pending(project: &dyn ProjectStore, platform: Platform) -> Result<Option<CacheFiles>> {
    let Some(location) = ConfigResolver::new(platform).locate(project)? else {
        return Ok(None);
    };
    if !has_cache(&location.build_folder) {
        return Ok(None);
    }
    CacheFiles::collect(&location.build_folder).map(Some)
}

/// Files and directories that make up the cmake cache, in removal order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheFiles {
    pub files: Vec<PathBuf>,
    pub dirs: Vec<PathBuf>,
}

impl CacheFiles {
    pub fn collect(build_folder: &Path) -> Result<Self> {
        let mut cache = Self::default();
        let cmakefiles = build_folder.join("CMakeFiles");
        if cmakefiles.exists() {
            // Contents first, so every directory is empty by the time it is
            // removed. The root itself comes last.
            for entry in WalkDir::new(&cmakefiles).contents_first(true) {
                let entry = entry.map_err(|e| Error::Io(e.into()))?;
                if entry.file_type().is_dir() {
                    cache.dirs.push(entry.into_path());
                } else {
                    cache.files.push(entry.into_path());
                }
            }
        }
        for name in TRY_TO_REMOVE {
            let path = build_folder.join(name);
            if path.exists() {
                cache.files.push(path);
            }
        }
        Ok(cache)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter().chain(&self.dirs)
    }

    /// Remove everything, carrying on past failures. Returns the failures.
    pub fn remove(&self) -> Vec<Error> {
        let mut failures = Vec::new();
        for file in &self.files {
            if let Err(source) = fs::remove_file(file) {
                failures.push(Error::Remove {
                    path: file.clone(),
                    source,
                });
            }
        }
        for dir in &self.dirs {
            if let Err(source) = fs::remove_dir(dir) {
                failures.push(Error::Remove {
                    path: dir.clone(),
                    source,
                });
            }
        }
        debug!(
            files = self.files.len(),
            dirs = self.dirs.len(),
            failed = failures.len(),
            "cleared cmake cache"
        );
        failures
    }
}
