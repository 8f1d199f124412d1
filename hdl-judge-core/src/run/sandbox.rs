use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{
    error::{path_not_exist, JudgeCoreError},
    utils::copy_recursively,
};

/// A disposable working directory for exactly one compile + run cycle.
///
/// The directory is created under `work_root` with a fresh uuid name and is
/// removed with all of its contents when the guard is dropped, whichever way
/// the owning scope is left.
#[derive(Debug)]
pub struct Sandbox {
    path: PathBuf,
}

impl Sandbox {
    pub fn create(work_root: &Path) -> Result<Self, JudgeCoreError> {
        fs::create_dir_all(work_root)?;
        let path = work_root.join(uuid::Uuid::new_v4().to_string());
        fs::create_dir(&path)?;
        log::debug!("Created sandbox {:?}", path);
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }

    /// Copy the contents of `dir` into the sandbox root.
    pub fn populate_from(&self, dir: &Path) -> Result<(), JudgeCoreError> {
        if !dir.is_dir() {
            return Err(path_not_exist(dir));
        }
        copy_recursively(dir, &self.path)?;
        Ok(())
    }

    pub fn write_file(
        &self,
        name: impl AsRef<Path>,
        content: &str,
    ) -> Result<PathBuf, JudgeCoreError> {
        let path = self.join(name);
        fs::write(&path, content)?;
        Ok(path)
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => log::debug!("Removed sandbox {:?}", self.path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::error!("Failed to remove sandbox {:?}: {:?}", self.path, e),
        }
    }
}
