use nix::errno::Errno;
use std::{fs, io, path::Path};

/// Copy `src` into `dest`, creating directories as needed.
/// Existing files under `dest` are overwritten.
pub fn copy_recursively(src: &Path, dest: &Path) -> io::Result<()> {
    log::debug!("copying {:?} to {:?}", src, dest);
    if fs::metadata(src)?.is_file() {
        fs::copy(src, dest)?;
    } else {
        if !dest.is_dir() {
            log::debug!("creating dir: {:?}", dest);
            fs::create_dir_all(dest)?;
        }
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            copy_recursively(&entry.path(), &dest.join(entry.file_name()))?;
        }
    }

    Ok(())
}

/// Move a file, falling back to copy + remove when `src` and `dest` sit on
/// different filesystems.
pub fn move_file(src: &Path, dest: &Path) -> io::Result<()> {
    log::debug!("moving {:?} to {:?}", src, dest);
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(Errno::EXDEV as i32) => {
            fs::copy(src, dest)?;
            fs::remove_file(src)
        }
        Err(e) => Err(e),
    }
}

/// Remove a file if it is there, ignoring absence.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Simulator logs are not guaranteed to be valid UTF-8.
pub fn read_lossy(path: &Path) -> io::Result<String> {
    Ok(String::from_utf8_lossy(&fs::read(path)?).into_owned())
}
