use nix::errno::Errno;
use std::fmt;
use std::io;
use std::path::Path;

#[derive(Debug)]
pub enum JudgeCoreError {
    NixErrno(Errno),
    IOError(io::Error),
    SerdeYamlError(serde_yaml::Error),
    AnyhowError(anyhow::Error),
}

impl fmt::Display for JudgeCoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JudgeCoreError::NixErrno(e) => write!(f, "errno: {}", e),
            JudgeCoreError::IOError(e) => write!(f, "io: {}", e),
            JudgeCoreError::SerdeYamlError(e) => write!(f, "yaml: {}", e),
            JudgeCoreError::AnyhowError(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for JudgeCoreError {}

impl From<Errno> for JudgeCoreError {
    fn from(error: Errno) -> JudgeCoreError {
        JudgeCoreError::NixErrno(error)
    }
}

impl From<io::Error> for JudgeCoreError {
    fn from(error: io::Error) -> JudgeCoreError {
        JudgeCoreError::IOError(error)
    }
}

impl From<anyhow::Error> for JudgeCoreError {
    fn from(error: anyhow::Error) -> JudgeCoreError {
        JudgeCoreError::AnyhowError(error)
    }
}

impl From<serde_yaml::Error> for JudgeCoreError {
    fn from(error: serde_yaml::Error) -> JudgeCoreError {
        JudgeCoreError::SerdeYamlError(error)
    }
}

pub fn path_not_exist(path: &Path) -> JudgeCoreError {
    JudgeCoreError::AnyhowError(anyhow::anyhow!("Path not exist: {:?}", path))
}
