use serde_derive::{Deserialize, Serialize};
use std::{path::PathBuf, process::Command};

/// An external tool invocation: the program plus any arguments that must
/// precede the tool's own arguments (e.g. an interpreter or a wrapper).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Executor {
    pub program: PathBuf,
    #[serde(default)]
    pub leading_args: Vec<String>,
}

impl Executor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: vec![],
        }
    }

    pub fn set_leading_args(&mut self, args: Vec<String>) {
        self.leading_args = args;
    }

    pub fn with_leading_args(mut self, args: Vec<String>) -> Self {
        self.set_leading_args(args);
        self
    }

    pub fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.leading_args).args(args);
        command
    }

    pub fn describe(&self, args: &[String]) -> String {
        let mut parts = vec![self.program.to_string_lossy().into_owned()];
        parts.extend(self.leading_args.iter().cloned());
        parts.extend(args.iter().cloned());
        parts.join(" ")
    }
}
