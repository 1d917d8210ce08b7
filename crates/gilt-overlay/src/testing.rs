//! Recording fakes shared by the unit tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::exec::{ExecError, ExecManager};

/// A command the fake was asked to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCall {
    pub name: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
}

impl ExecCall {
    pub fn new(name: &str, args: &[&str], dir: Option<&Path>) -> Self {
        Self {
            name: name.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            dir: dir.map(Path::to_path_buf),
        }
    }
}

/// Records every call and answers from a queue of canned results.
///
/// Calls beyond the queue succeed with empty output.
#[derive(Debug, Default)]
pub struct RecordingExec {
    calls: Mutex<Vec<ExecCall>>,
    results: Mutex<VecDeque<Result<String, String>>>,
}

impl RecordingExec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the output of the next call.
    pub fn push_ok(&self, output: &str) {
        self.results
            .lock()
            .unwrap()
            .push_back(Ok(output.to_string()));
    }

    /// Make the next call fail.
    pub fn push_err(&self, message: &str) {
        self.results
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn calls(&self) -> Vec<ExecCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, name: &str, args: &[String], dir: Option<&Path>) -> Result<String, ExecError> {
        self.calls.lock().unwrap().push(ExecCall {
            name: name.to_string(),
            args: args.to_vec(),
            dir: dir.map(Path::to_path_buf),
        });

        match self.results.lock().unwrap().pop_front() {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(ExecError::Failed {
                command: name.to_string(),
                status: Some(1),
                output: message,
            }),
            None => Ok(String::new()),
        }
    }
}

impl ExecManager for RecordingExec {
    fn run_cmd(&self, name: &str, args: &[String]) -> Result<String, ExecError> {
        self.record(name, args, None)
    }

    fn run_cmd_in_dir(&self, name: &str, args: &[String], dir: &Path) -> Result<String, ExecError> {
        self.record(name, args, Some(dir))
    }
}
