//! External pipeline driven through a subprocess.
//!
//! Each call writes the parameter set to a temporary JSON file and runs
//! `<cmd> transform|label --parameters <file> --subject <subject>`. The
//! artifact (or the JSON family labels) is read from stdout.

use std::io::Write;
use std::process::{Command, Output};

use parity_perturb::{FamilyLabels, ParameterSet, Transform, TransformError};
use tracing::debug;

use crate::error::{CliError, CliResult};

pub struct CommandTransform {
    program: String,
    args: Vec<String>,
    subject: String,
    name: String,
}

impl CommandTransform {
    /// `command` is split on whitespace into program and leading arguments.
    pub fn new(command: &str, subject: &str) -> CliResult<Self> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words
            .next()
            .ok_or_else(|| CliError::InvalidInput("transform command is empty".to_string()))?;
        Ok(Self {
            args: words.collect(),
            name: format!("{} [{}]", program, subject),
            program,
            subject: subject.to_string(),
        })
    }

    fn invoke(&self, action: &str, parameters: &ParameterSet) -> Result<String, TransformError> {
        let mut file = tempfile::Builder::new()
            .prefix("parity-parameters-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| TransformError::fatal(format!("cannot create parameter file: {}", e)))?;
        serde_json::to_writer(&mut file, parameters)
            .map_err(|e| TransformError::fatal(format!("cannot serialize parameters: {}", e)))?;
        file.flush()
            .map_err(|e| TransformError::fatal(format!("cannot write parameter file: {}", e)))?;

        debug!(program = %self.program, action, subject = %self.subject, "running transform command");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(action)
            .arg("--parameters")
            .arg(file.path())
            .arg("--subject")
            .arg(&self.subject)
            .output()
            .map_err(|e| TransformError::fatal(format!("cannot run '{}': {}", self.program, e)))?;
        stdout_of(action, output)
    }
}

fn stdout_of(action: &str, output: Output) -> Result<String, TransformError> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TransformError::recoverable(format!(
            "{} exited with {}: {}",
            action,
            output.status,
            stderr.trim()
        )));
    }
    String::from_utf8(output.stdout)
        .map_err(|e| TransformError::recoverable(format!("{} produced invalid UTF-8: {}", action, e)))
}

impl Transform for CommandTransform {
    fn transform(&self, parameters: &ParameterSet) -> Result<String, TransformError> {
        self.invoke("transform", parameters)
    }

    fn label(&self, parameters: &ParameterSet) -> Result<FamilyLabels, TransformError> {
        let stdout = self.invoke("label", parameters)?;
        serde_json::from_str(&stdout)
            .map_err(|e| TransformError::recoverable(format!("label output is not a family count map: {}", e)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
