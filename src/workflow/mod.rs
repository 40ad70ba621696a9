//! GitHub Actions workflow commands: step outputs and annotations.

use std::env;
use std::path::PathBuf;

use log::debug;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

const OUTPUT_FILE_VAR: &str = "GITHUB_OUTPUT";

/// Where the gate publishes its decision.
pub trait OutputSink {
    /// Publish every output or none of them.
    async fn set_outputs(&mut self, outputs: &[(&str, String)]) -> Result<(), String>;
    fn notice(&mut self, message: &str);
}

/// Outputs for a real Actions runner.
pub struct ActionsOutput {
    output_file: Option<PathBuf>,
}

impl ActionsOutput {
    pub fn from_env() -> Self {
        let output_file = env::var_os(OUTPUT_FILE_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self::new(output_file)
    }

    pub fn new(output_file: Option<PathBuf>) -> Self {
        Self { output_file }
    }
}

impl OutputSink for ActionsOutput {
    async fn set_outputs(&mut self, outputs: &[(&str, String)]) -> Result<(), String> {
        let block = render_outputs(outputs)?;
        match &self.output_file {
            Some(path) => {
                debug!("workflow: appending {} outputs to {}", outputs.len(), path.display());
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await
                    .map_err(|e| format!("failed to open {}: {e}", path.display()))?;
                file.write_all(block.as_bytes())
                    .await
                    .map_err(|e| format!("failed to write outputs: {e}"))?;
                file.flush()
                    .await
                    .map_err(|e| format!("failed to flush outputs: {e}"))
            }
            None => {
                for (name, value) in outputs {
                    println!("::set-output name={name}::{}", escape_data(value));
                }
                Ok(())
            }
        }
    }

    fn notice(&mut self, message: &str) {
        notice(message);
    }
}

pub fn notice(message: &str) {
    println!("::notice::{}", escape_data(message));
}

pub fn error(message: &str) {
    println!("::error::{}", escape_data(message));
}

/// `name=value` lines for `$GITHUB_OUTPUT`. Values must be single-line.
fn render_outputs(outputs: &[(&str, String)]) -> Result<String, String> {
    let mut block = String::new();
    for (name, value) in outputs {
        if value.contains('\n') || value.contains('\r') {
            return Err(format!("output {name} must be a single line"));
        }
        block.push_str(name);
        block.push('=');
        block.push_str(value);
        block.push('\n');
    }
    Ok(block)
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
