//! Running the external metadata programs.

use super::BackendError;
use log::debug;
use std::borrow::Cow;
use std::path::Path;
use std::process::{Command, Output};

fn check_status(program: &Path, output: Output) -> Result<Output, BackendError> {
    if output.status.success() {
        return Ok(output);
    }
    Err(BackendError::Command {
        program: program.display().to_string(),
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Checks that `program` starts and exits cleanly when asked for its version.
pub fn probe_program(program: &Path, version_flag: &str) -> Result<(), BackendError> {
    let output = Command::new(program).arg(version_flag).output()?;
    let output = check_status(program, output)?;
    debug!(
        "Found {}: {}",
        program.display(),
        String::from_utf8_lossy(&output.stdout).lines().next().unwrap_or_default()
    );
    Ok(())
}

/// Relative paths starting with `-` get a `./` prefix so tools do not read them as options.
fn operand(path: &Path) -> Cow<'_, Path> {
    if path.is_relative() && path.as_os_str().as_encoded_bytes().starts_with(b"-") {
        Cow::Owned(Path::new(".").join(path))
    } else {
        Cow::Borrowed(path)
    }
}

/// Runs `program` with `args` followed by `path` and returns its standard output.
pub fn run_tool(program: &Path, args: &[&str], path: &Path) -> Result<String, BackendError> {
    let output = Command::new(program).args(args).arg(operand(path).as_ref()).output()?;
    let output = check_status(program, output)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
