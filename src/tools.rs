//! External tool invocation.
//!
//! Both the formatter and the wire-binding compiler are best-effort
//! post-steps: a spawn failure or non-zero exit produces a warning and
//! the run continues, skipping only that file's normalization.

use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

/// Run rustfmt over one generated or modified Rust file.
pub fn format_rust_file(path: &Path) {
    match Command::new("rustfmt").arg("--edition=2021").arg(path).output() {
        Ok(out) if out.status.success() => {
            debug!(file = %path.display(), "rustfmt ok");
        }
        Ok(out) => {
            warn!(
                file = %path.display(),
                stderr = %String::from_utf8_lossy(&out.stderr),
                "rustfmt failed, skipping normalization"
            );
        }
        Err(e) => {
            warn!(file = %path.display(), error = %e, "rustfmt not runnable");
        }
    }
}

/// Invoke the configured wire-binding compiler on the injected
/// intermediate schema document.
pub fn run_compiler_hook(cmd: &str, schema: &Path) {
    let mut parts = cmd.split_whitespace();
    let Some(program) = parts.next() else {
        return;
    };
    let mut command = Command::new(program);
    command.args(parts).arg(schema);

    match command.output() {
        Ok(out) if out.status.success() => {
            debug!(cmd, schema = %schema.display(), "compiler hook ok");
        }
        Ok(out) => {
            warn!(
                cmd,
                schema = %schema.display(),
                stderr = %String::from_utf8_lossy(&out.stderr),
                "compiler hook failed, continuing"
            );
        }
        Err(e) => {
            warn!(cmd, error = %e, "compiler hook not runnable");
        }
    }
}
