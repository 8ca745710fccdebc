//! Audit command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::CliOverrides;
use crate::metadata::audit_dir;

use super::{load_settings, EXIT_ERROR, EXIT_SUCCESS};

/// Execute the audit command
pub fn run_audit(config: Option<&Path>, dir: Option<&Path>, require: &[String]) -> ExitCode {
    let settings = match load_settings(config, &CliOverrides::default()) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let dir = dir.unwrap_or(settings.output.dir.as_path());
    let required = if require.is_empty() { &settings.audit.required_traits[..] } else { require };

    let report = match audit_dir(dir, required) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    for finding in &report.findings {
        println!("{}: missing {}", finding.path.display(), finding.missing.join(", "));
    }
    for (path, reason) in &report.unreadable {
        eprintln!("Error: {}: {}", path.display(), reason);
    }
    println!(
        "Audited {} files in {}: {} missing required traits, {} unreadable",
        report.scanned,
        dir.display(),
        report.findings.len(),
        report.unreadable.len()
    );

    if report.is_clean() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}
