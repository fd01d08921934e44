//! Terminal and JSON rendering of build output.

use std::io::Write;
use std::sync::Mutex;

use clap::ValueEnum;
use zincrun_core::{BuildOutcome, BuildReport, Diagnostic, Severity};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const GREEN: &str = "\x1b[32m";
pub const RED: &str = "\x1b[31m";
pub const DIM: &str = "\x1b[2m";

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Human,
    Json,
}

/// Prints diagnostics and unit summaries from several build threads.
#[derive(Debug)]
pub struct Renderer {
    format: Format,
    /// Serializes writes so lines of concurrent units never interleave
    lock: Mutex<()>,
}

impl Renderer {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            lock: Mutex::new(()),
        }
    }

    pub fn diagnostic(&self, diagnostic: &Diagnostic) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        match self.format {
            Format::Human => {
                // Plain compiler output reads better without a severity banner.
                if diagnostic.severity == Severity::Error || diagnostic.location.is_some() {
                    eprint!("{}", diagnostic.format_terminal());
                } else {
                    eprintln!("{DIM}{}{RESET}", diagnostic.message);
                }
            }
            Format::Json => {
                let mut value = diagnostic.to_json();
                value["kind"] = "diagnostic".into();
                print_json_line(&value);
            }
        }
    }

    pub fn unit_report(&self, unit: &str, report: &BuildReport) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        match self.format {
            Format::Human => match report.outcome {
                BuildOutcome::NothingDone => {
                    eprintln!("{DIM}Nothing to compile in {unit}{RESET}");
                }
                BuildOutcome::Ok => {
                    eprintln!(
                        "{GREEN}Compiled{RESET} {BOLD}{unit}{RESET} ({} source{})",
                        report.sources,
                        if report.sources == 1 { "" } else { "s" }
                    );
                }
                BuildOutcome::Abort => {
                    eprintln!("{RED}Failed{RESET} {BOLD}{unit}{RESET}");
                }
            },
            Format::Json => print_json_line(&serde_json::json!({
                "kind": "unit",
                "unit": unit,
                "outcome": outcome_name(report.outcome),
                "sources": report.sources,
                "exit_code": report.exit_code,
            })),
        }
    }

    /// Report a unit that failed with an error instead of an outcome.
    pub fn unit_error(&self, unit: &str, error: &dyn std::fmt::Display) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        match self.format {
            Format::Human => {
                eprintln!("{RED}Failed{RESET} {BOLD}{unit}{RESET}: {error}");
            }
            Format::Json => print_json_line(&serde_json::json!({
                "kind": "unit",
                "unit": unit,
                "outcome": "error",
                "error": error.to_string(),
            })),
        }
    }
}

pub fn outcome_name(outcome: BuildOutcome) -> &'static str {
    match outcome {
        BuildOutcome::NothingDone => "nothing-done",
        BuildOutcome::Ok => "ok",
        BuildOutcome::Abort => "abort",
    }
}

fn print_json_line(value: &serde_json::Value) {
    let mut stdout = std::io::stdout().lock();
    // A closed pipe is not worth failing the build over.
    let _ = writeln!(stdout, "{value}");
}
