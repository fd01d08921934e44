//! Diagnostics reported to the build host and compiler output classification.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::OutputMode;

/// A message delivered to the host's diagnostic sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Subsystem that produced the message (e.g. "scala")
    pub source: String,

    /// Severity level
    pub severity: Severity,

    /// Message text
    pub message: String,

    /// Source location, when the compiler output named one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Parse a severity keyword as compilers print it.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warning" | "warn" => Some(Self::Warning),
            "info" | "note" => Some(Self::Info),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// A location in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// Source file path
    pub file: PathBuf,

    /// Line number (1-indexed)
    pub line: usize,
}

impl Diagnostic {
    pub fn new(source: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            severity,
            message: message.into(),
            location: None,
        }
    }

    pub fn error(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(source, Severity::Error, message)
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Format the diagnostic for terminal display.
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        let level_str = match self.severity {
            Severity::Error => "\x1b[1;31merror\x1b[0m",
            Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
            Severity::Info => "\x1b[1;36minfo\x1b[0m",
        };

        output.push_str(&format!("{level_str}[{}]: {}\n", self.source, self.message));

        if let Some(loc) = &self.location {
            output.push_str(&format!(
                "  \x1b[1;34m-->\x1b[0m {}:{}\n",
                loc.file.display(),
                loc.line
            ));
        }

        output
    }

    /// Format the diagnostic as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({
                "source": self.source,
                "severity": self.severity.to_string(),
                "message": self.message,
            })
        })
    }
}

/// Turns lines of compiler output into diagnostics.
///
/// In [`OutputMode::Plain`] every line becomes a warning. In
/// [`OutputMode::Structured`] lines of the form
/// `<file>:<line>:<severity>:<message>` become located diagnostics with the
/// given severity, and everything else is informational.
#[derive(Debug, Clone)]
pub struct OutputParser {
    source: String,
    mode: OutputMode,
}

impl OutputParser {
    pub fn new(source: impl Into<String>, mode: OutputMode) -> Self {
        Self {
            source: source.into(),
            mode,
        }
    }

    /// Classify one output line. Blank lines produce nothing.
    pub fn parse_line(&self, line: &str) -> Option<Diagnostic> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }

        match self.mode {
            OutputMode::Plain => Some(Diagnostic::new(&self.source, Severity::Warning, line)),
            OutputMode::Structured => Some(match parse_located(line) {
                Some((location, severity, message)) => {
                    Diagnostic::new(&self.source, severity, message).with_location(location)
                }
                None => Diagnostic::new(&self.source, Severity::Info, line),
            }),
        }
    }
}

/// Strip a leading `[level]` tag such as sbt prints.
fn strip_bracket_tag(line: &str) -> &str {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return rest[end + 1..].trim_start();
        }
    }
    trimmed
}

/// Match `<file>:<line>:<severity>:<message>`.
///
/// The file part may itself contain colons (Windows drive letters), so every
/// colon is tried as the end of the file name until a numeric line and a
/// known severity follow it.
fn parse_located(line: &str) -> Option<(SourceLocation, Severity, String)> {
    let text = strip_bracket_tag(line);

    for (idx, _) in text.match_indices(':') {
        let file = text[..idx].trim();
        if file.is_empty() {
            continue;
        }

        let rest = &text[idx + 1..];
        let Some(line_end) = rest.find(':') else {
            break;
        };
        let line_part = rest[..line_end].trim();
        if line_part.is_empty() || !line_part.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let Ok(line_no) = line_part.parse::<usize>() else {
            continue;
        };

        let after = &rest[line_end + 1..];
        let Some(sev_end) = after.find(':') else {
            continue;
        };
        let Some(severity) = Severity::from_keyword(&after[..sev_end]) else {
            continue;
        };

        let message = after[sev_end + 1..].trim().to_string();
        return Some((
            SourceLocation {
                file: PathBuf::from(file),
                line: line_no,
            },
            severity,
            message,
        ));
    }

    None
}
