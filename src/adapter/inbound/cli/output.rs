//! CLI output formatting.
//!
//! Human-readable lines by default; with `--json` every line is a JSON object
//! `{"type": ..., "payload": ...}` for scripting. Quiet mode suppresses
//! non-essential human output but never JSON or errors.

use std::fmt::Display;

use serde::Serialize;
use serde_json::json;

/// Output settings from the global CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    /// Emit machine-readable JSON output instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
}

impl Output {
    #[must_use]
    pub const fn new(json: bool, quiet: bool) -> Self {
        Self { json, quiet }
    }

    fn suppressed(&self) -> bool {
        !self.json && self.quiet
    }

    fn emit_json_line(kind: &str, payload: serde_json::Value) {
        println!(
            "{}",
            json!({
                "type": kind,
                "payload": payload,
            })
        );
    }

    /// Print a labeled value.
    pub fn field(&self, label: &str, value: impl Display) {
        let value = value.to_string();
        if self.json {
            Self::emit_json_line("field", json!({ "label": label, "value": value }));
            return;
        }
        if self.suppressed() {
            return;
        }
        println!("  {label:<16} {value}");
    }

    /// Print a success line.
    pub fn success(&self, message: &str) {
        if self.json {
            Self::emit_json_line("success", json!({ "message": message }));
            return;
        }
        if self.suppressed() {
            return;
        }
        println!("  ✓ {message}");
    }

    /// Print a warning line.
    pub fn warning(&self, message: &str) {
        if self.json {
            Self::emit_json_line("warning", json!({ "message": message }));
            return;
        }
        println!("  ⚠ {message}");
    }

    /// Print an error line to stderr.
    pub fn error(&self, message: &str) {
        if self.json {
            eprintln!(
                "{}",
                json!({
                    "type": "error",
                    "payload": { "message": message },
                })
            );
            return;
        }
        eprintln!("  × {message}");
    }

    /// Print a section header.
    pub fn section(&self, title: &str) {
        if self.json {
            Self::emit_json_line("section", json!({ "title": title }));
            return;
        }
        if self.suppressed() {
            return;
        }
        println!();
        println!("{title}");
    }

    /// Emit a serializable record. JSON mode only; text callers print fields.
    pub fn record<T: Serialize>(&self, kind: &str, value: &T) {
        if !self.json {
            return;
        }
        match serde_json::to_value(value) {
            Ok(payload) => Self::emit_json_line(kind, payload),
            Err(e) => self.error(&format!("failed to serialize {kind}: {e}")),
        }
    }
}
