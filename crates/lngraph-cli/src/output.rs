//! Shared output layer for pretty/text/JSON parity across all report commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its report
//! accordingly: framed output for humans, terse rows for scripts, or stable
//! JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / hidden `--json` flag
//! 2. `FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use std::fmt;
use std::io::{self, IsTerminal, Write};

use clap::ValueEnum;
use lngraph_core::TopologyError;
use serde::Serialize;

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<16} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (sections, aligned columns).
    Pretty,
    /// Plain whitespace-separated rows for pipes and scripts.
    Text,
    /// Machine-readable JSON, one pretty-printed object per report.
    Json,
}

/// Core resolution logic, separated from I/O for testability.
///
/// `format_flag`: explicit `--format` value if provided.
/// `json_flag`: hidden `--json` alias.
/// `format_env`: the value of `FORMAT` if set.
/// `is_tty`: true if stdout is a TTY.
fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }

    if json_flag {
        return OutputMode::Json;
    }

    if let Some(val) = format_env {
        match val.to_lowercase().as_str() {
            "json" => return OutputMode::Json,
            "text" => return OutputMode::Text,
            "pretty" => return OutputMode::Pretty,
            _ => {} // unknown value, fall through to TTY detection
        }
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from CLI flags, environment, and TTY defaults.
pub fn resolve_output_mode(format_flag: Option<OutputMode>, json_flag: bool) -> OutputMode {
    let env_val = std::env::var("FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(format_flag, json_flag, env_val.as_deref(), is_tty)
}

/// Render a serializable report into `out` with explicit text/pretty renderers.
pub fn render_mode_to<T: Serialize>(
    out: &mut dyn Write,
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, out)?,
        OutputMode::Pretty => pretty_fn(value, out)?,
    }
    Ok(())
}

/// Render a serializable report to stdout.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_mode_to(&mut out, mode, value, text_fn, pretty_fn)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "unknown_node", "snapshot_malformed").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create a simple error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    /// Create an error with a suggestion and error code.
    pub fn with_details(
        message: impl Into<String>,
        suggestion: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(suggestion.into()),
            error_code: Some(error_code.into()),
        }
    }

    /// Build the renderable form of a command failure.
    ///
    /// A [`CliError`] raised by a command is passed through; snapshot loader
    /// errors anywhere in the chain get a code and a suggestion.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        if let Some(cli) = err.downcast_ref::<Self>() {
            return Self {
                message: cli.message.clone(),
                suggestion: cli.suggestion.clone(),
                error_code: cli.error_code.clone(),
            };
        }

        let message = format!("{err:#}");
        let topology = err.chain().find_map(|e| e.downcast_ref::<TopologyError>());
        match topology {
            Some(TopologyError::Io { .. }) => Self::with_details(
                message,
                "check the snapshot path (export one with `lncli describegraph > graph.json`)",
                "snapshot_unreadable",
            ),
            Some(TopologyError::Parse(_)) => Self::with_details(
                message,
                "the snapshot must be `describegraph` JSON with `nodes` and `edges` arrays",
                "snapshot_malformed",
            ),
            Some(TopologyError::UnknownNode { .. }) => Self::with_details(
                message,
                "every channel endpoint must appear in the `nodes` array",
                "unknown_node",
            ),
            None => Self::new(message),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            writeln!(out, "error: {}", error.message)?;
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    // ── resolve_output_mode_inner ───────────────────────────────────────────

    #[test]
    fn resolve_format_flag_wins_over_json_and_env() {
        let mode = resolve_output_mode_inner(Some(OutputMode::Text), true, Some("pretty"), true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn resolve_json_flag_wins_over_env() {
        let mode = resolve_output_mode_inner(None, true, Some("pretty"), true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn resolve_format_env_json() {
        let mode = resolve_output_mode_inner(None, false, Some("json"), false);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn resolve_format_env_pretty_in_pipe() {
        let mode = resolve_output_mode_inner(None, false, Some("pretty"), false);
        assert_eq!(mode, OutputMode::Pretty);
    }

    #[test]
    fn resolve_format_env_case_insensitive() {
        let mode = resolve_output_mode_inner(None, false, Some("TEXT"), true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn resolve_format_env_unknown_falls_through_to_tty() {
        assert_eq!(
            resolve_output_mode_inner(None, false, Some("fancy"), true),
            OutputMode::Pretty
        );
        assert_eq!(
            resolve_output_mode_inner(None, false, Some("fancy"), false),
            OutputMode::Text
        );
    }

    #[test]
    fn resolve_default_depends_on_tty() {
        assert_eq!(resolve_output_mode_inner(None, false, None, true), OutputMode::Pretty);
        assert_eq!(resolve_output_mode_inner(None, false, None, false), OutputMode::Text);
    }

    // ── render_mode_to ──────────────────────────────────────────────────────

    #[derive(Serialize)]
    struct Sample {
        name: &'static str,
        count: u32,
    }

    fn render_sample(mode: OutputMode) -> String {
        let mut buf = Vec::new();
        render_mode_to(
            &mut buf,
            mode,
            &Sample {
                name: "hub",
                count: 3,
            },
            |s, w| writeln!(w, "{} {}", s.name, s.count),
            |s, w| pretty_kv(w, s.name, s.count.to_string()),
        )
        .expect("render");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn render_json_is_parseable() {
        let value: serde_json::Value =
            serde_json::from_str(&render_sample(OutputMode::Json)).expect("valid JSON");
        assert_eq!(value["name"], "hub");
        assert_eq!(value["count"], 3);
    }

    #[test]
    fn render_text_and_pretty_use_their_closures() {
        assert_eq!(render_sample(OutputMode::Text), "hub 3\n");
        let pretty = render_sample(OutputMode::Pretty);
        assert!(pretty.starts_with("hub:"));
        assert!(pretty.trim_end().ends_with('3'));
    }

    #[test]
    fn pretty_section_draws_rule() {
        let mut buf = Vec::new();
        pretty_section(&mut buf, "Summary").expect("write");
        let s = String::from_utf8(buf).expect("utf8");
        assert!(s.starts_with("Summary\n"));
        assert!(s.contains(&"-".repeat(PRETTY_RULE_WIDTH)));
    }

    // ── CliError ────────────────────────────────────────────────────────────

    #[test]
    fn cli_error_passes_through_anyhow() {
        let err: anyhow::Error =
            CliError::with_details("no such node", "use a pub key", "unknown_node").into();
        let cli = CliError::from_anyhow(&err);
        assert_eq!(cli.message, "no such node");
        assert_eq!(cli.error_code.as_deref(), Some("unknown_node"));
    }

    #[test]
    fn topology_errors_get_codes() {
        let err = lngraph_core::Topology::from_json_str("{ nope")
            .context("failed to load snapshot graph.json")
            .expect_err("malformed");
        let cli = CliError::from_anyhow(&err);
        assert_eq!(cli.error_code.as_deref(), Some("snapshot_malformed"));
        assert!(cli.message.contains("graph.json"));
        assert!(cli.suggestion.is_some());
    }

    #[test]
    fn plain_errors_have_no_code() {
        let cli = CliError::from_anyhow(&anyhow::anyhow!("boom"));
        assert_eq!(cli.message, "boom");
        assert!(cli.error_code.is_none());
    }

    #[test]
    fn render_error_in_all_modes() {
        let err = CliError::with_details("bad input", "try again", "bad_input");
        for mode in [OutputMode::Json, OutputMode::Pretty, OutputMode::Text] {
            assert!(render_error(mode, &err).is_ok());
        }
    }
}
