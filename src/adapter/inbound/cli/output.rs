//! Terminal output for CLI handlers.
//!
//! Every helper honors the global flags: `--json` switches to one JSON
//! object per line (`{"type": ..., "payload": ...}`), `--quiet` drops
//! everything except warnings and errors.

use std::fmt::Display;
use std::sync::{OnceLock, RwLock};

use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit machine-readable JSON output instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
    /// Verbosity level (0 = normal, 1+ = increasingly verbose).
    pub verbose: u8,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            json,
            quiet,
            verbose,
        }
    }
}

static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<OutputConfig> {
    OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()))
}

fn read_config() -> OutputConfig {
    match config_cell().read() {
        Ok(config) => *config,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

fn write_config(config: OutputConfig) {
    match config_cell().write() {
        Ok(mut current) => *current = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

fn regular_output_suppressed(config: OutputConfig) -> bool {
    !config.json && config.quiet
}

fn json_line(kind: &str, payload: serde_json::Value) -> String {
    json!({ "type": kind, "payload": payload }).to_string()
}

/// How a message behaves under `--quiet`.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Level {
    Regular,
    Always,
}

/// Route one message: a JSON line in JSON mode, otherwise `human` unless
/// quiet mode drops it.
fn emit(
    level: Level,
    kind: &str,
    payload: impl FnOnce() -> serde_json::Value,
    human: impl FnOnce(),
) {
    let config = read_config();
    if config.json {
        println!("{}", json_line(kind, payload()));
    } else if level == Level::Always || !regular_output_suppressed(config) {
        human();
    }
}

/// Apply output settings from global CLI flags.
pub fn configure(config: OutputConfig) {
    write_config(config);
}

#[must_use]
pub fn is_json() -> bool {
    read_config().json
}

#[must_use]
pub fn is_quiet() -> bool {
    read_config().quiet
}

/// Global verbosity level from `-v` flags.
#[must_use]
pub fn verbosity() -> u8 {
    read_config().verbose
}

/// Print the application name and version.
pub fn header(version: &str) {
    emit(
        Level::Regular,
        "header",
        || json!({ "app": "crowdsettle", "version": version }),
        || println!("{} {}\n", "crowdsettle".bold(), version.dimmed()),
    );
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    let value = value.to_string();
    emit(
        Level::Regular,
        "field",
        || json!({ "label": label, "value": value }),
        || println!("  {:<12} {}", label.dimmed(), value),
    );
}

pub fn success(message: &str) {
    emit(
        Level::Regular,
        "success",
        || json!({ "message": message }),
        || println!("  {} {}", "✓".green(), message),
    );
}

/// Print a warning line. Shown even in quiet mode.
pub fn warning(message: &str) {
    emit(
        Level::Always,
        "warning",
        || json!({ "message": message }),
        || println!("  {} {}", "⚠".yellow(), message),
    );
}

/// Print an error line to stderr, in both modes.
pub fn error(message: &str) {
    if is_json() {
        eprintln!("{}", json_line("error", json!({ "message": message })));
    } else {
        eprintln!("  {} {}", "×".red(), message);
    }
}

pub fn section(title: &str) {
    emit(
        Level::Regular,
        "section",
        || json!({ "title": title }),
        || println!("\n{}", title.bold()),
    );
}

pub fn note(message: &str) {
    emit(
        Level::Regular,
        "note",
        || json!({ "message": message }),
        || println!("  {}", message.dimmed()),
    );
}

pub fn hint(message: &str) {
    emit(
        Level::Regular,
        "hint",
        || json!({ "message": message }),
        || println!("  {}: {}", "hint".cyan().dimmed(), message.dimmed()),
    );
}

/// Print preformatted text, indenting each line.
pub fn lines(content: &str) {
    emit(
        Level::Regular,
        "lines",
        || json!({ "content": content }),
        || print_indented(content),
    );
}

/// Print rows as a table, or as one `table` JSON line holding the rows.
pub fn table<T: Tabled + Serialize>(rows: &[T]) {
    emit(
        Level::Regular,
        "table",
        || json!({ "rows": serde_json::to_value(rows).unwrap_or_else(|_| json!([])) }),
        || {
            let mut table = Table::new(rows);
            table.with(Style::sharp());
            print_indented(&table.to_string());
        },
    );
}

fn print_indented(content: &str) {
    for line in content.lines() {
        println!("  {line}");
    }
}

/// Emit a JSON value directly (for commands that need custom JSON output).
pub fn json_output(value: serde_json::Value) {
    println!("{}", value);
}

/// Color a value for emphasis. Plain in JSON mode.
pub fn highlight(value: impl Display) -> String {
    styled(value, |v| v.cyan().to_string())
}

/// Dim a value. Plain in JSON mode.
pub fn muted(value: impl Display) -> String {
    styled(value, |v| v.dimmed().to_string())
}

fn styled(value: impl Display, style: impl FnOnce(&str) -> String) -> String {
    let value = value.to_string();
    if is_json() {
        value
    } else {
        style(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_suppresses_regular_output_only_outside_json() {
        assert!(regular_output_suppressed(OutputConfig::new(false, true, 0)));
        assert!(!regular_output_suppressed(OutputConfig::new(true, true, 0)));
        assert!(!regular_output_suppressed(OutputConfig::new(false, false, 2)));
    }

    #[test]
    fn json_lines_wrap_payload_with_kind() {
        let line = json_line("field", json!({ "label": "workers", "value": "5" }));
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["type"], "field");
        assert_eq!(parsed["payload"]["label"], "workers");
    }

    #[test]
    fn default_config_is_human_and_chatty() {
        let config = OutputConfig::default();
        assert!(!config.json);
        assert!(!config.quiet);
        assert_eq!(config.verbose, 0);
    }
}
