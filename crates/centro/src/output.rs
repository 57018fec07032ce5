//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Highlight on/off style states; everything else passes through.
pub fn paint_state(value: &str, color: bool) -> String {
    if !color {
        return value.to_owned();
    }
    match value {
        "ON" | "heat" => value.green().to_string(),
        "OFF" | "off" => value.dimmed().to_string(),
        "unknown" => value.yellow().to_string(),
        _ => value.to_owned(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    plain_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(plain_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single item; table mode uses a pre-formatted detail view.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => plain_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    if compact {
        serde_json::to_string(data).expect("serialization should not fail")
    } else {
        serde_json::to_string_pretty(data).expect("serialization should not fail")
    }
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).expect("serialization should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Item {
        id: &'static str,
        value: f64,
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "ID")]
        id: String,
    }

    fn items() -> Vec<Item> {
        vec![
            Item { id: "pwr10", value: 60.0 },
            Item { id: "pwr3", value: 80.0 },
        ]
    }

    fn render(format: OutputFormat) -> String {
        render_list(
            format,
            &items(),
            |i| ItemRow { id: i.id.into() },
            |i| format!("{}={}", i.id, i.value),
        )
    }

    #[test]
    fn plain_is_one_line_per_item() {
        assert_eq!(render(OutputFormat::Plain), "pwr10=60\npwr3=80");
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render(OutputFormat::JsonCompact);
        assert!(!out.contains('\n'));
        assert!(out.starts_with("[{\"id\":\"pwr10\""));
    }

    #[test]
    fn table_has_header() {
        let out = render(OutputFormat::Table);
        assert!(out.contains("ID"));
        assert!(out.contains("pwr3"));
    }

    #[test]
    fn paint_state_without_color_is_identity() {
        assert_eq!(paint_state("ON", false), "ON");
        assert_eq!(paint_state("42", true), "42");
    }
}
