//! Output formatting: table, JSON, YAML, plain.
//!
//! Table uses `tabled`, structured formats use serde, plain emits one
//! value per line for scripting.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;

/// Color only on an interactive stdout, and never under `NO_COLOR`.
fn should_color() -> bool {
    io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Green check or red cross for a success flag.
pub fn status_mark(ok: bool) -> String {
    match (ok, should_color()) {
        (true, true) => "✓ success".green().bold().to_string(),
        (false, true) => "✗ failed".red().bold().to_string(),
        (true, false) => "success".into(),
        (false, false) => "failed".into(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable items, using `to_row` for tables
/// and `id_fn` for plain output.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
        structured => render_structured(structured, data),
    }
}

/// Render a single item. Tables get a pre-formatted detail view.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Plain => id_fn(data),
        structured => render_structured(structured, data),
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

/// JSON or YAML. Table and plain never reach here.
fn render_structured<T: serde::Serialize + ?Sized>(format: &OutputFormat, data: &T) -> String {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(data).expect("serialization should not fail"),
        OutputFormat::JsonCompact => serde_json::to_string(data).expect("serialization should not fail"),
        _ => serde_json::to_string_pretty(data).expect("serialization should not fail"),
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Item {
        id: &'static str,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: &'static str,
    }

    #[test]
    fn plain_lists_one_id_per_line() {
        let items = [Item { id: "ASUS" }, Item { id: "Zyxel" }];
        let out = render_list(
            &OutputFormat::Plain,
            &items,
            |i| Row { id: i.id },
            |i| i.id.to_owned(),
        );
        assert_eq!(out, "ASUS\nZyxel");
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render_single(
            &OutputFormat::JsonCompact,
            &Item { id: "x" },
            |_| String::new(),
            |_| String::new(),
        );
        assert_eq!(out, r#"{"id":"x"}"#);
    }

    #[test]
    fn yaml_and_pretty_json_share_one_path() {
        let item = Item { id: "x" };
        assert_eq!(render_structured(&OutputFormat::Yaml, &item), "id: x\n");
        assert_eq!(render_structured(&OutputFormat::Json, &item), "{\n  \"id\": \"x\"\n}");
    }

    #[test]
    fn table_has_header() {
        let out = render_list(&OutputFormat::Table, &[Item { id: "x" }], |i| Row { id: i.id }, |_| String::new());
        assert!(out.contains("ID"));
    }
}
