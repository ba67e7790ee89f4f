//! Table formatting for list and show commands
//!
//! List commands describe their rows once as a [`Listing`]; the selected
//! [`OutputFormat`] decides whether that becomes a terminal table, TSV, CSV,
//! markdown, bare IDs, or a JSON/YAML dump of the underlying records.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::OutputFormat;

/// Rows of a list command. The first column must be the row ID.
pub struct Listing<'a, T: Serialize> {
    /// Singular noun for the summary line, e.g. "project"
    pub noun: &'a str,
    pub headers: &'a [&'a str],
    pub rows: Vec<Vec<String>>,
    /// Full records, used for JSON and YAML output
    pub items: &'a [T],
}

impl<'a, T: Serialize> Listing<'a, T> {
    /// Render the listing to a string
    pub fn render(&self, format: OutputFormat, show_summary: bool) -> Result<String> {
        let mut out = match format {
            OutputFormat::Json => {
                let mut s = serde_json::to_string_pretty(self.items).into_diagnostic()?;
                s.push('\n');
                s
            }
            OutputFormat::Yaml => serde_yml::to_string(&self.items).into_diagnostic()?,
            OutputFormat::Id => self
                .rows
                .iter()
                .filter_map(|row| row.first())
                .map(|id| format!("{}\n", id))
                .collect(),
            OutputFormat::Tsv => {
                let mut s = self.headers.join("\t");
                s.push('\n');
                for row in &self.rows {
                    s.push_str(&row.join("\t"));
                    s.push('\n');
                }
                s
            }
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(Vec::new());
                writer.write_record(self.headers).into_diagnostic()?;
                for row in &self.rows {
                    writer.write_record(row).into_diagnostic()?;
                }
                let bytes = writer.into_inner().into_diagnostic()?;
                String::from_utf8(bytes).into_diagnostic()?
            }
            OutputFormat::Md | OutputFormat::Auto => {
                if self.rows.is_empty() && format == OutputFormat::Auto {
                    String::new()
                } else {
                    let mut builder = Builder::default();
                    builder.push_record(self.headers.iter().copied());
                    for row in &self.rows {
                        builder.push_record(row.iter().cloned());
                    }
                    let mut table = builder.build();
                    if format == OutputFormat::Md {
                        table.with(Style::markdown());
                    } else {
                        table.with(Style::rounded());
                    }
                    format!("{}\n", table)
                }
            }
        };

        if show_summary && format == OutputFormat::Auto {
            out.push_str(&format!(
                "{} {}(s) found\n",
                style(self.rows.len()).cyan(),
                self.noun
            ));
        }

        Ok(out)
    }

    pub fn print(&self, format: OutputFormat, quiet: bool) -> Result<()> {
        print!("{}", self.render(format, !quiet)?);
        Ok(())
    }
}

/// Print a single record: JSON/YAML dump, or the human form from `human`
pub fn print_record<T: Serialize>(
    format: OutputFormat,
    record: &T,
    human: impl FnOnce() -> Result<()>,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(record).into_diagnostic()?
            );
            Ok(())
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(record).into_diagnostic()?);
            Ok(())
        }
        _ => human(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        id: &'static str,
        name: &'static str,
    }

    fn listing<'a>(items: &'a [Row]) -> Listing<'a, Row> {
        Listing {
            noun: "widget",
            headers: &["ID", "NAME"],
            rows: items
                .iter()
                .map(|r| vec![r.id.to_string(), r.name.to_string()])
                .collect(),
            items,
        }
    }

    const ITEMS: [Row; 2] = [
        Row { id: "A-1", name: "plain" },
        Row { id: "A-2", name: "with, comma" },
    ];

    #[test]
    fn test_tsv_and_id() {
        let l = listing(&ITEMS);
        assert_eq!(
            l.render(OutputFormat::Tsv, true).unwrap(),
            "ID\tNAME\nA-1\tplain\nA-2\twith, comma\n"
        );
        assert_eq!(l.render(OutputFormat::Id, true).unwrap(), "A-1\nA-2\n");
    }

    #[test]
    fn test_csv_quotes_fields() {
        let out = listing(&ITEMS).render(OutputFormat::Csv, true).unwrap();
        assert_eq!(out, "ID,NAME\nA-1,plain\nA-2,\"with, comma\"\n");
    }

    #[test]
    fn test_json_dumps_items() {
        let out = listing(&ITEMS).render(OutputFormat::Json, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[1]["name"], "with, comma");
    }

    #[test]
    fn test_auto_table_has_summary() {
        let out = listing(&ITEMS).render(OutputFormat::Auto, true).unwrap();
        assert!(out.contains("plain"));
        assert!(out.contains("widget(s) found"));

        let quiet = listing(&ITEMS).render(OutputFormat::Auto, false).unwrap();
        assert!(!quiet.contains("found"));
    }
}
