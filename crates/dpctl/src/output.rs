//! Output formatting: tables for humans, JSON/YAML for scripts.

use std::io::IsTerminal;

use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use dpctl_core::{BatchPreview, BatchReport, BatchStatus, OutcomeStatus};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Formatting context derived from the global flags.
pub struct Printer {
    format: OutputFormat,
    color: bool,
    quiet: bool,
}

impl Printer {
    pub fn new(global: &GlobalOpts) -> Self {
        let color = match global.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        };
        Self {
            format: global.output,
            color,
            quiet: global.quiet,
        }
    }

    // ── Batch reports ────────────────────────────────────────────────

    pub fn print_report(&self, report: &BatchReport) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report)?);
                return Ok(());
            }
            OutputFormat::Yaml => {
                print!("{}", to_yaml(report)?);
                return Ok(());
            }
            OutputFormat::Table => {}
        }

        if !self.quiet {
            let rows: Vec<OutcomeRow> = report.outcomes.iter().map(|o| self.outcome_row(o)).collect();
            if !rows.is_empty() {
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }

        println!(
            "{}: {} attempted, {} succeeded, {} failed",
            self.status_label(report.status),
            report.summary.attempted,
            report.summary.succeeded,
            report.summary.failed
        );

        for error in &report.errors {
            eprintln!("{} {error}", self.paint_red("error:"));
        }
        Ok(())
    }

    fn outcome_row(&self, outcome: &dpctl_core::OperationOutcome) -> OutcomeRow {
        let status = match outcome.status {
            OutcomeStatus::Succeeded => self.paint_green("ok"),
            OutcomeStatus::Failed => self.paint_red("failed"),
        };
        OutcomeRow {
            entity: outcome.entity.to_string(),
            operation: outcome.description.clone(),
            status,
            http: outcome
                .http_status
                .map_or_else(|| "-".to_owned(), |s| s.to_string()),
            error: outcome.error.clone().unwrap_or_default(),
        }
    }

    fn status_label(&self, status: BatchStatus) -> String {
        match status {
            BatchStatus::Success => self.paint_green("success"),
            BatchStatus::PartialSuccess => self.paint_yellow("partial success"),
            BatchStatus::Failed => self.paint_red("failed"),
        }
    }

    // ── Previews ─────────────────────────────────────────────────────

    pub fn print_preview(&self, preview: &BatchPreview) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(preview)?);
                return Ok(());
            }
            OutputFormat::Yaml => {
                print!("{}", to_yaml(preview)?);
                return Ok(());
            }
            OutputFormat::Table => {}
        }

        let rows: Vec<PlannedRow> = preview
            .operations
            .iter()
            .map(|op| PlannedRow {
                method: op.method.to_string(),
                path: op.path.clone(),
                entity: op.entity.to_string(),
                note: op
                    .error
                    .as_ref()
                    .map_or_else(String::new, |e| self.paint_red(e)),
            })
            .collect();

        if rows.is_empty() {
            println!("nothing to do for device {}", preview.device);
            return Ok(());
        }

        println!("{}", Table::new(rows).with(Style::rounded()));
        println!(
            "dry run: {} operation(s) planned for device {}, nothing sent",
            preview.operations.len(),
            preview.device
        );
        for error in &preview.errors {
            eprintln!("{} {error}", self.paint_red("would fail:"));
        }
        Ok(())
    }

    // ── Raw values ───────────────────────────────────────────────────

    pub fn print_value(&self, value: &serde_json::Value) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Yaml => print!("{}", to_yaml(value)?),
            _ => println!("{}", serde_json::to_string_pretty(value)?),
        }
        Ok(())
    }

    pub fn note(&self, message: &str) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }

    // ── Color helpers ────────────────────────────────────────────────

    fn paint_green(&self, s: &str) -> String {
        if self.color { s.green().to_string() } else { s.to_owned() }
    }

    fn paint_yellow(&self, s: &str) -> String {
        if self.color { s.yellow().to_string() } else { s.to_owned() }
    }

    fn paint_red(&self, s: &str) -> String {
        if self.color { s.red().to_string() } else { s.to_owned() }
    }
}

fn to_yaml<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_yaml::to_string(value).map_err(|e| CliError::Validation {
        field: "output".into(),
        reason: e.to_string(),
    })
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "ENTITY")]
    entity: String,
    #[tabled(rename = "OPERATION")]
    operation: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "HTTP")]
    http: String,
    #[tabled(rename = "ERROR")]
    error: String,
}

#[derive(Tabled)]
struct PlannedRow {
    #[tabled(rename = "METHOD")]
    method: String,
    #[tabled(rename = "PATH")]
    path: String,
    #[tabled(rename = "ENTITY")]
    entity: String,
    #[tabled(rename = "NOTE")]
    note: String,
}
