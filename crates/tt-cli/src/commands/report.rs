//! Report command for hours per description and day.
//!
//! This module implements `tt report` over an inclusive date range with three
//! outputs: a text table (default), a JSON document (`--json`) and a CSV
//! spreadsheet written next to either (`--csv PATH`).

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use csv::WriterBuilder;
use serde::Serialize;
use tt_core::{EntryStore, Persistence, Report};

/// Selected report range and outputs.
#[derive(Debug)]
pub struct ReportRequest<'a> {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub csv: Option<&'a Path>,
    pub json: bool,
}

/// First day of `today`'s month through `today`.
pub fn default_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today.with_day(1).unwrap_or(today), today)
}

pub fn run<P: Persistence, W: Write>(
    writer: &mut W,
    store: &EntryStore<P>,
    request: &ReportRequest<'_>,
) -> Result<()> {
    let report = store.generate_report(request.start, request.end);
    let (start, end) = report
        .dates
        .first()
        .zip(report.dates.last())
        .map_or((request.start, request.end), |(s, e)| (*s, *e));

    if let Some(path) = request.csv {
        export_csv(path, &report)?;
        tracing::debug!(path = %path.display(), rows = report.rows.len(), "wrote csv report");
    }

    if request.json {
        writeln!(writer, "{}", format_report_json(&report, start, end)?)?;
    } else if report.is_empty() {
        writeln!(writer, "No entries between {start} and {end}.")?;
    } else {
        write!(writer, "{}", format_report(&report))?;
    }

    if let Some(path) = request.csv {
        writeln!(writer, "CSV written to {}", path.display())?;
    }
    Ok(())
}

// ========== Text ==========

/// Formats the report as an aligned table of hours.
pub fn format_report(report: &Report) -> String {
    let mut output = String::new();

    let label_width = report
        .rows
        .iter()
        .map(|r| r.label.chars().count())
        .chain(["Description".len(), "Total".len()])
        .max()
        .unwrap_or_default();
    // Dates are the widest cell in every column.
    let cell_width = 10;

    let _ = write!(output, "{:<label_width$}", "Description");
    for date in &report.dates {
        let _ = write!(output, "  {:>cell_width$}", date.to_string());
    }
    let _ = writeln!(output, "  {:>cell_width$}", "Total");

    for row in &report.rows {
        let padding = label_width - row.label.chars().count();
        let _ = write!(output, "{}{}", row.label, " ".repeat(padding));
        for hours in &row.hours {
            let _ = write!(output, "  {hours:>cell_width$.2}");
        }
        let _ = writeln!(output, "  {:>cell_width$.2}", row.total());
    }

    let _ = write!(output, "{:<label_width$}", "Total");
    for hours in report.column_totals() {
        let _ = write!(output, "  {hours:>cell_width$.2}");
    }
    let _ = writeln!(output, "  {:>cell_width$.2}", report.grand_total());

    output
}

// ========== CSV ==========

/// Writes the report grid to `path`, replacing any existing file.
pub fn export_csv(path: &Path, report: &Report) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Unable to create CSV file {}", path.display()))?;
    write_csv(file, report).with_context(|| format!("Unable to write CSV file {}", path.display()))
}

/// Header `Description, <dates>, Total`, one line per row, then a `Total` line.
pub fn write_csv<W: io::Write>(out: W, report: &Report) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().from_writer(out);

    let mut header = vec!["Description".to_string()];
    header.extend(report.dates.iter().map(ToString::to_string));
    header.push("Total".to_string());
    csv_writer.write_record(&header)?;

    for row in &report.rows {
        let mut record = vec![row.label.clone()];
        record.extend(row.hours.iter().map(|h| format!("{h:.2}")));
        record.push(format!("{:.2}", row.total()));
        csv_writer.write_record(&record)?;
    }

    let mut totals = vec!["Total".to_string()];
    totals.extend(report.column_totals().iter().map(|h| format!("{h:.2}")));
    totals.push(format!("{:.2}", report.grand_total()));
    csv_writer.write_record(&totals)?;

    csv_writer.flush()?;
    Ok(())
}

// ========== JSON Output ==========

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dates: &'a [NaiveDate],
    pub rows: Vec<JsonRow<'a>>,
    pub column_totals: Vec<f64>,
    pub grand_total: f64,
}

#[derive(Debug, Serialize)]
pub struct JsonRow<'a> {
    pub label: &'a str,
    pub is_absence: bool,
    pub hours: &'a [f64],
    pub total: f64,
}

/// Formats the report as pretty-printed JSON.
pub fn format_report_json(report: &Report, start: NaiveDate, end: NaiveDate) -> Result<String> {
    let json = JsonReport {
        start_date: start,
        end_date: end,
        dates: &report.dates,
        rows: report
            .rows
            .iter()
            .map(|row| JsonRow {
                label: &row.label,
                is_absence: row.is_absence,
                hours: &row.hours,
                total: row.total(),
            })
            .collect(),
        column_totals: report.column_totals(),
        grand_total: report.grand_total(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}
