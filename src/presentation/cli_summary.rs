use crate::application::monitoring::PerfReport;
use crate::application::pipeline::RunReport;
use crate::domain::dataset::{cell_text, Row};
use crate::domain::import_outcome::ImportOutcome;
use crate::error::PipelineError;
use colored::*;
use tabled::builder::Builder;
use tabled::settings::{object::Columns, Alignment, Modify, Style};
use tabled::{Table, Tabled};

pub fn print_summary(report: &RunReport) {
    println!();

    println!("{}", "SKUSYNC SEARCH SUMMARY".bold().cyan());
    println!(
        "Table: {}  ·  key column: {}",
        report.table.0.bold(),
        report.key_column.0.yellow()
    );
    println!("Run: {}", report.run_id.bright_yellow());
    println!("Cache: {}", describe_import(&report.import));
    println!();

    let result = &report.result;
    if result.matched.is_empty() {
        println!("{}", "No matching rows.".italic());
    } else {
        let mut builder = Builder::default();
        builder.push_record(report.header.iter().map(|c| c.0.clone()));
        for row in &result.matched {
            builder.push_record(row.iter().map(|cell| cell_text(cell).unwrap_or_default()));
        }
        println!("{}", builder.build().with(Style::rounded()));
    }

    if !result.not_found.is_empty() {
        println!();
        println!(
            "{} key(s) not found: {}",
            result.not_found.len().to_string().bold().red(),
            result
                .not_found
                .iter()
                .map(|k| k.red().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    println!();
    println!(
        "{} of {} requested key(s) matched {} row(s).",
        (report.requested - result.not_found.len()).to_string().green(),
        report.requested,
        result.matched.len().to_string().bold(),
    );

    match report.published_to {
        Some(kind) => println!("{} {}", "✓ Published to".bold().green(), kind.bold()),
        None => println!("{}", "Dry run: nothing published.".dimmed()),
    }
    println!();
}

fn describe_import(import: &ImportOutcome) -> String {
    match import {
        ImportOutcome::Created { fingerprint, .. } => {
            format!("{} ({})", "created".green(), short(fingerprint.as_str()))
        }
        ImportOutcome::Unchanged { fingerprint, .. } => {
            format!("{} ({})", "unchanged".dimmed(), short(fingerprint.as_str()))
        }
        ImportOutcome::Replaced {
            previous,
            fingerprint,
            ..
        } => format!(
            "{} ({} → {})",
            "replaced".yellow(),
            short(previous.as_str()),
            short(fingerprint.as_str())
        ),
    }
}

fn short(hex: &str) -> &str {
    &hex[..hex.len().min(12)]
}

/// Print the rows a dry run would have written, marker rows included.
pub fn print_layout(rows: &[Row]) {
    let mut builder = Builder::default();
    for row in rows {
        builder.push_record(row.iter().map(|cell| cell_text(cell).unwrap_or_default()));
    }
    println!("{}", "DESTINATION PREVIEW".bold().cyan());
    println!("{}", builder.build().with(Style::modern()));
    println!();
}

/// Print a pipeline failure as a single titled message on stderr.
pub fn print_error(err: &PipelineError) {
    eprintln!();
    eprintln!("{} {}", "✗".bold().red(), err.title().bold().red());
    eprintln!("  {}", err);
    if matches!(err, PipelineError::Publish(_)) {
        eprintln!(
            "  {}",
            "The cache import was kept; rerun to publish again.".dimmed()
        );
    }
    eprintln!();
}

// ─── Timings ──────────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct TimingRow {
    step: String,
    table: String,
    rows: usize,
    #[tabled(rename = "elapsed")]
    elapsed: String,
    #[tabled(rename = "% of run")]
    share: String,
}

/// Print how long each cache and search step took.
pub fn print_perf_summary(report: &PerfReport) {
    if report.timings.is_empty() {
        return;
    }

    let rows = report.timings.iter().map(|t| TimingRow {
        step: t.operation.to_string(),
        table: t.table.clone(),
        rows: t.rows,
        elapsed: elapsed(t.duration_ms),
        share: share(t.duration_ms, report.total_ms),
    });

    println!("{}", "TIMINGS".bold().cyan());
    println!(
        "{}",
        Table::new(rows)
            .with(Style::psql())
            .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
    );
    println!(
        "  {} read, {} written in {}",
        format!("{} row(s)", report.total_rows_read).bold(),
        format!("{} row(s)", report.total_rows_written).bold(),
        elapsed(report.total_ms).bold(),
    );
    println!();
}

fn elapsed(ms: u128) -> String {
    match ms {
        0 => "<1 ms".dimmed().to_string(),
        1..=999 => format!("{ms} ms"),
        _ => format!("{:.2} s", ms as f64 / 1_000.0).yellow().to_string(),
    }
}

fn share(part: u128, total: u128) -> String {
    if total == 0 {
        return "-".to_string();
    }
    format!("{:.0}%", part as f64 * 100.0 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_of_empty_run_is_a_dash() {
        assert_eq!(share(0, 0), "-");
        assert_eq!(share(25, 100), "25%");
    }

    #[test]
    fn short_keeps_twelve_hex_digits() {
        assert_eq!(short("0123456789abcdef"), "0123456789ab");
        assert_eq!(short("abc"), "abc");
    }
}
