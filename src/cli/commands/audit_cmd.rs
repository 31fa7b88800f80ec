//! `chromesync audit` — list past verify and migrate runs.
//!
//!   chromesync audit --last 20
//!   chromesync audit --since 2w

use chrono::{DateTime, Duration, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table};
use console::style;

use crate::audit::{AuditEntry, AuditLog};
use crate::cli::{load_settings, output};
use crate::errors::{ChromeSyncError, Result};

/// Execute the `audit` command.
pub fn execute(last: usize, since: Option<&str>) -> Result<()> {
    let (cwd, settings) = load_settings()?;
    let audit_dir = settings.audit_path(&cwd);
    let db_path = AuditLog::db_path(&audit_dir);

    if !db_path.exists() {
        output::info("No audit entries recorded yet.");
        return Ok(());
    }

    let cutoff = since.map(parse_since).transpose()?;
    let log = AuditLog::open(&audit_dir).ok_or_else(|| {
        ChromeSyncError::AuditError(format!("cannot open {}", db_path.display()))
    })?;
    let runs = log.query(last, cutoff)?;

    if runs.is_empty() {
        output::info("No audit entries match.");
        return Ok(());
    }

    println!(
        "{}",
        style(format!("{} run(s) from {}", runs.len(), db_path.display())).bold()
    );
    println!("{}", runs_table(&runs));
    Ok(())
}

/// `<n><unit>` back from now, unit one of w/d/h/m.
fn parse_since(spec: &str) -> Result<DateTime<Utc>> {
    let spec = spec.trim();
    let bad = || {
        ChromeSyncError::InvalidArgument(format!(
            "--since expects a count and unit such as 2w, 7d, 12h or 45m (got '{spec}')"
        ))
    };

    let unit = spec.chars().last().ok_or_else(bad)?;
    let count: i64 = spec[..spec.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| bad())?;

    let span = match unit {
        'w' => Duration::weeks(count),
        'd' => Duration::days(count),
        'h' => Duration::hours(count),
        'm' => Duration::minutes(count),
        _ => return Err(bad()),
    };
    Ok(Utc::now() - span)
}

fn runs_table(runs: &[AuditEntry]) -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["When (UTC)", "Run", "Browsers", "Profile", "Result"]);

    for run in runs {
        table.add_row(vec![
            Cell::new(run.timestamp.format("%Y-%m-%d %H:%M")),
            run_cell(&run.operation),
            Cell::new(&run.target),
            Cell::new(run.profile.as_deref().unwrap_or("")),
            Cell::new(run.details.as_deref().unwrap_or("")),
        ]);
    }
    table
}

fn run_cell(operation: &str) -> Cell {
    let cell = Cell::new(operation);
    match operation {
        "migrate" => cell.fg(Color::Green),
        "verify" => cell.fg(Color::Cyan),
        _ => cell,
    }
}
