//! CLI output formatting

use crate::core::{FeatureMatrix, FeatureVector, Frame, Item, RunReport, RunStatus, Series, Value};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");

/// Rows shown before a listing is elided
const MAX_ROWS: usize = 10;

/// Rows kept at each end of an elided listing
const EDGE_ROWS: usize = 5;

const ELLIPSIS: &str = "...";

/// Create a progress bar
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Current terminal width, 80 when unknown
pub fn terminal_width() -> usize {
    term_size::dimensions_stdout().map(|(w, _)| w).unwrap_or(80)
}

/// Format a run status for display
pub fn format_status(status: RunStatus) -> String {
    match status {
        RunStatus::Pending => style("PENDING").dim().to_string(),
        RunStatus::Running => style("RUNNING").yellow().to_string(),
        RunStatus::Completed => style("COMPLETED").green().to_string(),
        RunStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format a duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}.{:01}s", secs, duration.subsec_millis() / 100)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Format a run report: one header line and one line per stage
pub fn format_report(report: &RunReport) -> String {
    let icon = match report.status {
        RunStatus::Completed => CHECK,
        RunStatus::Failed => CROSS,
        RunStatus::Running => SPINNER,
        RunStatus::Pending => INFO,
    };
    let duration = report
        .duration()
        .and_then(|d| d.to_std().ok())
        .map(format_duration)
        .unwrap_or_else(|| "-".to_string());

    let mut lines = vec![format!(
        "{} {} - {} - {} ({})",
        icon,
        style(&report.run_id.to_string()[..8]).dim(),
        style(&report.pipeline).bold(),
        format_status(report.status),
        duration
    )];

    let total = report.stages.len();
    for (i, stage) in report.stages.iter().enumerate() {
        let mut line = format!(
            "  [{}/{}] {} ({}): {} in, {} kept",
            i + 1,
            total,
            style(&stage.stage).cyan(),
            stage.operation,
            stage.input,
            stage.kept
        );
        if stage.dropped > 0 {
            line.push_str(&format!(", {} dropped", style(stage.dropped).yellow()));
        }
        if stage.failed > 0 {
            line.push_str(&format!(", {} failed", style(stage.failed).red()));
        }
        if stage.skipped > 0 {
            line.push_str(&format!(", {} skipped", stage.skipped));
        }
        lines.push(line);
    }

    if let Some(error) = &report.error {
        lines.push(format!("{} {}", CROSS, style(error).red()));
    }
    lines.join("\n")
}

/// Format a pipeline output for the terminal
pub fn format_item(item: &Item) -> String {
    match item {
        Item::Single { value } => format_value(value, "0"),
        Item::Rejected { stage } => format!("{} Rejected by stage '{}'", WARN, style(stage).yellow()),
        Item::Collection { members } => format_series(members),
    }
}

/// Format a single value
pub fn format_value(value: &Value, name: &str) -> String {
    match value {
        Value::Mol(mol) => format!("{}  {}", name, mol.to_smiles()),
        Value::Vector(vector) => format_vector(vector),
        Value::Matrix(matrix) => format_matrix(matrix),
        Value::Failed(failure) => {
            let mut line = format!(
                "{} {} failed in '{}': {}",
                CROSS,
                name,
                failure.stage,
                style(&failure.reason).dim()
            );
            if let Some(input) = &failure.input {
                line.push_str(&format!(" ({})", input));
            }
            line
        }
    }
}

/// Format a collection: a table when it holds vectors, a listing otherwise
pub fn format_series(series: &Series) -> String {
    if series.iter().any(|m| m.value.as_vector().is_some()) {
        if let Ok(frame) = Frame::from_series(series) {
            return format_frame(&frame, terminal_width());
        }
    }

    let mut lines: Vec<String> = Vec::new();
    for member in series.iter() {
        match &member.value {
            Value::Matrix(_) | Value::Vector(_) => {
                lines.push(style(&member.name).bold().to_string());
                lines.push(format_value(&member.value, &member.name));
            }
            other => lines.push(format_value(other, &member.name)),
        }
    }
    lines.push(format!("Length: {}", series.len()));
    lines.join("\n")
}

/// Format a vector as `label value` lines, eliding the middle of long vectors
pub fn format_vector(vector: &FeatureVector) -> String {
    let rows: Vec<Option<usize>> = elide(vector.len());
    let labels: Vec<String> = rows
        .iter()
        .map(|r| r.map(|i| vector.label(i)).unwrap_or_else(|| ELLIPSIS.to_string()))
        .collect();
    let cells: Vec<String> = rows
        .iter()
        .map(|r| r.map(|i| format_number(vector.values[i])).unwrap_or_else(|| ELLIPSIS.to_string()))
        .collect();

    let label_width = labels.iter().map(|l| l.len()).max().unwrap_or(0);
    let cell_width = cells.iter().map(|c| c.len()).max().unwrap_or(0);

    let mut lines: Vec<String> = labels
        .iter()
        .zip(&cells)
        .map(|(label, cell)| format!("{:<lw$}    {:>cw$}", label, cell, lw = label_width, cw = cell_width))
        .collect();
    lines.push(format!("Name: {}, Length: {}", vector.name, vector.len()));
    lines.join("\n")
}

/// Format a matrix as a table with integer row labels
pub fn format_matrix(matrix: &FeatureMatrix) -> String {
    let index: Vec<String> = (0..matrix.rows).map(|i| i.to_string()).collect();
    let columns: Vec<String> = match &matrix.column_labels {
        Some(labels) => labels.clone(),
        None => (0..matrix.cols).map(|i| i.to_string()).collect(),
    };
    let data: Vec<Vec<f64>> = (0..matrix.rows).map(|r| matrix.row(r).to_vec()).collect();
    render_table(&index, &columns, &data, terminal_width())
}

/// Format a frame, truncating rows and fitting columns to `width`
pub fn format_frame(frame: &Frame, width: usize) -> String {
    render_table(&frame.index, &frame.columns, &frame.data, width)
}

fn render_table(index: &[String], columns: &[String], data: &[Vec<f64>], width: usize) -> String {
    let rows = elide(index.len());

    let index_cells: Vec<&str> = rows
        .iter()
        .map(|r| r.map(|i| index[i].as_str()).unwrap_or(ELLIPSIS))
        .collect();
    let index_width = index_cells.iter().map(|c| c.len()).max().unwrap_or(0);

    // (header, cells) for every column, in order
    let rendered: Vec<(usize, Vec<String>)> = columns
        .iter()
        .enumerate()
        .map(|(c, header)| {
            let cells: Vec<String> = rows
                .iter()
                .map(|r| match r {
                    Some(i) => format_number(data[*i][c]),
                    None => ELLIPSIS.to_string(),
                })
                .collect();
            let w = cells.iter().map(|s| s.len()).chain([header.len()]).max().unwrap_or(0);
            (w, cells)
        })
        .collect();

    let shown = fit_columns(&rendered.iter().map(|(w, _)| *w).collect::<Vec<_>>(), index_width, width);

    let mut header = " ".repeat(index_width);
    for col in &shown {
        match col {
            Some(c) => header.push_str(&format!("  {:>w$}", columns[*c], w = rendered[*c].0)),
            None => header.push_str(&format!("  {}", ELLIPSIS)),
        }
    }

    let mut lines = vec![header];
    for (r, label) in index_cells.iter().enumerate() {
        let mut line = format!("{:<w$}", label, w = index_width);
        for col in &shown {
            match col {
                Some(c) => line.push_str(&format!("  {:>w$}", rendered[*c].1[r], w = rendered[*c].0)),
                None => line.push_str(&format!("  {}", ELLIPSIS)),
            }
        }
        lines.push(line);
    }

    lines.push(String::new());
    lines.push(format!("[{} rows x {} columns]", index.len(), columns.len()));
    lines.join("\n")
}

/// Row positions to print; `None` marks the elided middle
fn elide(len: usize) -> Vec<Option<usize>> {
    if len <= MAX_ROWS {
        return (0..len).map(Some).collect();
    }
    (0..EDGE_ROWS)
        .map(Some)
        .chain([None])
        .chain((len - EDGE_ROWS..len).map(Some))
        .collect()
}

/// Columns that fit in `width`, taken alternately from both ends; `None` marks the gap
fn fit_columns(widths: &[usize], index_width: usize, width: usize) -> Vec<Option<usize>> {
    let full: usize = index_width + widths.iter().map(|w| w + 2).sum::<usize>();
    if full <= width {
        return (0..widths.len()).map(Some).collect();
    }

    let mut budget = width.saturating_sub(index_width + 2 + ELLIPSIS.len());
    let mut left = Vec::new();
    let mut right = Vec::new();
    let (mut lo, mut hi) = (0, widths.len());
    while lo < hi {
        let cost = widths[lo] + 2;
        if cost > budget {
            break;
        }
        budget -= cost;
        left.push(lo);
        lo += 1;

        if lo >= hi {
            break;
        }
        let cost = widths[hi - 1] + 2;
        if cost > budget {
            break;
        }
        budget -= cost;
        hi -= 1;
        right.push(hi);
    }

    right.reverse();
    let mut shown: Vec<Option<usize>> = left.into_iter().map(Some).collect();
    if lo < hi {
        shown.push(None);
    }
    shown.extend(right.into_iter().map(Some));
    shown
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{:.4}", value)
    }
}
