//! Textual rendering of a [`Report`]. The profiler exposes raw counts and
//! summaries; everything about layout, widths, and ordering-for-display
//! lives here.

use std::fmt::Write as _;

use crate::profile::Report;

/// Renders the full text report: file banner, coverage table, optional
/// frequency tables, and the elapsed-time footer.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File: {}", report.file_name);
    let _ = writeln!(out, "Info: {}", report.file_info);

    if !report.has_data() {
        let _ = writeln!(out, "No data found");
        return out;
    }

    let _ = writeln!(out, "=================");
    let _ = writeln!(out, " coverage report ");
    let _ = writeln!(out, "=================");
    let headers = ["field", "count", "%", "type", "summary"];
    let rows: Vec<Vec<String>> = report
        .coverage
        .iter()
        .map(|entry| {
            vec![
                entry.name.clone(),
                entry.count.to_string(),
                format!("{:.2}", entry.percent),
                entry.datatype.to_string(),
                entry.summary.clone(),
            ]
        })
        .collect();
    out.push_str(&render_table(&headers, &rows));
    let _ = writeln!(out);

    if let Some(frequency) = &report.frequency {
        let title = format!(
            "{} {} frequent string values",
            frequency.sample_size,
            if frequency.least_frequent {
                "least"
            } else {
                "most"
            }
        );
        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "{}", "=".repeat(title.len()));
        for column in &frequency.columns {
            let _ = writeln!(out, "{}", column.name);
            match &column.entries {
                None => {
                    let _ = writeln!(out, "  --- NOT AVAILABLE ---");
                }
                Some(entries) => {
                    let rows: Vec<Vec<String>> = entries
                        .iter()
                        .map(|entry| {
                            vec![
                                entry.count.to_string(),
                                format!("{:.2}", entry.percent),
                                entry.value.clone(),
                            ]
                        })
                        .collect();
                    out.push_str(&render_table(&["count", "%", "value"], &rows));
                }
            }
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Done in {:.3} seconds.", report.elapsed_seconds);
    out
}

/// Elastic-width table: each column is as wide as its widest cell, cells are
/// joined by two spaces, and a dashed separator follows the header.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let _ = writeln!(out, "{}", format_row(&header_cells, &widths));
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat((*w).max(3))).collect();
    let _ = writeln!(out, "{}", format_row(&separator, &widths));
    for row in rows {
        let _ = writeln!(out, "{}", format_row(row, &widths));
    }
    out
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let mut line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let sanitized: String = cell
                .chars()
                .map(|c| if matches!(c, '\n' | '\r' | '\t') { ' ' } else { c })
                .collect();
            let padding = width.saturating_sub(sanitized.chars().count());
            format!("{sanitized}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}
