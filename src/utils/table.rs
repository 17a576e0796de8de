//! Plain text tables with columns sized to their widest cell.

use console::Term;

use crate::error::{Error, Result};

const COLUMN_SEPARATOR: &str = "  ";

/// Formats `labels` and `rows` as lines of a table. The header, when there are
/// labels, is underlined with `=`.
pub fn format_table<S: AsRef<str>>(labels: &[&str], rows: &[Vec<S>]) -> Vec<String> {
    if labels.is_empty() && rows.is_empty() {
        return vec![];
    }

    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(labels.len()))
        .max()
        .unwrap_or(0);
    let mut widths = vec![0; columns];
    for (i, label) in labels.iter().enumerate() {
        widths[i] = label.chars().count();
    }
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.as_ref().chars().count());
        }
    }

    let mut lines = vec![];
    if !labels.is_empty() {
        lines.push(format_row(labels, &widths));
        let rule = widths.iter().sum::<usize>() + labels.len() * COLUMN_SEPARATOR.len();
        lines.push("=".repeat(rule));
    }
    for row in rows {
        lines.push(format_row(row, &widths));
    }
    lines
}

/// Prints the table on `stdout`.
pub fn print_table<S: AsRef<str>>(labels: &[&str], rows: &[Vec<S>]) -> Result<()> {
    let term = Term::stdout();
    for line in format_table(labels, rows) {
        term.write_line(&line)
            .map_err(|e| Error::io("<stdout>", e))?;
    }
    Ok(())
}

fn format_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = width))
        .collect::<Vec<_>>()
        .join(COLUMN_SEPARATOR)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn nothing_to_print() {
    let rows: Vec<Vec<String>> = vec![];
    assert!(format_table(&[], &rows).is_empty());
}

#[test]
fn columns_fit_widest_cell() {
    let rows = vec![
        vec!["/dev/ttyUSB0", "FT231X", "USB VID:PID=0403:6015"],
        vec!["/dev/ttyS0", "n/a", "n/a"],
    ];
    let lines = format_table(&["Device", "Description", "Hardware ID"], &rows);
    assert_eq!(
        lines,
        vec![
            "Device        Description  Hardware ID          ",
            "==================================================",
            "/dev/ttyUSB0  FT231X       USB VID:PID=0403:6015",
            "/dev/ttyS0    n/a          n/a                  ",
        ]
    );
}

#[test]
fn header_only() {
    let rows: Vec<Vec<&str>> = vec![];
    let lines = format_table(&["Key", "Size"], &rows);
    assert_eq!(lines, vec!["Key  Size", "==========="]);
}

#[test]
fn rows_without_labels_have_no_rule() {
    let lines = format_table(&[], &[vec!["a", "bb"], vec!["ccc", "d"]]);
    assert_eq!(lines, vec!["a    bb", "ccc  d "]);
}
