//! Heuristic parser for delimiter-separated text.
//!
//! Documents often arrive as pasted spreadsheet cells (tab-separated) or CSV
//! exports. When the text looks like a table it skips model analysis and goes
//! straight to the settlement layout.

use serde_json::Value;

use crate::models::{Row, RowTable};

/// How far into the text to look for a tab before assuming commas.
const DELIMITER_SNIFF_CHARS: usize = 500;

/// Parses `text` as a table, or returns `None` when it does not look like one.
///
/// - Delimiter: tab if one occurs in the first 500 characters, else comma.
/// - The most frequent field count (at least 2) across non-blank lines is
///   canonical; ties go to the count seen first. Other lines are dropped.
/// - A numeric first cell means there is no header and columns are named
///   `col_0..`; otherwise the first canonical line is the header.
/// - At least one data row is required.
pub fn try_parse(text: &str) -> Option<RowTable> {
    let delimiter = detect_delimiter(text)?;

    let lines: Vec<Vec<&str>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split(delimiter).collect())
        .collect();
    if lines.len() < 2 {
        return None;
    }

    let width = canonical_width(&lines)?;
    let canonical: Vec<&Vec<&str>> = lines.iter().filter(|l| l.len() == width).collect();
    let first = canonical.first()?;

    let (header, data) = if is_numeric(first[0]) {
        let header = (0..width).map(|i| format!("col_{i}")).collect::<Vec<_>>();
        (header, &canonical[..])
    } else {
        let header = first
            .iter()
            .enumerate()
            .map(|(i, cell)| match cell.trim() {
                "" => format!("col_{i}"),
                name => name.to_string(),
            })
            .collect::<Vec<_>>();
        (header, &canonical[1..])
    };

    if data.is_empty() {
        return None;
    }

    let rows = data
        .iter()
        .map(|cells| {
            let mut row = Row::new();
            for (i, column) in header.iter().enumerate() {
                let cell = cells.get(i).map(|c| c.trim()).unwrap_or_default();
                row.insert(column.clone(), Value::String(cell.to_string()));
            }
            row
        })
        .collect();
    Some(rows)
}

fn detect_delimiter(text: &str) -> Option<char> {
    let head: String = text.chars().take(DELIMITER_SNIFF_CHARS).collect();
    if head.contains('\t') {
        Some('\t')
    } else if head.contains(',') {
        Some(',')
    } else {
        None
    }
}

/// Most frequent field count of at least 2; ties go to first seen.
fn canonical_width(lines: &[Vec<&str>]) -> Option<usize> {
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for line in lines.iter().filter(|l| l.len() >= 2) {
        match counts.iter_mut().find(|(width, _)| *width == line.len()) {
            Some((_, seen)) => *seen += 1,
            None => counts.push((line.len(), 1)),
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (width, seen) in counts {
        if best.map_or(true, |(_, top)| seen > top) {
            best = Some((width, seen));
        }
    }
    best.map(|(width, _)| width)
}

fn is_numeric(cell: &str) -> bool {
    cell.trim().replace(',', "").parse::<f64>().is_ok()
}
