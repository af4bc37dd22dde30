//! Report repair and normalization.
//!
//! Exports from the learning platform are frequently malformed: rows gain
//! extra comma-separated fields when a name contains a comma, and student
//! identifiers arrive with a stray `ID` prefix. Repair happens on raw lines
//! before structured parsing.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{GraderError, Result};
use crate::table::Table;

pub const STUDENT_ID_COLUMN: &str = "Student ID";
pub const SMART_SCORE_COLUMN: &str = "SmartScore";
pub const SCORE_COLUMN: &str = "Score";

/// Normalizes a student identifier: surrounding whitespace removed and any
/// leading run of the characters `I` and `D` stripped.
///
/// Idempotent: the result never starts with whitespace, `I`, or `D`, so
/// re-applying is a no-op.
pub fn canonicalize_student_id(raw: &str) -> String {
    raw.trim().trim_start_matches(['I', 'D']).trim().to_string()
}

/// Rejoins overflowing data lines down to the header's field count.
///
/// Name fields come before the other blankable fields in the export, so the
/// first blank cell in a row with too many fields is taken to be part of the
/// name and merged into the preceding cell. Repeats per row until the field
/// count matches or nothing is mergeable; the header is never touched.
pub fn fix_column_counts(lines: &[String]) -> Vec<String> {
    let Some(header) = lines.first() else {
        return Vec::new();
    };
    let expected = header.split(',').count();

    let mut fixed = Vec::with_capacity(lines.len());
    fixed.push(header.clone());

    for line in &lines[1..] {
        let mut parts: Vec<String> = line.split(',').map(str::to_string).collect();
        while parts.len() > expected {
            match parts.iter().position(|p| p.is_empty()) {
                Some(i) if i > 0 => {
                    let blank = parts.remove(i);
                    parts[i - 1] = format!("{} {}", parts[i - 1], blank);
                }
                // No blank cell to fold away; pass the line through and let
                // downstream parsing surface the misalignment.
                _ => break,
            }
        }
        fixed.push(parts.join(","));
    }

    fixed
}

/// Reads a report file, repairs its lines, and parses it into a [`Table`]
/// with a canonicalized `Student ID` column.
pub fn read_report(path: &Path) -> Result<Table> {
    let raw = fs::read_to_string(path).map_err(|e| GraderError::FileFormat {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let lines: Vec<String> = raw.lines().map(str::to_string).collect();
    if lines.first().is_none_or(|l| l.trim().is_empty()) {
        return Err(GraderError::FileFormat {
            path: path.display().to_string(),
            message: "missing header row".to_string(),
        });
    }

    let repaired = fix_column_counts(&lines);
    debug!(lines = repaired.len(), "Report lines repaired");

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(repaired.join("\n").as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| GraderError::FileFormat {
            path: path.display().to_string(),
            message: e.to_string(),
        })?
        .iter()
        .map(str::to_string)
        .collect();

    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record.map_err(|e| GraderError::FileFormat {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        table.push_row(record.iter().map(str::to_string).collect());
    }

    let missing_column = |name: &str| GraderError::FileFormat {
        path: path.display().to_string(),
        message: format!("missing required column {name:?}"),
    };
    if table.column_index(SMART_SCORE_COLUMN).is_none() {
        return Err(missing_column(SMART_SCORE_COLUMN));
    }
    let id_col = table
        .column_index(STUDENT_ID_COLUMN)
        .ok_or_else(|| missing_column(STUDENT_ID_COLUMN))?;
    for row in 0..table.row_count() {
        let canonical = canonicalize_student_id(table.cell(row, id_col).unwrap_or(""));
        table.set_cell(row, id_col, canonical);
    }

    Ok(table)
}
