//! In-memory table of per-student overrides, write-through persisted.

use std::path::Path;

use tracing::info;

use super::store::{OverrideRecord, OverrideStore};
use crate::error::{GraderError, Result};
use crate::repair::canonicalize_student_id;

/// Required columns of an overrides CSV, in export order.
pub const OVERRIDE_COLUMNS: [&str; 3] = ["Student ID", "Smart Score Threshold", "Minimum Grade"];

/// The current set of per-student override rules, keyed by canonical
/// student id. At most one record per student; mutations persist
/// immediately through the backing store.
pub struct OverrideTable {
    records: Vec<OverrideRecord>,
    store: OverrideStore,
}

impl OverrideTable {
    /// Builds a table over `store`, reloading any previously persisted
    /// records.
    pub fn new(store: OverrideStore) -> Self {
        let records = store.load().unwrap_or_default();
        OverrideTable { records, store }
    }

    /// Replaces the whole table with the contents of a CSV file and
    /// persists the result.
    ///
    /// The file must carry the three [`OVERRIDE_COLUMNS`]; rows whose id is
    /// empty after canonicalization are dropped, and numeric cells that are
    /// non-numeric or outside 0-100 become absent rather than errors.
    pub fn import(&mut self, path: &Path) -> Result<()> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let missing: Vec<String> = OVERRIDE_COLUMNS
            .iter()
            .filter(|c| !headers.iter().any(|h| h == *c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(GraderError::MissingColumns { columns: missing });
        }

        let column = |name: &str| headers.iter().position(|h| h == name).unwrap();
        let id_col = column(OVERRIDE_COLUMNS[0]);
        let threshold_col = column(OVERRIDE_COLUMNS[1]);
        let minimum_col = column(OVERRIDE_COLUMNS[2]);

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            let student_id = canonicalize_student_id(record.get(id_col).unwrap_or(""));
            if student_id.is_empty() {
                continue;
            }
            records.push(OverrideRecord {
                student_id,
                threshold: coerce_percent(record.get(threshold_col)),
                minimum_grade: coerce_percent(record.get(minimum_col)),
            });
        }

        self.records = records;
        self.persist();
        info!(count = self.records.len(), "Imported student overrides");
        Ok(())
    }

    /// Upserts one student's overrides and persists.
    ///
    /// Only supplied fields overwrite an existing record; out-of-range
    /// values are coerced to absent, which leaves any existing value
    /// untouched.
    pub fn set(&mut self, student_id: &str, threshold: Option<f64>, minimum_grade: Option<f64>) {
        let student_id = canonicalize_student_id(student_id);
        let threshold = threshold.and_then(valid_percent);
        let minimum_grade = minimum_grade.and_then(valid_percent);

        match self
            .records
            .iter_mut()
            .find(|r| r.student_id == student_id)
        {
            Some(existing) => {
                if threshold.is_some() {
                    existing.threshold = threshold;
                }
                if minimum_grade.is_some() {
                    existing.minimum_grade = minimum_grade;
                }
            }
            None => self.records.push(OverrideRecord {
                student_id,
                threshold,
                minimum_grade,
            }),
        }

        self.persist();
    }

    /// Returns `(threshold, minimum_grade)` for a student. Never fails;
    /// unknown students get `(None, None)`.
    pub fn get(&self, student_id: &str) -> (Option<f64>, Option<f64>) {
        let student_id = canonicalize_student_id(student_id);
        self.records
            .iter()
            .find(|r| r.student_id == student_id)
            .map(|r| (r.threshold, r.minimum_grade))
            .unwrap_or((None, None))
    }

    /// Removes a student's record if present and persists. No-op for
    /// unknown students.
    pub fn remove(&mut self, student_id: &str) {
        let student_id = canonicalize_student_id(student_id);
        self.records.retain(|r| r.student_id != student_id);
        self.persist();
    }

    /// Drops every record, in memory and in the backing store.
    pub fn clear_all(&mut self) {
        self.records.clear();
        self.persist();
    }

    /// Writes the current records as CSV. Fails without writing anything
    /// when the table is empty.
    pub fn export(&self, path: &Path) -> Result<()> {
        if self.records.is_empty() {
            return Err(GraderError::EmptyExport);
        }

        let mut writer = csv::Writer::from_path(path)?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn records(&self) -> &[OverrideRecord] {
        &self.records
    }

    pub fn has_overrides(&self) -> bool {
        !self.records.is_empty()
    }

    fn persist(&self) {
        self.store.save(&self.records);
    }
}

fn valid_percent(value: f64) -> Option<f64> {
    (value.is_finite() && (0.0..=100.0).contains(&value)).then_some(value)
}

/// Numeric-or-absent coercion for override cells: blank, non-numeric,
/// non-finite, and out-of-range text all collapse to absent.
fn coerce_percent(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse().ok().and_then(valid_percent)
}
