use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::overrides::OverrideTable;
use crate::repair::{SCORE_COLUMN, STUDENT_ID_COLUMN};
use crate::table::Table;

/// Score at or above which a student counts as passing in the summary.
pub const PASSING_SCORE: f64 = 70.0;

/// Statistics for one grading pass over a report.
#[derive(Debug, Default, Serialize)]
pub struct GradeSummary {
    pub generated_at: DateTime<Utc>,
    pub total_students: usize,
    pub graded_students: usize,
    pub ungraded_students: usize,
    pub override_hits: usize,
    pub average_score: Option<f64>,
    pub pass_rate_percent: Option<f64>,
}

impl GradeSummary {
    /// Summarizes a graded report. Rows with a blank `Score` count as
    /// ungraded; `override_hits` counts rows whose student has any
    /// override rule.
    pub fn from_report(report: &Table, overrides: &OverrideTable) -> Self {
        let score_col = report.column_index(SCORE_COLUMN);
        let id_col = report.column_index(STUDENT_ID_COLUMN);

        let mut scores = Vec::new();
        let mut override_hits = 0;

        for row in 0..report.row_count() {
            if let Some(col) = score_col {
                if let Some(score) = report.number(row, col) {
                    scores.push(score);
                }
            }
            if let Some(col) = id_col {
                let (threshold, minimum) = overrides.get(report.cell(row, col).unwrap_or(""));
                if threshold.is_some() || minimum.is_some() {
                    override_hits += 1;
                }
            }
        }

        let total_students = report.row_count();
        let graded_students = scores.len();
        let average_score =
            (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64);
        let pass_rate_percent = (!scores.is_empty()).then(|| {
            let passing = scores.iter().filter(|s| **s >= PASSING_SCORE).count();
            100.0 * passing as f64 / scores.len() as f64
        });

        GradeSummary {
            generated_at: Utc::now(),
            total_students,
            graded_students,
            ungraded_students: total_students - graded_students,
            override_hits,
            average_score,
            pass_rate_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::{OverrideStore, OverrideTable};
    use crate::repair::SMART_SCORE_COLUMN;

    fn graded_report() -> Table {
        let mut t = Table::new(vec![
            STUDENT_ID_COLUMN.to_string(),
            SMART_SCORE_COLUMN.to_string(),
            SCORE_COLUMN.to_string(),
        ]);
        t.push_row(vec!["001".into(), "90".into(), "100".into()]);
        t.push_row(vec!["002".into(), "40".into(), "50".into()]);
        t.push_row(vec!["003".into(), "".into(), "".into()]);
        t
    }

    #[test]
    fn test_summary_counts_and_average() {
        let dir = tempfile::tempdir().unwrap();
        let mut overrides = OverrideTable::new(OverrideStore::open(dir.path()));
        overrides.set("002", Some(60.0), None);

        let summary = GradeSummary::from_report(&graded_report(), &overrides);

        assert_eq!(summary.total_students, 3);
        assert_eq!(summary.graded_students, 2);
        assert_eq!(summary.ungraded_students, 1);
        assert_eq!(summary.override_hits, 1);
        assert_eq!(summary.average_score, Some(75.0));
        assert_eq!(summary.pass_rate_percent, Some(50.0));
    }

    #[test]
    fn test_summary_of_ungraded_report() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = OverrideTable::new(OverrideStore::open(dir.path()));

        let mut t = Table::new(vec![STUDENT_ID_COLUMN.to_string(), SCORE_COLUMN.to_string()]);
        t.push_row(vec!["001".into(), "".into()]);

        let summary = GradeSummary::from_report(&t, &overrides);
        assert_eq!(summary.graded_students, 0);
        assert_eq!(summary.average_score, None);
        assert_eq!(summary.pass_rate_percent, None);
    }
}
