//! Score curving against a threshold, with per-student overrides.

use tracing::debug;

use crate::error::{GraderError, Result};
use crate::overrides::OverrideTable;
use crate::repair::{SCORE_COLUMN, SMART_SCORE_COLUMN, STUDENT_ID_COLUMN};
use crate::table::Table;

/// Inputs for one grading pass: the global threshold plus the per-student
/// override rules. The pass only reads the override table.
pub struct GradingContext<'a> {
    pub threshold: f64,
    pub overrides: &'a OverrideTable,
}

/// Curves a smart score against a threshold to a whole 0-100 percentage.
///
/// Scores at or above the threshold earn 100; below it they scale linearly.
/// Halves round away from zero (62.5 becomes 63). The threshold must be
/// non-zero.
pub fn curve(smart_score: f64, threshold: f64) -> f64 {
    (100.0 * smart_score.min(threshold) / threshold).round()
}

/// Computes a `Score` for every row of a repaired report and appends it as
/// a new column.
///
/// Rows without a numeric `SmartScore` get a blank score. A zero effective
/// threshold fails the whole pass; no partial `Score` column is attached.
pub fn assign_scores(report: &mut Table, ctx: &GradingContext<'_>) -> Result<()> {
    let (Some(id_col), Some(smart_col)) = (
        report.column_index(STUDENT_ID_COLUMN),
        report.column_index(SMART_SCORE_COLUMN),
    ) else {
        return Err(GraderError::MissingColumns {
            columns: [STUDENT_ID_COLUMN, SMART_SCORE_COLUMN]
                .iter()
                .filter(|c| report.column_index(c).is_none())
                .map(|c| c.to_string())
                .collect(),
        });
    };

    let mut scores = Vec::with_capacity(report.row_count());
    for row in 0..report.row_count() {
        let student_id = report.cell(row, id_col).unwrap_or("").to_string();

        // An incomplete assignment has no smart score; that row simply
        // stays ungraded.
        let Some(smart_score) = report.number(row, smart_col) else {
            scores.push(String::new());
            continue;
        };

        let (threshold_override, minimum_grade) = ctx.overrides.get(&student_id);
        let threshold = threshold_override.unwrap_or(ctx.threshold);
        if threshold == 0.0 {
            return Err(GraderError::ZeroThreshold { student_id });
        }

        let mut grade = curve(smart_score, threshold);
        if let Some(minimum) = minimum_grade {
            if grade < minimum {
                debug!(student_id = %student_id, grade, minimum, "Raising grade to student minimum");
                grade = minimum;
            }
        }

        scores.push(format_score(grade));
    }

    report.add_column(SCORE_COLUMN, scores);
    Ok(())
}

/// Renders a score without a decimal point when it is whole.
fn format_score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
