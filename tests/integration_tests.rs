use mastery_grader::grading::{GradingContext, assign_scores};
use mastery_grader::output::write_report;
use mastery_grader::overrides::{OverrideStore, OverrideTable};
use mastery_grader::repair::read_report;
use mastery_grader::summary::GradeSummary;

#[test]
fn test_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();

    // A typical malformed export: a comma inside a name produced a ragged
    // row, ids carry the stray prefix, and one assignment is unfinished.
    let report_path = dir.path().join("report.csv");
    std::fs::write(
        &report_path,
        "Student ID,Last name,First name,SmartScore\n\
         ID0012345,Smith,John,90\n\
         ID0012346,Jones,Ann,,40\n\
         ID0012347,Miller,Sue,\n\
         ID0012348,Lopez,Maria,20\n",
    )
    .unwrap();

    let overrides_path = dir.path().join("overrides.csv");
    std::fs::write(
        &overrides_path,
        "Student ID,Smart Score Threshold,Minimum Grade\n\
         ID0012346,60,\n\
         ID0012348,,60\n",
    )
    .unwrap();

    let mut report = read_report(&report_path).unwrap();

    let store_dir = dir.path().join("store");
    let mut overrides = OverrideTable::new(OverrideStore::open(&store_dir));
    overrides.import(&overrides_path).unwrap();

    let ctx = GradingContext {
        threshold: 80.0,
        overrides: &overrides,
    };
    assign_scores(&mut report, &ctx).unwrap();

    let output_path = dir.path().join("graded.csv");
    write_report(output_path.to_str().unwrap(), &report).unwrap();

    let content = std::fs::read_to_string(&output_path).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines[0], "Student ID,Last name,First name,SmartScore,Score");
    // 90 against the global 80 threshold caps at 100.
    assert_eq!(lines[1], "0012345,Smith,John,90,100");
    // The ragged row was repaired, then curved against the 60 override.
    assert_eq!(lines[2], "0012346,Jones,Ann ,40,67");
    // No smart score: no grade.
    assert_eq!(lines[3], "0012347,Miller,Sue,,");
    // Curved to 25, raised to the 60 minimum.
    assert_eq!(lines[4], "0012348,Lopez,Maria,20,60");

    let summary = GradeSummary::from_report(&report, &overrides);
    assert_eq!(summary.total_students, 4);
    assert_eq!(summary.graded_students, 3);
    assert_eq!(summary.ungraded_students, 1);
    assert_eq!(summary.override_hits, 2);

    // The imported overrides survive a fresh table over the same store.
    let reloaded = OverrideTable::new(OverrideStore::open(&store_dir));
    assert_eq!(reloaded.get("0012346"), (Some(60.0), None));
    assert_eq!(reloaded.get("0012348"), (None, Some(60.0)));
}
