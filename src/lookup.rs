use crate::dataset::ExamDataset;
use serde::Serialize;
use std::collections::BTreeMap;

/// A student's completed result in one exam.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub section_a: Option<f64>,
    pub section_b: Option<f64>,
    pub total: f64,
    /// Always equal to `total`; workbooks store totals as percentages.
    pub percentage: f64,
}

/// Exam name to result, for a single student.
pub type StudentResults = BTreeMap<String, ResultRecord>;

/// Collect a student's completed results across all exams
///
/// Exams where the student is absent, or where their total is not strictly
/// positive, are left out. An empty map means "no results found".
///
/// The caller is expected to have validated `student_id` with
/// [`crate::student_id::is_valid_student_id`].
///
/// # Examples
/// ```
/// use exam_results::dataset::ExamDataset;
/// use exam_results::lookup::lookup_student;
///
/// let dataset = ExamDataset::new();
/// assert!(lookup_student(&dataset, "123456789").is_empty());
/// ```
pub fn lookup_student(dataset: &ExamDataset, student_id: &str) -> StudentResults {
    dataset
        .exams()
        .filter_map(|(exam_name, records)| {
            let record = records.get(student_id)?;
            let total = record.total.filter(|total| *total > 0.0)?;

            Some((
                exam_name.clone(),
                ResultRecord {
                    section_a: record.section_a,
                    section_b: record.section_b,
                    total,
                    percentage: total,
                },
            ))
        })
        .collect()
}

/// Render a score for display: whole numbers without a trailing ".0", and
/// `-` for a blank cell.
pub fn format_score(score: Option<f64>) -> String {
    score.map_or_else(|| "-".to_string(), |s| s.to_string())
}
