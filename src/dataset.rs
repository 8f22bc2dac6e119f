use serde::Serialize;
use std::collections::BTreeMap;

/// One row of an exam workbook, projected to the columns the portal uses.
///
/// Scores are `None` when the cell was left blank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub name: String,
    pub section_a: Option<f64>,
    pub section_b: Option<f64>,
    /// Already a percentage; no scaling is applied.
    pub total: Option<f64>,
}

impl StudentRecord {
    /// A record counts as completed only when its total is strictly positive.
    pub fn is_complete(&self) -> bool {
        matches!(self.total, Some(total) if total > 0.0)
    }
}

/// Records of a single exam keyed by student ID.
pub type ExamRecords = BTreeMap<String, StudentRecord>;

/// Every loaded exam keyed by exam name.
///
/// Built fresh by [`crate::loader::load_exams`] and never mutated afterwards
/// by the lookup side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExamDataset {
    exams: BTreeMap<String, ExamRecords>,
}

impl ExamDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an exam, returning the records it replaced if the name was taken.
    pub fn insert_exam(
        &mut self,
        name: impl Into<String>,
        records: ExamRecords,
    ) -> Option<ExamRecords> {
        self.exams.insert(name.into(), records)
    }

    pub fn exam(&self, name: &str) -> Option<&ExamRecords> {
        self.exams.get(name)
    }

    pub fn exams(&self) -> impl Iterator<Item = (&String, &ExamRecords)> {
        self.exams.iter()
    }

    pub fn exam_names(&self) -> impl Iterator<Item = &str> {
        self.exams.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.exams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exams.is_empty()
    }

    /// Total number of student records across all exams.
    pub fn record_count(&self) -> usize {
        self.exams.values().map(BTreeMap::len).sum()
    }
}
