use crate::dataset::{ExamDataset, ExamRecords, StudentRecord};
use crate::error::{FileFailure, LoadError};
use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use std::fs;
use std::path::{Path, PathBuf};

/// Extension (compared case-insensitively) of the workbooks picked up from the data directory
pub const EXAM_EXTENSION: &str = "xlsx";

pub const ID_COLUMN: &str = "ID";
pub const NAME_COLUMN: &str = "Name";
pub const SECTION_A_COLUMN: &str = "Section A";
pub const SECTION_B_COLUMN: &str = "Section B";
pub const TOTAL_COLUMN: &str = "Total";

/// Outcome of scanning a set of exam workbooks
///
/// The dataset contains every workbook that parsed; `failures` lists the ones
/// that were skipped, in processing order.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub dataset: ExamDataset,
    pub failures: Vec<FileFailure>,
}

/// Load every exam workbook in a directory
///
/// A missing directory yields an empty dataset. Workbooks that fail to parse
/// are skipped and logged; they never abort the scan.
///
/// # Arguments
/// * `dir` - Directory holding one `.xlsx` file per exam
///
/// # Returns
/// * `ExamDataset` - Exam name (file name without extension) to student records
///
/// # Examples
/// ```no_run
/// use exam_results::loader::load_exams;
///
/// let dataset = load_exams("data");
/// println!("Loaded {} exams", dataset.len());
/// ```
pub fn load_exams(dir: impl AsRef<Path>) -> ExamDataset {
    load_exams_with_report(dir).dataset
}

/// Same as [`load_exams`], but also returns the workbooks that were skipped.
pub fn load_exams_with_report(dir: impl AsRef<Path>) -> LoadReport {
    let dir = dir.as_ref();
    if !dir.exists() {
        log::debug!("data directory {} does not exist", dir.display());
        return LoadReport::default();
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("cannot list data directory {}: {}", dir.display(), e);
            return LoadReport::default();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_exam_file(path))
        .collect();
    // read_dir order is filesystem dependent
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    load_exam_files(paths)
}

/// Load an explicit, ordered list of exam workbooks
///
/// When two files share an exam name, the one processed later replaces the
/// earlier one.
pub fn load_exam_files<I, P>(paths: I) -> LoadReport
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut report = LoadReport::default();

    for path in paths {
        let path = path.as_ref();
        let Some(name) = exam_name(path) else {
            continue;
        };

        match read_exam_file(path) {
            Ok(records) => {
                log::debug!(
                    "loaded {} records for exam '{}' from {}",
                    records.len(),
                    name,
                    path.display()
                );
                if report.dataset.insert_exam(name.clone(), records).is_some() {
                    log::warn!(
                        "exam '{}' from {} replaces an earlier file with the same name",
                        name,
                        path.display()
                    );
                }
            }
            Err(error) => {
                log::warn!("Error loading {}: {}", path.display(), error);
                report.failures.push(FileFailure {
                    path: path.to_path_buf(),
                    error,
                });
            }
        }
    }

    report
}

/// Read the first worksheet of one exam workbook.
pub fn read_exam_file(path: impl AsRef<Path>) -> Result<ExamRecords, LoadError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::NoWorksheet)??;

    parse_exam_range(&range)
}

fn is_exam_file(path: &Path) -> bool {
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    // Excel keeps "~$name.xlsx" lock files next to open workbooks
    if file_name.starts_with("~$") {
        return false;
    }

    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(EXAM_EXTENSION))
}

fn exam_name(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
}

/// Positions of the required columns within the header row.
struct ColumnIndex {
    id: usize,
    name: usize,
    section_a: usize,
    section_b: usize,
    total: usize,
}

impl ColumnIndex {
    fn from_header(header: &[Data]) -> Result<Self, LoadError> {
        let find = |column: &'static str| {
            header
                .iter()
                .position(|cell| cell_to_string(Some(cell)) == column)
                .ok_or(LoadError::MissingColumn(column))
        };

        Ok(ColumnIndex {
            id: find(ID_COLUMN)?,
            name: find(NAME_COLUMN)?,
            section_a: find(SECTION_A_COLUMN)?,
            section_b: find(SECTION_B_COLUMN)?,
            total: find(TOTAL_COLUMN)?,
        })
    }
}

fn parse_exam_range(range: &Range<Data>) -> Result<ExamRecords, LoadError> {
    let mut rows = range.rows();
    let header = rows.next().ok_or(LoadError::MissingHeader)?;
    let columns = ColumnIndex::from_header(header)?;

    // 1-based sheet row of the header, for log messages
    let header_row = range.start().map_or(1, |(row, _)| row as usize + 1);

    let mut records = ExamRecords::new();
    for (offset, row) in rows.enumerate() {
        let row_number = header_row + offset + 1;

        let id = cell_to_string(row.get(columns.id));
        if id.is_empty() {
            continue;
        }

        let record = StudentRecord {
            name: cell_to_string(row.get(columns.name)),
            section_a: cell_to_score(row.get(columns.section_a), row_number, SECTION_A_COLUMN),
            section_b: cell_to_score(row.get(columns.section_b), row_number, SECTION_B_COLUMN),
            total: cell_to_score(row.get(columns.total), row_number, TOTAL_COLUMN),
        };

        // Duplicate IDs: the later row wins
        records.insert(id, record);
    }

    Ok(records)
}

/// Render a cell as text. Integral numbers print without a fractional part,
/// so a numeric ID cell `123456789.0` becomes `"123456789"`.
fn cell_to_string(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::Float(f)) => f.to_string(),
        Some(Data::Bool(b)) => b.to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

/// Read a score cell. Blank cells are `None`; so are cells that are not a
/// number (e.g. "ABS"), which are logged and leave the rest of the row intact.
fn cell_to_score(cell: Option<&Data>, row: usize, column: &'static str) -> Option<f64> {
    let value = match cell {
        None | Some(Data::Empty) => return None,
        Some(Data::Float(f)) => return Some(*f),
        Some(Data::Int(i)) => return Some(*i as f64),
        Some(Data::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Some(score) = trimmed.parse::<f64>().ok().filter(|v| v.is_finite()) {
                return Some(score);
            }
            trimmed.to_string()
        }
        Some(other) => other.to_string(),
    };

    log::warn!(
        "row {}: column '{}' holds non-numeric value '{}', treating it as blank",
        row,
        column,
        value
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Value, write_exam, write_sheet};
    use tempfile::TempDir;

    #[test]
    fn missing_directory_yields_empty_dataset() {
        let dir = TempDir::new().unwrap();
        let report = load_exams_with_report(dir.path().join("does-not-exist"));

        assert!(report.dataset.is_empty());
        assert!(report.failures.is_empty());
    }

    #[test]
    fn loads_records_keyed_by_string_id() {
        let dir = TempDir::new().unwrap();
        write_exam(
            &dir.path().join("Midterm.xlsx"),
            &[
                (123456789.0, "Ada Lovelace", 40.0, 45.5, 85.5),
                (987654321.0, "Alan Turing", 20.0, 10.0, 30.0),
            ],
        );

        let dataset = load_exams(dir.path());
        let midterm = dataset.exam("Midterm").expect("exam should be loaded");

        assert_eq!(midterm.len(), 2);
        let ada = &midterm["123456789"];
        assert_eq!(ada.name, "Ada Lovelace");
        assert_eq!(ada.section_a, Some(40.0));
        assert_eq!(ada.section_b, Some(45.5));
        assert_eq!(ada.total, Some(85.5));
    }

    #[test]
    fn text_ids_are_trimmed_and_extra_columns_ignored() {
        let dir = TempDir::new().unwrap();
        write_sheet(
            &dir.path().join("Quiz.xlsx"),
            &[
                vec![
                    Value::Text("Total"),
                    Value::Text("Comments"),
                    Value::Text(" ID "),
                    Value::Text("Name"),
                    Value::Text("Section B"),
                    Value::Text("Section A"),
                ],
                vec![
                    Value::Number(72.0),
                    Value::Text("late submission"),
                    Value::Text(" 000000042 "),
                    Value::Text("Grace Hopper"),
                    Value::Number(30.0),
                    Value::Number(42.0),
                ],
            ],
        );

        let dataset = load_exams(dir.path());
        let record = &dataset.exam("Quiz").unwrap()["000000042"];

        assert_eq!(record.name, "Grace Hopper");
        assert_eq!(record.section_a, Some(42.0));
        assert_eq!(record.section_b, Some(30.0));
        assert_eq!(record.total, Some(72.0));
    }

    #[test]
    fn duplicate_ids_keep_last_row() {
        let dir = TempDir::new().unwrap();
        write_exam(
            &dir.path().join("Final.xlsx"),
            &[
                (111111111.0, "First Attempt", 10.0, 10.0, 20.0),
                (111111111.0, "Second Attempt", 30.0, 30.0, 60.0),
            ],
        );

        let dataset = load_exams(dir.path());
        let record = &dataset.exam("Final").unwrap()["111111111"];

        assert_eq!(record.name, "Second Attempt");
        assert_eq!(record.total, Some(60.0));
    }

    #[test]
    fn blank_scores_and_blank_ids() {
        let dir = TempDir::new().unwrap();
        write_sheet(
            &dir.path().join("Lab.xlsx"),
            &[
                vec![
                    Value::Text("ID"),
                    Value::Text("Name"),
                    Value::Text("Section A"),
                    Value::Text("Section B"),
                    Value::Text("Total"),
                ],
                vec![
                    Value::Number(222222222.0),
                    Value::Text("Absent"),
                    Value::Blank,
                    Value::Blank,
                    Value::Blank,
                ],
                vec![
                    Value::Blank,
                    Value::Text("No ID"),
                    Value::Number(1.0),
                    Value::Number(1.0),
                    Value::Number(2.0),
                ],
            ],
        );

        let dataset = load_exams(dir.path());
        let lab = dataset.exam("Lab").unwrap();

        assert_eq!(lab.len(), 1);
        assert_eq!(lab["222222222"].total, None);
        assert_eq!(lab["222222222"].section_a, None);
    }

    #[test]
    fn malformed_file_is_skipped_without_aborting() {
        let dir = TempDir::new().unwrap();
        write_exam(
            &dir.path().join("Good.xlsx"),
            &[(123456789.0, "Ada", 40.0, 40.0, 80.0)],
        );
        fs::write(dir.path().join("Broken.xlsx"), b"this is not a zip archive").unwrap();

        let report = load_exams_with_report(dir.path());

        assert_eq!(report.dataset.exam_names().collect::<Vec<_>>(), vec!["Good"]);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("Broken.xlsx"));
        assert!(matches!(report.failures[0].error, LoadError::Workbook(_)));
    }

    #[test]
    fn missing_column_rejects_file() {
        let dir = TempDir::new().unwrap();
        write_sheet(
            &dir.path().join("NoTotal.xlsx"),
            &[
                vec![
                    Value::Text("ID"),
                    Value::Text("Name"),
                    Value::Text("Section A"),
                    Value::Text("Section B"),
                ],
                vec![
                    Value::Number(123456789.0),
                    Value::Text("Ada"),
                    Value::Number(1.0),
                    Value::Number(2.0),
                ],
            ],
        );

        let report = load_exams_with_report(dir.path());

        assert!(report.dataset.is_empty());
        assert!(matches!(
            report.failures[0].error,
            LoadError::MissingColumn(TOTAL_COLUMN)
        ));
    }

    #[test]
    fn non_numeric_score_blanks_only_that_cell() {
        let dir = TempDir::new().unwrap();
        write_sheet(
            &dir.path().join("Typo.xlsx"),
            &[
                vec![
                    Value::Text("ID"),
                    Value::Text("Name"),
                    Value::Text("Section A"),
                    Value::Text("Section B"),
                    Value::Text("Total"),
                ],
                vec![
                    Value::Number(123456789.0),
                    Value::Text("Ada"),
                    Value::Number(40.0),
                    Value::Number(40.0),
                    Value::Number(80.0),
                ],
                vec![
                    Value::Number(987654321.0),
                    Value::Text("Bob"),
                    Value::Text("ABS"),
                    Value::Number(10.0),
                    Value::Number(10.0),
                ],
                vec![
                    Value::Number(555555555.0),
                    Value::Text("Cy"),
                    Value::Number(5.0),
                    Value::Number(5.0),
                    Value::Text("pending"),
                ],
            ],
        );

        let report = load_exams_with_report(dir.path());
        assert!(report.failures.is_empty());

        let typo = report.dataset.exam("Typo").unwrap();
        assert_eq!(typo.len(), 3);
        assert_eq!(typo["123456789"].total, Some(80.0));
        assert_eq!(typo["987654321"].section_a, None);
        assert_eq!(typo["987654321"].section_b, Some(10.0));
        assert_eq!(typo["987654321"].total, Some(10.0));
        assert_eq!(typo["555555555"].total, None);
        assert!(!typo["555555555"].is_complete());
    }

    #[test]
    fn numeric_text_scores_are_parsed() {
        let dir = TempDir::new().unwrap();
        write_sheet(
            &dir.path().join("Text.xlsx"),
            &[
                vec![
                    Value::Text("ID"),
                    Value::Text("Name"),
                    Value::Text("Section A"),
                    Value::Text("Section B"),
                    Value::Text("Total"),
                ],
                vec![
                    Value::Text("123456789"),
                    Value::Text("Ada"),
                    Value::Text(" 12.5 "),
                    Value::Text(""),
                    Value::Text("12.5"),
                ],
            ],
        );

        let dataset = load_exams(dir.path());
        let record = &dataset.exam("Text").unwrap()["123456789"];

        assert_eq!(record.section_a, Some(12.5));
        assert_eq!(record.section_b, None);
        assert_eq!(record.total, Some(12.5));
    }

    #[test]
    fn ignores_other_extensions_and_lock_files() {
        let dir = TempDir::new().unwrap();
        write_exam(
            &dir.path().join("Upper.XLSX"),
            &[(123456789.0, "Ada", 1.0, 1.0, 2.0)],
        );
        fs::write(dir.path().join("notes.csv"), "ID,Name\n").unwrap();
        fs::write(dir.path().join("~$Upper.xlsx"), b"lock").unwrap();

        let report = load_exams_with_report(dir.path());

        assert_eq!(report.dataset.exam_names().collect::<Vec<_>>(), vec!["Upper"]);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn same_exam_name_last_file_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let first_path = first.path().join("Midterm.xlsx");
        let second_path = second.path().join("Midterm.xlsx");
        write_exam(&first_path, &[(123456789.0, "Old", 1.0, 1.0, 2.0)]);
        write_exam(&second_path, &[(987654321.0, "New", 5.0, 5.0, 10.0)]);

        let report = load_exam_files([&first_path, &second_path]);
        let midterm = report.dataset.exam("Midterm").unwrap();

        assert_eq!(report.dataset.len(), 1);
        assert!(!midterm.contains_key("123456789"));
        assert_eq!(midterm["987654321"].name, "New");
    }

    #[test]
    fn directory_collision_resolves_by_file_name_order() {
        let dir = TempDir::new().unwrap();
        // "Quiz.XLSX" sorts before "Quiz.xlsx" byte-wise, so the lower-case file wins
        write_exam(
            &dir.path().join("Quiz.XLSX"),
            &[(123456789.0, "Upper", 1.0, 1.0, 2.0)],
        );
        write_exam(
            &dir.path().join("Quiz.xlsx"),
            &[(987654321.0, "Lower", 5.0, 5.0, 10.0)],
        );

        let dataset = load_exams(dir.path());
        let quiz = dataset.exam("Quiz").unwrap();

        assert_eq!(dataset.len(), 1);
        assert!(!quiz.contains_key("123456789"));
        assert_eq!(quiz["987654321"].name, "Lower");
    }

    #[test]
    fn loading_twice_gives_equal_datasets() {
        let dir = TempDir::new().unwrap();
        write_exam(
            &dir.path().join("A.xlsx"),
            &[(123456789.0, "Ada", 40.0, 40.0, 80.0)],
        );
        write_exam(
            &dir.path().join("B.xlsx"),
            &[(123456789.0, "Ada", 0.0, 0.0, 0.0)],
        );

        assert_eq!(load_exams(dir.path()), load_exams(dir.path()));
    }
}
