use crate::dataset::ExamDataset;
use crate::loader::{ID_COLUMN, NAME_COLUMN, SECTION_A_COLUMN, SECTION_B_COLUMN, TOTAL_COLUMN};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::collections::HashSet;

const EXAM_COLUMN: &str = "Exam";
const MAX_SHEET_NAME: usize = 31;

/// Convert the whole dataset to CSV format
///
/// One line per student record, prefixed with the exam name. Fields that
/// contain commas, quotes or line breaks are quoted, and inner quotes doubled.
///
/// # Arguments
/// * `dataset` - Exams to export
///
/// # Returns
/// * `String` - CSV content, header line included
pub fn to_csv(dataset: &ExamDataset) -> String {
    let mut csv_content = [
        EXAM_COLUMN,
        ID_COLUMN,
        NAME_COLUMN,
        SECTION_A_COLUMN,
        SECTION_B_COLUMN,
        TOTAL_COLUMN,
    ]
    .join(",");
    csv_content.push('\n');

    for (exam_name, records) in dataset.exams() {
        for (id, record) in records {
            let fields = [
                escape_csv(exam_name),
                escape_csv(id),
                escape_csv(&record.name),
                format_score(record.section_a),
                format_score(record.section_b),
                format_score(record.total),
            ];
            csv_content.push_str(&fields.join(","));
            csv_content.push('\n');
        }
    }

    csv_content
}

/// Convert the whole dataset to XLSX format
///
/// Each exam gets its own worksheet, laid out the way the loader expects, so
/// an exported worksheet can be dropped back into the data directory.
///
/// # Returns
/// * `Result<Vec<u8>, XlsxError>` - XLSX file content as bytes or an error
pub fn to_xlsx(dataset: &ExamDataset) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    // Excel reserves "History" for its own use
    let mut used_names: HashSet<String> = HashSet::from(["history".to_string()]);

    for (exam_name, records) in dataset.exams() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(worksheet_name(exam_name, &mut used_names))?;

        let header = [
            ID_COLUMN,
            NAME_COLUMN,
            SECTION_A_COLUMN,
            SECTION_B_COLUMN,
            TOTAL_COLUMN,
        ];
        for (col, title) in header.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *title, &bold)?;
        }

        for (index, (id, record)) in records.iter().enumerate() {
            let row = index as u32 + 1;
            worksheet.write_string(row, 0, id.as_str())?;
            worksheet.write_string(row, 1, record.name.as_str())?;
            for (col, score) in [record.section_a, record.section_b, record.total]
                .into_iter()
                .enumerate()
            {
                if let Some(score) = score {
                    worksheet.write_number(row, col as u16 + 2, score)?;
                }
            }
        }
    }

    if dataset.is_empty() {
        // A workbook needs at least one worksheet to be valid
        workbook.add_worksheet();
    }

    workbook.save_to_buffer()
}

fn escape_csv(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn format_score(score: Option<f64>) -> String {
    score.map(|s| s.to_string()).unwrap_or_default()
}

/// Excel limits sheet names to 31 characters, forbids `[]:*?/\` and
/// leading or trailing apostrophes, and compares names case-insensitively.
/// Names already in `used` get a ` (2)`, ` (3)`, ... suffix.
fn worksheet_name(exam_name: &str, used: &mut HashSet<String>) -> String {
    let cleaned: String = exam_name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    let base = if cleaned.trim().is_empty() { "Exam" } else { cleaned };

    let truncated: String = base.chars().take(MAX_SHEET_NAME).collect();
    let mut name = truncated.trim_end_matches('\'').to_string();
    let mut counter = 2;
    while !used.insert(name.to_lowercase()) {
        let suffix = format!(" ({})", counter);
        let keep = MAX_SHEET_NAME - suffix.chars().count();
        name = base.chars().take(keep).collect::<String>() + &suffix;
        counter += 1;
    }

    name
}
