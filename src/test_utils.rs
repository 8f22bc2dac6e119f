//! Workbook fixtures shared by the unit tests.

use rust_xlsxwriter::Workbook;
use std::path::Path;

pub enum Value {
    Text(&'static str),
    Number(f64),
    Blank,
}

/// Write `rows` into the first worksheet of a new workbook at `path`.
pub fn write_sheet(path: &Path, rows: &[Vec<Value>]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            match value {
                Value::Text(text) => {
                    worksheet.write_string(r as u32, c as u16, *text).unwrap();
                }
                Value::Number(number) => {
                    worksheet.write_number(r as u32, c as u16, *number).unwrap();
                }
                Value::Blank => {}
            }
        }
    }

    workbook.save(path).unwrap();
}

/// Write a well-formed exam workbook: (ID, Name, Section A, Section B, Total).
pub fn write_exam(path: &Path, rows: &[(f64, &'static str, f64, f64, f64)]) {
    let mut sheet = vec![vec![
        Value::Text("ID"),
        Value::Text("Name"),
        Value::Text("Section A"),
        Value::Text("Section B"),
        Value::Text("Total"),
    ]];
    for &(id, name, section_a, section_b, total) in rows {
        sheet.push(vec![
            Value::Number(id),
            Value::Text(name),
            Value::Number(section_a),
            Value::Number(section_b),
            Value::Number(total),
        ]);
    }

    write_sheet(path, &sheet);
}
