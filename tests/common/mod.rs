#![allow(dead_code)]

use std::path::Path;

#[path = "../../src/test_utils.rs"]
mod fixtures;

pub use fixtures::*;

/// A file with the right extension that is not a workbook at all.
pub fn write_garbage(path: &Path) {
    std::fs::write(path, b"definitely not an xlsx file").unwrap();
}
