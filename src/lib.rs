/*!
# Exam Results Portal

A small web application that lets students look up their exam results by
student ID and lets an administrator browse every result.

## Overview

Results live in `.xlsx` workbooks dropped into a data directory, one workbook
per exam. Nothing is cached: every request re-reads the directory, so the
portal always reflects what is on disk.

## Architecture

### Core
- **Exam Loader** (`loader`) - scans the data directory, parses each workbook
  into records keyed by student ID, and skips (and reports) any file that fails
  to parse
- **Result Aggregator** (`lookup`) - collects one student's completed results
  across every exam
- **Student ID validation** (`student_id`) - the nine-digit format check run
  before a lookup

### Web Layer (feature `web`)
- **app** - axum router, page handlers and request logging
- **login** - injected credential store, argon2 hashing and server-side
  sessions
- **downloader** - CSV and XLSX export of the whole dataset

## Workbook Format

The first worksheet must start with a header row containing at least
`ID`, `Name`, `Section A`, `Section B` and `Total`. Other columns are ignored.
`Total` is already a percentage. A record whose total is zero or blank counts
as incomplete and is never shown to the student.

## Routes

- `/` - lookup form (GET) and results (POST)
- `/login`, `/logout` - administrator session
- `/admin` - every exam and record, plus files that failed to load
- `/admin/export.csv`, `/admin/export.xlsx` - downloads
*/

pub mod config;
pub mod dataset;
pub mod downloader;
pub mod error;
pub mod loader;
pub mod logging;
pub mod login;
pub mod lookup;
pub mod student_id;

#[cfg(feature = "web")]
pub mod app;

#[cfg(test)]
mod test_utils;

pub use dataset::{ExamDataset, ExamRecords, StudentRecord};
pub use loader::{LoadReport, load_exams, load_exams_with_report};
pub use lookup::{ResultRecord, StudentResults, lookup_student};
pub use student_id::{StudentId, is_valid_student_id};
