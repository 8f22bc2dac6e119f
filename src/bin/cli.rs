#![cfg(not(tarpaulin_include))]

use exam_results::loader::load_exams_with_report;
use exam_results::logging;
use exam_results::lookup::{format_score, lookup_student};
use exam_results::student_id::StudentId;
use std::env;
use std::process;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("warn");
    let args: Vec<String> = env::args().collect();

    if args.len() != 3 {
        eprintln!("Usage: {} <data-dir> <student-id | --all>", args[0]);
        process::exit(2);
    }

    let report = load_exams_with_report(&args[1]);

    if args[2] == "--all" {
        for (exam, records) in report.dataset.exams() {
            println!("{:<32} {:>6} records", exam, records.len());
        }
        for failure in &report.failures {
            println!("skipped {}: {}", failure.path.display(), failure.error);
        }
        return Ok(());
    }

    let student_id = match StudentId::parse(&args[2]) {
        Ok(student_id) => student_id,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    let results = lookup_student(&report.dataset, student_id.as_str());

    if results.is_empty() {
        println!("No results found for this Student ID.");
        return Ok(());
    }

    println!(
        "{:<32} {:>10} {:>10} {:>10} {:>10}",
        "Exam", "Section A", "Section B", "Total", "Percent"
    );
    for (exam, result) in &results {
        println!(
            "{:<32} {:>10} {:>10} {:>10} {:>9.2}%",
            exam,
            format_score(result.section_a),
            format_score(result.section_b),
            result.total,
            result.percentage
        );
    }

    Ok(())
}
