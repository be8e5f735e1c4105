//! Audit log rows and CSV export after real batches.

mod common;

use common::*;
use ocrbatch::db::upload_log_repo::{self, CSV_HEADER};
use ocrbatch::Upload;

#[test]
fn test_one_row_per_accepted_file() {
    let harness = TestHarness::new();
    harness.run(
        vec![
            Upload::new("a.png", png_bytes(20, 20)),
            Upload::new("skip.bmp", b"BM".to_vec()),
            Upload::new("b.pdf", pdf_bytes(4)),
        ],
        "eng",
    );

    let rows = harness.audit_rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].filename, "a.png");
    assert_eq!(rows[1].filename, "b.pdf");
    assert_eq!(rows[1].pages_processed, 4);
    assert!(rows[0].timestamp <= rows[1].timestamp);
}

#[test]
fn test_csv_export_matches_rows() {
    let harness = TestHarness::new();
    harness.run(
        vec![
            Upload::new("a.png", png_bytes(20, 20)),
            Upload::new("bad.png", b"nope".to_vec()),
        ],
        "ita",
    );
    harness.run(vec![Upload::new("c.pdf", pdf_bytes(2))], "eng");

    let mut out = Vec::new();
    let written = upload_log_repo::export_csv(&harness.db, &mut out).unwrap();
    assert_eq!(written, 3);

    let mut reader = csv::Reader::from_reader(out.as_slice());
    let headers: Vec<String> = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    assert_eq!(headers, CSV_HEADER.to_vec());

    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 3);
    assert_eq!(&records[0][1], "a.png");
    assert_eq!(&records[0][3], "Complete");
    assert_eq!(&records[0][4], "ita");
    assert!(records[1][3].starts_with("Error: "));
    assert_eq!(&records[1][5], "0");
    assert_eq!(&records[2][1], "c.pdf");
    assert_eq!(&records[2][5], "2");
}

#[test]
fn test_recent_rows_newest_first() {
    let harness = TestHarness::new();
    harness.run(
        vec![
            Upload::new("1.png", png_bytes(20, 20)),
            Upload::new("2.png", png_bytes(20, 20)),
        ],
        "eng",
    );

    let recent = upload_log_repo::list_recent(&harness.db).unwrap();
    let names: Vec<&str> = recent.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, vec!["2.png", "1.png"]);
}
