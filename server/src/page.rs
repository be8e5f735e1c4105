//! Minimal HTML pages: the upload form, the results view and the audit
//! dashboard.

use html_escape::{encode_double_quoted_attribute, encode_text};
use ocrbatch::db::upload_log_repo::CSV_HEADER;
use ocrbatch::{FileResult, UploadLog};

use crate::flash::Flash;

/// Languages offered in the upload form; any valid code is accepted.
const LANGUAGES: &[(&str, &str)] = &[
    ("eng", "English"),
    ("deu", "German"),
    ("fra", "French"),
    ("spa", "Spanish"),
    ("ita", "Italian"),
];

fn open(title: &str, flash: Option<&Flash>) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n");
    html.push_str(&format!("<title>{}</title>\n</head>\n<body>\n", encode_text(title)));
    if let Some(flash) = flash {
        html.push_str(&format!(
            "<div class=\"flash flash-{}\">{}</div>\n",
            flash.level.as_str(),
            encode_text(&flash.message)
        ));
    }
    html
}

fn close(mut html: String) -> String {
    html.push_str("</body>\n</html>\n");
    html
}

pub fn index(default_language: &str, flash: Option<&Flash>) -> String {
    let mut html = open("Batch OCR", flash);
    html.push_str("<h1>Batch OCR</h1>\n");
    html.push_str(
        "<form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"files[]\" multiple accept=\".png,.jpg,.jpeg,.pdf\">\n\
         <select name=\"language\">\n",
    );
    for (code, label) in LANGUAGES {
        let selected = if *code == default_language { " selected" } else { "" };
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>\n",
            code, selected, label
        ));
    }
    html.push_str("</select>\n<button type=\"submit\">Upload</button>\n</form>\n");
    close(html)
}

pub fn results(job_id: &str, results: &[FileResult], flash: Option<&Flash>) -> String {
    let mut html = open("OCR Results", flash);
    html.push_str("<h1>OCR Results</h1>\n");

    if results.is_empty() {
        html.push_str("<p>No files were processed.</p>\n");
    }

    for (index, result) in results.iter().enumerate() {
        html.push_str(&format!(
            "<section>\n<h2>{}</h2>\n<p>{} page(s)</p>\n<p>",
            encode_text(&result.original_filename),
            result.page_count
        ));
        for format in ["txt", "docx", "pdf"] {
            let href = format!(
                "/download/{}/{}/{}",
                urlencoding::encode(job_id),
                index,
                format
            );
            html.push_str(&format!(
                "<a href=\"{}\">{}</a> ",
                encode_double_quoted_attribute(&href),
                format
            ));
        }
        html.push_str("</p>\n");

        for page in &result.pages {
            let src = format!("/static/{}", page.preview_image);
            html.push_str(&format!(
                "<h3>Page {}</h3>\n<img src=\"{}\" alt=\"Page {}\" width=\"300\">\n<pre>{}</pre>\n",
                page.page_num,
                encode_double_quoted_attribute(&src),
                page.page_num,
                encode_text(&page.text)
            ));
        }
        html.push_str("</section>\n");
    }

    html.push_str("<p><a href=\"/\">Upload more files</a></p>\n");
    close(html)
}

/// The audit table, rows in the order given.
pub fn dashboard(logs: &[UploadLog]) -> String {
    let mut html = open("Upload Logs", None);
    html.push_str("<h1>Upload Logs</h1>\n");
    html.push_str("<p><a href=\"/admin/export_logs\">Export CSV</a></p>\n");

    if logs.is_empty() {
        html.push_str("<p>No uploads yet.</p>\n");
        return close(html);
    }

    html.push_str("<table>\n<tr>");
    for column in CSV_HEADER {
        html.push_str(&format!("<th>{}</th>", column));
    }
    html.push_str("</tr>\n");

    for log in logs {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            log.id,
            encode_text(&log.filename),
            log.timestamp.format("%Y-%m-%d %H:%M:%S"),
            encode_text(&log.status),
            encode_text(&log.language),
            log.pages_processed
        ));
    }
    html.push_str("</table>\n");
    close(html)
}
