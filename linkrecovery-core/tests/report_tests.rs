// Tests for report generation functionality

use linkrecovery_core::model::{DashboardStats, ErrorRecord, ErrorStatus};
use linkrecovery_core::report::{
    ReportData, ReportFormat, generate_csv_report, generate_json_report,
    generate_markdown_report, generate_report, generate_text_report, save_report,
};
use tempfile::TempDir;

fn sample_errors() -> Vec<ErrorRecord> {
    let mut high = ErrorRecord::new("site-1", "https://example.com/deleted-blog-post");
    high.priority_score = 90;
    high.backlink_count = 12;
    high.impressions = 450;

    let mut normal = ErrorRecord::new("site-1", "https://example.com/missing,category");
    normal.priority_score = 60;
    normal.backlink_count = 3;
    normal.impressions = 80;
    normal.status = ErrorStatus::Ignored;

    vec![high, normal]
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert!(matches!(ReportFormat::from_str("text"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json)));
    assert!(matches!(ReportFormat::from_str("Csv"), Some(ReportFormat::Csv)));
    assert!(matches!(ReportFormat::from_str("md"), Some(ReportFormat::Markdown)));
    assert!(ReportFormat::from_str("html").is_none());
}

// ============================================================================
// Text Report Tests
// ============================================================================

#[test]
fn test_text_report_lists_errors_with_priority() {
    let data = ReportData::new("Broken URLs", sample_errors());
    let report = generate_text_report(&data);

    assert!(report.contains("BROKEN URLS"));
    assert!(report.contains("Broken URLs:   2"));
    assert!(report.contains("High priority: 1"));
    assert!(report.contains("Backlinks:     15"));
    assert!(report.contains("HIGH"));
    assert!(report.contains("https://example.com/deleted-blog-post [new]"));
    assert!(report.contains("[ignored]"));
}

#[test]
fn test_text_report_includes_stats() {
    let stats = DashboardStats {
        sites_count: 1,
        total_errors: 5,
        new_errors: 2,
        fixed_errors: 3,
        backlinks_affected: 12,
        recent_scans: Vec::new(),
    };
    let data = ReportData::new("Dashboard", Vec::new()).with_stats(stats);
    let report = generate_text_report(&data);

    assert!(report.contains("Total 404s:         5"));
    assert!(report.contains("New issues:         2"));
    assert!(report.contains("Fixed:              3"));
    assert!(report.contains("Backlinks affected: 12"));
    assert!(report.contains("No broken URLs found."));
}

// ============================================================================
// Structured Format Tests
// ============================================================================

#[test]
fn test_json_report_is_valid() {
    let data = ReportData::new("Broken URLs", sample_errors());
    let json = generate_json_report(&data).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["report"]["summary"]["total"], 2);
    assert_eq!(value["report"]["summary"]["high_priority"], 1);
    assert_eq!(value["report"]["errors"][0]["status"], "new");
    assert!(value["report"]["stats"].is_null());
}

#[test]
fn test_csv_report_escapes_fields() {
    let data = ReportData::new("Broken URLs", sample_errors());
    let csv = generate_csv_report(&data).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "id,url,status,priority_score,backlink_count,impressions,clicks");
    assert_eq!(lines.len(), 3);
    assert!(lines[2].contains("\"https://example.com/missing,category\""));
    assert!(lines[2].ends_with(",ignored,60,3,80,0"));
}

#[test]
fn test_csv_report_quotes_line_breaks_and_quotes() {
    let urls = [
        "https://example.com/a\rb",
        "https://example.com/say-\"hi\"",
        "https://example.com/multi\nline",
    ];
    let errors = urls.iter().map(|url| ErrorRecord::new("site-1", url)).collect();
    let report = generate_csv_report(&ReportData::new("Broken URLs", errors)).unwrap();

    assert!(report.contains("\"https://example.com/a\rb\""));
    assert!(report.contains("\"https://example.com/say-\"\"hi\"\"\""));

    let mut reader = csv::Reader::from_reader(report.as_bytes());
    let parsed: Vec<String> = reader
        .records()
        .map(|record| record.unwrap()[1].to_string())
        .collect();
    assert_eq!(parsed, urls);
}

#[test]
fn test_markdown_report_table() {
    let data = ReportData::new("Broken URLs", sample_errors());
    let md = generate_markdown_report(&data);

    assert!(md.starts_with("# Broken URLs"));
    assert!(md.contains("| HIGH | 90 | 12 | 450 | new | `https://example.com/deleted-blog-post` |"));
}

#[test]
fn test_generate_report_dispatches_on_format() {
    let data = ReportData::new("Broken URLs", sample_errors());
    let csv = generate_report(&data, ReportFormat::Csv).unwrap();
    assert!(csv.starts_with("id,url"));
}

#[test]
fn test_save_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.txt");

    save_report("hello", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
}
