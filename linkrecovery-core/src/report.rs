// Report generation for broken URL listings

use crate::model::{DashboardStats, ErrorRecord, Priority};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub title: String,
    pub errors: Vec<ErrorRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<DashboardStats>,
}

impl ReportData {
    pub fn new(title: impl Into<String>, errors: Vec<ErrorRecord>) -> Self {
        Self {
            title: title.into(),
            errors,
            stats: None,
        }
    }

    pub fn with_stats(mut self, stats: DashboardStats) -> Self {
        self.stats = Some(stats);
        self
    }

    fn high_priority_count(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| e.priority() == Priority::High)
            .count()
    }

    fn backlink_total(&self) -> u64 {
        self.errors.iter().map(|e| e.backlink_count as u64).sum()
    }
}

pub fn generate_report(data: &ReportData, format: ReportFormat) -> Result<String, ReportError> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(data)),
        ReportFormat::Json => Ok(generate_json_report(data)?),
        ReportFormat::Csv => generate_csv_report(data),
        ReportFormat::Markdown => Ok(generate_markdown_report(data)),
    }
}

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str(RULE);
    report.push('\n');
    report.push_str(&format!("  {}\n", data.title.to_uppercase()));
    report.push_str(RULE);
    report.push_str("\n\n");

    if let Some(ref stats) = data.stats {
        report.push_str(&format!("Sites:              {}\n", stats.sites_count));
        report.push_str(&format!("Total 404s:         {}\n", stats.total_errors));
        report.push_str(&format!("New issues:         {}\n", stats.new_errors));
        report.push_str(&format!("Fixed:              {}\n", stats.fixed_errors));
        report.push_str(&format!("Backlinks affected: {}\n", stats.backlinks_affected));
        report.push('\n');
    }

    report.push_str(&format!("Broken URLs:   {}\n", data.errors.len()));
    report.push_str(&format!("High priority: {}\n", data.high_priority_count()));
    report.push_str(&format!("Backlinks:     {}\n\n", data.backlink_total()));

    if data.errors.is_empty() {
        report.push_str("  No broken URLs found.\n\n");
    } else {
        report.push_str(&format!(
            "  {:<8} {:<6} {:>9} {:>11}  {}\n",
            "PRIORITY", "SCORE", "BACKLINKS", "IMPRESSIONS", "URL"
        ));
        for error in &data.errors {
            report.push_str(&format!(
                "  {:<8} {:<6} {:>9} {:>11}  {} [{}]\n",
                error.priority().label(),
                error.priority_score,
                error.backlink_count,
                error.impressions,
                error.url,
                error.status
            ));
        }
        report.push('\n');
    }

    report.push_str(RULE);
    report.push('\n');
    report.push_str("Generated by Link Recovery\n");

    report
}

pub fn generate_json_report(data: &ReportData) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "linkrecovery",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "title": data.title,
            },
            "summary": {
                "total": data.errors.len(),
                "high_priority": data.high_priority_count(),
                "backlinks": data.backlink_total(),
            },
            "stats": data.stats,
            "errors": data.errors,
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_csv_report(data: &ReportData) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id",
        "url",
        "status",
        "priority_score",
        "backlink_count",
        "impressions",
        "clicks",
    ])?;
    for error in &data.errors {
        writer.write_record([
            error.id.clone(),
            error.url.clone(),
            error.status.to_string(),
            error.priority_score.to_string(),
            error.backlink_count.to_string(),
            error.impressions.to_string(),
            error.clicks.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    // Every field came from a String
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn generate_markdown_report(data: &ReportData) -> String {
    let mut report = format!("# {}\n\n", data.title);

    if let Some(ref stats) = data.stats {
        report.push_str("| Total 404s | New | Fixed | Backlinks affected |\n");
        report.push_str("|---|---|---|---|\n");
        report.push_str(&format!(
            "| {} | {} | {} | {} |\n\n",
            stats.total_errors, stats.new_errors, stats.fixed_errors, stats.backlinks_affected
        ));
    }

    if data.errors.is_empty() {
        report.push_str("_No broken URLs found._\n");
        return report;
    }

    report.push_str("| Priority | Score | Backlinks | Impressions | Status | URL |\n");
    report.push_str("|---|---|---|---|---|---|\n");
    for error in &data.errors {
        report.push_str(&format!(
            "| {} | {} | {} | {} | {} | `{}` |\n",
            error.priority().label(),
            error.priority_score,
            error.backlink_count,
            error.impressions,
            error.status,
            error.url.replace('|', "\\|")
        ));
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
