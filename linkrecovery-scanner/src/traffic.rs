// Search Console "Pages" export import

use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// Only the top of the export (sorted by clicks) is considered.
pub const CANDIDATE_WINDOW: usize = 50;
pub const MAX_CANDIDATES: usize = 20;

const PAGE_COLUMNS: &[&str] = &["top pages", "page", "pages", "url", "landing page"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficRow {
    pub page: String,
    pub clicks: u32,
    pub impressions: u32,
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
}

fn parse_count(raw: &str) -> u32 {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    cleaned.parse().unwrap_or(0)
}

/// Canonical form used to match export rows against crawled URLs.
pub fn normalize_page(page: &str) -> String {
    match Url::parse(page.trim()) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => page.trim().to_string(),
    }
}

pub fn read_traffic<R: Read>(reader: R) -> Result<Vec<TrafficRow>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = reader.headers()?.clone();
    let page_idx = find_column(&headers, PAGE_COLUMNS).ok_or(ScanError::MissingColumn("Page"))?;
    let clicks_idx = find_column(&headers, &["clicks"]).ok_or(ScanError::MissingColumn("Clicks"))?;
    let impressions_idx =
        find_column(&headers, &["impressions"]).ok_or(ScanError::MissingColumn("Impressions"))?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let Some(page) = record.get(page_idx).map(str::trim).filter(|p| !p.is_empty()) else {
            continue;
        };

        rows.push(TrafficRow {
            page: normalize_page(page),
            clicks: record.get(clicks_idx).map(parse_count).unwrap_or(0),
            impressions: record.get(impressions_idx).map(parse_count).unwrap_or(0),
        });
    }

    debug!("Read {} traffic rows", rows.len());
    Ok(rows)
}

pub fn load_traffic_file(path: &Path) -> Result<Vec<TrafficRow>> {
    let file = std::fs::File::open(path)?;
    let rows = read_traffic(file)?;
    info!("Loaded {} traffic rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Pages that were shown in search but never clicked: likely dead.
pub fn candidates(rows: &[TrafficRow]) -> Vec<TrafficRow> {
    rows.iter()
        .take(CANDIDATE_WINDOW)
        .filter(|r| r.impressions > 0 && r.clicks == 0)
        .take(MAX_CANDIDATES)
        .cloned()
        .collect()
}

pub fn index_by_page(rows: &[TrafficRow]) -> HashMap<String, TrafficRow> {
    rows.iter().map(|r| (r.page.clone(), r.clone())).collect()
}

/// `<dir>/<host>.csv` for a site URL or `sc-domain:` property.
pub fn traffic_file_for(dir: &Path, site_url: &str) -> Option<PathBuf> {
    let host = match site_url.strip_prefix("sc-domain:") {
        Some(domain) => domain.trim().to_string(),
        None => Url::parse(site_url).ok()?.host_str()?.to_string(),
    };
    if host.is_empty() || host.contains(['/', '\\']) {
        return None;
    }
    Some(dir.join(format!("{}.csv", host)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXPORT: &str = "\
Top pages,Clicks,Impressions,CTR,Position
https://example.com/,\"1,204\",\"10,000\",12.04%,3.1
https://example.com/old-product-page,0,450,0%,12.5
https://example.com/blog,15,300,5%,8
https://example.com/deleted-blog-post,0,0,0%,0
https://example.com/missing-category,0,80,0%,22
";

    #[test]
    fn test_read_search_console_export() {
        let rows = read_traffic(EXPORT.as_bytes()).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].clicks, 1204);
        assert_eq!(rows[0].impressions, 10000);
        assert_eq!(rows[1].page, "https://example.com/old-product-page");
    }

    #[test]
    fn test_alternate_page_header() {
        let rows = read_traffic("Page,Clicks,Impressions\nhttps://example.com/a,1,2\n".as_bytes()).unwrap();
        assert_eq!(rows[0].page, "https://example.com/a");
    }

    #[test]
    fn test_missing_column() {
        let err = read_traffic("Page,Clicks\nhttps://example.com/a,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ScanError::MissingColumn("Impressions")));
    }

    #[test]
    fn test_candidates_rule() {
        let rows = read_traffic(EXPORT.as_bytes()).unwrap();
        let picked: Vec<String> = candidates(&rows).into_iter().map(|r| r.page).collect();
        assert_eq!(
            picked,
            vec![
                "https://example.com/old-product-page".to_string(),
                "https://example.com/missing-category".to_string(),
            ]
        );
    }

    #[test]
    fn test_candidates_window_and_cap() {
        let rows: Vec<TrafficRow> = (0..80)
            .map(|i| TrafficRow {
                page: format!("https://example.com/p{i}"),
                clicks: 0,
                impressions: 1,
            })
            .collect();
        assert_eq!(candidates(&rows).len(), MAX_CANDIDATES);

        let mut late = vec![
            TrafficRow {
                page: "https://example.com/busy".into(),
                clicks: 5,
                impressions: 9,
            };
            CANDIDATE_WINDOW
        ];
        late.push(TrafficRow {
            page: "https://example.com/late".into(),
            clicks: 0,
            impressions: 9,
        });
        assert!(candidates(&late).is_empty());
    }

    #[test]
    fn test_traffic_file_for() {
        let dir = Path::new("/data/traffic");
        assert_eq!(
            traffic_file_for(dir, "https://example.com/"),
            Some(PathBuf::from("/data/traffic/example.com.csv"))
        );
        assert_eq!(
            traffic_file_for(dir, "sc-domain:example.org"),
            Some(PathBuf::from("/data/traffic/example.org.csv"))
        );
        assert_eq!(traffic_file_for(dir, "not a url"), None);
    }

    #[test]
    fn test_load_traffic_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("example.com.csv");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(EXPORT.as_bytes())
            .unwrap();

        let rows = load_traffic_file(&path).unwrap();
        let index = index_by_page(&rows);
        assert_eq!(index["https://example.com/blog"].clicks, 15);
    }
}
