//! Scan orchestration: crawl a site, probe traffic candidates and record
//! every broken URL with its referrers.

use crate::error::ApiError;
use crate::state::AppState;
use linkrecovery_core::data::Database;
use linkrecovery_core::model::{ErrorRecord, ScanType, Site};
use linkrecovery_core::priority::priority_score;
use linkrecovery_scanner::traffic::{self, TrafficRow};
use linkrecovery_scanner::{BrokenUrl, Crawler, scan_site};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Broken URLs recorded for the first time.
    pub errors_found: u32,
    pub urls_inspected: u32,
}

/// URL the crawl starts from. Domain properties are crawled over https.
pub fn crawl_root(site_url: &str) -> String {
    match site_url.strip_prefix("sc-domain:") {
        Some(domain) => format!("https://{}/", domain.trim().trim_end_matches('/')),
        None => site_url.trim().to_string(),
    }
}

fn load_traffic(state: &AppState, site: &Site) -> Vec<TrafficRow> {
    let Some(dir) = state.config.traffic_dir.as_deref() else {
        return Vec::new();
    };
    let Some(path) = traffic::traffic_file_for(dir, &site.site_url) else {
        return Vec::new();
    };
    if !path.exists() {
        return Vec::new();
    }

    match traffic::load_traffic_file(&path) {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Ignoring traffic export {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

pub async fn run_scan(state: &AppState, site: &Site) -> Result<ScanOutcome, ApiError> {
    let scan_log = {
        let db = state.db.lock().await;
        db.create_scan_log(&site.id, ScanType::Manual)?
    };
    info!("Scanning {} (scan {})", site.site_url, scan_log.id);

    let settings = state.config.crawl;
    let crawler = match Crawler::with_timeout(settings.timeout_secs) {
        Ok(crawler) => crawler
            .with_max_depth(settings.max_depth)
            .with_max_pages(settings.max_pages),
        Err(e) => return Err(fail_scan(state, site, &scan_log.id, e.to_string()).await),
    };

    let rows = load_traffic(state, site);
    let scan = match scan_site(&crawler, &crawl_root(&site.site_url), &rows, settings.workers).await {
        Ok(scan) => scan,
        Err(e) => return Err(fail_scan(state, site, &scan_log.id, e.to_string()).await),
    };
    let urls_inspected = scan.urls_inspected() as u32;

    let db = state.db.lock().await;
    match record_broken(&db, site, &scan.broken) {
        Ok(errors_found) => {
            db.touch_last_scan(&site.id)?;
            db.complete_scan_log(&scan_log.id, errors_found)?;
            info!(
                "Scan of {} complete: {} inspected, {} broken, {} new",
                site.site_url,
                urls_inspected,
                scan.broken.len(),
                errors_found
            );
            Ok(ScanOutcome {
                errors_found,
                urls_inspected,
            })
        }
        Err(e) => {
            db.fail_scan_log(&scan_log.id, &e.to_string())?;
            Err(e.into())
        }
    }
}

async fn fail_scan(state: &AppState, site: &Site, scan_id: &str, message: String) -> ApiError {
    warn!("Scan of {} failed: {}", site.site_url, message);
    let db = state.db.lock().await;
    if let Err(e) = db.fail_scan_log(scan_id, &message) {
        return e.into();
    }
    ApiError::BadGateway(message)
}

/// Insert new broken URLs and refresh known ones. A known URL's backlinks
/// become exactly its current referrers. Returns the insert count.
fn record_broken(db: &Database, site: &Site, broken: &[BrokenUrl]) -> rusqlite::Result<u32> {
    let mut inserted = 0;

    for link in broken {
        let backlink_count = link.backlink_count();
        let score = priority_score(link.impressions, backlink_count);

        let error_id = match db.find_error_by_url(&site.id, &link.url)? {
            Some(existing) => {
                db.refresh_error(&existing.id, link.impressions, link.clicks, backlink_count, score)?;
                existing.id
            }
            None => {
                let mut record = ErrorRecord::new(&site.id, &link.url);
                record.impressions = link.impressions;
                record.clicks = link.clicks;
                record.backlink_count = backlink_count;
                record.priority_score = score;
                db.insert_error(&record)?;
                inserted += 1;
                record.id
            }
        };

        let sources: Vec<(&str, Option<&str>)> = link
            .referrers
            .iter()
            .map(|r| (r.source_url.as_str(), r.anchor_text.as_deref()))
            .collect();
        db.replace_backlinks(&error_id, &sources)?;
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_root() {
        assert_eq!(crawl_root("https://example.com/"), "https://example.com/");
        assert_eq!(crawl_root("sc-domain:example.com"), "https://example.com/");
    }
}
