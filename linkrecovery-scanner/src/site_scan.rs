//! One pass over a site: crawl it, probe the search-traffic pages the crawl
//! never reached, then attach traffic numbers to every broken URL.

use crate::crawler::{Crawler, broken_links};
use crate::error::Result;
use crate::probe::{ProbeOutcome, probe_urls};
use crate::result::{BrokenLink, CrawlResult, Referrer};
use crate::traffic::{self, TrafficRow, normalize_page};
use std::collections::HashSet;
use tracing::info;

/// A broken URL with the search traffic it used to get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenUrl {
    pub url: String,
    pub status_code: u16,
    pub referrers: Vec<Referrer>,
    pub impressions: u32,
    pub clicks: u32,
}

impl BrokenUrl {
    pub fn backlink_count(&self) -> u32 {
        self.referrers.len() as u32
    }
}

#[derive(Debug, Clone)]
pub struct SiteScan {
    pub results: Vec<CrawlResult>,
    pub probed: Vec<ProbeOutcome>,
    /// Crawl findings first, ordered by URL, then probe findings.
    pub broken: Vec<BrokenUrl>,
}

impl SiteScan {
    pub fn urls_inspected(&self) -> usize {
        self.results.len() + self.probed.len()
    }
}

/// Traffic candidates the crawl never reached.
pub fn unvisited_candidates(results: &[CrawlResult], rows: &[TrafficRow]) -> Vec<String> {
    let known: HashSet<String> = results.iter().map(|r| normalize_page(&r.url)).collect();
    traffic::candidates(rows)
        .into_iter()
        .map(|r| r.page)
        .filter(|page| !known.contains(page))
        .collect()
}

/// Combine crawl and probe findings and look up each URL's traffic.
pub fn merge_findings(
    results: &[CrawlResult],
    probed: &[ProbeOutcome],
    rows: &[TrafficRow],
) -> Vec<BrokenUrl> {
    let index = traffic::index_by_page(rows);

    let probed_broken = probed.iter().filter(|o| o.is_broken()).filter_map(|o| {
        o.status_code.map(|status_code| BrokenLink {
            url: o.url.clone(),
            status_code,
            referrers: Vec::new(),
        })
    });

    broken_links(results)
        .into_iter()
        .chain(probed_broken)
        .map(|link| {
            let (impressions, clicks) = index
                .get(&normalize_page(&link.url))
                .map(|row| (row.impressions, row.clicks))
                .unwrap_or((0, 0));
            BrokenUrl {
                url: link.url,
                status_code: link.status_code,
                referrers: link.referrers,
                impressions,
                clicks,
            }
        })
        .collect()
}

/// Crawl from `root` with `workers` workers, then probe unvisited traffic
/// candidates through the crawler's client.
pub async fn scan_site(
    crawler: &Crawler,
    root: &str,
    rows: &[TrafficRow],
    workers: usize,
) -> Result<SiteScan> {
    let results = crawler.crawl(root, workers).await?;

    let to_probe = unvisited_candidates(&results, rows);
    if !to_probe.is_empty() {
        info!("Probing {} traffic pages the crawl did not reach", to_probe.len());
    }
    let probed = probe_urls(crawler.client(), to_probe, workers).await;

    let broken = merge_findings(&results, &probed, rows);
    Ok(SiteScan {
        results,
        probed,
        broken,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::LinkRef;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn row(page: &str, clicks: u32, impressions: u32) -> TrafficRow {
        TrafficRow {
            page: page.to_string(),
            clicks,
            impressions,
        }
    }

    fn page(url: &str, status_code: u16, links: &[&str]) -> CrawlResult {
        let mut result = CrawlResult::new(url.to_string(), 0);
        result.status_code = status_code;
        result.links = links
            .iter()
            .map(|l| LinkRef {
                url: l.to_string(),
                anchor_text: None,
            })
            .collect();
        result
    }

    #[test]
    fn test_unvisited_candidates_skip_crawled_pages() {
        let results = vec![page("https://example.com/", 200, &[])];
        let rows = vec![
            row("https://example.com/", 0, 500),
            row("https://example.com/gone", 0, 40),
            row("https://example.com/clicked", 3, 40),
        ];

        assert_eq!(
            unvisited_candidates(&results, &rows),
            vec!["https://example.com/gone".to_string()]
        );
    }

    #[test]
    fn test_merge_findings_attaches_traffic() {
        let results = vec![
            page("https://example.com/", 200, &["https://example.com/old"]),
            page("https://example.com/old", 404, &[]),
        ];
        let probed = vec![
            ProbeOutcome {
                url: "https://example.com/unlinked".to_string(),
                status_code: Some(410),
            },
            ProbeOutcome {
                url: "https://example.com/fine".to_string(),
                status_code: Some(200),
            },
        ];
        let rows = vec![
            row("https://example.com/old", 2, 90),
            row("https://example.com/unlinked", 0, 30),
        ];

        let broken = merge_findings(&results, &probed, &rows);
        let summary: Vec<(&str, u16, u32, u32, u32)> = broken
            .iter()
            .map(|b| (b.url.as_str(), b.status_code, b.backlink_count(), b.impressions, b.clicks))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("https://example.com/old", 404, 1, 90, 2),
                ("https://example.com/unlinked", 410, 0, 30, 0),
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_site_checks_unreached_traffic_pages() {
        let server = MockServer::start().await;
        let base = server.uri();
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(r#"<html><body><a href="/old">Old</a></body></html>"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orphan"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let rows = vec![row(&format!("{}/orphan", base), 0, 25)];
        let crawler = Crawler::new().unwrap().with_max_depth(2);
        let scan = scan_site(&crawler, &format!("{}/", base), &rows, 2)
            .await
            .unwrap();

        assert_eq!(scan.probed.len(), 1);
        assert_eq!(scan.urls_inspected(), scan.results.len() + 1);
        assert_eq!(scan.broken.len(), 2);
        assert!(scan.broken[0].url.ends_with("/old"));
        assert_eq!(scan.broken[0].backlink_count(), 1);
        assert!(scan.broken[1].url.ends_with("/orphan"));
        assert_eq!(scan.broken[1].impressions, 25);
    }
}
