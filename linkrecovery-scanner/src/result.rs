use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Status codes that mark a URL as gone.
pub fn is_not_found(status_code: u16) -> bool {
    status_code == 404 || status_code == 410
}

/// An outgoing `<a href>` found on a crawled page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    pub url: String,
    pub anchor_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub url: String,
    pub depth: usize,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub response_time: Duration,
    pub links: Vec<LinkRef>,
}

impl CrawlResult {
    pub fn new(url: String, depth: usize) -> Self {
        Self {
            url,
            depth,
            status_code: 0,
            content_type: None,
            response_time: Duration::from_secs(0),
            links: Vec::new(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        is_not_found(self.status_code)
    }
}

/// A crawled page that links to a broken URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referrer {
    pub source_url: String,
    pub anchor_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokenLink {
    pub url: String,
    pub status_code: u16,
    pub referrers: Vec<Referrer>,
}
