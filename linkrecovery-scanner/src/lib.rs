pub mod crawler;
pub mod error;
pub mod probe;
pub mod result;
pub mod site_scan;
pub mod traffic;

pub use crawler::Crawler;
pub use error::ScanError;
pub use probe::{ProbeOutcome, probe_urls};
pub use result::{BrokenLink, CrawlResult, LinkRef, Referrer};
pub use site_scan::{BrokenUrl, SiteScan, scan_site};
pub use traffic::TrafficRow;
