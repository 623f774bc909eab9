use crate::error::{Result, ScanError};
use crate::result::{BrokenLink, CrawlResult, LinkRef, Referrer};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

type WorkerQueues = Arc<Vec<Mutex<VecDeque<(String, usize)>>>>;

const USER_AGENT: &str = concat!("LinkRecovery/", env!("CARGO_PKG_VERSION"));

pub struct Crawler {
    client: Client,
    visited: Arc<Mutex<HashSet<String>>>,
    results: Arc<Mutex<Vec<CrawlResult>>>,
    max_depth: usize,
    max_pages: usize,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new() -> Result<Self> {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            visited: Arc::new(Mutex::new(HashSet::new())),
            results: Arc::new(Mutex::new(Vec::new())),
            max_depth: 3,
            max_pages: 200,
            progress_callback: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages.max(1);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Crawl `start_url` and every same-domain page reachable from it.
    ///
    /// Pages at `max_depth` are fetched (so their status is known) but their
    /// links are not followed. The root page is fetched before the workers
    /// start: if it cannot be reached the whole crawl fails.
    pub async fn crawl(&self, start_url: &str, workers: usize) -> Result<Vec<CrawlResult>> {
        let workers = workers.max(1);
        info!("Starting crawl of {} with {} workers", start_url, workers);

        let parsed_url = Url::parse(start_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", start_url, e)))?;
        if !matches!(parsed_url.scheme(), "http" | "https") {
            return Err(ScanError::InvalidUrl(format!(
                "{}: only http and https are supported",
                start_url
            )));
        }

        let base_domain = parsed_url
            .host_str()
            .map(|h| h.to_string())
            .ok_or_else(|| ScanError::InvalidUrl(format!("{}: missing host", start_url)))?;

        let root = parsed_url.to_string();
        {
            let mut visited = self.visited.lock().await;
            visited.insert(root.clone());
        }

        if let Some(ref callback) = self.progress_callback {
            callback(0, root.clone());
        }
        let root_result = Self::fetch_and_parse(&self.client, &root, 0, &base_domain).await?;
        let root_links = if self.max_depth > 0 {
            root_result.links.clone()
        } else {
            Vec::new()
        };
        self.results.lock().await.push(root_result);

        let worker_queues: WorkerQueues =
            Arc::new((0..workers).map(|_| Mutex::new(VecDeque::new())).collect());
        Self::distribute(&worker_queues, &self.visited, self.max_pages, root_links, 1, 0).await;

        let in_flight = Arc::new(AtomicUsize::new(0));
        let mut worker_handles = Vec::new();

        for worker_id in 0..workers {
            let client = self.client.clone();
            let base_domain = base_domain.clone();
            let progress_cb = self.progress_callback.clone();
            let max_depth = self.max_depth;
            let max_pages = self.max_pages;
            let visited = self.visited.clone();
            let results = self.results.clone();
            let worker_queues = worker_queues.clone();
            let in_flight = in_flight.clone();

            let handle = tokio::spawn(async move {
                debug!("Worker {} started", worker_id);
                let mut empty_iterations = 0;
                const MAX_EMPTY_ITERATIONS: usize = 10;

                loop {
                    // in_flight is raised while the queue lock is held so an idle
                    // worker never sees an empty queue with an uncounted item
                    let work_item = {
                        let mut queue = worker_queues[worker_id].lock().await;
                        let item = queue.pop_front();
                        if item.is_some() {
                            in_flight.fetch_add(1, Ordering::SeqCst);
                        }
                        item
                    };

                    let Some((url, depth)) = work_item else {
                        if Self::all_queues_empty(&worker_queues).await
                            && in_flight.load(Ordering::SeqCst) == 0
                        {
                            empty_iterations += 1;
                            if empty_iterations >= MAX_EMPTY_ITERATIONS {
                                debug!("Worker {} exiting", worker_id);
                                break;
                            }
                        } else {
                            empty_iterations = 0;
                        }

                        tokio::time::sleep(Duration::from_millis(10)).await;
                        continue;
                    };
                    empty_iterations = 0;

                    if let Some(ref callback) = progress_cb {
                        callback(worker_id, url.clone());
                    }

                    match Self::fetch_and_parse(&client, &url, depth, &base_domain).await {
                        Ok(crawl_result) => {
                            let follow = if depth < max_depth && !crawl_result.is_not_found() {
                                crawl_result.links.clone()
                            } else {
                                Vec::new()
                            };
                            results.lock().await.push(crawl_result);

                            Self::distribute(
                                &worker_queues,
                                &visited,
                                max_pages,
                                follow,
                                depth + 1,
                                worker_id,
                            )
                            .await;
                        }
                        Err(e) => {
                            warn!("Crawl error for {}: {}", url, e);
                        }
                    }

                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }

                debug!("Worker {} finished", worker_id);
            });

            worker_handles.push(handle);
        }

        for handle in worker_handles {
            handle
                .await
                .map_err(|e| ScanError::Other(format!("Worker task failed: {}", e)))?;
        }

        let results = self.results.lock().await;
        info!("Crawl complete. Visited {} pages", results.len());
        Ok(results.clone())
    }

    /// Queue unseen same-domain links round-robin across all workers.
    async fn distribute(
        worker_queues: &WorkerQueues,
        visited: &Arc<Mutex<HashSet<String>>>,
        max_pages: usize,
        links: Vec<LinkRef>,
        depth: usize,
        worker_id: usize,
    ) {
        let mut target_worker = 0;
        for link in links {
            let should_queue = {
                let mut visited_lock = visited.lock().await;
                if visited_lock.len() >= max_pages || visited_lock.contains(&link.url) {
                    false
                } else {
                    visited_lock.insert(link.url.clone());
                    true
                }
            };

            if should_queue {
                debug!("[Worker {}] Queuing {} to worker {}", worker_id, link.url, target_worker);
                let mut queue = worker_queues[target_worker].lock().await;
                queue.push_back((link.url, depth));
                drop(queue);

                target_worker = (target_worker + 1) % worker_queues.len();
            }
        }
    }

    async fn all_queues_empty(worker_queues: &WorkerQueues) -> bool {
        for queue in worker_queues.iter() {
            if !queue.lock().await.is_empty() {
                return false;
            }
        }
        true
    }

    async fn fetch_and_parse(
        client: &Client,
        url: &str,
        depth: usize,
        base_domain: &str,
    ) -> Result<CrawlResult> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = client.get(url).send().await?;
        let response_time = start.elapsed();

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut result = CrawlResult::new(url.to_string(), depth);
        result.status_code = status.as_u16();
        result.content_type = content_type.clone();
        result.response_time = response_time;

        let is_html = content_type
            .as_ref()
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false);

        if status.is_success() && is_html {
            // Links are resolved against the final URL after redirects
            let final_url = response.url().to_string();
            let body = response.text().await?;
            result.links = Self::extract_links(&body, &final_url, base_domain);
        }

        Ok(result)
    }

    fn extract_links(html: &str, current_url: &str, base_domain: &str) -> Vec<LinkRef> {
        let document = Html::parse_document(html);
        let Ok(link_selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(&link_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(absolute_url) = Self::resolve_url(current_url, href) else {
                continue;
            };
            if !Self::is_same_domain(&absolute_url, base_domain) {
                debug!("Skipping off-site link {}", absolute_url);
                continue;
            }
            if !seen.insert(absolute_url.clone()) {
                continue;
            }

            let text = element.text().collect::<Vec<_>>().join(" ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            links.push(LinkRef {
                url: absolute_url,
                anchor_text: if text.is_empty() { None } else { Some(text) },
            });
        }

        links
    }

    fn resolve_url(base: &str, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty()
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with('#')
        {
            return None;
        }

        let base_url = Url::parse(base).ok()?;
        let mut resolved = base_url.join(href).ok()?;
        if !matches!(resolved.scheme(), "http" | "https") {
            return None;
        }
        resolved.set_fragment(None);

        Some(resolved.to_string())
    }

    fn is_same_domain(url: &str, base_domain: &str) -> bool {
        if let Ok(parsed) = Url::parse(url)
            && let Some(host) = parsed.host_str()
        {
            return host == base_domain || host.ends_with(&format!(".{}", base_domain));
        }
        false
    }
}

/// Collect every 404/410 page in `results` together with its referrers.
/// Output is ordered by URL.
pub fn broken_links(results: &[CrawlResult]) -> Vec<BrokenLink> {
    let mut broken: BTreeMap<&str, BrokenLink> = results
        .iter()
        .filter(|r| r.is_not_found())
        .map(|r| {
            (
                r.url.as_str(),
                BrokenLink {
                    url: r.url.clone(),
                    status_code: r.status_code,
                    referrers: Vec::new(),
                },
            )
        })
        .collect();

    for page in results {
        for link in &page.links {
            if let Some(entry) = broken.get_mut(link.url.as_str()) {
                entry.referrers.push(Referrer {
                    source_url: page.url.clone(),
                    anchor_text: link.anchor_text.clone(),
                });
            }
        }
    }

    let mut broken: Vec<BrokenLink> = broken.into_values().collect();
    for entry in &mut broken {
        entry.referrers.sort_by(|a, b| a.source_url.cmp(&b.source_url));
    }
    broken
}
