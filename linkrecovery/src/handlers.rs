use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use linkrecovery_core::model::{
    DashboardStats, ErrorDetail, ErrorListQuery, ErrorRecord, ErrorStatus, Priority, Recommendation,
    ScanStatus, Site,
};
use linkrecovery_core::priority::priority_score;
use linkrecovery_core::report::{ReportData, ReportFormat, generate_report, save_report};
use linkrecovery_scanner::traffic::{self, TrafficRow};
use linkrecovery_scanner::{BrokenUrl, Crawler, scan_site};
use linkrecovery_server::{CrawlSettings, LlmConfig, ServerConfig};
use linkrecovery_tui::{ApiClient, AuthSession};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn parse_format(raw: &str) -> Result<ReportFormat> {
    ReportFormat::from_str(raw).ok_or_else(|| anyhow!("Unknown report format '{}'", raw))
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.into());
    pb
}

fn priority_label(score: u32) -> String {
    match Priority::of(score) {
        Priority::High => format!("{} {}", "HIGH".white().on_red().bold(), score),
        Priority::Normal => score.to_string().yellow().to_string(),
    }
}

fn last_scan_label(site: &Site) -> String {
    site.last_scan
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "Never".to_string())
}

/// Emit a report to `output` if given, otherwise to stdout.
fn deliver_report(report: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            save_report(report, path)
                .with_context(|| format!("writing report to {}", path.display()))?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", report),
    }
    Ok(())
}

// ============================================================================
// serve / ui
// ============================================================================

pub fn server_config_from_args(args: &ArgMatches) -> Result<ServerConfig> {
    let defaults = ServerConfig::default();
    let crawl_defaults = CrawlSettings::default();

    let bind = args
        .get_one::<SocketAddr>("bind")
        .copied()
        .unwrap_or(defaults.bind);
    let database_path = args
        .get_one::<String>("database")
        .map(|p| expand_path(p))
        .unwrap_or(defaults.database_path);

    let llm = args
        .get_one::<String>("llm-key")
        .filter(|k| !k.trim().is_empty())
        .map(|key| {
            let mut llm = LlmConfig::new(key.trim());
            if let Some(base_url) = args.get_one::<String>("llm-base-url") {
                llm.base_url = base_url.clone();
            }
            if let Some(model) = args.get_one::<String>("llm-model") {
                llm.model = model.clone();
            }
            llm
        });

    let workers = args
        .get_one::<usize>("threads")
        .copied()
        .unwrap_or(crawl_defaults.workers);
    if workers == 0 {
        bail!("--threads must be at least 1");
    }

    Ok(ServerConfig {
        bind,
        database_path,
        session_ttl_minutes: args
            .get_one::<i64>("session-ttl")
            .copied()
            .unwrap_or(defaults.session_ttl_minutes),
        cors_origins: args
            .get_one::<String>("cors-origins")
            .cloned()
            .unwrap_or(defaults.cors_origins),
        llm,
        traffic_dir: args.get_one::<String>("traffic-dir").map(|p| expand_path(p)),
        crawl: CrawlSettings {
            max_depth: args
                .get_one::<usize>("max-depth")
                .copied()
                .unwrap_or(crawl_defaults.max_depth),
            max_pages: args
                .get_one::<usize>("max-pages")
                .copied()
                .unwrap_or(crawl_defaults.max_pages),
            workers,
            timeout_secs: args
                .get_one::<u64>("timeout")
                .copied()
                .unwrap_or(crawl_defaults.timeout_secs),
        },
    })
}

pub async fn handle_serve(args: &ArgMatches) -> Result<()> {
    let config = server_config_from_args(args)?;

    print_divider();
    println!("{}", "  LINK RECOVERY BACKEND".bright_white().bold());
    print_divider();
    println!(
        "{} API: {}",
        "→".blue(),
        format!("http://{}/api/", config.bind).bright_white()
    );
    println!(
        "{} Database: {}",
        "→".blue(),
        config.database_path.display().to_string().bright_white()
    );
    let advisor = match &config.llm {
        Some(llm) => format!("{} via {}", llm.model, llm.base_url),
        None => "built-in heuristic".to_string(),
    };
    println!("{} Recommendations: {}", "→".blue(), advisor.bright_white());
    println!();

    linkrecovery_server::serve(config).await
}

pub async fn handle_ui(backend_url: &str) -> Result<()> {
    linkrecovery_tui::run_dashboard(backend_url).await
}

// ============================================================================
// Remote commands
// ============================================================================

/// Every remote command runs inside a fresh demo session.
pub async fn connect(backend_url: &str) -> Result<AuthSession> {
    let client = ApiClient::new(backend_url)?;
    Ok(AuthSession::bootstrap(client).await)
}

pub async fn handle_sites_list(session: &AuthSession) -> Result<()> {
    let sites = session.client().list_sites().await?.sites;

    if sites.is_empty() {
        println!("No sites added yet. Add your first site to start monitoring 404 errors.");
        return Ok(());
    }

    println!("{}", format!("Your Sites ({})", sites.len()).bright_white().bold());
    for site in &sites {
        println!(
            "  {} {}  {}",
            "•".cyan(),
            site.site_url.bright_white(),
            format!("id {}  last scan: {}", site.id, last_scan_label(site)).dimmed()
        );
    }
    Ok(())
}

pub async fn handle_sites_add(session: &AuthSession, site_url: &str) -> Result<()> {
    let resp = session.client().create_site(site_url).await?;
    println!(
        "{} {}: {} ({})",
        "✓".green().bold(),
        resp.message,
        resp.site.site_url.bright_white(),
        resp.site.id.dimmed()
    );
    Ok(())
}

pub async fn handle_sites_scan(session: &AuthSession, site_id: &str) -> Result<()> {
    let pb = spinner("Scanning...");
    let result = session.client().scan_site(site_id).await;
    pb.finish_and_clear();

    let resp = result?;
    println!(
        "{} {}: {} new broken URL(s), {} URLs inspected",
        "✓".green().bold(),
        resp.message,
        resp.errors_found.to_string().cyan(),
        resp.urls_inspected.to_string().cyan()
    );
    Ok(())
}

/// Fetch errors matching `query` and render them in `format`.
pub async fn errors_report(
    client: &ApiClient,
    query: &ErrorListQuery,
    format: ReportFormat,
) -> Result<String> {
    let errors = client.list_errors(query).await?.errors;
    let title = match &query.status {
        Some(status) => format!("Broken URLs ({})", status),
        None => "Broken URLs".to_string(),
    };
    Ok(generate_report(&ReportData::new(title, errors), format)?)
}

pub async fn handle_errors_list(session: &AuthSession, args: &ArgMatches) -> Result<()> {
    let query = ErrorListQuery {
        site_id: args.get_one::<String>("site").cloned(),
        status: args.get_one::<String>("status").cloned(),
    };
    let format = parse_format(
        args.get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("text"),
    )?;

    let report = errors_report(session.client(), &query, format).await?;
    deliver_report(&report, args.get_one::<PathBuf>("output"))
}

fn print_recommendation(rec: &Recommendation) {
    println!("{}", "Redirect Recommendation".bright_blue().bold());
    println!(
        "  {} {}",
        "Suggested target:".dimmed(),
        rec.redirect_target.as_deref().unwrap_or("N/A").cyan()
    );
    println!(
        "  {} {}",
        "Reason:".dimmed(),
        rec.redirect_reason.as_deref().unwrap_or("No reason provided")
    );
    println!();
    println!("{}", "Content Creation Suggestion".bright_blue().bold());
    println!(
        "  {}",
        rec.content_suggestion
            .as_deref()
            .unwrap_or("No content suggestion available")
    );
}

pub fn print_error_detail(detail: &ErrorDetail) {
    let error = &detail.error;

    print_divider();
    println!("{}", "  404 ERROR DETAILS".bright_white().bold());
    print_divider();
    println!("{} {}", "URL:".dimmed(), error.url.bright_white());
    if let Some(site) = &detail.site {
        println!("{} {}", "Site:".dimmed(), site.site_url);
    }
    println!(
        "{} {}   {} {}   {} {}   {} {}",
        "Priority:".dimmed(),
        priority_label(error.priority_score),
        "Backlinks:".dimmed(),
        error.backlink_count.to_string().blue().bold(),
        "Impressions:".dimmed(),
        error.impressions.to_string().magenta().bold(),
        "Status:".dimmed(),
        error.status.to_string().yellow()
    );
    println!();

    println!(
        "{}",
        format!("Backlinks ({})", detail.backlinks.len()).bright_blue().bold()
    );
    if detail.backlinks.is_empty() {
        println!("  No backlinks found for this URL.");
    }
    for backlink in &detail.backlinks {
        println!("  {} {}", "→".dimmed(), backlink.source_url);
        if let Some(anchor) = &backlink.anchor_text {
            println!("      {} {}", "Anchor:".dimmed(), anchor.bold());
        }
    }
    println!();

    match &detail.recommendation {
        Some(rec) => print_recommendation(rec),
        None => println!(
            "No recommendation yet. Run {} to generate one.",
            format!("linkrecovery errors recommend {}", error.id).cyan()
        ),
    }
}

pub async fn handle_errors_show(session: &AuthSession, error_id: &str) -> Result<()> {
    let detail = session.client().get_error(error_id).await?;
    print_error_detail(&detail);
    Ok(())
}

pub async fn handle_errors_recommend(session: &AuthSession, error_id: &str) -> Result<()> {
    let pb = spinner("Generating recommendations...");
    let result = session.client().generate_recommendation(error_id).await;
    pb.finish_and_clear();

    print_recommendation(&result?.recommendation);
    Ok(())
}

pub async fn handle_errors_set_status(
    session: &AuthSession,
    error_id: &str,
    status: ErrorStatus,
) -> Result<()> {
    let resp = session.client().update_status(error_id, status).await?;
    println!(
        "{} {}: {}",
        "✓".green().bold(),
        resp.message,
        resp.status.to_string().yellow()
    );
    Ok(())
}

pub fn print_stats(stats: &DashboardStats) {
    print_divider();
    println!("{}", "  DASHBOARD".bright_white().bold());
    print_divider();
    println!("  {:<12} {}", "Total 404s", stats.total_errors.to_string().bold());
    println!("  {:<12} {}", "New Issues", stats.new_errors.to_string().red().bold());
    println!("  {:<12} {}", "Fixed", stats.fixed_errors.to_string().green().bold());
    println!(
        "  {:<12} {}",
        "Backlinks",
        stats.backlinks_affected.to_string().blue().bold()
    );
    println!("  {:<12} {}", "Sites", stats.sites_count);

    if !stats.recent_scans.is_empty() {
        println!();
        println!("{}", "Recent scans".bright_blue().bold());
        for scan in &stats.recent_scans {
            let status = match scan.status {
                ScanStatus::Completed => scan.status.as_str().green(),
                ScanStatus::Failed => scan.status.as_str().red(),
                ScanStatus::Running => scan.status.as_str().yellow(),
            };
            println!(
                "  {} {:<9} {} found  {}",
                scan.started_at.format("%Y-%m-%d %H:%M"),
                status,
                scan.errors_found,
                scan.error_message.as_deref().unwrap_or("").dimmed()
            );
        }
    }
}

pub async fn handle_stats(session: &AuthSession) -> Result<()> {
    let stats = session.client().dashboard_stats().await?;
    print_stats(&stats);
    Ok(())
}

pub async fn handle_status(session: &AuthSession) -> Result<()> {
    let status = session.client().auth_status().await?;
    match status.user {
        Some(user) if status.authenticated => println!(
            "{} Authenticated as {} ({})",
            "✓".green().bold(),
            user.email.bright_white(),
            user.id.dimmed()
        ),
        _ => println!("{} Not authenticated", "✗".red().bold()),
    }
    Ok(())
}

pub async fn handle_logout(mut session: AuthSession) -> Result<()> {
    session.logout().await;
    println!("{} Logged out", "✓".green().bold());
    Ok(())
}

// ============================================================================
// Offline crawl
// ============================================================================

/// Rank scan findings for display, highest priority first. Referrers count
/// as backlinks. Records carry the crawled site URL in place of a site id.
pub fn crawl_records(site_url: &str, broken: &[BrokenUrl]) -> Vec<ErrorRecord> {
    let mut records: Vec<ErrorRecord> = broken
        .iter()
        .map(|link| {
            let mut record = ErrorRecord::new(site_url, &link.url);
            record.impressions = link.impressions;
            record.clicks = link.clicks;
            record.backlink_count = link.backlink_count();
            record.priority_score = priority_score(record.impressions, record.backlink_count);
            record
        })
        .collect();

    records.sort_by(|a, b| {
        b.priority_score
            .cmp(&a.priority_score)
            .then_with(|| a.url.cmp(&b.url))
    });
    records
}

pub async fn handle_crawl(args: &ArgMatches) -> Result<()> {
    let url = args
        .get_one::<Url>("URL")
        .ok_or_else(|| anyhow!("a URL is required"))?;
    info!("Offline crawl of {}", url);
    let threads = args.get_one::<usize>("threads").copied().unwrap_or(4).max(1);
    let max_depth = args.get_one::<usize>("max-depth").copied().unwrap_or(3);
    let max_pages = args.get_one::<usize>("max-pages").copied().unwrap_or(200);
    let format = parse_format(
        args.get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("text"),
    )?;

    let rows = match args.get_one::<PathBuf>("traffic") {
        Some(path) => load_traffic(path)?,
        None => Vec::new(),
    };

    let host = url.host_str().unwrap_or("unknown").to_string();
    println!("\n🕷️  Crawling {}", host);
    println!("Workers: {}", threads);
    println!("Max depth: {}", max_depth);
    if !rows.is_empty() {
        println!("Traffic rows: {}", rows.len());
    }
    println!();

    let pb = spinner("starting");
    let pb_clone = pb.clone();
    let progress_callback = Arc::new(move |worker_id: usize, page: String| {
        let path = Url::parse(&page)
            .map(|u| u.path().to_string())
            .unwrap_or(page);
        pb_clone.set_message(format!("Worker {}: {}", worker_id, path));
    });

    let crawler = Crawler::new()?
        .with_max_depth(max_depth)
        .with_max_pages(max_pages)
        .with_progress_callback(progress_callback);

    let scan = match scan_site(&crawler, url.as_str(), &rows, threads).await {
        Ok(scan) => scan,
        Err(e) => {
            pb.finish_and_clear();
            bail!("Crawl failed: {}", e);
        }
    };
    pb.finish_and_clear();

    println!(
        "{} Crawl complete: {} pages, {} probed, {} broken\n",
        "✓".green().bold(),
        scan.results.len(),
        scan.probed.len(),
        scan.broken.len().to_string().red().bold()
    );

    let records = crawl_records(url.as_str(), &scan.broken);
    let report = generate_report(
        &ReportData::new(format!("Broken links on {}", host), records),
        format,
    )?;
    deliver_report(&report, args.get_one::<PathBuf>("output"))
}

fn load_traffic(path: &Path) -> Result<Vec<TrafficRow>> {
    let path = expand_path(&path.to_string_lossy());
    debug!("Loading traffic export {}", path.display());
    traffic::load_traffic_file(&path)
        .with_context(|| format!("reading traffic export {}", path.display()))
}
