use anyhow::Result;
use clap::ArgMatches;
use colored::Colorize;
use linkrecovery::command_argument_builder;
use linkrecovery::handlers::*;
use linkrecovery_core::model::ErrorStatus;
use linkrecovery_core::print_banner;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn init_tracing(matches: &ArgMatches) -> Result<()> {
    let default_level = match matches.subcommand_name() {
        Some("serve") => "info",
        _ => "warn",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match matches.subcommand() {
        // The dashboard owns the terminal: logs go to a file or nowhere.
        Some(("ui", args)) => match args.get_one::<PathBuf>("log-file") {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(expand_path(&path.to_string_lossy()))?;
                builder.with_ansi(false).with_writer(Mutex::new(file)).init();
            }
            None => builder.with_writer(std::io::sink).init(),
        },
        _ => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

async fn dispatch(matches: &ArgMatches) -> Result<()> {
    let backend_url = matches
        .get_one::<String>("backend-url")
        .map(String::as_str)
        .unwrap_or(linkrecovery::commands::DEFAULT_BACKEND_URL);

    match matches.subcommand() {
        Some(("serve", args)) => handle_serve(args).await,
        Some(("ui", _)) => handle_ui(backend_url).await,
        Some(("crawl", args)) => handle_crawl(args).await,
        Some(("sites", primary_command)) => {
            let session = connect(backend_url).await?;
            match primary_command.subcommand() {
                Some(("list", _)) => handle_sites_list(&session).await,
                Some(("add", args)) => handle_sites_add(&session, required(args, "URL")?).await,
                Some(("scan", args)) => handle_sites_scan(&session, required(args, "ID")?).await,
                _ => unreachable!("clap should ensure we don't get here"),
            }
        }
        Some(("errors", primary_command)) => {
            let session = connect(backend_url).await?;
            match primary_command.subcommand() {
                Some(("list", args)) => handle_errors_list(&session, args).await,
                Some(("show", args)) => handle_errors_show(&session, required(args, "ID")?).await,
                Some(("recommend", args)) => {
                    handle_errors_recommend(&session, required(args, "ID")?).await
                }
                Some(("fix", args)) => {
                    handle_errors_set_status(&session, required(args, "ID")?, ErrorStatus::Fixed)
                        .await
                }
                Some(("ignore", args)) => {
                    handle_errors_set_status(&session, required(args, "ID")?, ErrorStatus::Ignored)
                        .await
                }
                Some(("reopen", args)) => {
                    handle_errors_set_status(&session, required(args, "ID")?, ErrorStatus::New)
                        .await
                }
                _ => unreachable!("clap should ensure we don't get here"),
            }
        }
        Some(("stats", _)) => handle_stats(&connect(backend_url).await?).await,
        Some(("status", _)) => handle_status(&connect(backend_url).await?).await,
        Some(("logout", _)) => handle_logout(connect(backend_url).await?).await,
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("missing <{}>", name))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    if let Err(e) = init_tracing(&chosen_command) {
        eprintln!("{} Could not set up logging: {}", "✗".red().bold(), e);
        std::process::exit(1);
    }

    if let Err(e) = dispatch(&chosen_command).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
