use clap::{arg, command};
use std::net::SocketAddr;
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8001";
pub const DEFAULT_DATABASE: &str = "~/.config/linkrecovery/linkrecovery.db";

fn format_arg() -> clap::Arg {
    arg!(-f --"format" <FORMAT>)
        .required(false)
        .help("Report format: text, json, csv, markdown")
        .value_parser(["text", "json", "csv", "markdown"])
        .default_value("text")
}

fn output_arg() -> clap::Arg {
    arg!(-o --"output" <PATH>)
        .required(false)
        .help("Save report to file (default: display to screen)")
        .value_parser(clap::value_parser!(std::path::PathBuf))
}

fn error_id_arg() -> clap::Arg {
    arg!(<ID>).required(true).help("The broken URL's id")
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkrecovery")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkrecovery")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(--"backend-url" <URL>)
                .required(false)
                .global(true)
                .env("LINKRECOVERY_BACKEND_URL")
                .help("Base URL of the Link Recovery backend")
                .default_value(DEFAULT_BACKEND_URL),
        )
        .subcommand_required(false)
        .subcommand(
            command!("serve")
                .about("Runs the REST backend")
                .arg(
                    arg!(-b --"bind" <ADDR>)
                        .required(false)
                        .env("LINKRECOVERY_BIND")
                        .help("Address to listen on")
                        .value_parser(clap::value_parser!(SocketAddr))
                        .default_value("127.0.0.1:8001"),
                )
                .arg(
                    arg!(-d --"database" <PATH>)
                        .required(false)
                        .env("LINKRECOVERY_DB")
                        .help("Location of the SQLite database")
                        .default_value(DEFAULT_DATABASE),
                )
                .arg(
                    arg!(--"cors-origins" <ORIGINS>)
                        .required(false)
                        .env("CORS_ORIGINS")
                        .help("Comma separated allowed origins, or * for any")
                        .default_value("*"),
                )
                .arg(
                    arg!(--"traffic-dir" <PATH>)
                        .required(false)
                        .env("LINKRECOVERY_TRAFFIC_DIR")
                        .help("Directory of <host>.csv Search Console page exports"),
                )
                .arg(
                    arg!(--"session-ttl" <MINUTES>)
                        .required(false)
                        .help("Session cookie lifetime in minutes")
                        .value_parser(clap::value_parser!(i64))
                        .default_value("30"),
                )
                .arg(
                    arg!(--"llm-key" <KEY>)
                        .required(false)
                        .env("LLM_API_KEY")
                        .hide_env_values(true)
                        .help("API key for an OpenAI compatible backend (default: heuristic advisor)"),
                )
                .arg(
                    arg!(--"llm-base-url" <URL>)
                        .required(false)
                        .env("LLM_BASE_URL")
                        .help("Base URL of the OpenAI compatible backend")
                        .default_value(linkrecovery_server::config::DEFAULT_LLM_BASE_URL),
                )
                .arg(
                    arg!(--"llm-model" <MODEL>)
                        .required(false)
                        .env("LLM_MODEL")
                        .help("Chat model used for recommendations")
                        .default_value(linkrecovery_server::config::DEFAULT_LLM_MODEL),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("Crawler workers per scan")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("4"),
                )
                .arg(
                    arg!(--"max-depth" <DEPTH>)
                        .required(false)
                        .help("Link depth followed from the site root")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    arg!(--"max-pages" <PAGES>)
                        .required(false)
                        .help("Pages fetched per scan")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("200"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                ),
        )
        .subcommand(
            command!("ui")
                .about("Opens the terminal dashboard against a running backend")
                .arg(
                    arg!(--"log-file" <PATH>)
                        .required(false)
                        .help("Write logs here while the dashboard owns the terminal")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("sites")
                .about("Manage monitored sites")
                .subcommand_required(true)
                .subcommand(command!("list").about("List your sites"))
                .subcommand(
                    command!("add").about("Register a site").arg(
                        arg!(<URL>)
                            .required(true)
                            .help("Site URL, e.g. https://example.com or sc-domain:example.com"),
                    ),
                )
                .subcommand(
                    command!("scan")
                        .about("Crawl a site now and record its broken URLs")
                        .arg(arg!(<ID>).required(true).help("The site's id")),
                ),
        )
        .subcommand(
            command!("errors")
                .about("Triage broken URLs")
                .subcommand_required(true)
                .subcommand(
                    command!("list")
                        .about("List broken URLs, highest priority first")
                        .arg(
                            arg!(-s --"status" <STATUS>)
                                .required(false)
                                .help("Only show errors with this status")
                                .value_parser(["new", "fixed", "ignored"]),
                        )
                        .arg(
                            arg!(--"site" <ID>)
                                .required(false)
                                .help("Only show errors for this site"),
                        )
                        .arg(format_arg())
                        .arg(output_arg()),
                )
                .subcommand(
                    command!("show")
                        .about("Show a broken URL with its backlinks and recommendation")
                        .arg(error_id_arg()),
                )
                .subcommand(
                    command!("recommend")
                        .about("Generate a fresh redirect and content recommendation")
                        .arg(error_id_arg()),
                )
                .subcommand(command!("fix").about("Mark as fixed").arg(error_id_arg()))
                .subcommand(command!("ignore").about("Mark as ignored").arg(error_id_arg()))
                .subcommand(command!("reopen").about("Mark as new again").arg(error_id_arg())),
        )
        .subcommand(command!("stats").about("Show dashboard totals and recent scans"))
        .subcommand(command!("status").about("Show the current session"))
        .subcommand(command!("logout").about("End the current session"))
        .subcommand(
            command!("crawl")
                .about("Crawl a site locally and report broken links without a backend")
                .arg(
                    arg!(<URL>)
                        .required(true)
                        .help("The URL to crawl")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' in the worker pool.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("4"),
                )
                .arg(
                    arg!(--"max-depth" <DEPTH>)
                        .required(false)
                        .help("Link depth followed from the start URL")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    arg!(--"max-pages" <PAGES>)
                        .required(false)
                        .help("Maximum pages fetched")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("200"),
                )
                .arg(
                    arg!(--"traffic" <PATH>)
                        .required(false)
                        .help("Search Console pages export (CSV) used for impressions and probing")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(format_arg())
                .arg(output_arg()),
        )
}
