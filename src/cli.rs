use crate::api::{self, Components};
use crate::engine::StderrSink;
use crate::types::{ApiResponse, CrawlConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pomcrawl", version, about = "Crawl a web app into page models (JSON only)")]
pub struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl from a seed URL and write page models + a summary report
    Crawl(CrawlArgs),
    /// Show recent activity log entries
    Logs(LogsArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum DriverKind {
    /// Deterministic built-in two-page site, no network
    Mock,
    /// Live HTTP fetching
    Http,
}

#[derive(Args)]
struct CrawlArgs {
    /// Seed URL; also the origin the crawl is fenced to
    #[arg(long)]
    base_url: String,
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
    #[arg(long, default_value_t = 3)]
    max_depth: u32,
    #[arg(long, default_value_t = 80)]
    max_pages: usize,
    /// Interactive nodes kept per page
    #[arg(long, default_value_t = 120)]
    max_nodes: usize,
    /// Follow links to other origins too
    #[arg(long)]
    allow_external: bool,
    /// Denied domain substrings; replaces the built-in denylist
    #[arg(long)]
    deny: Vec<String>,
    #[arg(long, value_enum, default_value_t = DriverKind::Mock)]
    driver: DriverKind,
    /// Print per-page progress to stderr
    #[arg(long)]
    verbose: bool,
}

#[derive(Args)]
struct LogsArgs {
    /// Only show error entries
    #[arg(long)]
    errors_only: bool,
    /// Only show entries mentioning this domain
    #[arg(long)]
    domain: Option<String>,
}

pub fn run() {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Crawl(args) => crawl_cmd(args),
        Command::Logs(args) => {
            finish(api::read_logs(args.domain.as_deref(), args.errors_only));
        }
    }
}

fn crawl_cmd(args: CrawlArgs) {
    let mut config = CrawlConfig::new(&args.base_url);
    config.max_depth = args.max_depth;
    config.max_pages = args.max_pages;
    config.max_nodes = args.max_nodes;
    config.same_origin_only = !args.allow_external;
    if !args.deny.is_empty() {
        config.denied_domains = args.deny;
    }

    let components = match args.driver {
        DriverKind::Mock => Ok(Components::mock(&args.base_url)),
        DriverKind::Http => Components::http(),
    };
    let mut components = match components {
        Ok(c) => c,
        Err(e) => return print_json(ApiResponse::<()>::err(e.to_string())),
    };
    if args.verbose {
        components = components.with_sink(Box::new(StderrSink));
    }

    finish(api::crawl(&config, &mut components, &args.output_dir));
}

fn finish<T: serde::Serialize>(res: crate::Result<T>) {
    match res {
        Ok(v) => print_json(ApiResponse::ok(v)),
        Err(e) => print_json(ApiResponse::<()>::err(e.to_string())),
    }
}
fn print_json<T: serde::Serialize>(val: T) {
    // pretty JSON output
    println!("{}", serde_json::to_string_pretty(&val).unwrap());
}
