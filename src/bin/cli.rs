//! VOSE Finder CLI
//!
//! Prints today's VOSE/VO showings, or all upcoming ones with `--all-dates`.

use std::path::PathBuf;

use clap::Parser;
use vose_finder::{
    error::Result,
    models::Config,
    pipeline,
    report::{self, TextReport},
    services::{ChildCommand, FetchContext, RenderMode, render_target},
    utils::http,
};

/// VOSE Finder - original-version showings in Gran Canaria
#[derive(Parser, Debug)]
#[command(
    name = "vose-finder",
    version,
    about = "Find VOSE/VO film showings at Gran Canaria cinemas"
)]
struct Cli {
    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Include every upcoming date, not only today
    #[arg(long)]
    all_dates: bool,

    /// Write the calendar page (default: calendar.output from config); implies --all-dates
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    calendar: Option<Option<PathBuf>>,

    /// Path to the configuration file
    #[arg(short, long, default_value = "vose.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Render one headless target and print its records as JSON
    #[arg(long, hide = true, value_name = "KEY")]
    render_target: Option<String>,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Arguments a renderer child needs to see the same configuration.
fn child_args(cli: &Cli) -> Vec<String> {
    let mut args = vec![
        "--config".to_string(),
        cli.config.to_string_lossy().into_owned(),
    ];
    if cli.verbose {
        args.push("--verbose".to_string());
    }
    args
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    if let Some(key) = &cli.render_target {
        let showings = render_target(&config, key).await?;
        println!("{}", serde_json::to_string(&showings)?);
        return Ok(());
    }

    let all_dates = cli.all_dates || cli.calendar.is_some();
    let render = if config.browser.isolate {
        RenderMode::Child(ChildCommand::current_exe(child_args(&cli))?)
    } else {
        RenderMode::InProcess
    };

    let client = http::create_client(&config.http)?;
    let ctx = FetchContext::new(client, all_dates);

    log::info!(
        "Searching VOSE showings for {}{}",
        ctx.today_iso(),
        if all_dates { " and later" } else { "" }
    );

    let report = pipeline::run_pipeline(&config, &ctx, render).await;

    if let Some(path) = &cli.calendar {
        let path = path.clone().unwrap_or_else(|| config.calendar.output.clone());
        report::write_calendar(&report, &config.calendar.title, ctx.today, &path)?;
    }

    if cli.json {
        println!("{}", report::to_json(&report)?);
    } else if cli.calendar.is_none() {
        println!("{}", TextReport::new(&report, all_dates));
    }

    log::info!(
        "Done: {} showings, {} source errors",
        report.total_films,
        report.errors.len()
    );

    Ok(())
}
