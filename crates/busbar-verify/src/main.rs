//! busbar-verify - checks the busbar measurement tool in a headless browser

use std::path::PathBuf;
use std::time::Duration;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use busbar_verify::playwright::{Browser, PlaywrightConfig};
use busbar_verify::{RunnerConfig, Scenario, VerificationRunner, VerifyResult};

#[derive(Parser, Debug)]
#[command(name = "busbar-verify")]
#[command(author, version, about = "End-to-end verification of the busbar measurement tool")]
struct Args {
    /// HTML page under test, relative to the working directory
    #[arg(long, default_value = "index.html")]
    target: PathBuf,

    /// YAML scenario to run instead of the built-in one
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Browser to use
    #[arg(long, value_enum, default_value_t = Browser::Chromium)]
    browser: Browser,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Default assertion timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Overall deadline for the browser run in seconds
    #[arg(long, default_value = "120")]
    run_timeout_secs: u64,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print the generated Playwright script and exit
    #[arg(long)]
    print_script: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(args: Args) -> VerifyResult<()> {
    let mut scenario = match &args.scenario {
        Some(path) => Scenario::from_file(path)?,
        None => Scenario::busbar(),
    };
    if let Some(ms) = args.timeout_ms {
        scenario.timeout_ms = ms;
    }

    let runner = VerificationRunner::with_config(RunnerConfig {
        target: args.target,
        working_dir: None,
        playwright: PlaywrightConfig {
            browser: args.browser,
            headless: !args.headed,
            run_timeout: Duration::from_secs(args.run_timeout_secs),
            ..Default::default()
        },
        report_path: args.report,
    });

    if args.print_script {
        println!("{}", runner.render_script(&scenario)?);
        return Ok(());
    }

    runner.run(&scenario).await?;
    Ok(())
}
