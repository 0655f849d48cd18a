use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use mod_checker::compat::{
    AvailabilityResolver, CheckOutcome, CheckRequest, DependencyWalker, Downloader, Escalation,
    HttpDownloader, run_check,
};
use mod_checker::config::{CheckerConfig, data_dir, db_path, log_path};
use mod_checker::logging::init_logging;
use mod_checker::parser::LinkParser;
use mod_checker::version::cache::Cache;
use mod_checker::version::rate_limit::RateLimiter;
use mod_checker::version::registries::ModrinthRegistry;
use mod_checker::version::types::{Availability, Loader};

#[derive(Parser)]
#[command(name = "mod-checker", disable_version_flag = true)]
#[command(about = "Checks that every mod in a list has a Modrinth build for one Minecraft version and loader")]
struct Cli {
    /// Minecraft version to check (e.g. "1.20.4")
    #[arg(long = "version")]
    game_version: String,

    /// Mod loader (fabric, forge, quilt or neoforge)
    #[arg(long)]
    loader: Loader,

    /// Loader to favor when several loaders support the same number of mods
    #[arg(long)]
    preferred_alt_loader: Option<Loader>,

    /// File containing Modrinth mod links
    #[arg(long, default_value = "mods.md")]
    input: PathBuf,

    /// Directory downloaded mods are saved to
    #[arg(long, default_value = "mods")]
    output_dir: PathBuf,

    /// Download every available mod and its required dependencies
    #[arg(long)]
    download: bool,

    /// Also consider versions older than --version
    #[arg(long)]
    allow_downgrade: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Drop all cached metadata before checking
    #[arg(long)]
    clear_cache: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, Some(&log_path()));

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")
        .and_then(|runtime| runtime.block_on(run(&cli)));

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = CheckerConfig::load(cli.config.as_deref())?;

    let packages = LinkParser::new()
        .parse_file(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    if packages.is_empty() {
        println!("No Modrinth mod links found in {}", cli.input.display());
        return Ok(ExitCode::SUCCESS);
    }

    std::fs::create_dir_all(data_dir()).context("failed to create data directory")?;
    let cache = Cache::new(&db_path(), config.cache.ttl).context("failed to open cache")?;
    if cli.clear_cache {
        cache.clear().context("failed to clear cache")?;
        info!("Cache cleared");
    }

    let limiter = RateLimiter::new(
        Duration::from_millis(config.rate_limit.min_request_interval),
        config.rate_limit.low_watermark,
    );
    let registry = ModrinthRegistry::new(&config.api.base_url, Arc::new(limiter))?;
    let resolver = AvailabilityResolver::new(Arc::new(registry), Arc::new(cache));

    println!(
        "Checking {} mods for Minecraft {} using {}",
        packages.len(),
        cli.game_version,
        cli.loader
    );

    let request = CheckRequest {
        game_version: cli.game_version.clone(),
        loader: cli.loader,
        preferred_loader: cli.preferred_alt_loader,
        allow_downgrade: cli.allow_downgrade,
    };
    let outcome = run_check(&resolver, &packages, &request).await;

    print_escalation(&outcome, &request);
    println!(
        "\nResults for Minecraft {} ({}):",
        outcome.game_version, outcome.loader
    );
    for result in &outcome.results {
        print_result(result);
    }

    if cli.download {
        let downloader = HttpDownloader::new()?;
        for result in outcome.results.iter().filter(|r| r.is_available()) {
            downloader.download(result, &cli.output_dir).await;
        }

        let dependencies = DependencyWalker::new(&resolver)
            .with_downloads(&downloader, &cli.output_dir)
            .expand_all(&outcome.results, &outcome.game_version, outcome.loader)
            .await;
        if !dependencies.is_empty() {
            println!("\nDependencies:");
            for dependency in &dependencies {
                print_result(dependency);
            }
        }
    }

    Ok(if outcome.all_available() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_escalation(outcome: &CheckOutcome, request: &CheckRequest) {
    match &outcome.escalation {
        Escalation::None => {}
        Escalation::CommonVersion { loader_stats } => {
            println!(
                "\nSome mods are not available for {} {}; every mod supports {}",
                request.game_version, request.loader, outcome.game_version
            );
            for (loader, count) in loader_stats {
                let marker = if *loader == outcome.loader { '*' } else { ' ' };
                println!(
                    "{} {}: {}/{} mods compatible",
                    marker,
                    loader,
                    count,
                    outcome.results.len()
                );
            }
        }
        Escalation::NextVersion => {
            println!(
                "\nSwitched to the next compatible version {} after {} checks",
                outcome.game_version,
                outcome.version_checks.len()
            );
        }
        Escalation::AlternativeLoader { satisfying } => {
            let names: Vec<&str> = satisfying.iter().map(Loader::as_str).collect();
            println!(
                "\nLoaders supporting every mod at {}: {}; using {}",
                outcome.game_version,
                names.join(", "),
                outcome.loader
            );
        }
        Escalation::Exhausted => {
            println!(
                "\nNo compatible version or loader found for {} {}",
                request.game_version, request.loader
            );
        }
    }
}

fn print_result(result: &Availability) {
    match result.filename() {
        Some(filename) => println!("+ {} ({})", result.name, filename),
        None => {
            let mut details = vec!["not available".to_string()];
            if !result.versions.is_empty() {
                let newest: Vec<&str> = result.versions.iter().take(3).map(String::as_str).collect();
                details.push(format!("versions: {}", newest.join(", ")));
            }
            if let Some(loaders) = result.loader_types.as_ref().filter(|l| !l.is_empty()) {
                let loaders: Vec<&str> = loaders.iter().map(String::as_str).collect();
                details.push(format!("loaders: {}", loaders.join(", ")));
            }
            if let Some(error) = &result.error {
                details.push(error.clone());
            }
            println!("- {} ({})", result.name, details.join("; "));
        }
    }
}
