use anyhow::Context;
use clap::Parser;
use food_composition_normalizer::cli::{self, Args};
use food_composition_normalizer::{NormalizerConfig, TableProcessor};
use std::process;
use tracing::debug;

fn main() {
    let args = Args::parse();

    setup_logging(&args);

    match run(&args) {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => NormalizerConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => NormalizerConfig::default(),
    };

    let processor = TableProcessor::new(config, args.run_options())?;

    if args.discovery_only {
        let rows = processor.load()?;
        let header = processor
            .decompose(&rows)
            .context("Header decomposition failed")?;
        cli::print_discovery(&header);
        return Ok(());
    }

    let stats = processor
        .run()
        .with_context(|| format!("Failed to normalize {}", args.input_csv.display()))?;
    cli::print_summary(&stats);

    Ok(())
}

/// Set up structured logging on stderr
fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("food_composition_normalizer={}", log_level))
    });

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}
