use anyhow::{Context, Result};
use clap::Parser;
use clinistat::cli::{Cli, OutputFormat};
use clinistat::comparison::{compare_segments, compare_with_labels};
use clinistat::config::StudyConfig;
use clinistat::json_output::JsonOutput;
use clinistat::sample::{tables_by_segment, ObservationSet, SampleTable};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Compare the whole study at once
fn run_study(
    config: &StudyConfig,
    observations: &ObservationSet,
    format: OutputFormat,
) -> Result<()> {
    let samples = SampleTable::from_observations(&observations.observations, &config.groups)?;
    let report = compare_with_labels(&config.metrics, &samples, &config.groups)?;

    match format {
        OutputFormat::Text => print!("{}", report.to_report_string()),
        OutputFormat::Json => {
            let mut output = JsonOutput::new(config.groups.clone());
            output.set_report(report);
            println!("{}", output.to_json()?);
        }
    }
    Ok(())
}

/// Compare every segment independently; a failing segment does not fail the run
fn run_by_segment(
    config: &StudyConfig,
    observations: &ObservationSet,
    format: OutputFormat,
) -> Result<()> {
    let segments = tables_by_segment(&observations.observations, &config.groups)?;
    let results = compare_segments(&config.metrics, &segments, &config.groups);

    match format {
        OutputFormat::Text => {
            for (name, result) in &results {
                println!("=== Segment: {} ===", name);
                match result {
                    Ok(report) => print!("{}", report.to_report_string()),
                    Err(e) => println!("⚠️  skipped: {}", e),
                }
                println!();
            }
        }
        OutputFormat::Json => {
            let mut output = JsonOutput::new(config.groups.clone());
            output.set_segments(results);
            println!("{}", output.to_json()?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = StudyConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load study config {}", args.config.display()))?;
    let observations = ObservationSet::from_file(&args.input)?;

    tracing::info!(
        "Loaded {} metric specs and {} observations",
        config.metrics.len(),
        observations.observations.len()
    );

    if args.by_segment {
        run_by_segment(&config, &observations, args.format)
    } else {
        run_study(&config, &observations, args.format)
    }
}
