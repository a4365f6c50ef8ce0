use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::process;
use tracing::{debug, info};
use workorder_etl::cli::{Args, prompts};
use workorder_etl::{EtlConfig, EtlError, Pipeline, PipelineInputs};

fn main() {
    let args = Args::parse();

    if let Err(e) = setup_logging(&args) {
        eprintln!("Failed to initialize logging: {:#}", e);
    }

    let exit_code = match run(&args) {
        Ok(()) => 0,
        Err(error) => {
            report_error(&error);
            1
        }
    };

    if !args.no_pause {
        let _ = prompts::wait_for_enter();
    }
    process::exit(exit_code);
}

fn run(args: &Args) -> Result<()> {
    let Some(inputs) = resolve_inputs(args)? else {
        println!("{}", "Operation cancelled".bright_yellow());
        return Ok(());
    };
    debug!("Resolved inputs: {:?}", inputs);

    let pipeline = Pipeline::new(EtlConfig::default());
    pipeline.run(&inputs).context("Pipeline failed")?;

    println!("\n{}", "Process completed successfully".bright_green().bold());
    Ok(())
}

/// Fill in paths missing from the command line; `None` when the user cancels
fn resolve_inputs(args: &Args) -> Result<Option<PipelineInputs>> {
    let Some(source_dir) = path_or_prompt(&args.source_dir, "Source directory with CSV files")?
    else {
        return Ok(None);
    };
    let Some(output_dir) = path_or_prompt(&args.output_dir, "Output directory")? else {
        return Ok(None);
    };

    let equipment_master = path_or_prompt(
        &args.equipment_master,
        "Equipment master file (Enter to skip)",
    )?;
    let technical_locations = path_or_prompt(
        &args.technical_locations,
        "Technical locations file (Enter to skip)",
    )?;

    Ok(Some(PipelineInputs {
        source_dir,
        output_dir,
        equipment_master,
        technical_locations,
    }))
}

fn path_or_prompt(given: &Option<PathBuf>, label: &str) -> Result<Option<PathBuf>> {
    match given {
        Some(path) => Ok(Some(path.clone())),
        None => prompts::prompt_path(label),
    }
}

/// Print expected stop conditions plainly and anything else as uncontrolled
fn report_error(error: &anyhow::Error) {
    let hard_stop = error
        .downcast_ref::<EtlError>()
        .is_some_and(EtlError::is_hard_stop);

    if hard_stop {
        eprintln!("{} {:#}", "Error:".bright_red().bold(), error);
    } else {
        eprintln!("{} {:#}", "Uncontrolled error:".bright_red().bold(), error);
    }
}

/// Set up structured logging to stderr
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("workorder_etl={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    info!("Logging initialized at level: {}", log_level);
    Ok(())
}
