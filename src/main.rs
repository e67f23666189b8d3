use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use data_range_processor::cli::{Args, setup_logging};
use data_range_processor::processor::discovery::discover_dataset_files;
use data_range_processor::{ProcessingStats, RangeProcessor};
use std::process;

fn main() {
    let args = Args::parse();
    setup_logging(&args);

    match run(&args) {
        Ok(stats) => {
            if !args.quiet {
                print_summary(&stats);
            }
            if stats.designators_processed == 0 && stats.designators_failed > 0 {
                process::exit(1);
            }
        }
        Err(error) => {
            eprintln!("{} {:#}", "Error:".bright_red().bold(), error);
            process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<ProcessingStats> {
    let config = args
        .resolve_config()
        .context("Failed to resolve configuration")?;

    let files = discover_dataset_files(&args.inputs).context("Failed to discover dataset files")?;
    if files.is_empty() {
        anyhow::bail!("No dataset files found in the given inputs");
    }

    let processor = RangeProcessor::new(config)?.with_progress(args.show_progress());
    let stats = processor
        .process(files)
        .context("Data range processing failed")?;
    Ok(stats)
}

fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Data range processing complete".bright_green().bold());
    println!(
        "  {} {}",
        "Designators processed:".bright_cyan(),
        stats.designators_processed.to_string().bright_white().bold()
    );
    if stats.designators_failed > 0 {
        println!(
            "  {} {}",
            "Designators failed:".bright_red(),
            stats.designators_failed.to_string().bright_white().bold()
        );
    }
    println!(
        "  {} {} reported, {} skipped",
        "Variables:".bright_cyan(),
        stats.variables_reported,
        stats.variables_skipped
    );
    println!(
        "  {} {}",
        "Report rows:".bright_cyan(),
        stats.rows_written
    );
    if stats.sigma_windows > 0 {
        println!(
            "  {} {}",
            "Sigma windows:".bright_yellow(),
            stats.sigma_windows
        );
    }
    for path in &stats.output_paths {
        println!("  {} {}", "Wrote".bright_green(), path.display());
    }
    println!(
        "  {} {:.2}s",
        "Elapsed:".bright_cyan(),
        stats.processing_time_ms as f64 / 1000.0
    );
}
