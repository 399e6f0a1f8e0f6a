//! Developer utility to run the trainer on a local CSV without the server.

use std::path::PathBuf;

use mlpipe::config::PipelineConfig;
use mlpipe::logging;
use mlpipe::pipeline::PipelineVariant;
use mlpipe::trainer::{self, TriggerPayload};

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let config = PipelineConfig::for_output_dir(options.variant, &options.output_dir)
        .map_err(|err| err.to_string())?;
    let payload = TriggerPayload::for_path(&options.input);
    let outcome = trainer::train(&config, &payload).map_err(|err| err.to_string())?;

    println!("{}", outcome.message);
    if let Some(accuracy) = outcome.accuracy {
        println!("test accuracy: {accuracy:.4}");
    }
    let metrics = std::fs::read_to_string(&outcome.saved_files.metrics)
        .map_err(|err| format!("Failed to read metrics: {err}"))?;
    println!("{metrics}");
    for (label, path) in [
        ("model", &outcome.saved_files.model),
        ("metrics", &outcome.saved_files.metrics),
        ("predictions", &outcome.saved_files.predictions),
        ("feature importance", &outcome.saved_files.feature_importance),
    ] {
        println!("{label:<20} {}", path.display());
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct CliOptions {
    input: PathBuf,
    output_dir: PathBuf,
    variant: PipelineVariant,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut input: Option<PathBuf> = None;
    let mut output_dir = PathBuf::from("output");
    let mut variant = PipelineVariant::default();

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--input" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--input requires a value".to_string())?;
                input = Some(PathBuf::from(value));
            }
            "--output-dir" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--output-dir requires a value".to_string())?;
                output_dir = PathBuf::from(value);
            }
            "--variant" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--variant requires a value".to_string())?;
                variant = value
                    .parse()
                    .map_err(|err| format!("Invalid --variant value: {err}"))?;
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let input = input.ok_or_else(help_text)?;
    Ok(CliOptions {
        input,
        output_dir,
        variant,
    })
}

fn help_text() -> String {
    [
        "mlpipe-train",
        "",
        "Train a model on a local table and write its artifacts.",
        "",
        "Usage:",
        "  mlpipe-train --input <table.csv> [--output-dir <dir>] [--variant iris|airline]",
        "",
        "Defaults: --output-dir output, --variant iris.",
    ]
    .join("\n")
}
