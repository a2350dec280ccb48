use clap::{Parser, Subcommand};
use heic_convert::config::{self, CliOverrides, ConverterConfig, LoggingConfig};
use heic_convert::convert::{self, BatchReport, ConvertOptions};
use heic_convert::imaging::LibheifCodec;
use heic_convert::{diagnose, logging, output};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

/// Encoding and report flags. Global, so they work with or without the
/// `convert` subcommand.
#[derive(clap::Args, Clone)]
struct ConvertArgs {
    /// JPEG quality, 1-100 (default 95)
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: Option<u32>,

    /// Use standard Huffman tables instead of optimized ones
    #[arg(long, global = true)]
    no_optimize: bool,

    /// Also write the full per-file report as JSON (convert only)
    #[arg(long, global = true, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "heic-convert")]
#[command(about = "Convert a directory of HEIC/HEIF photos to JPEG")]
#[command(long_about = "\
Convert a directory of HEIC/HEIF photos to JPEG

Every .heic/.heif file (any letter case) in the photos directory gets a .jpg
sibling with the same stem. Existing .jpg files are never overwritten, so
re-running only converts what is missing. Subdirectories are not scanned.

  photos/
  ├── IMG_0001.heic
  ├── IMG_0001.jpg      # created
  ├── IMG_0002.HEIC
  ├── IMG_0002.jpg      # already there, skipped
  └── notes.txt         # ignored

A file that fails to convert is logged and the batch carries on. The exit
code is non-zero only when the directory cannot be read or setup fails.

Run 'heic-convert gen-config' to generate a documented heic-convert.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: heic-convert.toml in the working directory, if present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Photos directory (overrides photos_dir)
    #[arg(long, global = true, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Log file (overrides logging.file)
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    convert: ConvertArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Convert every HEIC/HEIF file in the photos directory (default)
    Convert,
    /// Explain why files fail: header, brands, decode and a test encode
    Diagnose {
        /// Single file to check; all candidates in the photos directory when omitted
        file: Option<PathBuf>,
    },
    /// Print a stock heic-convert.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli
        .command
        .clone()
        .unwrap_or(Command::Convert);

    if let Command::GenConfig = command {
        print!("{}", config::stock_config_toml());
        return ExitCode::SUCCESS;
    }

    let convert_args = cli.convert;
    let overrides = CliOverrides {
        photos_dir: cli.dir.clone(),
        quality: convert_args.quality,
        no_optimize: convert_args.no_optimize,
        log_file: cli.log_file.clone(),
    };

    // logging is not up yet, so setup errors go straight to stderr
    let config = match config::load_config(cli.config.as_deref(), Path::new("."))
        .and_then(|c| c.with_overrides(&overrides))
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let logging_config = match command {
        // diagnostics are console-only
        Command::Diagnose { .. } => LoggingConfig {
            file: String::new(),
            ..config.logging.clone()
        },
        _ => config.logging.clone(),
    };
    if let Err(e) = logging::init(&logging_config) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match command {
        Command::Diagnose { file } => run_diagnose(&config, file.as_deref()),
        _ => run_convert(&config, convert_args.report.as_deref()),
    }
}

fn run_convert(config: &ConverterConfig, report_path: Option<&Path>) -> ExitCode {
    let options = ConvertOptions::from_config(config);
    info!(
        "Starting HEIC to JPEG conversion in {}",
        config.photos_dir.display()
    );

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::log_event(&event);
        }
    });
    let result = convert::run_batch(&config.photos_dir, &options, Some(tx));
    printer.join().ok();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = report_path {
        if let Err(e) = write_report(path, &report) {
            error!("cannot write report {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
        info!("Report written to {}", path.display());
    }
    ExitCode::SUCCESS
}

fn write_report(path: &Path, report: &BatchReport) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn run_diagnose(config: &ConverterConfig, file: Option<&Path>) -> ExitCode {
    let codec = LibheifCodec::new();
    let options = ConvertOptions::from_config(config);

    if let Some(path) = file {
        output::print_diagnosis(&diagnose::diagnose_file(&codec, path, &options));
        return ExitCode::SUCCESS;
    }

    let directory = diagnose::resolve_photos_dir(&config.photos_dir, Path::new("."));
    let all = match diagnose::diagnose_directory(&codec, &directory, &options) {
        Ok(all) => all,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if all.is_empty() {
        println!("No HEIC files found in {}", directory.display());
        return ExitCode::SUCCESS;
    }
    for d in &all {
        output::print_diagnosis(d);
        println!();
    }
    println!("{}", output::format_diagnosis_summary(&all));
    ExitCode::SUCCESS
}
