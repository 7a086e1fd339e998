// Encode a voxelized OBJ mesh into a VXL map.
// Usage: vxlsmith <input.obj> <output.vxl> [--settings <file.json>] [--parallel] [--no-diagnostics]

use std::fs::{self, File};
use std::io::BufWriter;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vxlsmith::{
    get_manager, prepare, write_prepared, EncodeConfig, EncodeError, Rgba, SolidColor,
};

const USAGE: &str = "usage: vxlsmith <input.obj> <output.vxl> \
    [--settings <file.json>] [--parallel] [--no-diagnostics]";

struct Args {
    input: String,
    output: String,
    settings: Option<String>,
    parallel: bool,
    no_diagnostics: bool,
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut positional = Vec::new();
    let mut settings = None;
    let mut parallel = false;
    let mut no_diagnostics = false;

    let mut iter = raw.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--settings" => {
                let path = iter.next().ok_or("--settings needs a file path")?;
                settings = Some(path.clone());
            }
            "--parallel" => parallel = true,
            "--no-diagnostics" => no_diagnostics = true,
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            _ => positional.push(arg.clone()),
        }
    }

    match <[String; 2]>::try_from(positional) {
        Ok([input, output]) => Ok(Args {
            input,
            output,
            settings,
            parallel,
            no_diagnostics,
        }),
        Err(_) => Err("expected an input and an output path".to_string()),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw: Vec<String> = std::env::args().collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("{USAGE}");
            return ExitCode::from(1);
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(EncodeError::Geometry(err)) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> Result<(), EncodeError> {
    let mut config = match &args.settings {
        Some(path) => EncodeConfig::from_json(&fs::read_to_string(path)?)?,
        None => EncodeConfig::default(),
    };
    if args.parallel {
        config.parallel = true;
    }
    if args.no_diagnostics {
        config.diagnostics.enabled = false;
    }

    let data = fs::read(&args.input)?;
    let mesh = {
        let manager = get_manager();
        let manager = manager
            .lock()
            .map_err(|_| EncodeError::Config("format registry is poisoned".to_string()))?;
        manager
            .read(&data)
            .map_err(|err| EncodeError::Config(format!("{}: {err}", args.input)))?
    };

    // Geometry is checked before the output file exists.
    let prepared = prepare(&mesh, &config)?;
    let sink = BufWriter::new(File::create(&args.output)?);
    let report = write_prepared(&prepared, sink, &config, &SolidColor(Rgba::GREEN))?;

    println!("wrote {} ({} bytes)", args.output, report.bytes_written);
    println!(
        "  resolution {:.4}, footprint {}x{} at ({}, {})",
        report.resolution,
        report.footprint.width(),
        report.footprint.length(),
        report.footprint.min_x,
        report.footprint.min_y
    );
    println!(
        "  columns: {} solid, {} outside footprint, {} degenerate, {} rejected",
        report.columns.solid,
        report.columns.out_of_footprint,
        report.columns.degenerate,
        report.columns.rejected
    );
    if report.discarded_faces > 0 {
        println!("  {} side faces ignored", report.discarded_faces);
    }
    Ok(())
}
