//! Tally - A spreadsheet formula engine on the command line

mod config;

use anyhow::{Context, bail};
use regex::Regex;
use std::env;
use std::path::PathBuf;
use tally_core::{CellContents, CellRef, Spreadsheet};
use tally_engine::engine::{Cell, Formula, canonical_name};

fn print_usage() {
    eprintln!("Usage: tally [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Spreadsheet file to open (.tly)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <EXPR>      Evaluate an expression and print the result");
    eprintln!("  -s, --set <NAME=TEXT>     Set a cell before printing (can be repeated)");
    eprintln!("  -o, --output <FILE>       Save the sheet after edits");
    eprintln!("  --valid <REGEX>           Pattern every cell name must match");
    eprintln!("  --config <FILE>           Read settings from FILE instead of the user config");
    eprintln!("  -h, --help                Print help");
}

#[derive(Debug, Default)]
struct Options {
    file_path: Option<PathBuf>,
    command: Option<String>,
    edits: Vec<String>,
    output_file: Option<PathBuf>,
    valid: Option<String>,
    config_file: Option<PathBuf>,
}

fn require_value(args: &[String], i: usize, what: &str) -> String {
    if i >= args.len() {
        eprintln!("Error: {} requires {}", args[i - 1], what);
        std::process::exit(1);
    }
    args[i].clone()
}

fn parse_args(args: &[String]) -> Options {
    let mut opts = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            "-c" | "--command" => {
                i += 1;
                opts.command = Some(require_value(args, i, "an expression"));
            }
            "-s" | "--set" => {
                i += 1;
                opts.edits.push(require_value(args, i, "NAME=TEXT"));
            }
            "-o" | "--output" => {
                i += 1;
                opts.output_file = Some(PathBuf::from(require_value(args, i, "a file path")));
            }
            "--valid" => {
                i += 1;
                opts.valid = Some(require_value(args, i, "a pattern"));
            }
            "--config" => {
                i += 1;
                opts.config_file = Some(PathBuf::from(require_value(args, i, "a file path")));
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if opts.file_path.is_none() {
                    opts.file_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    opts
}

/// Evaluate `expr` against the sheet. Returns the printed value and whether
/// it is an error.
fn evaluate_command(sheet: &Spreadsheet, expr: &str) -> anyhow::Result<(String, bool)> {
    let expr = expr.trim();
    let expr = expr.strip_prefix('=').unwrap_or(expr);
    let formula = Formula::parse_with(expr, canonical_name, |name| sheet.is_valid_name(name))
        .with_context(|| format!("cannot parse {:?}", expr))?;

    let cell = Cell::new(CellContents::Formula(formula));
    let value = cell.compute_value(|name| {
        sheet
            .get_cell_value(name)
            .ok()
            .and_then(|value| value.as_number())
    });
    Ok((value.to_string(), value.is_error()))
}

fn print_cells(sheet: &Spreadsheet) -> anyhow::Result<()> {
    let mut names: Vec<&str> = sheet.names_of_all_nonempty_cells().collect();
    names.sort_by_key(|name| (CellRef::from_str(name), name.to_string()));
    for name in names {
        println!("{}\t{}", name, sheet.get_cell_value(name)?);
    }
    Ok(())
}

fn run(opts: Options) -> anyhow::Result<i32> {
    let (config, warnings) = config::load_config(opts.config_file.as_deref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let pattern = opts.valid.unwrap_or(config.is_valid);
    let is_valid =
        Regex::new(&pattern).with_context(|| format!("invalid cell name pattern {:?}", pattern))?;

    let mut sheet = match &opts.file_path {
        Some(path) => Spreadsheet::load_from_path(path, is_valid)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Spreadsheet::with_validator(is_valid),
    };

    for edit in &opts.edits {
        let Some((name, text)) = edit.split_once('=') else {
            bail!("expected NAME=TEXT, got {:?}", edit);
        };
        let affected = sheet
            .set_contents_of_cell(name.trim(), text)
            .with_context(|| format!("cannot set {}", name.trim()))?;
        log::info!("{} updated {} cells", name.trim(), affected.len());
    }

    let mut code = 0;
    match &opts.command {
        Some(expr) => {
            let (value, is_error) = evaluate_command(&sheet, expr)?;
            println!("{}", value);
            if is_error {
                code = 1;
            }
        }
        None => print_cells(&sheet)?,
    }

    if let Some(output_path) = &opts.output_file {
        sheet
            .save_to_path(output_path)
            .with_context(|| format!("failed to save {}", output_path.display()))?;
        eprintln!("Saved to {}", output_path.display());
    }

    Ok(code)
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let opts = parse_args(&args);

    match run(opts) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
