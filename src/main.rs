use std::collections::HashMap;
use std::env;
use std::io::{self, Read};
use std::process;

use log::{debug, warn};

use argline::config::{load_env_file, parse_args, Options, USAGE};
use argline::{
    process_line, ArgError, ArgResult, Diagnostics, Environment, ErrorKind, Processed,
};

// Exit status when --strict rejects a line with a blocking signal.
const BLOCKED_STATUS: i32 = 2;

fn main() {
    init_logging();
    let status = match run() {
        Ok(status) => status,
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    };
    process::exit(status);
}

fn init_logging() {
    let env = env_logger::Env::default().filter_or("ARGLINE_LOG", "info");
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

fn run() -> ArgResult<i32> {
    let options = parse_args(env::args().skip(1))?;
    if options.help {
        println!("{USAGE}");
        return Ok(0);
    }

    let line = match &options.line {
        Some(line) => line.clone(),
        None => read_stdin_line()?,
    };
    let overrides = match options.env_file_path() {
        Some(path) => load_env_file(&path)?,
        None => HashMap::new(),
    };
    let env = Environment::layered(&overrides, Environment::process());

    let processed = process_line(options.dialect, options.mode, &line, &env)?;
    let status = gate(&options, processed.diagnostics(), &processed.text());
    if status == BLOCKED_STATUS {
        return Ok(status);
    }
    if options.json {
        print_json(&processed)?;
        return Ok(status);
    }
    match &processed {
        Processed::Expanded(expansion) => println!("{}", expansion.line),
        Processed::Tokenized(tokenized) => {
            for arg in &tokenized.args {
                println!("{arg}");
            }
        }
    }
    Ok(status)
}

/// Logs the telemetry and decides the exit status for blocking signals.
fn gate(options: &Options, diagnostics: &dyn Diagnostics, shown: &str) -> i32 {
    let telemetry: Vec<String> = diagnostics
        .entries()
        .into_iter()
        .filter(|(_, value)| *value != 0)
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    debug!(
        "telemetry event=line dialect={} {}",
        options.dialect,
        telemetry.join(" ")
    );
    if diagnostics.is_possibly_blocked() {
        warn!("line event=review dialect={} reason=unusual-construct", options.dialect);
    }
    let Some(err) = diagnostics.blocking_error() else {
        return 0;
    };
    if options.strict {
        eprintln!("error: {}", err.display_with_input(shown));
        return BLOCKED_STATUS;
    }
    warn!("line event=blocked dialect={} {}", options.dialect, err.message);
    0
}

fn read_stdin_line() -> ArgResult<String> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|err| ArgError::new(ErrorKind::Io, format!("cannot read stdin: {err}")))?;
    let trimmed = input.trim_end_matches(['\n', '\r']).len();
    input.truncate(trimmed);
    Ok(input)
}

fn print_json<T: serde::Serialize>(value: &T) -> ArgResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| ArgError::new(ErrorKind::Io, format!("cannot render json: {err}")))?;
    println!("{rendered}");
    Ok(())
}
