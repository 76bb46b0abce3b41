//! Command line flags and env files for the `argline` binary.
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ArgError, ArgResult, ErrorKind};
use crate::utils::{is_valid_var_name, strip_quotes};
use crate::{Dialect, Mode};

pub const ENV_FILE_VAR: &str = "ARGLINE_ENV_FILE";

pub const USAGE: &str = "usage: argline [-d bash|powershell] [--tokenize] [--env-file=PATH] [--json] [--strict] [LINE...]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub dialect: Dialect,
    pub mode: Mode,
    pub env_file: Option<PathBuf>,
    pub json: bool,
    pub strict: bool,
    pub help: bool,
    /// Remaining arguments joined by spaces; `None` means read stdin.
    pub line: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dialect: Dialect::Bash,
            mode: Mode::Expand,
            env_file: None,
            json: false,
            strict: false,
            help: false,
            line: None,
        }
    }
}

impl Options {
    /// The explicit `--env-file`, else `ARGLINE_ENV_FILE`.
    pub fn env_file_path(&self) -> Option<PathBuf> {
        self.env_file
            .clone()
            .or_else(|| env::var_os(ENV_FILE_VAR).map(PathBuf::from))
    }
}

pub fn parse_args<I>(args: I) -> ArgResult<Options>
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options::default();
    let mut rest: Vec<String> = Vec::new();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if !rest.is_empty() {
            rest.push(arg);
            continue;
        }
        match arg.as_str() {
            "-h" | "--help" => options.help = true,
            "-t" | "--tokenize" => options.mode = Mode::Tokenize,
            "--json" => options.json = true,
            "--strict" => options.strict = true,
            "-d" | "--dialect" => {
                let value = args.next().ok_or_else(|| {
                    ArgError::new(ErrorKind::Usage, format!("{arg} needs a value"))
                        .with_context(USAGE)
                })?;
                options.dialect = value.parse()?;
            }
            "--env-file" => {
                let value = args.next().ok_or_else(|| {
                    ArgError::new(ErrorKind::Usage, "--env-file needs a value").with_context(USAGE)
                })?;
                options.env_file = Some(PathBuf::from(value));
            }
            "--" => rest.extend(args.by_ref()),
            _ => {
                if let Some(value) = arg.strip_prefix("--dialect=") {
                    options.dialect = value.parse()?;
                } else if let Some(value) = arg.strip_prefix("--env-file=") {
                    options.env_file = Some(PathBuf::from(value));
                } else if arg.starts_with("--") {
                    return Err(
                        ArgError::new(ErrorKind::Usage, format!("unknown flag '{arg}'"))
                            .with_context(USAGE),
                    );
                } else {
                    rest.push(arg);
                }
            }
        }
    }

    if options.mode == Mode::Tokenize && options.dialect != Dialect::PowerShell {
        return Err(ArgError::new(
            ErrorKind::Usage,
            "--tokenize is only available for the powershell dialect",
        )
        .with_context(USAGE));
    }
    if !rest.is_empty() {
        options.line = Some(rest.join(" "));
    }
    Ok(options)
}

pub fn load_env_file(path: &Path) -> ArgResult<HashMap<String, String>> {
    let content = fs::read_to_string(path).map_err(|err| {
        ArgError::new(
            ErrorKind::Config,
            format!("cannot read env file {}: {err}", path.display()),
        )
    })?;
    parse_env_lines(&content)
}

/// `KEY=VALUE` lines, with optional `export ` prefix and `#` comments.
pub fn parse_env_lines(content: &str) -> ArgResult<HashMap<String, String>> {
    let mut vars = HashMap::new();
    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let (name, value) = parse_assignment(line, idx + 1)?;
        vars.insert(name.to_string(), value.to_string());
    }
    Ok(vars)
}

fn parse_assignment(input: &str, line: usize) -> ArgResult<(&str, &str)> {
    let (name, value) = input.split_once('=').ok_or_else(|| {
        ArgError::new(
            ErrorKind::Config,
            format!("assignment missing '=' on line {line}"),
        )
        .with_context("Expected: NAME=value")
    })?;
    let name = name.trim();
    if !is_valid_var_name(name) {
        return Err(ArgError::new(
            ErrorKind::Config,
            format!("invalid variable name '{name}' on line {line}"),
        )
        .with_context("Variable names must start with a letter or underscore, followed by letters, digits, or underscores"));
    }
    Ok((name, strip_quotes(value.trim())))
}
