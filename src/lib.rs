//! Variable expansion and argument tokenizing for scripted build steps.
//!
//! A raw argument line goes in together with an environment lookup; an
//! expanded line (Bash, PowerShell) or an argument vector (PowerShell) comes
//! out, along with a diagnostics record. Malformed input never fails: it is
//! reported through blocking signals in the diagnostics, and callers decide
//! whether to run the result.
use std::fmt;
use std::str::FromStr;

pub mod config;
mod diagnostics;
mod error;
mod expansion;
mod parse;
mod utils;

pub use diagnostics::{Diagnostics, ExpandDiagnostics, TokenizeDiagnostics};
pub use error::{ArgError, ArgResult, ErrorKind};
pub use expansion::{expand_bash_variables, expand_powershell_variables, Environment, Expansion};
pub use parse::{tokenize_powershell_arguments, Tokenized};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Bash,
    PowerShell,
}

impl Dialect {
    pub fn expand(self, line: &str, env: &Environment<'_>) -> Expansion {
        match self {
            Dialect::Bash => expand_bash_variables(line, env),
            Dialect::PowerShell => expand_powershell_variables(line, env),
        }
    }
}

impl FromStr for Dialect {
    type Err = ArgError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bash" | "sh" => Ok(Dialect::Bash),
            "powershell" | "pwsh" | "ps" => Ok(Dialect::PowerShell),
            other => Err(
                ArgError::new(ErrorKind::Usage, format!("unknown dialect '{other}'"))
                    .with_context("Valid values: bash, powershell"),
            ),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Dialect::Bash => write!(f, "bash"),
            Dialect::PowerShell => write!(f, "powershell"),
        }
    }
}

/// What to do with a line: expand it, or expand and split it into arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Expand,
    Tokenize,
}

/// Result of [`process_line`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Processed {
    Expanded(Expansion),
    Tokenized(Tokenized),
}

impl Processed {
    pub fn diagnostics(&self) -> &dyn Diagnostics {
        match self {
            Processed::Expanded(expansion) => &expansion.diagnostics,
            Processed::Tokenized(tokenized) => &tokenized.diagnostics,
        }
    }

    /// The expanded line, or the arguments joined by single spaces.
    pub fn text(&self) -> String {
        match self {
            Processed::Expanded(expansion) => expansion.line.clone(),
            Processed::Tokenized(tokenized) => tokenized.args.join(" "),
        }
    }
}

/// Runs one line through the expander or tokenizer of `dialect`.
///
/// Only PowerShell lines can be tokenized; asking for Bash tokenizing is a
/// usage error, not a diagnostics signal.
pub fn process_line(
    dialect: Dialect,
    mode: Mode,
    line: &str,
    env: &Environment<'_>,
) -> ArgResult<Processed> {
    match (dialect, mode) {
        (_, Mode::Expand) => Ok(Processed::Expanded(dialect.expand(line, env))),
        (Dialect::PowerShell, Mode::Tokenize) => Ok(Processed::Tokenized(
            tokenize_powershell_arguments(line, env),
        )),
        (Dialect::Bash, Mode::Tokenize) => Err(ArgError::new(
            ErrorKind::Usage,
            "tokenizing is only available for the powershell dialect",
        )),
    }
}

/// Fuzz helper for the expansion targets.
pub fn fuzz_expand_bytes(data: &[u8]) {
    let input = String::from_utf8_lossy(data);
    let env = Environment::new(|name| Some(format!("${name}'")));
    for dialect in [Dialect::Bash, Dialect::PowerShell] {
        if let Ok(processed) = process_line(dialect, Mode::Expand, &input, &env) {
            let _ = processed.diagnostics().check();
        }
    }
}

/// Fuzz helper for the tokenizer target.
pub fn fuzz_tokenize_bytes(data: &[u8]) {
    let input = String::from_utf8_lossy(data);
    let env = Environment::new(|_| Some("a `b' \"c".to_string()));
    if let Ok(Processed::Tokenized(tokenized)) =
        process_line(Dialect::PowerShell, Mode::Tokenize, &input, &env)
    {
        assert!(tokenized.args.iter().all(|arg| !arg.is_empty()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_names() {
        assert_eq!("Bash".parse::<Dialect>().unwrap(), Dialect::Bash);
        assert_eq!(" pwsh ".parse::<Dialect>().unwrap(), Dialect::PowerShell);
        assert!("cmd".parse::<Dialect>().is_err());
        assert_eq!(Dialect::PowerShell.to_string(), "powershell");
    }

    #[test]
    fn process_line_dispatches_on_dialect_and_mode() {
        let vars = std::collections::HashMap::from([("A".to_string(), "x y".to_string())]);
        let env = Environment::from_map(&vars);

        let processed = process_line(Dialect::Bash, Mode::Expand, "$A '$A'", &env).unwrap();
        assert_eq!(processed, Processed::Expanded(expand_bash_variables("$A '$A'", &env)));
        assert_eq!(processed.text(), "x y '$A'");
        assert!(!processed.diagnostics().is_clean());

        let processed =
            process_line(Dialect::PowerShell, Mode::Expand, "$env:A", &env).unwrap();
        assert_eq!(processed.text(), "x y");

        let processed =
            process_line(Dialect::PowerShell, Mode::Tokenize, "$env:A \"$env:A\"", &env).unwrap();
        let Processed::Tokenized(tokenized) = &processed else {
            panic!("expected arguments, got {processed:?}");
        };
        assert_eq!(tokenized.args, vec!["x", "y", "x y"]);
        assert_eq!(processed.text(), "x y x y");

        let err = process_line(Dialect::Bash, Mode::Tokenize, "a", &env).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Usage);
    }

    #[test]
    fn process_line_passes_blocking_signals_through() {
        let env = Environment::new(|_| None);
        let processed = process_line(Dialect::PowerShell, Mode::Tokenize, "\"open", &env).unwrap();
        assert!(processed.diagnostics().is_blocked());
        assert!(processed.diagnostics().check().is_err());

        let processed = process_line(Dialect::Bash, Mode::Expand, "plain", &env).unwrap();
        assert!(processed.diagnostics().is_clean());
    }

    #[test]
    fn fuzz_helpers_survive_odd_input() {
        for input in ["", "$", "${", "$env:", "`", "'\"`$env:x`", "\\$\\\\${\\", "é$é"] {
            fuzz_expand_bytes(input.as_bytes());
            fuzz_tokenize_bytes(input.as_bytes());
        }
        fuzz_expand_bytes(&[0xff, b'$', 0xfe]);
    }
}
