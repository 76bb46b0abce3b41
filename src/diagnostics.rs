//! Diagnostics records returned next to every expansion and tokenization.
//!
//! Counters are informational unless noted. Blocking signals mean the result
//! is partial and must not be executed unmodified; `check` turns the first
//! blocking signal into an `ArgError` for callers that want a hard failure.
use crate::error::{ArgError, ArgResult, ErrorKind};

pub trait Diagnostics {
    /// Flat `(name, value)` pairs for telemetry. Blocking flags are 0/1,
    /// positions are reported as-is with 0 meaning "not raised".
    fn entries(&self) -> Vec<(String, usize)>;

    /// The first blocking signal, if any, as an error.
    fn blocking_error(&self) -> Option<ArgError>;

    /// Unusual constructs that were resolved but deserve a review.
    fn is_possibly_blocked(&self) -> bool;

    /// Nothing was found at all: no prefixes, quotes or escapes.
    fn is_clean(&self) -> bool {
        self.entries().iter().all(|(_, value)| *value == 0)
    }

    fn is_blocked(&self) -> bool {
        self.blocking_error().is_some()
    }

    fn check(&self) -> ArgResult<()> {
        match self.blocking_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Signals raised by the Bash and PowerShell variable expanders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExpandDiagnostics {
    pub found_prefixes: usize,
    /// Single-quoted blocks skipped without expansion.
    pub quoted_blocks: usize,
    pub variables_expanded: usize,
    /// References written as `\$NAME` and emitted literally.
    pub escaped_variables: usize,
    /// References preceded by a doubled escape symbol, still expanded.
    pub escaped_escape_symbols: usize,
    /// References whose name starts with the escape symbol (`$\NAME`).
    pub variables_starting_with_escape: usize,
    pub brace_syntax_entries: usize,
    pub braced_variables: usize,
    // possibly blocking
    pub variables_with_escape_inside: usize,
    // blocking
    pub unmatched_quotes: bool,
    /// Byte offset of the unclosed `{` in the returned line.
    pub unclosed_brace_position: Option<usize>,
}

impl Diagnostics for ExpandDiagnostics {
    fn entries(&self) -> Vec<(String, usize)> {
        vec![
            ("found_prefixes".to_string(), self.found_prefixes),
            ("quoted_blocks".to_string(), self.quoted_blocks),
            ("variables_expanded".to_string(), self.variables_expanded),
            ("escaped_variables".to_string(), self.escaped_variables),
            ("escaped_escape_symbols".to_string(), self.escaped_escape_symbols),
            (
                "variables_starting_with_escape".to_string(),
                self.variables_starting_with_escape,
            ),
            ("brace_syntax_entries".to_string(), self.brace_syntax_entries),
            ("braced_variables".to_string(), self.braced_variables),
            (
                "variables_with_escape_inside".to_string(),
                self.variables_with_escape_inside,
            ),
            ("unmatched_quotes".to_string(), usize::from(self.unmatched_quotes)),
            (
                "unclosed_brace_position".to_string(),
                self.unclosed_brace_position.unwrap_or(0),
            ),
        ]
    }

    fn blocking_error(&self) -> Option<ArgError> {
        if self.unmatched_quotes {
            return Some(
                ArgError::new(ErrorKind::Blocked, "unmatched quote before variable reference")
                    .with_context("Close the single-quoted block: 'text'"),
            );
        }
        self.unclosed_brace_position.map(|pos| {
            ArgError::new(ErrorKind::Blocked, "unclosed brace in variable reference")
                .with_context("Missing closing brace: ${variable}")
                .with_position(pos)
        })
    }

    fn is_possibly_blocked(&self) -> bool {
        self.variables_with_escape_inside > 0
    }
}

/// Signals raised by the PowerShell tokenizer, including its expansion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TokenizeDiagnostics {
    pub expansion: ExpandDiagnostics,
    /// Quotes of the other type appended literally inside a quoted run.
    pub nested_quotes: usize,
    pub closed_quote_pairs: usize,
    pub escaped_quotes: usize,
    pub backticks: usize,
    pub escaped_backticks: usize,
    pub backticks_in_single_quotes: usize,
    /// Arguments whose buffer was exactly one of `$ ; @ &` when the
    /// character was appended.
    pub special_characters: usize,
    /// Escapes still pending at an argument boundary or at end of input.
    pub trailing_escapes: usize,
    // possibly blocking
    pub unbalanced_quotes: usize,
    // blocking
    pub unmatched_quotes: bool,
}

impl Diagnostics for TokenizeDiagnostics {
    fn entries(&self) -> Vec<(String, usize)> {
        let mut entries = vec![
            ("nested_quotes".to_string(), self.nested_quotes),
            ("closed_quote_pairs".to_string(), self.closed_quote_pairs),
            ("escaped_quotes".to_string(), self.escaped_quotes),
            ("backticks".to_string(), self.backticks),
            ("escaped_backticks".to_string(), self.escaped_backticks),
            (
                "backticks_in_single_quotes".to_string(),
                self.backticks_in_single_quotes,
            ),
            ("special_characters".to_string(), self.special_characters),
            ("trailing_escapes".to_string(), self.trailing_escapes),
            ("unbalanced_quotes".to_string(), self.unbalanced_quotes),
            ("unmatched_quotes".to_string(), usize::from(self.unmatched_quotes)),
        ];
        entries.extend(
            self.expansion
                .entries()
                .into_iter()
                .map(|(name, value)| (format!("env.{name}"), value)),
        );
        entries
    }

    fn blocking_error(&self) -> Option<ArgError> {
        if let Some(err) = self.expansion.blocking_error() {
            return Some(err);
        }
        if self.unmatched_quotes {
            return Some(
                ArgError::new(ErrorKind::Blocked, "unmatched quote in arguments")
                    .with_context("Every opening quote needs a closing quote of the same type"),
            );
        }
        None
    }

    fn is_possibly_blocked(&self) -> bool {
        self.unbalanced_quotes > 0 || self.expansion.is_possibly_blocked()
    }
}
